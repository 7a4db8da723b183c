//! CLI integration tests.

mod cache_tests;
mod common;
mod run_tests;

//! kiln-lib: compile, cache and run Lua build scripts.
//!
//! A build script is turned into a single Lua chunk, compiled to bytecode
//! and run against a host context exposing build primitives:
//! - `script`: parsed scripts, code generation and source fingerprints
//! - `compiler`: the compiler service and its diagnostics
//! - `cache`: compiled scripts persisted between runs
//! - `session`: the compile/cache/run orchestration
//! - `execute`: loading bytecode and invoking it with the host
//! - `host`: the primitives scripts call
//! - `engine`: one-call entry point used by the CLI

pub mod cache;
pub mod compiler;
pub mod config;
pub mod consts;
pub mod engine;
pub mod execute;
pub mod host;
pub mod library;
pub mod script;
pub mod session;
pub mod util;

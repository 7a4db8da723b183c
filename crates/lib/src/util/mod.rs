//! Shared utilities.
//!
//! Path normalization, scoped timing, and test helpers.

pub mod path;
pub mod stopwatch;

#[cfg(test)]
pub mod testutil;

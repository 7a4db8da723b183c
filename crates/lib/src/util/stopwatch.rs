//! Scoped timing that reports on drop.

use std::time::Instant;

use tracing::debug;

/// Measures the time until it is dropped and logs it at debug level.
///
/// The report is emitted on every exit path, including early returns and
/// `?` propagation, since it lives in `Drop`.
#[must_use = "the stopwatch reports when dropped; bind it to a variable"]
pub struct Stopwatch {
  label: String,
  started: Instant,
}

impl Stopwatch {
  pub fn start(label: impl Into<String>) -> Self {
    Self {
      label: label.into(),
      started: Instant::now(),
    }
  }
}

impl Drop for Stopwatch {
  fn drop(&mut self) {
    let elapsed_ms = self.started.elapsed().as_millis();
    debug!(elapsed_ms, "{}: {}ms", self.label, elapsed_ms);
  }
}

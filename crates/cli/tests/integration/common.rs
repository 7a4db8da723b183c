//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the build script, its
/// referenced files and the default `tools/cache` directory.
pub struct TestEnv {
  pub temp: TempDir,
  pub script_path: PathBuf,
}

impl TestEnv {
  /// Create with `build.lua` holding `content`.
  pub fn with_script(content: &str) -> Self {
    let env = Self::empty();
    std::fs::write(&env.script_path, content).unwrap();
    env
  }

  /// Create an empty test environment.
  pub fn empty() -> Self {
    let temp = TempDir::new().unwrap();
    let script_path = temp.path().join("build.lua");
    Self { temp, script_path }
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Read a file relative to the temp directory.
  pub fn read_file(&self, relative_path: &str) -> String {
    std::fs::read_to_string(self.temp.path().join(relative_path)).unwrap()
  }

  /// Default cache directory for the script.
  pub fn cache_path(&self) -> PathBuf {
    self.temp.path().join("tools").join("cache")
  }

  /// Command running in the temp directory with a clean environment.
  pub fn kiln_cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("kiln");
    cmd
      .current_dir(self.temp.path())
      .env_remove("KILN_CACHE_ENABLED")
      .env_remove("KILN_CACHE_PATH")
      .env_remove("KILN_PATHS_TOOLS")
      .env_remove("RUST_LOG");
    cmd
  }
}

//! The host context scripts run against.
//!
//! A [`ScriptHost`] supplies the value the compiled chunk receives as its
//! argument (the receiver every alias forwards to) and the environment the
//! run happens in. [`BuildHost`] is the host shipped with kiln.

mod context;
pub mod process;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use mlua::prelude::*;
use thiserror::Error;

pub use context::{BuildHost, TaskRecord};

/// Failures raised by host primitives while a script runs.
///
/// These travel through Lua as external errors and are recovered intact by
/// the execution adapter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
  #[error("task '{0}' is already defined")]
  DuplicateTask(String),

  #[error("task '{0}' is not defined")]
  UnknownTask(String),

  #[error("failed to start '{program}': {message}")]
  Spawn { program: String, message: String },

  #[error("command '{cmd}' failed: {}", describe_exit(.code))]
  CommandFailed { cmd: String, code: Option<i32> },

  #[error("{}: {message}", .path.display())]
  Io { path: PathBuf, message: String },

  #[error("failed to create process runtime: {0}")]
  Runtime(String),
}

fn describe_exit(code: &Option<i32>) -> String {
  match code {
    Some(code) => format!("exit code {}", code),
    None => "terminated by signal".to_string(),
  }
}

impl HostError {
  pub(crate) fn io(path: &Path, err: std::io::Error) -> Self {
    HostError::Io {
      path: path.to_path_buf(),
      message: err.to_string(),
    }
  }
}

/// Where a run happens and what it was asked to do.
#[derive(Debug, Clone, Default)]
pub struct HostEnvironment {
  working_directory: PathBuf,
  arguments: BTreeMap<String, String>,
}

impl HostEnvironment {
  pub fn new(working_directory: PathBuf) -> Self {
    Self {
      working_directory,
      arguments: BTreeMap::new(),
    }
  }

  pub fn with_arguments(mut self, arguments: BTreeMap<String, String>) -> Self {
    self.arguments = arguments;
    self
  }

  pub fn working_directory(&self) -> &Path {
    &self.working_directory
  }

  /// Argument lookup is case-insensitive.
  pub fn argument(&self, name: &str) -> Option<&str> {
    self
      .arguments
      .iter()
      .find(|(key, _)| key.eq_ignore_ascii_case(name))
      .map(|(_, value)| value.as_str())
  }

  /// Resolve `path` against the working directory.
  pub fn resolve(&self, path: &str) -> PathBuf {
    crate::util::path::make_absolute(Path::new(path), &self.working_directory)
  }
}

/// Supplies the receiver a compiled script is invoked with.
pub trait ScriptHost {
  fn environment(&self) -> &HostEnvironment;

  /// Create the receiver value inside `lua`.
  fn receiver(&self, lua: &Lua) -> LuaResult<LuaValue>;
}

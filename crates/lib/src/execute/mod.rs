//! Running compiled scripts.
//!
//! The adapter loads bytecode into a fresh Lua state, binds the host
//! receiver, makes the session's references resolvable for the duration of
//! the call, and invokes the chunk. Errors raised inside the script come back
//! unwrapped:
//!
//! - a failing host primitive surfaces as [`ExecutionError::Host`]
//! - anything else as [`ExecutionError::Script`] with the root Lua error

mod resolver;

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mlua::{ChunkMode, LuaOptions, StdLib, prelude::*};
use thiserror::Error;
use tracing::debug;

use crate::compiler::{CompiledModule, SymbolMap};
use crate::host::{HostError, ScriptHost};
use crate::session::ReferenceSet;

pub use resolver::ResolutionScope;

/// A compiled script ready to run.
#[derive(Debug, Clone, Copy)]
pub enum Artifact<'a> {
  /// Bytecode persisted in the cache.
  Persisted(&'a Path),
  /// Bytecode held in memory only.
  Transient(&'a CompiledModule),
}

#[derive(Debug, Error)]
pub enum ExecutionError {
  #[error("failed to read compiled script {}: {source}", .path.display())]
  Load {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("compiled script '{name}' could not be loaded: {message}")]
  Invalid { name: String, message: String },

  #[error("failed to prepare script state: {0}")]
  Setup(#[source] LuaError),

  #[error("{0}")]
  Script(LuaError),

  #[error(transparent)]
  Host(HostError),
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ExecutionAdapter;

impl ExecutionAdapter {
  pub fn new() -> Self {
    Self
  }

  /// Run `artifact` against `host`, waiting for the script to finish.
  pub fn run(
    &self,
    artifact: Artifact<'_>,
    host: &dyn ScriptHost,
    references: &ReferenceSet,
  ) -> Result<(), ExecutionError> {
    let (name, bytecode, symbols) = match artifact {
      Artifact::Persisted(path) => {
        let bytes = fs::read(path).map_err(|source| ExecutionError::Load {
          path: path.to_path_buf(),
          source,
        })?;
        let name = path
          .file_stem()
          .map(|stem| stem.to_string_lossy().into_owned())
          .unwrap_or_default();
        (name, Cow::Owned(bytes), None)
      }
      Artifact::Transient(module) => (
        module.name.clone(),
        Cow::Borrowed(module.bytecode.as_slice()),
        module.symbols.as_ref(),
      ),
    };

    let lua = create_state().map_err(ExecutionError::Setup)?;
    let _scope = ResolutionScope::activate(&lua, references).map_err(ExecutionError::Setup)?;

    let entry = lua
      .load(bytecode.as_ref())
      .set_name(format!("={}", name))
      .set_mode(ChunkMode::Binary)
      .into_function()
      .map_err(|e| ExecutionError::Invalid {
        name: name.clone(),
        message: e.to_string(),
      })?;
    let receiver = host.receiver(&lua).map_err(ExecutionError::Setup)?;

    debug!(
      script = %name,
      working_directory = %host.environment().working_directory().display(),
      "invoking script"
    );
    entry.call::<()>(receiver).map_err(|e| unwrap_error(e, symbols))
  }
}

/// Lua state for running precompiled chunks.
fn create_state() -> LuaResult<Lua> {
  // SAFETY: only the safe standard libraries are opened. Binary chunks are
  // allowed because the bytecode comes from our own compiler or our own cache.
  Ok(unsafe { Lua::unsafe_new_with(StdLib::ALL_SAFE, LuaOptions::new()) })
}

/// Strip callback and context wrappers down to the error that was raised.
fn root_cause(err: LuaError) -> LuaError {
  match err {
    LuaError::CallbackError { cause, .. } => root_cause(Arc::unwrap_or_clone(cause)),
    LuaError::WithContext { cause, .. } => root_cause(Arc::unwrap_or_clone(cause)),
    other => other,
  }
}

fn unwrap_error(err: LuaError, symbols: Option<&SymbolMap>) -> ExecutionError {
  let err = root_cause(err);

  if let LuaError::ExternalError(inner) = &err
    && let Some(host) = inner.downcast_ref::<HostError>()
  {
    return ExecutionError::Host(host.clone());
  }

  match (err, symbols) {
    (LuaError::RuntimeError(message), Some(symbols)) => {
      ExecutionError::Script(LuaError::RuntimeError(symbols.remap(&message)))
    }
    (err, _) => ExecutionError::Script(err),
  }
}

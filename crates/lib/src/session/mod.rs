//! Script sessions: compile, cache and run one build script.
//!
//! A session owns the reference and namespace sets a script compiles
//! against. [`CachingSession`] reuses compiled scripts across runs when the
//! cache is enabled; [`DebugSession`] always compiles with debug information
//! and never touches the cache.

mod caching;
mod debug;
pub mod references;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::trace;

pub use caching::CachingSession;
pub use debug::DebugSession;
pub use references::{NamespaceSet, ReferenceSet};

use crate::cache::CacheError;
use crate::compiler::Diagnostic;
use crate::execute::ExecutionError;
use crate::library::LibraryHandle;
use crate::script::Script;

#[derive(Debug, Error)]
pub enum SessionError {
  #[error("reference path must not be empty")]
  InvalidReference,

  #[error("{message}")]
  Compilation {
    message: String,
    diagnostics: Vec<Diagnostic>,
  },

  #[error("compiler produced no module for script '{0}'")]
  NoArtifact(String),

  #[error(transparent)]
  Execution(#[from] ExecutionError),
}

/// Where the code that ran came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
  /// A cached artifact whose fingerprint matched.
  Cached(PathBuf),
  /// Freshly compiled and written to the cache.
  Persisted(PathBuf),
  /// Freshly compiled and run from memory.
  Transient,
}

impl ArtifactSource {
  pub fn as_str(&self) -> &'static str {
    match self {
      ArtifactSource::Cached(_) => "cached",
      ArtifactSource::Persisted(_) => "compiled",
      ArtifactSource::Transient => "in-memory",
    }
  }
}

/// Outcome of a successful `execute`.
#[derive(Debug)]
pub struct ExecutionReport {
  pub source: ArtifactSource,
  /// Set when the compiled script could not be cached; it still ran.
  pub cache_error: Option<CacheError>,
}

/// References and imports shared by every session kind.
#[derive(Debug, Default)]
pub struct SessionState {
  pub references: ReferenceSet,
  pub namespaces: NamespaceSet,
}

pub trait ScriptSession {
  fn state(&self) -> &SessionState;

  fn state_mut(&mut self) -> &mut SessionState;

  /// Compile (or reuse) and run `script`.
  fn execute(&mut self, script: &mut Script) -> Result<ExecutionReport, SessionError>;

  fn references(&self) -> &ReferenceSet {
    &self.state().references
  }

  fn namespaces(&self) -> &NamespaceSet {
    &self.state().namespaces
  }

  fn add_library(&mut self, library: LibraryHandle) {
    trace!(library = %library.name(), "Adding library reference to {}...", library.name());
    self.state_mut().references.add_library(library);
  }

  /// Add a library file or directory. An empty path is rejected.
  fn add_reference(&mut self, path: &Path) -> Result<(), SessionError> {
    if path.as_os_str().is_empty() {
      return Err(SessionError::InvalidReference);
    }
    let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    trace!(path = %path.display(), "Adding reference to {}...", file_name);
    self.state_mut().references.add_path(path);
    Ok(())
  }

  /// Import a namespace; blank and repeated names are ignored.
  fn import_namespace(&mut self, namespace: &str) {
    if self.state_mut().namespaces.import(namespace) {
      trace!(namespace, "Importing namespace {}...", namespace);
    }
  }
}

//! Top-level entry: load a script, build its session and run it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::compiler::{CompilerService, LuaCompiler};
use crate::config::{CacheSettings, Configuration};
use crate::host::{BuildHost, HostEnvironment, HostError, ScriptHost};
use crate::library::path::path_library;
use crate::script::{Script, ScriptError};
use crate::session::{ArtifactSource, CachingSession, DebugSession, ScriptSession, SessionError};
use crate::util::path::make_absolute;

#[derive(Debug, Error)]
pub enum RunError {
  #[error(transparent)]
  Script(#[from] ScriptError),

  #[error(transparent)]
  Host(#[from] HostError),

  #[error(transparent)]
  Session(#[from] SessionError),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
  pub debug: bool,
}

/// Creates sessions sharing one compiler and one cache configuration.
pub struct ScriptEngine {
  settings: CacheSettings,
  compiler: Box<dyn CompilerService>,
}

impl ScriptEngine {
  pub fn new(settings: CacheSettings, compiler: Box<dyn CompilerService>) -> Self {
    Self { settings, compiler }
  }

  /// A debug session when `options.debug` is set, a caching session
  /// otherwise. Built-in libraries are already referenced.
  pub fn create_session<'a>(&'a self, host: &'a dyn ScriptHost, options: SessionOptions) -> Box<dyn ScriptSession + 'a> {
    let mut session: Box<dyn ScriptSession + 'a> = if options.debug {
      Box::new(DebugSession::new(host, self.compiler.as_ref()))
    } else {
      Box::new(CachingSession::new(host, self.compiler.as_ref(), self.settings.clone()))
    };
    session.add_library(path_library());
    session
  }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
  pub script: PathBuf,
  pub working_directory: PathBuf,
  pub arguments: BTreeMap<String, String>,
  pub debug: bool,
  pub recompile: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskSummary {
  pub name: String,
  pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
  pub script: String,
  pub path: PathBuf,
  /// `cached`, `compiled` or `in-memory`.
  pub source: String,
  pub artifact: Option<PathBuf>,
  pub cache_warning: Option<String>,
  pub tasks: Vec<TaskSummary>,
  pub elapsed_ms: u64,
}

/// Load and run the script described by `options`.
pub fn run_script(options: &RunOptions, config: &Configuration) -> Result<RunSummary, RunError> {
  let started = Instant::now();
  let script_path = make_absolute(&options.script, &options.working_directory);
  let script_dir = script_path.parent().unwrap_or(Path::new(".")).to_path_buf();

  let mut script = Script::load(&script_path)?.with_aliases(BuildHost::default_aliases());
  info!(script = %script.name(), path = %script_path.display(), "running build script");

  let settings = config
    .cache_settings(&script_dir, &options.working_directory)
    .with_force_recompile(options.recompile);
  let environment =
    HostEnvironment::new(options.working_directory.clone()).with_arguments(options.arguments.clone());
  let host = BuildHost::new(environment)?;
  let engine = ScriptEngine::new(settings, Box::new(LuaCompiler::new()));

  let report = {
    let mut session = engine.create_session(&host, SessionOptions { debug: options.debug });
    for reference in script.references().to_vec() {
      session.add_reference(&reference)?;
    }
    for namespace in script.namespaces().clone() {
      session.import_namespace(&namespace);
    }
    session.execute(&mut script)?
  };

  let cache_warning = report.cache_error.map(|err| {
    warn!(error = %err, "compiled script was not cached");
    err.to_string()
  });
  let artifact = match &report.source {
    ArtifactSource::Cached(path) | ArtifactSource::Persisted(path) => Some(path.clone()),
    ArtifactSource::Transient => None,
  };

  Ok(RunSummary {
    script: script.name().to_string(),
    path: script_path,
    source: report.source.as_str().to_string(),
    artifact,
    cache_warning,
    tasks: host
      .report()
      .into_iter()
      .map(|task| TaskSummary {
        name: task.name,
        duration_ms: task.duration.as_millis() as u64,
      })
      .collect(),
    elapsed_ms: started.elapsed().as_millis() as u64,
  })
}

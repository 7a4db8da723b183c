//! The default session: compile once, reuse while the source is unchanged.

use tracing::{debug, warn};

use super::{ArtifactSource, ExecutionReport, ScriptSession, SessionError, SessionState};
use crate::cache::CacheStore;
use crate::compiler::{CompileRequest, CompiledModule, CompilerService, route_diagnostics};
use crate::config::CacheSettings;
use crate::execute::{Artifact, ExecutionAdapter, ExecutionError};
use crate::host::ScriptHost;
use crate::script::{CodeGenerator, Script, hash_script};
use crate::util::stopwatch::Stopwatch;

pub struct CachingSession<'a> {
  host: &'a dyn ScriptHost,
  compiler: &'a dyn CompilerService,
  settings: CacheSettings,
  store: CacheStore,
  generator: CodeGenerator,
  adapter: ExecutionAdapter,
  state: SessionState,
}

impl<'a> CachingSession<'a> {
  pub fn new(host: &'a dyn ScriptHost, compiler: &'a dyn CompilerService, settings: CacheSettings) -> Self {
    let store = CacheStore::new(settings.directory.clone());
    Self {
      host,
      compiler,
      settings,
      store,
      generator: CodeGenerator::new(),
      adapter: ExecutionAdapter::new(),
      state: SessionState::default(),
    }
  }

  fn compile(&self, script: &mut Script) -> Result<CompiledModule, SessionError> {
    let _timer = Stopwatch::start("Script compile time");

    let code = self.generator.generate(script);
    for (namespace, names) in script.excluded_namespaces() {
      warn!(
        namespace = %namespace,
        "Namespace {} excluded by code generation, affected methods: {}",
        namespace,
        names.join(", ")
      );
    }

    let imports = self.state.namespaces.without(script.excluded_namespaces());
    debug!("Compiling build script...");
    let output = self.compiler.compile(&CompileRequest {
      name: script.name(),
      code: &code,
      references: &self.state.references,
      imports: &imports,
      emit_debug_info: false,
    });

    let errors = route_diagnostics(&output.diagnostics);
    if !errors.is_empty() {
      let details: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
      return Err(SessionError::Compilation {
        message: format!("Error(s) occurred when compiling build script:\n{}", details.join("\n")),
        diagnostics: errors.into_iter().cloned().collect(),
      });
    }

    output
      .module
      .ok_or_else(|| SessionError::NoArtifact(script.name().to_string()))
  }
}

impl ScriptSession for CachingSession<'_> {
  fn state(&self) -> &SessionState {
    &self.state
  }

  fn state_mut(&mut self) -> &mut SessionState {
    &mut self.state
  }

  fn execute(&mut self, script: &mut Script) -> Result<ExecutionReport, SessionError> {
    let name = script.name().to_string();
    let _timer = Stopwatch::start(format!("{} execution time", name));

    let artifact_path = self.store.artifact_path(&name);
    debug!(path = %artifact_path.display(), "cache artifact location");

    let mut hash = None;
    if self.settings.enabled
      && !self.settings.force_recompile
      && let Some(cached) = self.store.try_get(&name)
    {
      let current = hash_script(script);
      if current.matches(&cached.hash) {
        debug!("Running cached build script...");
        match self
          .adapter
          .run(Artifact::Persisted(&cached.artifact), self.host, &self.state.references)
        {
          Ok(()) => {
            return Ok(ExecutionReport {
              source: ArtifactSource::Cached(cached.artifact),
              cache_error: None,
            });
          }
          Err(err @ (ExecutionError::Load { .. } | ExecutionError::Invalid { .. })) => {
            debug!(error = %err, "cached artifact could not be loaded");
          }
          Err(err) => return Err(err.into()),
        }
      }
      debug!("Cache check failed.");
      hash = Some(current);
    }

    let module = self.compile(script)?;

    if !self.settings.enabled {
      self
        .adapter
        .run(Artifact::Transient(&module), self.host, &self.state.references)?;
      return Ok(ExecutionReport {
        source: ArtifactSource::Transient,
        cache_error: None,
      });
    }

    let hash = hash.unwrap_or_else(|| hash_script(script));
    match self.store.write(&name, &module.bytecode, &hash) {
      Ok(path) => {
        self
          .adapter
          .run(Artifact::Persisted(&path), self.host, &self.state.references)?;
        Ok(ExecutionReport {
          source: ArtifactSource::Persisted(path),
          cache_error: None,
        })
      }
      Err(err) => {
        warn!(error = %err, "could not cache compiled script, running it from memory");
        self
          .adapter
          .run(Artifact::Transient(&module), self.host, &self.state.references)?;
        Ok(ExecutionReport {
          source: ArtifactSource::Transient,
          cache_error: Some(err),
        })
      }
    }
  }
}

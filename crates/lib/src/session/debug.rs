//! Session for debugging build scripts.
//!
//! Every run compiles with line information kept, so runtime errors point
//! at script lines. Nothing is read from or written to the cache.

use tracing::debug;

use super::{ArtifactSource, ExecutionReport, ScriptSession, SessionError, SessionState};
use crate::compiler::{CompileRequest, CompilerService};
use crate::execute::{Artifact, ExecutionAdapter};
use crate::host::ScriptHost;
use crate::script::{CodeGenerator, Script};
use crate::util::stopwatch::Stopwatch;

pub struct DebugSession<'a> {
  host: &'a dyn ScriptHost,
  compiler: &'a dyn CompilerService,
  generator: CodeGenerator,
  adapter: ExecutionAdapter,
  state: SessionState,
}

impl<'a> DebugSession<'a> {
  pub fn new(host: &'a dyn ScriptHost, compiler: &'a dyn CompilerService) -> Self {
    Self {
      host,
      compiler,
      generator: CodeGenerator::new(),
      adapter: ExecutionAdapter::new(),
      state: SessionState::default(),
    }
  }
}

impl ScriptSession for DebugSession<'_> {
  fn state(&self) -> &SessionState {
    &self.state
  }

  fn state_mut(&mut self) -> &mut SessionState {
    &mut self.state
  }

  fn execute(&mut self, script: &mut Script) -> Result<ExecutionReport, SessionError> {
    let _timer = Stopwatch::start(format!("{} execution time", script.name()));

    let code = self.generator.generate(script);
    let imports = self.state.namespaces.to_vec();
    debug!(script = %script.name(), "Compiling build script for debugging...");
    let output = self.compiler.compile(&CompileRequest {
      name: script.name(),
      code: &code,
      references: &self.state.references,
      imports: &imports,
      emit_debug_info: true,
    });

    let has_errors = output.has_errors();
    let module = match output.module {
      Some(module) if !has_errors => module,
      _ => {
        let details: Vec<String> = output.diagnostics.iter().map(|d| d.to_string()).collect();
        return Err(SessionError::Compilation {
          message: format!("Error occurred when compiling: {}", details.join("\n")),
          diagnostics: output.diagnostics,
        });
      }
    };

    self
      .adapter
      .run(Artifact::Transient(&module), self.host, &self.state.references)?;
    Ok(ExecutionReport {
      source: ArtifactSource::Transient,
      cache_error: None,
    })
  }
}

//! Test utilities for kiln-lib.
//!
//! Cross-platform shell snippets plus in-memory fakes for the compiler
//! service and the host context.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use mlua::prelude::*;

use crate::compiler::{CompileOutput, CompileRequest, CompilerService, Diagnostic, LuaCompiler};
use crate::host::{HostEnvironment, ScriptHost};

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("powershell.exe", vec!["-NoProfile".to_string(), "-Command".to_string(), script.to_string()])
}

/// Returns a shell command that echoes an environment variable.
#[cfg(unix)]
pub fn echo_env(var: &str) -> String {
  format!("echo ${}", var)
}

#[cfg(windows)]
pub fn echo_env(var: &str) -> String {
  format!("Write-Output $env:{}", var)
}

/// Escape a path for embedding in a Lua string literal.
pub fn lua_path(path: &Path) -> String {
  path.display().to_string().replace('\\', "\\\\")
}

/// A compile request captured by [`RecordingCompiler`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
  pub code: String,
  pub imports: Vec<String>,
  pub emit_debug_info: bool,
}

/// Wraps the Lua compiler, counting calls and optionally injecting diagnostics.
#[derive(Default)]
pub struct RecordingCompiler {
  inner: LuaCompiler,
  pub calls: Cell<usize>,
  pub requests: RefCell<Vec<RecordedRequest>>,
  pub extra_diagnostics: Vec<Diagnostic>,
}

impl RecordingCompiler {
  pub fn with_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
    Self {
      extra_diagnostics: diagnostics,
      ..Self::default()
    }
  }
}

impl CompilerService for RecordingCompiler {
  fn compile(&self, request: &CompileRequest<'_>) -> CompileOutput {
    self.calls.set(self.calls.get() + 1);
    self.requests.borrow_mut().push(RecordedRequest {
      code: request.code.to_string(),
      imports: request.imports.to_vec(),
      emit_debug_info: request.emit_debug_info,
    });
    let mut output = self.inner.compile(request);
    output.diagnostics.extend(self.extra_diagnostics.iter().cloned());
    output
  }
}

/// Host whose receiver is a table recording `Print` calls.
pub struct RecordingHost {
  environment: HostEnvironment,
  pub printed: Rc<RefCell<Vec<String>>>,
}

impl RecordingHost {
  pub fn new(working_directory: PathBuf) -> Self {
    Self {
      environment: HostEnvironment::new(working_directory),
      printed: Rc::new(RefCell::new(Vec::new())),
    }
  }

  pub fn printed(&self) -> Vec<String> {
    self.printed.borrow().clone()
  }
}

impl ScriptHost for RecordingHost {
  fn environment(&self) -> &HostEnvironment {
    &self.environment
  }

  fn receiver(&self, lua: &Lua) -> LuaResult<LuaValue> {
    let receiver = lua.create_table()?;
    let printed = self.printed.clone();
    receiver.set(
      "Print",
      lua.create_function(move |_, (_this, value): (LuaValue, LuaValue)| {
        let text = match value {
          LuaValue::String(s) => s.to_str()?.to_string(),
          LuaValue::Integer(i) => i.to_string(),
          LuaValue::Number(n) => n.to_string(),
          LuaValue::Boolean(b) => b.to_string(),
          LuaValue::Nil => "nil".to_string(),
          other => format!("{:?}", other),
        };
        printed.borrow_mut().push(text);
        Ok(())
      })?,
    )?;
    Ok(LuaValue::Table(receiver))
  }
}

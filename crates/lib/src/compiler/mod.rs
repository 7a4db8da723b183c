//! The compiler service seam.
//!
//! The session never talks to a concrete compiler; it hands generated code,
//! references and imports to a [`CompilerService`] and gets back an optional
//! [`CompiledModule`] plus diagnostics. [`LuaCompiler`] is the implementation
//! shipped with the crate.

mod lua;

use std::fmt;

use tracing::{error, info, warn};

pub use lua::LuaCompiler;

use crate::session::ReferenceSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
  Info,
  Warning,
  Error,
}

impl Severity {
  pub fn as_str(self) -> &'static str {
    match self {
      Severity::Info => "info",
      Severity::Warning => "warning",
      Severity::Error => "error",
    }
  }
}

/// A compiler message, optionally tied to a script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
  pub severity: Severity,
  pub message: String,
  pub line: Option<usize>,
}

impl Diagnostic {
  pub fn info(message: impl Into<String>) -> Self {
    Self::new(Severity::Info, message)
  }

  pub fn warning(message: impl Into<String>) -> Self {
    Self::new(Severity::Warning, message)
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self::new(Severity::Error, message)
  }

  fn new(severity: Severity, message: impl Into<String>) -> Self {
    Self {
      severity,
      message: message.into(),
      line: None,
    }
  }

  pub fn at_line(mut self, line: usize) -> Self {
    self.line = Some(line);
    self
  }
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.line {
      Some(line) => write!(f, "({}): {}: {}", line, self.severity.as_str(), self.message),
      None => write!(f, "{}: {}", self.severity.as_str(), self.message),
    }
  }
}

/// Log every diagnostic on the channel matching its severity and return the
/// errors, in the order they were reported.
pub fn route_diagnostics(diagnostics: &[Diagnostic]) -> Vec<&Diagnostic> {
  let mut errors = Vec::new();
  for diagnostic in diagnostics {
    match diagnostic.severity {
      Severity::Info => info!("{}", diagnostic),
      Severity::Warning => warn!("{}", diagnostic),
      Severity::Error => {
        error!("{}", diagnostic);
        errors.push(diagnostic);
      }
    }
  }
  errors
}

/// Generated-to-script line mapping shipped with debug compiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMap {
  /// Name the chunk reports in error locations.
  pub chunk_name: String,
  /// Generated lines preceding script line 1.
  pub line_offset: usize,
  /// The generated source the bytecode was compiled from.
  pub source: String,
}

impl SymbolMap {
  /// Map a generated line back to the script line it came from.
  pub fn script_line(&self, generated_line: usize) -> Option<usize> {
    generated_line.checked_sub(self.line_offset).filter(|line| *line > 0)
  }

  /// Rewrite `chunk:LINE:` locations in an error message to script lines.
  pub fn remap(&self, message: &str) -> String {
    let marker = format!("{}:", self.chunk_name);
    let mut out = String::with_capacity(message.len());
    let mut rest = message;

    while let Some(pos) = rest.find(&marker) {
      let after = &rest[pos + marker.len()..];
      let digits = after.chars().take_while(char::is_ascii_digit).count();
      out.push_str(&rest[..pos + marker.len()]);
      if digits > 0 && after[digits..].starts_with(':') {
        let generated: usize = after[..digits].parse().unwrap_or(0);
        match self.script_line(generated) {
          Some(line) => out.push_str(&line.to_string()),
          None => out.push_str(&after[..digits]),
        }
        rest = &after[digits..];
      } else {
        rest = after;
      }
    }
    out.push_str(rest);
    out
  }
}

/// A compiled, loadable script.
#[derive(Debug, Clone)]
pub struct CompiledModule {
  pub name: String,
  pub bytecode: Vec<u8>,
  pub symbols: Option<SymbolMap>,
}

/// Everything a compiler needs for one compile.
pub struct CompileRequest<'a> {
  pub name: &'a str,
  pub code: &'a str,
  pub references: &'a ReferenceSet,
  pub imports: &'a [String],
  pub emit_debug_info: bool,
}

#[derive(Debug, Default)]
pub struct CompileOutput {
  pub module: Option<CompiledModule>,
  pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutput {
  pub fn has_errors(&self) -> bool {
    self.diagnostics.iter().any(|d| d.severity == Severity::Error)
  }
}

/// Turns generated code into a loadable module.
pub trait CompilerService {
  fn compile(&self, request: &CompileRequest<'_>) -> CompileOutput;
}

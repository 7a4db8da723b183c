//! Lua bytecode compiler.
//!
//! Imports become `local <leaf> = require("<namespace>")` statements prefixed
//! to the first generated line, so script line numbers are unaffected. The
//! chunk is compiled in a throwaway state and dumped as bytecode; debug
//! compiles keep line information and carry a [`SymbolMap`].

use std::collections::BTreeMap;

use mlua::prelude::*;
use tracing::trace;

use super::{CompileOutput, CompileRequest, CompiledModule, CompilerService, Diagnostic, SymbolMap};
use crate::script::PREAMBLE_LINES;
use crate::script::codegen::{is_identifier, namespace_binding};

/// Standard modules already present in `package.loaded` of a script state.
const STANDARD_MODULES: &[&str] = &["coroutine", "io", "math", "os", "package", "string", "table", "utf8"];

#[derive(Debug, Default, Clone, Copy)]
pub struct LuaCompiler;

impl LuaCompiler {
  pub fn new() -> Self {
    Self
  }

  /// Build the import prelude, reporting imports that cannot be bound or found.
  fn import_prelude(&self, request: &CompileRequest<'_>, diagnostics: &mut Vec<Diagnostic>) -> String {
    let mut prelude = String::new();
    let mut bound: BTreeMap<&str, &str> = BTreeMap::new();

    for namespace in request.imports {
      let leaf = namespace_binding(namespace);
      if !is_identifier(leaf) {
        diagnostics.push(Diagnostic::error(format!(
          "the namespace '{}' cannot be imported: '{}' is not a valid identifier",
          namespace, leaf
        )));
        continue;
      }
      let resolvable = STANDARD_MODULES.contains(&namespace.as_str())
        || request.references.library(namespace).is_some()
        || request.references.find_module_file(namespace).is_some();
      if !resolvable {
        diagnostics.push(Diagnostic::error(format!(
          "the namespace '{}' could not be found (are you missing a reference?)",
          namespace
        )));
        continue;
      }
      if let Some(previous) = bound.insert(leaf, namespace) {
        diagnostics.push(Diagnostic::warning(format!(
          "the import '{}' hides '{}', both bind '{}'",
          namespace, previous, leaf
        )));
      }
      prelude.push_str(&format!("local {} = require({:?}); ", leaf, namespace));
    }

    prelude
  }
}

impl CompilerService for LuaCompiler {
  fn compile(&self, request: &CompileRequest<'_>) -> CompileOutput {
    let mut diagnostics = Vec::new();

    for path in request.references.paths() {
      if !path.exists() {
        diagnostics.push(Diagnostic::warning(format!(
          "the reference '{}' does not exist",
          path.display()
        )));
      }
    }

    let prelude = self.import_prelude(request, &mut diagnostics);
    let source = format!("{}{}", prelude, request.code);
    let chunk_name = request.name.to_string();
    trace!(name = %chunk_name, bytes = source.len(), "compiling chunk");

    let lua = Lua::new();
    let function = match lua.load(&source).set_name(format!("={}", chunk_name)).into_function() {
      Ok(function) => Some(function),
      Err(LuaError::SyntaxError { message, .. }) => {
        diagnostics.push(syntax_diagnostic(&chunk_name, &message));
        None
      }
      Err(err) => {
        diagnostics.push(Diagnostic::error(err.to_string()));
        None
      }
    };

    let has_errors = diagnostics.iter().any(|d| d.severity == super::Severity::Error);
    let module = match function {
      Some(function) if !has_errors => Some(CompiledModule {
        name: chunk_name.clone(),
        bytecode: function.dump(!request.emit_debug_info),
        symbols: request.emit_debug_info.then(|| SymbolMap {
          chunk_name: chunk_name.clone(),
          line_offset: PREAMBLE_LINES,
          source,
        }),
      }),
      _ => None,
    };

    CompileOutput { module, diagnostics }
  }
}

/// Turn `name:LINE: message` into a diagnostic on the script line.
fn syntax_diagnostic(chunk_name: &str, message: &str) -> Diagnostic {
  let location = message
    .strip_prefix(chunk_name)
    .and_then(|rest| rest.strip_prefix(':'))
    .and_then(|rest| rest.split_once(':'))
    .and_then(|(line, text)| line.parse::<usize>().ok().map(|line| (line, text.trim())));

  match location {
    Some((line, text)) if line > PREAMBLE_LINES => Diagnostic::error(text).at_line(line - PREAMBLE_LINES),
    Some((_, text)) => Diagnostic::error(text),
    None => Diagnostic::error(message),
  }
}

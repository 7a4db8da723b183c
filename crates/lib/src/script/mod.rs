//! Build scripts and their translation into compilable units.
//!
//! # Submodules
//!
//! - [`codegen`] - Turns a [`Script`] into one Lua chunk
//! - [`hash`] - Source fingerprint used to validate cached artifacts

pub mod codegen;
pub mod hash;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::trace;

pub use codegen::{CodeGenerator, PREAMBLE_LINES};
pub use hash::{ScriptHash, hash_script, hash_source};

use crate::util::path::collapse;

/// Namespace name mapped to the declarations it lost during generation.
pub type ExcludedNamespaces = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum ScriptError {
  #[error("script not found: {}", .path.display())]
  NotFound { path: PathBuf },

  #[error("cannot read script {}: {source}", .path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// How an alias is bound in generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasKind {
  /// Forwards calls to a host method: `Name(...)` becomes `__host:Name(...)`.
  Method,
  /// Captures a host field once when the script starts.
  Property,
}

/// A host declaration made available to the script under a bare name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptAlias {
  pub name: String,
  pub namespace: String,
  pub kind: AliasKind,
}

impl ScriptAlias {
  pub fn method(namespace: &str, name: &str) -> Self {
    Self {
      name: name.to_string(),
      namespace: namespace.to_string(),
      kind: AliasKind::Method,
    }
  }

  pub fn property(namespace: &str, name: &str) -> Self {
    Self {
      name: name.to_string(),
      namespace: namespace.to_string(),
      kind: AliasKind::Property,
    }
  }
}

/// A parsed build script.
#[derive(Debug, Clone)]
pub struct Script {
  name: String,
  lines: Vec<String>,
  namespaces: BTreeSet<String>,
  aliases: Vec<ScriptAlias>,
  references: Vec<PathBuf>,
  pub(crate) excluded_namespaces: ExcludedNamespaces,
}

impl Script {
  pub fn new(name: impl Into<String>, lines: Vec<String>) -> Self {
    Self {
      name: name.into(),
      lines,
      namespaces: BTreeSet::new(),
      aliases: Vec::new(),
      references: Vec::new(),
      excluded_namespaces: ExcludedNamespaces::new(),
    }
  }

  /// Read a script file, naming it after the file stem.
  ///
  /// Directive comments are recognised and kept as lines so that script line
  /// numbers match the file:
  ///
  /// ```lua
  /// --#using kiln.path
  /// --#r "libs/semver.lua"
  /// ```
  ///
  /// Reference paths are resolved against the script's directory.
  pub fn load(path: &Path) -> Result<Self, ScriptError> {
    if !path.is_file() {
      return Err(ScriptError::NotFound {
        path: path.to_path_buf(),
      });
    }
    let content = fs::read_to_string(path).map_err(|source| ScriptError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let name = path
      .file_stem()
      .map(|s| s.to_string_lossy().into_owned())
      .unwrap_or_else(|| "script".to_string());
    let dir = path.parent().unwrap_or(Path::new("."));

    let lines: Vec<String> = content.lines().map(str::to_string).collect();
    let directives: Vec<Directive> = lines.iter().filter_map(|line| parse_directive(line)).collect();
    let mut script = Script::new(name, lines);

    for directive in directives {
      match directive {
        Directive::Using(namespace) => {
          trace!(namespace = %namespace, "using directive");
          script.namespaces.insert(namespace);
        }
        Directive::Reference(reference) => {
          trace!(reference = %reference, "reference directive");
          script.references.push(collapse(&dir.join(reference)));
        }
      }
    }

    Ok(script)
  }

  pub fn with_namespace(mut self, namespace: &str) -> Self {
    self.namespaces.insert(namespace.to_string());
    self
  }

  pub fn with_aliases(mut self, aliases: impl IntoIterator<Item = ScriptAlias>) -> Self {
    self.aliases.extend(aliases);
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn lines(&self) -> &[String] {
    &self.lines
  }

  pub fn namespaces(&self) -> &BTreeSet<String> {
    &self.namespaces
  }

  pub fn aliases(&self) -> &[ScriptAlias] {
    &self.aliases
  }

  pub fn references(&self) -> &[PathBuf] {
    &self.references
  }

  /// Namespaces the code generator could not fully translate.
  pub fn excluded_namespaces(&self) -> &ExcludedNamespaces {
    &self.excluded_namespaces
  }
}

enum Directive {
  Using(String),
  Reference(String),
}

fn parse_directive(line: &str) -> Option<Directive> {
  let rest = line.trim().strip_prefix("--#")?;
  let (keyword, argument) = rest.split_once(char::is_whitespace)?;
  let argument = argument.trim().trim_matches('"').trim();
  if argument.is_empty() {
    return None;
  }
  match keyword {
    "using" => Some(Directive::Using(argument.to_string())),
    "r" | "reference" => Some(Directive::Reference(argument.to_string())),
    _ => None,
  }
}

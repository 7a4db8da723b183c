//! Lua code generation for build scripts.
//!
//! A script becomes a single chunk. The chunk is the entry point: it receives
//! the host context as its only argument. The first line binds the host and
//! every alias, the script lines follow unchanged:
//!
//! ```lua
//! local __host = ...; local function Information(...) return __host:Information(...) end
//! local x = 1
//! Information(x)
//! ```

use std::collections::BTreeSet;

use super::{AliasKind, Script};

/// Number of generated lines placed before the first script line.
pub const PREAMBLE_LINES: usize = 1;

/// Local name the host context is bound to inside the chunk.
pub const HOST_BINDING: &str = "__host";

const LUA_KEYWORDS: &[&str] = &[
  "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in", "local", "nil",
  "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Whether `name` can be bound as a Lua local.
pub fn is_identifier(name: &str) -> bool {
  let mut chars = name.chars();
  let starts_well = matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic());
  starts_well && chars.all(|c| c == '_' || c.is_ascii_alphanumeric()) && !LUA_KEYWORDS.contains(&name)
}

/// Local name an imported namespace is bound to: its last dotted segment.
pub fn namespace_binding(namespace: &str) -> &str {
  namespace.rsplit('.').next().unwrap_or(namespace)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CodeGenerator;

impl CodeGenerator {
  pub fn new() -> Self {
    Self
  }

  /// Generate the chunk for `script`.
  ///
  /// Aliases that cannot be bound are left out and recorded in the script's
  /// excluded namespaces, as are requested namespaces whose binding is not a
  /// valid identifier. Output depends only on the script.
  pub fn generate(&self, script: &mut Script) -> String {
    script.excluded_namespaces.clear();

    let mut preamble = vec![format!("local {} = ...", HOST_BINDING)];
    let mut bound: BTreeSet<&str> = BTreeSet::from([HOST_BINDING]);

    for alias in &script.aliases {
      if !is_identifier(&alias.name) || !bound.insert(alias.name.as_str()) {
        script
          .excluded_namespaces
          .entry(alias.namespace.clone())
          .or_default()
          .push(alias.name.clone());
        continue;
      }
      preamble.push(match alias.kind {
        AliasKind::Method => format!(
          "local function {name}(...) return {host}:{name}(...) end",
          name = alias.name,
          host = HOST_BINDING
        ),
        AliasKind::Property => format!("local {name} = {host}.{name}", name = alias.name, host = HOST_BINDING),
      });
    }

    for namespace in &script.namespaces {
      let binding = namespace_binding(namespace);
      if is_identifier(binding) {
        continue;
      }
      let affected = script.excluded_namespaces.entry(namespace.clone()).or_default();
      if !affected.iter().any(|name| name == binding) {
        affected.push(binding.to_string());
      }
    }

    let mut code = preamble.join("; ");
    for line in &script.lines {
      code.push('\n');
      code.push_str(line);
    }
    code
  }
}

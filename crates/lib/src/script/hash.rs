//! Script fingerprints.
//!
//! The fingerprint is a SHA-256 over the script lines concatenated in order
//! with nothing between them. It is persisted next to a compiled script and
//! compared on the next run, so it must not depend on anything but the text.

use std::fmt;

use sha2::{Digest, Sha256};

use super::Script;

/// A 64-character lowercase hex SHA-256 of a script's source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScriptHash(pub String);

impl ScriptHash {
  /// Compare against a stored fingerprint, ignoring ASCII case and
  /// surrounding whitespace.
  pub fn matches(&self, stored: &str) -> bool {
    self.0.eq_ignore_ascii_case(stored.trim())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ScriptHash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Hash source lines the way the cache expects.
pub fn hash_source<S: AsRef<str>>(lines: &[S]) -> ScriptHash {
  let mut hasher = Sha256::new();
  for line in lines {
    hasher.update(line.as_ref().as_bytes());
  }
  ScriptHash(format!("{:x}", hasher.finalize()))
}

pub fn hash_script(script: &Script) -> ScriptHash {
  hash_source(script.lines())
}

//! The libraries and namespaces a session makes visible to scripts.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::library::LibraryHandle;
use crate::script::ExcludedNamespaces;
use crate::util::path::collapse;

/// Libraries visible to compiled scripts.
///
/// Library handles are unique by identity, file references by normalized
/// path. Nothing is ever removed.
#[derive(Debug, Default, Clone)]
pub struct ReferenceSet {
  libraries: Vec<LibraryHandle>,
  paths: BTreeSet<PathBuf>,
}

impl ReferenceSet {
  /// Returns false when the same handle was already added.
  pub fn add_library(&mut self, library: LibraryHandle) -> bool {
    if self.libraries.contains(&library) {
      return false;
    }
    self.libraries.push(library);
    true
  }

  /// Returns false when the normalized path was already present.
  pub fn add_path(&mut self, path: &Path) -> bool {
    self.paths.insert(normalize(path))
  }

  pub fn libraries(&self) -> &[LibraryHandle] {
    &self.libraries
  }

  pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
    self.paths.iter()
  }

  pub fn is_empty(&self) -> bool {
    self.libraries.is_empty() && self.paths.is_empty()
  }

  /// First library handle registered under `name`.
  pub fn library(&self, name: &str) -> Option<&LibraryHandle> {
    self.libraries.iter().find(|library| library.name() == name)
  }

  /// Locate the Lua file providing module `name` among the file references.
  ///
  /// A file reference provides the module named after its stem. A directory
  /// reference provides `<dir>/<a/b>.lua` and `<dir>/<a/b>/init.lua` for
  /// module `a.b`.
  pub fn find_module_file(&self, name: &str) -> Option<PathBuf> {
    let relative: PathBuf = name.split('.').collect();
    for path in &self.paths {
      if path.is_file() {
        if path.file_stem().is_some_and(|stem| stem == name) {
          return Some(path.clone());
        }
      } else if path.is_dir() {
        let direct = path.join(&relative).with_extension("lua");
        if direct.is_file() {
          return Some(direct);
        }
        let init = path.join(&relative).join("init.lua");
        if init.is_file() {
          return Some(init);
        }
      }
    }
    None
  }
}

fn normalize(path: &Path) -> PathBuf {
  let collapsed = collapse(path);
  dunce::canonicalize(&collapsed).unwrap_or(collapsed)
}

/// Ordinal set of imported namespace names.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NamespaceSet {
  names: BTreeSet<String>,
}

impl NamespaceSet {
  /// Returns false for blank names and names already imported.
  pub fn import(&mut self, name: &str) -> bool {
    if name.trim().is_empty() || self.names.contains(name) {
      return false;
    }
    self.names.insert(name.to_string())
  }

  pub fn contains(&self, name: &str) -> bool {
    self.names.contains(name)
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &String> {
    self.names.iter()
  }

  pub fn to_vec(&self) -> Vec<String> {
    self.names.iter().cloned().collect()
  }

  /// Imports with every excluded namespace removed.
  pub fn without(&self, excluded: &ExcludedNamespaces) -> Vec<String> {
    self
      .names
      .iter()
      .filter(|name| !excluded.contains_key(name.as_str()))
      .cloned()
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use mlua::prelude::*;
  use std::fs;
  use tempfile::TempDir;

  fn empty_library(name: &str) -> LibraryHandle {
    LibraryHandle::from_fn(name, |lua| lua.create_table().map(LuaValue::Table))
  }

  #[test]
  fn same_handle_is_added_once() {
    let mut references = ReferenceSet::default();
    let handle = empty_library("lib");

    assert!(references.add_library(handle.clone()));
    assert!(!references.add_library(handle));
    assert_eq!(references.libraries().len(), 1);
  }

  #[test]
  fn distinct_handles_with_same_name_are_both_kept() {
    let mut references = ReferenceSet::default();
    references.add_library(empty_library("lib"));
    references.add_library(empty_library("lib"));
    assert_eq!(references.libraries().len(), 2);
  }

  #[test]
  fn paths_are_unique_after_normalization() {
    let temp = TempDir::new().unwrap();
    let lib = temp.path().join("semver.lua");
    fs::write(&lib, "return {}").unwrap();

    let mut references = ReferenceSet::default();
    assert!(references.add_path(&lib));
    assert!(!references.add_path(&temp.path().join(".").join("semver.lua")));
    assert!(!references.add_path(&temp.path().join("sub/../semver.lua")));
    assert_eq!(references.paths().count(), 1);
  }

  #[test]
  fn finds_modules_in_files_and_directories() {
    let temp = TempDir::new().unwrap();
    let libs = temp.path().join("libs");
    fs::create_dir_all(libs.join("tools/archive")).unwrap();
    fs::write(libs.join("tools/zip.lua"), "return {}").unwrap();
    fs::write(libs.join("tools/archive/init.lua"), "return {}").unwrap();
    let single = temp.path().join("semver.lua");
    fs::write(&single, "return {}").unwrap();

    let mut references = ReferenceSet::default();
    references.add_path(&libs);
    references.add_path(&single);

    assert!(references.find_module_file("semver").is_some());
    assert!(references.find_module_file("tools.zip").unwrap().ends_with("zip.lua"));
    assert!(references.find_module_file("tools.archive").unwrap().ends_with("init.lua"));
    assert!(references.find_module_file("missing").is_none());
  }

  #[test]
  fn import_is_idempotent_and_rejects_blank() {
    let mut namespaces = NamespaceSet::default();
    assert!(namespaces.import("kiln.path"));
    assert!(!namespaces.import("kiln.path"));
    assert!(!namespaces.import("  "));
    assert_eq!(namespaces.len(), 1);
  }

  #[test]
  fn import_is_ordinal() {
    let mut namespaces = NamespaceSet::default();
    namespaces.import("Kiln.Path");
    namespaces.import("kiln.path");
    assert_eq!(namespaces.len(), 2);
  }

  #[test]
  fn without_drops_excluded() {
    let mut namespaces = NamespaceSet::default();
    namespaces.import("a");
    namespaces.import("b");
    let mut excluded = ExcludedNamespaces::new();
    excluded.insert("a".to_string(), vec!["Thing".to_string()]);

    assert_eq!(namespaces.without(&excluded), vec!["b".to_string()]);
  }
}

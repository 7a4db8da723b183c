//! On-disk cache of compiled scripts.
//!
//! For a script named `N` the cache directory holds `N.luac` (bytecode) and
//! `N.hash` (the source fingerprint, plain text). An entry is only trusted
//! when both files are present and the stored fingerprint matches.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::consts::{ARTIFACT_EXTENSION, HASH_EXTENSION};
use crate::script::ScriptHash;

/// Suffix of an artifact being written, before it is renamed into place.
const STAGING_EXTENSION: &str = "tmp";

#[derive(Debug, Error)]
pub enum CacheError {
  #[error("failed to create cache directory {}: {source}", .path.display())]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to write {}: {source}", .path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to read cache directory {}: {source}", .path.display())]
  List {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to remove {}: {source}", .path.display())]
  Remove {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// A cache entry found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedArtifact {
  pub artifact: PathBuf,
  /// Fingerprint as stored, untrimmed.
  pub hash: String,
}

#[derive(Debug, Clone)]
pub struct CacheStore {
  dir: PathBuf,
}

impl CacheStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  pub fn artifact_path(&self, name: &str) -> PathBuf {
    self.dir.join(format!("{}.{}", name, ARTIFACT_EXTENSION))
  }

  pub fn hash_path(&self, name: &str) -> PathBuf {
    self.dir.join(format!("{}.{}", name, HASH_EXTENSION))
  }

  /// Look up the entry for `name`. Anything missing or unreadable is a miss.
  pub fn try_get(&self, name: &str) -> Option<CachedArtifact> {
    let artifact = self.artifact_path(name);
    let hash_path = self.hash_path(name);

    if !artifact.is_file() {
      debug!(path = %artifact.display(), "no cached artifact");
      return None;
    }

    match fs::read_to_string(&hash_path) {
      Ok(hash) => Some(CachedArtifact { artifact, hash }),
      Err(e) => {
        debug!(path = %hash_path.display(), error = %e, "cached hash unreadable");
        None
      }
    }
  }

  /// Persist `bytes` and `hash` for `name`, returning the artifact path.
  ///
  /// Any previous hash is removed first and the new one is written only once
  /// the artifact is in place, so a failed write leaves no matching entry.
  /// The artifact is staged next to its final path and renamed over it.
  pub fn write(&self, name: &str, bytes: &[u8], hash: &ScriptHash) -> Result<PathBuf, CacheError> {
    fs::create_dir_all(&self.dir).map_err(|source| CacheError::CreateDir {
      path: self.dir.clone(),
      source,
    })?;

    let hash_path = self.hash_path(name);
    if hash_path.exists() {
      fs::remove_file(&hash_path).map_err(|source| CacheError::Remove {
        path: hash_path.clone(),
        source,
      })?;
    }

    let artifact = self.artifact_path(name);
    let staged = self.dir.join(format!("{}.{}.{}", name, ARTIFACT_EXTENSION, STAGING_EXTENSION));
    let placed = fs::write(&staged, bytes).and_then(|()| fs::rename(&staged, &artifact));
    if let Err(source) = placed {
      let _ = fs::remove_file(&staged);
      return Err(CacheError::Write {
        path: artifact,
        source,
      });
    }

    fs::write(&hash_path, hash.as_str()).map_err(|source| CacheError::Write {
      path: hash_path.clone(),
      source,
    })?;

    debug!(path = %artifact.display(), bytes = bytes.len(), "cached compiled script");
    Ok(artifact)
  }

  /// Names of scripts with a cached artifact, sorted.
  pub fn entries(&self) -> Result<Vec<String>, CacheError> {
    if !self.dir.exists() {
      return Ok(Vec::new());
    }

    let list_err = |source| CacheError::List {
      path: self.dir.clone(),
      source,
    };
    let mut names = Vec::new();
    for entry in fs::read_dir(&self.dir).map_err(list_err)? {
      let path = entry.map_err(list_err)?.path();
      if path.extension().is_some_and(|ext| ext == ARTIFACT_EXTENSION)
        && let Some(stem) = path.file_stem()
      {
        names.push(stem.to_string_lossy().into_owned());
      }
    }
    names.sort();
    Ok(names)
  }

  /// Remove every artifact and hash file, returning how many were removed.
  ///
  /// Other files in the directory are left alone.
  pub fn clear(&self) -> Result<usize, CacheError> {
    let mut removed = 0;
    for name in self.entries()? {
      for path in [self.artifact_path(&name), self.hash_path(&name)] {
        if path.exists() {
          fs::remove_file(&path).map_err(|source| CacheError::Remove {
            path: path.clone(),
            source,
          })?;
          removed += 1;
        }
      }
    }
    debug!(dir = %self.dir.display(), removed, "cleared cache");
    Ok(removed)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::script::hash_source;
  use tempfile::TempDir;

  #[test]
  fn missing_entry_is_a_miss() {
    let temp = TempDir::new().unwrap();
    let store = CacheStore::new(temp.path().join("cache"));
    assert!(store.try_get("build").is_none());
  }

  #[test]
  fn artifact_without_hash_is_a_miss() {
    let temp = TempDir::new().unwrap();
    let store = CacheStore::new(temp.path());
    fs::write(store.artifact_path("build"), b"bytes").unwrap();

    assert!(store.try_get("build").is_none());
  }

  #[test]
  fn write_creates_directory_and_both_files() {
    let temp = TempDir::new().unwrap();
    let store = CacheStore::new(temp.path().join("tools").join("cache"));
    let hash = hash_source(&["print(1)"]);

    let artifact = store.write("build", b"\x1bLua", &hash).unwrap();

    assert_eq!(artifact, store.artifact_path("build"));
    assert_eq!(fs::read(&artifact).unwrap(), b"\x1bLua");
    assert_eq!(fs::read_to_string(store.hash_path("build")).unwrap(), hash.as_str());

    let cached = store.try_get("build").unwrap();
    assert_eq!(cached.artifact, artifact);
    assert!(hash.matches(&cached.hash));
  }

  #[test]
  fn write_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let store = CacheStore::new(temp.path());
    let hash = hash_source(&["a"]);

    store.write("build", b"one", &hash).unwrap();
    store.write("build", b"two", &hash).unwrap();

    assert_eq!(fs::read(store.artifact_path("build")).unwrap(), b"two");
  }

  #[test]
  fn write_into_a_file_path_fails() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("cache");
    fs::write(&blocker, "not a directory").unwrap();
    let store = CacheStore::new(&blocker);

    let result = store.write("build", b"x", &hash_source(&["x"]));

    assert!(matches!(result, Err(CacheError::CreateDir { .. })));
  }

  #[test]
  fn failed_artifact_write_leaves_no_hash() {
    let temp = TempDir::new().unwrap();
    let store = CacheStore::new(temp.path());
    fs::create_dir_all(store.artifact_path("build")).unwrap();

    let result = store.write("build", b"bytes", &hash_source(&["x"]));

    assert!(matches!(result, Err(CacheError::Write { .. })));
    assert!(!store.hash_path("build").exists());
    assert!(store.try_get("build").is_none());
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
  }

  #[test]
  fn failed_rewrite_drops_previous_hash() {
    let temp = TempDir::new().unwrap();
    let store = CacheStore::new(temp.path());
    let old = hash_source(&["old"]);
    store.write("build", b"old", &old).unwrap();
    fs::remove_file(store.artifact_path("build")).unwrap();
    fs::create_dir_all(store.artifact_path("build")).unwrap();

    assert!(store.write("build", b"new", &hash_source(&["new"])).is_err());

    assert!(!store.hash_path("build").exists());
  }

  #[test]
  fn entries_and_clear() {
    let temp = TempDir::new().unwrap();
    let store = CacheStore::new(temp.path());
    let hash = hash_source(&["x"]);
    store.write("deploy", b"x", &hash).unwrap();
    store.write("build", b"x", &hash).unwrap();
    fs::write(temp.path().join("notes.txt"), "keep").unwrap();

    assert_eq!(store.entries().unwrap(), vec!["build".to_string(), "deploy".to_string()]);
    assert_eq!(store.clear().unwrap(), 4);
    assert!(store.entries().unwrap().is_empty());
    assert!(temp.path().join("notes.txt").exists());
  }
}

//! Lexical path helpers.
//!
//! None of these touch the filesystem; they only rewrite components.

use std::path::{Component, Path, PathBuf};

/// Collapse `.` and `..` components without resolving symlinks.
///
/// A `..` that would climb above a root or prefix is dropped.
pub fn collapse(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::ParentDir => {
        let popped = matches!(normalized.components().next_back(), Some(Component::Normal(_)));
        if popped {
          normalized.pop();
        } else if !normalized.has_root() {
          normalized.push("..");
        }
      }
      Component::CurDir => {}
      _ => normalized.push(component),
    }
  }
  normalized
}

/// Make `path` absolute against `base` (when relative) and collapse it.
pub fn make_absolute(path: &Path, base: &Path) -> PathBuf {
  if path.is_absolute() {
    collapse(path)
  } else {
    collapse(&base.join(path))
  }
}

/// Path relative from `from` to `to`, or `.` when they are equal.
pub fn relative(from: &Path, to: &Path) -> PathBuf {
  let from_components: Vec<_> = from.components().collect();
  let to_components: Vec<_> = to.components().collect();

  let common_len = from_components
    .iter()
    .zip(to_components.iter())
    .take_while(|(a, b)| a == b)
    .count();

  let mut relative = PathBuf::new();
  for _ in common_len..from_components.len() {
    relative.push("..");
  }
  for component in to_components.iter().skip(common_len) {
    relative.push(component);
  }

  if relative.as_os_str().is_empty() {
    PathBuf::from(".")
  } else {
    relative
  }
}

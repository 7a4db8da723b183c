//! The `kiln.path` library: lexical path helpers for build scripts.
//!
//! ```lua
//! --#using kiln.path
//! local out = path.join(WorkingDirectory, "out", "bin")
//! ```

use std::path::{Path, PathBuf};

use mlua::prelude::*;

use super::{Library, LibraryHandle};
use crate::util::path::{collapse, relative};

pub const PATH_LIBRARY: &str = "kiln.path";

pub struct PathLibrary;

/// Handle to the `kiln.path` library.
pub fn path_library() -> LibraryHandle {
  LibraryHandle::new(PathLibrary)
}

fn lossy(path: &Path) -> String {
  path.to_string_lossy().into_owned()
}

fn join_segments(segments: LuaMultiValue) -> LuaResult<PathBuf> {
  let mut result = PathBuf::new();
  for segment in segments {
    if let LuaValue::String(s) = segment {
      result.push(s.to_str()?.as_ref());
    }
  }
  Ok(result)
}

impl Library for PathLibrary {
  fn name(&self) -> &str {
    PATH_LIBRARY
  }

  fn open(&self, lua: &Lua) -> LuaResult<LuaValue> {
    let path = lua.create_table()?;

    path.set(
      "join",
      lua.create_function(|_, segments: LuaMultiValue| Ok(lossy(&join_segments(segments)?)))?,
    )?;

    path.set(
      "dirname",
      lua.create_function(|_, p: String| Ok(Path::new(&p).parent().map(lossy).unwrap_or_default()))?,
    )?;

    path.set(
      "basename",
      lua.create_function(|_, p: String| {
        Ok(
          Path::new(&p)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        )
      })?,
    )?;

    path.set(
      "extname",
      lua.create_function(|_, p: String| {
        Ok(
          Path::new(&p)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default(),
        )
      })?,
    )?;

    path.set(
      "is_absolute",
      lua.create_function(|_, p: String| Ok(Path::new(&p).is_absolute()))?,
    )?;

    path.set(
      "normalize",
      lua.create_function(|_, p: String| Ok(lossy(&collapse(Path::new(&p)))))?,
    )?;

    path.set(
      "relative",
      lua.create_function(|_, (from, to): (String, String)| Ok(lossy(&relative(Path::new(&from), Path::new(&to)))))?,
    )?;

    path.set(
      "split",
      lua.create_function(|lua, p: String| {
        let parts: Vec<String> = Path::new(&p)
          .components()
          .map(|c| c.as_os_str().to_string_lossy().into_owned())
          .collect();
        lua.create_sequence_from(parts)
      })?,
    )?;

    Ok(LuaValue::Table(path))
  }
}

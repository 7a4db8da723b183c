//! Library resolution while a script runs.
//!
//! A searcher is inserted at `package.searchers[2]`, ahead of the standard
//! file searchers, so `require` finds the session's library handles and file
//! references first. [`ResolutionScope`] removes it again when dropped.

use std::fs;
use std::path::Path;

use mlua::prelude::*;
use tracing::{debug, trace};

use crate::session::ReferenceSet;

/// Index the reference searcher is inserted at; 1 is `package.preload`.
const SEARCHER_INDEX: i64 = 2;

/// Keeps the reference searcher installed for as long as it lives.
pub struct ResolutionScope {
  searchers: LuaTable,
  searcher: LuaFunction,
}

impl ResolutionScope {
  pub fn activate(lua: &Lua, references: &ReferenceSet) -> LuaResult<Self> {
    let package: LuaTable = lua.globals().get("package")?;
    let searchers: LuaTable = package.get("searchers")?;
    let searcher = create_reference_searcher(lua, references.clone())?;
    searchers.raw_insert(SEARCHER_INDEX, &searcher)?;
    trace!(
      libraries = references.libraries().len(),
      paths = references.paths().count(),
      "library resolution active"
    );
    Ok(Self { searchers, searcher })
  }

  fn deactivate(&self) -> LuaResult<()> {
    for (index, value) in self.searchers.clone().sequence_values::<LuaValue>().enumerate() {
      if let LuaValue::Function(f) = value?
        && f == self.searcher
      {
        return self.searchers.raw_remove(index as i64 + 1);
      }
    }
    Ok(())
  }
}

impl Drop for ResolutionScope {
  fn drop(&mut self) {
    if let Err(e) = self.deactivate() {
      debug!(error = %e, "failed to remove library searcher");
    }
  }
}

/// Load a referenced Lua file, passing the module name like `require` does.
fn load_module_file(lua: &Lua, name: &str, path: &Path) -> LuaResult<LuaValue> {
  let content = fs::read_to_string(path)
    .map_err(|e| LuaError::external(format!("cannot read '{}': {}", path.display(), e)))?;
  lua
    .load(&content)
    .set_name(format!("@{}", path.display()))
    .call((name, path.to_string_lossy().into_owned()))
}

fn create_reference_searcher(lua: &Lua, references: ReferenceSet) -> LuaResult<LuaFunction> {
  lua.create_function(move |lua, modname: String| {
    if let Some(library) = references.library(&modname) {
      let library = library.clone();
      let loader = lua.create_function(move |lua, _: LuaMultiValue| library.open(lua))?;
      return Ok((LuaValue::Function(loader), LuaValue::String(lua.create_string(&modname)?)));
    }

    if let Some(path) = references.find_module_file(&modname) {
      let location = path.to_string_lossy().into_owned();
      let loader = lua.create_function(move |lua, (name, _): (String, LuaValue)| load_module_file(lua, &name, &path))?;
      return Ok((LuaValue::Function(loader), LuaValue::String(lua.create_string(&location)?)));
    }

    let message = format!("\n\tno reference provides module '{}'", modname);
    Ok((LuaValue::String(lua.create_string(&message)?), LuaValue::Nil))
  })
}

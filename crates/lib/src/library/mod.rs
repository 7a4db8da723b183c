//! In-memory libraries that scripts can `require`.
//!
//! A [`LibraryHandle`] is the in-process counterpart of a file reference: the
//! module table is produced by Rust code when the script first requires it.

pub mod path;

use std::fmt;
use std::rc::Rc;

use mlua::prelude::*;

/// A module that builds its Lua value on demand.
pub trait Library {
  /// Module name scripts pass to `require`.
  fn name(&self) -> &str;

  /// Produce the module value in `lua`.
  fn open(&self, lua: &Lua) -> LuaResult<LuaValue>;
}

/// Shared handle to a [`Library`]; two handles are equal only when they point
/// at the same library instance.
#[derive(Clone)]
pub struct LibraryHandle(Rc<dyn Library>);

impl LibraryHandle {
  pub fn new(library: impl Library + 'static) -> Self {
    Self(Rc::new(library))
  }

  pub fn from_fn<F>(name: &str, open: F) -> Self
  where
    F: Fn(&Lua) -> LuaResult<LuaValue> + 'static,
  {
    Self::new(FnLibrary {
      name: name.to_string(),
      open: Box::new(open),
    })
  }

  pub fn name(&self) -> &str {
    self.0.name()
  }

  pub fn open(&self, lua: &Lua) -> LuaResult<LuaValue> {
    self.0.open(lua)
  }
}

impl PartialEq for LibraryHandle {
  fn eq(&self, other: &Self) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
  }
}

impl Eq for LibraryHandle {}

impl fmt::Debug for LibraryHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("LibraryHandle").field(&self.name()).finish()
  }
}

type OpenFn = Box<dyn Fn(&Lua) -> LuaResult<LuaValue>>;

struct FnLibrary {
  name: String,
  open: OpenFn,
}

impl Library for FnLibrary {
  fn name(&self) -> &str {
    &self.name
  }

  fn open(&self, lua: &Lua) -> LuaResult<LuaValue> {
    (self.open)(lua)
  }
}

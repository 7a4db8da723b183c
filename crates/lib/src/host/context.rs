//! `BuildHost`: the build primitives exposed to scripts.
//!
//! The receiver handed to a script is a `HostContext` userdata. Every method
//! takes `&self`; mutable state lives behind `RefCell`s shared with the
//! `BuildHost` so the run can be reported after the Lua state is gone.
//! Registered task functions stay inside the Lua state, in a named registry
//! table.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use mlua::prelude::*;
use tokio::runtime::Runtime;
use tracing::{debug, error, info, trace, warn};

use super::process::{self, ProcessSettings};
use super::{HostEnvironment, HostError, ScriptHost};
use crate::consts::SCRIPT_LOG_TARGET;
use crate::script::ScriptAlias;

/// Registry key of the table holding task functions by name.
const TASKS_REGISTRY_KEY: &str = "kiln.tasks";

pub const CORE_NAMESPACE: &str = "kiln.core";
pub const IO_NAMESPACE: &str = "kiln.io";
pub const PROCESS_NAMESPACE: &str = "kiln.process";

const CORE_METHODS: &[&str] = &[
  "Information",
  "Warning",
  "Error",
  "Verbose",
  "Debug",
  "Task",
  "RunTarget",
  "Argument",
  "EnvironmentVariable",
];

const IO_METHODS: &[&str] = &[
  "FileExists",
  "DirectoryExists",
  "ReadFile",
  "WriteFile",
  "CreateDirectory",
  "DeleteFile",
  "DeleteDirectory",
];

const PROCESS_METHODS: &[&str] = &["StartProcess", "Shell"];

/// A task that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
  pub name: String,
  pub duration: Duration,
}

#[derive(Debug, Default)]
struct HostState {
  completed: Vec<TaskRecord>,
}

pub struct BuildHost {
  environment: HostEnvironment,
  state: Rc<RefCell<HostState>>,
  runtime: Rc<Runtime>,
}

impl BuildHost {
  pub fn new(environment: HostEnvironment) -> Result<Self, HostError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .map_err(|e| HostError::Runtime(e.to_string()))?;

    Ok(Self {
      environment,
      state: Rc::new(RefCell::new(HostState::default())),
      runtime: Rc::new(runtime),
    })
  }

  /// Aliases for every host primitive, grouped by namespace.
  pub fn default_aliases() -> Vec<ScriptAlias> {
    let mut aliases: Vec<ScriptAlias> = CORE_METHODS
      .iter()
      .map(|name| ScriptAlias::method(CORE_NAMESPACE, name))
      .collect();
    aliases.extend(IO_METHODS.iter().map(|name| ScriptAlias::method(IO_NAMESPACE, name)));
    aliases.push(ScriptAlias::property(IO_NAMESPACE, "WorkingDirectory"));
    aliases.extend(
      PROCESS_METHODS
        .iter()
        .map(|name| ScriptAlias::method(PROCESS_NAMESPACE, name)),
    );
    aliases
  }

  /// Tasks run so far, in completion order.
  pub fn report(&self) -> Vec<TaskRecord> {
    self.state.borrow().completed.clone()
  }
}

impl ScriptHost for BuildHost {
  fn environment(&self) -> &HostEnvironment {
    &self.environment
  }

  fn receiver(&self, lua: &Lua) -> LuaResult<LuaValue> {
    let context = HostContext {
      environment: self.environment.clone(),
      state: self.state.clone(),
      runtime: self.runtime.clone(),
    };
    lua.create_userdata(context).map(LuaValue::UserData)
  }
}

struct HostContext {
  environment: HostEnvironment,
  state: Rc<RefCell<HostState>>,
  runtime: Rc<Runtime>,
}

/// Render log arguments the way `print` would, separated by spaces.
fn render(lua: &Lua, args: LuaMultiValue) -> LuaResult<String> {
  let tostring: LuaFunction = lua.globals().get("tostring")?;
  let mut parts = Vec::with_capacity(args.len());
  for value in args {
    parts.push(tostring.call::<String>(value)?);
  }
  Ok(parts.join(" "))
}

fn tasks_table(lua: &Lua) -> LuaResult<LuaTable> {
  match lua.named_registry_value::<Option<LuaTable>>(TASKS_REGISTRY_KEY)? {
    Some(table) => Ok(table),
    None => {
      let table = lua.create_table()?;
      lua.set_named_registry_value(TASKS_REGISTRY_KEY, &table)?;
      Ok(table)
    }
  }
}

fn parse_process_opts(program: &str, opts: Option<LuaTable>) -> LuaResult<ProcessSettings> {
  let mut settings = ProcessSettings::new(program);
  let Some(opts) = opts else {
    return Ok(settings);
  };

  if let Some(args) = opts.get::<Option<LuaTable>>("args")? {
    for arg in args.sequence_values::<String>() {
      settings.args.push(arg?);
    }
  }
  settings.cwd = opts.get::<Option<String>>("cwd")?.map(PathBuf::from);
  if let Some(env) = opts.get::<Option<LuaTable>>("env")? {
    let mut env_map = BTreeMap::new();
    for pair in env.pairs::<String, String>() {
      let (key, value) = pair?;
      env_map.insert(key, value);
    }
    settings.env = env_map;
  }
  Ok(settings)
}

impl LuaUserData for HostContext {
  fn add_fields<F: LuaUserDataFields<Self>>(fields: &mut F) {
    fields.add_field_method_get("WorkingDirectory", |_, this| {
      Ok(this.environment.working_directory().to_string_lossy().into_owned())
    });
  }

  fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
    methods.add_method("Information", |lua, _, args: LuaMultiValue| {
      info!(target: SCRIPT_LOG_TARGET, "{}", render(lua, args)?);
      Ok(())
    });
    methods.add_method("Warning", |lua, _, args: LuaMultiValue| {
      warn!(target: SCRIPT_LOG_TARGET, "{}", render(lua, args)?);
      Ok(())
    });
    methods.add_method("Error", |lua, _, args: LuaMultiValue| {
      error!(target: SCRIPT_LOG_TARGET, "{}", render(lua, args)?);
      Ok(())
    });
    methods.add_method("Verbose", |lua, _, args: LuaMultiValue| {
      debug!(target: SCRIPT_LOG_TARGET, "{}", render(lua, args)?);
      Ok(())
    });
    methods.add_method("Debug", |lua, _, args: LuaMultiValue| {
      trace!(target: SCRIPT_LOG_TARGET, "{}", render(lua, args)?);
      Ok(())
    });

    methods.add_method("Task", |lua, _, (name, body): (String, LuaFunction)| {
      let tasks = tasks_table(lua)?;
      if tasks.contains_key(name.as_str())? {
        return Err(LuaError::external(HostError::DuplicateTask(name)));
      }
      debug!(task = %name, "registered task");
      tasks.set(name, body)
    });

    methods.add_method("RunTarget", |lua, this, name: String| {
      let body: Option<LuaFunction> = tasks_table(lua)?.get(name.as_str())?;
      let Some(body) = body else {
        return Err(LuaError::external(HostError::UnknownTask(name)));
      };

      info!(task = %name, "running task");
      let started = Instant::now();
      body.call::<()>(())?;
      let duration = started.elapsed();
      debug!(task = %name, elapsed_ms = duration.as_millis() as u64, "task finished");

      this.state.borrow_mut().completed.push(TaskRecord { name, duration });
      Ok(())
    });

    methods.add_method("Argument", |lua, this, (name, default): (String, LuaValue)| {
      match this.environment.argument(&name) {
        Some(value) => value.into_lua(lua),
        None => Ok(default),
      }
    });

    methods.add_method("EnvironmentVariable", |_, _, name: String| Ok(std::env::var(&name).ok()));

    methods.add_method("FileExists", |_, this, path: String| Ok(this.environment.resolve(&path).is_file()));

    methods.add_method("DirectoryExists", |_, this, path: String| {
      Ok(this.environment.resolve(&path).is_dir())
    });

    methods.add_method("ReadFile", |_, this, path: String| {
      let path = this.environment.resolve(&path);
      fs::read_to_string(&path).map_err(|e| LuaError::external(HostError::io(&path, e)))
    });

    methods.add_method("WriteFile", |_, this, (path, content): (String, LuaString)| {
      let path = this.environment.resolve(&path);
      fs::write(&path, content.as_bytes().to_vec()).map_err(|e| LuaError::external(HostError::io(&path, e)))
    });

    methods.add_method("CreateDirectory", |_, this, path: String| {
      let path = this.environment.resolve(&path);
      fs::create_dir_all(&path).map_err(|e| LuaError::external(HostError::io(&path, e)))
    });

    methods.add_method("DeleteFile", |_, this, path: String| {
      let path = this.environment.resolve(&path);
      if !path.exists() {
        return Ok(());
      }
      fs::remove_file(&path).map_err(|e| LuaError::external(HostError::io(&path, e)))
    });

    methods.add_method("DeleteDirectory", |_, this, path: String| {
      let path = this.environment.resolve(&path);
      if !path.exists() {
        return Ok(());
      }
      fs::remove_dir_all(&path).map_err(|e| LuaError::external(HostError::io(&path, e)))
    });

    methods.add_method(
      "StartProcess",
      |_, this, (program, opts): (String, Option<LuaTable>)| {
        let mut settings = parse_process_opts(&program, opts)?;
        settings.cwd = settings.cwd.map(|cwd| this.environment.resolve(&cwd.to_string_lossy()));
        let output = this
          .runtime
          .block_on(process::start_process(&settings, this.environment.working_directory()))
          .map_err(LuaError::external)?;
        Ok(output.code)
      },
    );

    methods.add_method("Shell", |_, this, command: String| {
      this
        .runtime
        .block_on(process::run_shell(&command, this.environment.working_directory()))
        .map_err(LuaError::external)
    });
  }
}

//! Implementation of the `kiln run` command.
//!
//! Loads a build script, compiles it (or reuses the cached compilation) and
//! runs it in the current directory.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Args;

use kiln_lib::config::{Configuration, parse_argument};
use kiln_lib::consts::DEFAULT_SCRIPT;
use kiln_lib::engine::{RunOptions, run_script};

use crate::output::{OutputFormat, print_run_summary};

#[derive(Debug, Args)]
pub struct RunArgs {
  /// Build script to run
  #[arg(default_value = DEFAULT_SCRIPT)]
  pub script: PathBuf,

  /// Cache the compiled script and reuse it while the source is unchanged
  #[arg(long)]
  pub cache: bool,

  /// Cache directory (default: tools/cache next to the script)
  #[arg(long, value_name = "PATH")]
  pub cache_path: Option<String>,

  /// Ignore any cached compilation
  #[arg(long)]
  pub recompile: bool,

  /// Compile with debug information and bypass the cache
  #[arg(long)]
  pub debug: bool,

  /// Script argument, readable with Argument(name)
  #[arg(long = "arg", value_name = "KEY=VALUE")]
  pub args: Vec<String>,
}

/// Flags override the environment.
fn configuration(args: &RunArgs) -> Configuration {
  let mut config = Configuration::from_env();
  if args.cache {
    config.cache_enabled = true;
  }
  if let Some(path) = &args.cache_path {
    config.cache_path = Some(path.clone());
  }
  config
}

pub fn cmd_run(args: &RunArgs, output: OutputFormat) -> Result<()> {
  let working_directory = std::env::current_dir().context("Failed to read current directory")?;

  let mut arguments = BTreeMap::new();
  for raw in &args.args {
    let (key, value) = parse_argument(raw)?;
    arguments.insert(key, value);
  }

  let options = RunOptions {
    script: args.script.clone(),
    working_directory,
    arguments,
    debug: args.debug,
    recompile: args.recompile,
  };

  let summary = run_script(&options, &configuration(args)).map_err(|e| anyhow!("{}", e))?;
  output.emit(&summary, print_run_summary)
}

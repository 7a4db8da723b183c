use anyhow::{Context, Result};
use serde::Serialize;

use kiln_lib::config::Configuration;
use kiln_lib::consts::{APP_NAME, DEFAULT_SCRIPT, ENV_CACHE_ENABLED, ENV_CACHE_PATH, ENV_TOOLS_PATH};

use crate::output::{OutputFormat, print_field};

#[derive(Debug, Serialize)]
struct Info {
  version: &'static str,
  cache_enabled: bool,
  cache_directory: String,
  tools_directory: String,
}

pub fn cmd_info(output: OutputFormat) -> Result<()> {
  let working_directory = std::env::current_dir().context("Failed to read current directory")?;
  let config = Configuration::from_env();

  let info = Info {
    version: env!("CARGO_PKG_VERSION"),
    cache_enabled: config.cache_enabled,
    cache_directory: config
      .cache_directory(&working_directory, &working_directory)
      .display()
      .to_string(),
    tools_directory: config
      .tool_directory(&working_directory, &working_directory)
      .display()
      .to_string(),
  };

  output.emit(&info, print_info)
}

fn print_info(info: &Info) {
  println!("{} {}", APP_NAME, info.version);
  println!();
  println!("Configuration (for ./{}):", DEFAULT_SCRIPT);
  print_field("Cache enabled", &info.cache_enabled.to_string());
  print_field("Cache directory", &info.cache_directory);
  print_field("Tools directory", &info.tools_directory);
  println!();
  println!("Environment: {}, {}, {}", ENV_CACHE_ENABLED, ENV_CACHE_PATH, ENV_TOOLS_PATH);
}

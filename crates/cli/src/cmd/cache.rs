//! Implementation of the `kiln cache` command.
//!
//! Lists the compiled scripts cached for a build script's location, or
//! removes them with `--clean`.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};

use kiln_lib::cache::CacheStore;
use kiln_lib::config::Configuration;
use kiln_lib::util::path::make_absolute;

use crate::output::{
  CacheClean, CacheEntry, CacheListing, OutputFormat, print_cache_clean, print_cache_listing,
};

fn describe(store: &CacheStore, name: &str) -> CacheEntry {
  let artifact = store.artifact_path(name);
  let metadata = fs::metadata(&artifact).ok();
  let age_secs = metadata
    .as_ref()
    .and_then(|m| m.modified().ok())
    .and_then(|modified| SystemTime::now().duration_since(modified).ok())
    .map(|age| age.as_secs());

  CacheEntry {
    script: name.to_string(),
    size_bytes: metadata.map(|m| m.len()).unwrap_or(0),
    artifact,
    age_secs,
  }
}

pub fn cmd_cache(script: &Path, clean: bool, output: OutputFormat) -> Result<()> {
  let working_directory = std::env::current_dir().context("Failed to read current directory")?;
  let script_path = make_absolute(script, &working_directory);
  let script_dir = script_path.parent().unwrap_or(Path::new("."));

  let directory = Configuration::from_env().cache_directory(script_dir, &working_directory);
  let store = CacheStore::new(&directory);

  if clean {
    let removed = store
      .clear()
      .with_context(|| format!("Failed to clean cache at {}", directory.display()))?;
    return output.emit(&CacheClean { directory, removed }, print_cache_clean);
  }

  let names = store
    .entries()
    .with_context(|| format!("Failed to list cache at {}", directory.display()))?;
  let entries = names.iter().map(|name| describe(&store, name)).collect();
  output.emit(&CacheListing { directory, entries }, print_cache_listing)
}

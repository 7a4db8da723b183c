//! Terminal rendering for kiln commands.
//!
//! Every command produces a serializable report. `-o json` prints it as-is;
//! text output goes through the renderers below.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use kiln_lib::engine::RunSummary;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  /// Print `report` as JSON, or hand it to `text` for terminal output.
  pub fn emit<T: Serialize>(self, report: &T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
    match self {
      OutputFormat::Json => {
        let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
        println!("{}", json);
      }
      OutputFormat::Text => text(report),
    }
    Ok(())
  }
}

/// Leading marker of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  Done,
  Note,
  Warn,
  Fail,
}

impl Status {
  fn symbol(self) -> &'static str {
    match self {
      Status::Done => "✓",
      Status::Note => "•",
      Status::Warn => "⚠",
      Status::Fail => "✗",
    }
  }

  /// Done and Note go to stdout, Warn and Fail to stderr.
  pub fn print(self, message: &str) {
    let symbol = self.symbol();
    match self {
      Status::Done => println!("{} {}", symbol.if_supports_color(Stream::Stdout, |s| s.green()), message),
      Status::Note => println!("{} {}", symbol.if_supports_color(Stream::Stdout, |s| s.blue()), message),
      Status::Warn => eprintln!(
        "{} {}",
        symbol.if_supports_color(Stream::Stderr, |s| s.yellow()),
        message.if_supports_color(Stream::Stderr, |s| s.yellow())
      ),
      Status::Fail => eprintln!(
        "{} {}",
        symbol.if_supports_color(Stream::Stderr, |s| s.red()),
        message.if_supports_color(Stream::Stderr, |s| s.red())
      ),
    }
  }
}

/// Indented `label: value` row under a status line.
pub fn print_field(label: &str, value: &str) {
  println!("  {}: {}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()), value);
}

pub fn format_size(bytes: u64) -> String {
  const UNITS: [&str; 3] = ["KB", "MB", "GB"];

  if bytes < 1024 {
    return format!("{} B", bytes);
  }
  let mut value = bytes as f64 / 1024.0;
  let mut unit = 0;
  while value >= 1024.0 && unit + 1 < UNITS.len() {
    value /= 1024.0;
    unit += 1;
  }
  format!("{:.1} {}", value, UNITS[unit])
}

/// Milliseconds below one second, seconds with two decimals above it.
pub fn format_millis(ms: u64) -> String {
  if ms < 1000 {
    format!("{}ms", ms)
  } else {
    format!("{:.2}s", ms as f64 / 1000.0)
  }
}

// =============================================================================
// run
// =============================================================================

fn run_headline(summary: &RunSummary) -> String {
  format!(
    "{} finished in {} ({})",
    summary.script,
    format_millis(summary.elapsed_ms),
    summary.source
  )
}

pub fn print_run_summary(summary: &RunSummary) {
  if let Some(warning) = &summary.cache_warning {
    Status::Warn.print(&format!("Compiled script was not cached: {}", warning));
  }
  for task in &summary.tasks {
    print_field(&task.name, &format_millis(task.duration_ms));
  }
  Status::Done.print(&run_headline(summary));
}

// =============================================================================
// cache
// =============================================================================

#[derive(Debug, Serialize)]
pub struct CacheEntry {
  pub script: String,
  pub artifact: PathBuf,
  pub size_bytes: u64,
  pub age_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct CacheListing {
  pub directory: PathBuf,
  pub entries: Vec<CacheEntry>,
}

#[derive(Debug, Serialize)]
pub struct CacheClean {
  pub directory: PathBuf,
  pub removed: usize,
}

fn entry_detail(entry: &CacheEntry) -> String {
  let age = match entry.age_secs {
    Some(secs) => format!("{} ago", humantime::format_duration(Duration::from_secs(secs))),
    None => "unknown age".to_string(),
  };
  format!("→ {} ({}, {})", entry.artifact.display(), format_size(entry.size_bytes), age)
}

pub fn print_cache_listing(listing: &CacheListing) {
  if listing.entries.is_empty() {
    Status::Note.print(&format!("No cached scripts in {}", listing.directory.display()));
    return;
  }
  Status::Note.print(&format!("Cached scripts in {}", listing.directory.display()));
  for entry in &listing.entries {
    print_field(&entry.script, &entry_detail(entry));
  }
}

pub fn print_cache_clean(clean: &CacheClean) {
  Status::Done.print(&format!(
    "Removed {} cache file(s) from {}",
    clean.removed,
    clean.directory.display()
  ));
}

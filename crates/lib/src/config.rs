//! Run configuration and cache location.
//!
//! Values come from the environment (see [`Configuration::from_env`]) and are
//! overridden by command-line flags before being resolved into the
//! [`CacheSettings`] a session is built with.

use std::env;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::consts::{CACHE_DIR_NAME, DEFAULT_TOOLS_DIR, ENV_CACHE_ENABLED, ENV_CACHE_PATH, ENV_TOOLS_PATH};
use crate::util::path::{collapse, make_absolute};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("invalid argument '{0}': expected key=value")]
  InvalidArgument(String),
}

/// Raw configuration values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
  pub cache_enabled: bool,
  pub cache_path: Option<String>,
  pub tool_path: Option<String>,
}

/// Cache behaviour for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
  pub enabled: bool,
  pub directory: PathBuf,
  pub force_recompile: bool,
}

impl CacheSettings {
  pub fn new(enabled: bool, directory: PathBuf) -> Self {
    Self {
      enabled,
      directory,
      force_recompile: false,
    }
  }

  pub fn disabled(directory: PathBuf) -> Self {
    Self::new(false, directory)
  }

  pub fn with_force_recompile(mut self, force_recompile: bool) -> Self {
    self.force_recompile = force_recompile;
    self
  }
}

fn non_blank(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}

impl Configuration {
  /// Read `KILN_CACHE_ENABLED`, `KILN_CACHE_PATH` and `KILN_PATHS_TOOLS`.
  ///
  /// The cache is enabled only when the variable equals `true`, ignoring
  /// case. Blank paths count as unset.
  pub fn from_env() -> Self {
    Self {
      cache_enabled: env::var(ENV_CACHE_ENABLED)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false),
      cache_path: non_blank(env::var(ENV_CACHE_PATH).ok()),
      tool_path: non_blank(env::var(ENV_TOOLS_PATH).ok()),
    }
  }

  /// Tools directory: the configured tool path made absolute against the
  /// working directory, or `tools` next to the script.
  pub fn tool_directory(&self, script_dir: &Path, working_dir: &Path) -> PathBuf {
    match non_blank(self.tool_path.clone()) {
      Some(path) => make_absolute(Path::new(&path), working_dir),
      None => collapse(&script_dir.join(DEFAULT_TOOLS_DIR)),
    }
  }

  /// Cache directory: the configured cache path made absolute against the
  /// working directory, or `cache` under the tools directory.
  pub fn cache_directory(&self, script_dir: &Path, working_dir: &Path) -> PathBuf {
    match non_blank(self.cache_path.clone()) {
      Some(path) => make_absolute(Path::new(&path), working_dir),
      None => collapse(&self.tool_directory(script_dir, working_dir).join(CACHE_DIR_NAME)),
    }
  }

  pub fn cache_settings(&self, script_dir: &Path, working_dir: &Path) -> CacheSettings {
    CacheSettings::new(self.cache_enabled, self.cache_directory(script_dir, working_dir))
  }
}

/// Parse a `key=value` script argument.
pub fn parse_argument(raw: &str) -> Result<(String, String), ConfigError> {
  match raw.split_once('=') {
    Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
    _ => Err(ConfigError::InvalidArgument(raw.to_string())),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  #[serial]
  fn from_env_reads_all_values() {
    temp_env::with_vars(
      [
        (ENV_CACHE_ENABLED, Some("TRUE")),
        (ENV_CACHE_PATH, Some("build/cache")),
        (ENV_TOOLS_PATH, Some("/opt/tools")),
      ],
      || {
        let config = Configuration::from_env();
        assert!(config.cache_enabled);
        assert_eq!(config.cache_path.as_deref(), Some("build/cache"));
        assert_eq!(config.tool_path.as_deref(), Some("/opt/tools"));
      },
    );
  }

  #[test]
  #[serial]
  fn cache_is_disabled_unless_exactly_true() {
    for value in [None, Some("1"), Some("yes"), Some("")] {
      temp_env::with_vars([(ENV_CACHE_ENABLED, value)], || {
        assert!(!Configuration::from_env().cache_enabled, "{:?}", value);
      });
    }
  }

  #[test]
  #[serial]
  fn blank_paths_count_as_unset() {
    temp_env::with_vars([(ENV_CACHE_PATH, Some("  ")), (ENV_TOOLS_PATH, None::<&str>)], || {
      let config = Configuration::from_env();
      assert_eq!(config.cache_path, None);
      assert_eq!(config.tool_path, None);
    });
  }

  #[test]
  fn default_cache_directory_is_under_script_tools() {
    let config = Configuration::default();
    assert_eq!(
      config.cache_directory(Path::new("/repo/scripts"), Path::new("/work")),
      PathBuf::from("/repo/scripts/tools/cache")
    );
  }

  #[test]
  fn tool_path_override_is_absolute_against_working_directory() {
    let config = Configuration {
      tool_path: Some("../shared/tools".to_string()),
      ..Configuration::default()
    };
    assert_eq!(
      config.cache_directory(Path::new("/repo"), Path::new("/work/project")),
      PathBuf::from("/work/shared/tools/cache")
    );
  }

  #[test]
  fn cache_path_override_wins_and_is_collapsed() {
    let config = Configuration {
      cache_path: Some("./out/../.kiln-cache".to_string()),
      tool_path: Some("/opt/tools".to_string()),
      ..Configuration::default()
    };
    assert_eq!(
      config.cache_directory(Path::new("/repo"), Path::new("/work")),
      PathBuf::from("/work/.kiln-cache")
    );
  }

  #[test]
  fn cache_settings_carry_enabled_flag() {
    let config = Configuration {
      cache_enabled: true,
      ..Configuration::default()
    };
    let settings = config.cache_settings(Path::new("/repo"), Path::new("/repo"));
    assert!(settings.enabled);
    assert!(!settings.force_recompile);
    assert_eq!(settings.directory, PathBuf::from("/repo/tools/cache"));
  }

  #[test]
  fn arguments_split_on_first_equals() {
    assert_eq!(
      parse_argument("target=Pack").unwrap(),
      ("target".to_string(), "Pack".to_string())
    );
    assert_eq!(
      parse_argument("define=A=B").unwrap(),
      ("define".to_string(), "A=B".to_string())
    );
    assert_eq!(
      parse_argument("novalue"),
      Err(ConfigError::InvalidArgument("novalue".to_string()))
    );
    assert!(parse_argument("=x").is_err());
  }
}

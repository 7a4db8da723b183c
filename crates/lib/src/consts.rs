//! Names and fixed values shared across the crate.

pub const APP_NAME: &str = "kiln";

/// Environment variable enabling the script cache (`true`, any case).
pub const ENV_CACHE_ENABLED: &str = "KILN_CACHE_ENABLED";

/// Environment variable overriding the script cache directory.
pub const ENV_CACHE_PATH: &str = "KILN_CACHE_PATH";

/// Environment variable overriding the tools directory.
pub const ENV_TOOLS_PATH: &str = "KILN_PATHS_TOOLS";

/// Directory under the script directory used when no tool path is configured.
pub const DEFAULT_TOOLS_DIR: &str = "tools";

/// Segment appended to the tool path to form the default cache directory.
pub const CACHE_DIR_NAME: &str = "cache";

/// Extension of a persisted compiled script.
pub const ARTIFACT_EXTENSION: &str = "luac";

/// Extension of the fingerprint sidecar next to a compiled script.
pub const HASH_EXTENSION: &str = "hash";

/// Script file used when none is given.
pub const DEFAULT_SCRIPT: &str = "build.lua";

/// Target for log events emitted by build scripts themselves.
pub const SCRIPT_LOG_TARGET: &str = "kiln::script";

//! Process execution for build scripts.
//!
//! Commands run on tokio's process API; callers that are not async drive
//! them with the host's runtime.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, info};

use super::HostError;

/// What to run and where.
#[derive(Debug, Clone, Default)]
pub struct ProcessSettings {
  pub program: String,
  pub args: Vec<String>,
  pub cwd: Option<PathBuf>,
  pub env: BTreeMap<String, String>,
}

impl ProcessSettings {
  pub fn new(program: &str) -> Self {
    Self {
      program: program.to_string(),
      ..Self::default()
    }
  }
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
  pub code: Option<i32>,
  pub stdout: String,
}

/// Run a program to completion and capture its exit code and stdout.
///
/// The environment is inherited; `settings.env` entries are added on top.
pub async fn start_process(settings: &ProcessSettings, default_cwd: &Path) -> Result<ProcessOutput, HostError> {
  info!(program = %settings.program, args = ?settings.args, "starting process");

  let working_dir = settings.cwd.as_deref().unwrap_or(default_cwd);
  let mut command = Command::new(&settings.program);
  command.args(&settings.args).current_dir(working_dir);
  for (key, value) in &settings.env {
    command.env(key, value);
  }

  let output = command.output().await.map_err(|e| HostError::Spawn {
    program: settings.program.clone(),
    message: e.to_string(),
  })?;

  let stderr = String::from_utf8_lossy(&output.stderr);
  if !stderr.is_empty() {
    debug!(stderr = %stderr, "process stderr");
  }

  Ok(ProcessOutput {
    code: output.status.code(),
    stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
  })
}

/// Run a command line through the platform shell, failing on non-zero exit.
///
/// Returns the trimmed stdout.
pub async fn run_shell(cmd: &str, cwd: &Path) -> Result<String, HostError> {
  let (shell, mut args) = get_shell();
  args.push(cmd.to_string());
  let settings = ProcessSettings {
    program: shell,
    args,
    cwd: Some(cwd.to_path_buf()),
    env: BTreeMap::new(),
  };

  let output = start_process(&settings, cwd).await?;
  if output.code != Some(0) {
    return Err(HostError::CommandFailed {
      cmd: cmd.to_string(),
      code: output.code,
    });
  }
  if !output.stdout.is_empty() {
    debug!(stdout = %output.stdout, "command output");
  }
  Ok(output.stdout)
}

/// Shell and the flags that make it take a command string.
fn get_shell() -> (String, Vec<String>) {
  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()])
  }

  #[cfg(windows)]
  {
    (
      "powershell.exe".to_string(),
      vec![
        "-NoProfile".to_string(),
        "-ExecutionPolicy".to_string(),
        "Bypass".to_string(),
        "-Command".to_string(),
      ],
    )
  }
}

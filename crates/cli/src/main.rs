use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kiln_lib::consts::{DEFAULT_SCRIPT, SCRIPT_LOG_TARGET};

mod cmd;
mod output;

use output::{OutputFormat, Status};

/// kiln - compile, cache and run Lua build scripts
#[derive(Parser)]
#[command(name = "kiln")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Increase log verbosity (-v debug, -vv trace)
  #[arg(short, long, global = true, action = clap::ArgAction::Count)]
  verbose: u8,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Compile and run a build script
  Run(cmd::RunArgs),

  /// List or clean the compiled script cache
  Cache {
    /// Build script whose cache to inspect
    #[arg(default_value = DEFAULT_SCRIPT)]
    script: PathBuf,

    /// Remove every cached script
    #[arg(long)]
    clean: bool,
  },

  /// Show version and configuration
  Info,
}

fn init_tracing(verbose: u8) {
  let default = match verbose {
    0 => format!("warn,{}=info", SCRIPT_LOG_TARGET),
    1 => "debug".to_string(),
    _ => "trace".to_string(),
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let result = match cli.command {
    Commands::Run(args) => cmd::cmd_run(&args, cli.output),
    Commands::Cache { script, clean } => cmd::cmd_cache(&script, clean, cli.output),
    Commands::Info => cmd::cmd_info(cli.output),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      Status::Fail.print(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}

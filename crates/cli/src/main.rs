mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use artreg_lib::consts::DECLARATIONS_FILENAME;

use crate::output::print_error;

/// artreg - Declarative artifact registration for CDAP-style registries
#[derive(Parser)]
#[command(name = "artreg")]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[command(flatten)]
  global: GlobalArgs,

  #[command(subcommand)]
  command: Commands,
}

/// Flags shared by every command. Each one overrides its environment variable.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  pub verbose: bool,

  /// Registry base URL [env: ARTREG_HOST]
  #[arg(long, global = true)]
  pub host: Option<String>,

  /// Namespace for declarations that do not name one [env: ARTREG_NAMESPACE]
  #[arg(long, global = true)]
  pub namespace: Option<String>,

  /// State file location [env: ARTREG_STATE]
  #[arg(long, global = true)]
  pub state: Option<PathBuf>,

  /// Per-request timeout, e.g. "30s" or "2m" [env: ARTREG_TIMEOUT_SECS]
  #[arg(long, global = true, value_parser = humantime::parse_duration)]
  pub timeout: Option<Duration>,
}

#[derive(Subcommand)]
enum Commands {
  /// Show what apply would change, without changing anything
  Plan {
    /// Path to the declarations file
    #[arg(default_value = DECLARATIONS_FILENAME)]
    file: PathBuf,
  },

  /// Register, replace, and remove artifacts to match the declarations file
  Apply {
    /// Path to the declarations file
    #[arg(default_value = DECLARATIONS_FILENAME)]
    file: PathBuf,
  },

  /// Delete every artifact recorded in state
  Destroy {
    /// Show what would be deleted without deleting it
    #[arg(long)]
    dry_run: bool,
  },

  /// Show recorded artifacts
  Status {
    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Check whether the registry lists an artifact by name (exit code 1 if not)
  Exists {
    /// Artifact name
    name: String,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_logging(cli.global.verbose);

  match run(cli) {
    Ok(code) => code,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}

fn run(cli: Cli) -> Result<ExitCode> {
  let global = &cli.global;
  match cli.command {
    Commands::Plan { file } => cmd::cmd_plan(global, &file)?,
    Commands::Apply { file } => cmd::cmd_apply(global, &file)?,
    Commands::Destroy { dry_run } => cmd::cmd_destroy(global, dry_run)?,
    Commands::Status { json } => cmd::cmd_status(global, json)?,
    Commands::Exists { name } => {
      if !cmd::cmd_exists(global, &name)? {
        return Ok(ExitCode::FAILURE);
      }
    }
  }
  Ok(ExitCode::SUCCESS)
}

/// Logs go to stderr so `--json` output stays parseable. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
  let default_level = if verbose { "info" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

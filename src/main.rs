use anyhow::{bail, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gitsync::git::ensure_git_available;
use gitsync::{Config, RunLog, SyncCommand, SyncEngine};

/// Run log written to the process working directory
const LOG_FILE: &str = "gitsync.log";

#[derive(Parser)]
#[command(name = "gitsync")]
#[command(about = "Batch mirroring of git repositories between an origin and a secondary remote")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Workspace directory containing config.json and all working copies
    #[arg(short, long, default_value = ".")]
    workspace: String,

    /// Configuration file path (defaults to <workspace>/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone every repository from its source and register the target remote
    Clone,

    /// Push every repository's source branch to its target branch
    Push,

    /// Pull every repository from its preserved source remote
    Pull,

    /// Delete every repository's local working copy
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Bare invocation: show usage, succeed.
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };
    let command = to_sync_command(&command);

    init_logging(cli.verbose)?;
    info!("Starting gitsync v{}", env!("CARGO_PKG_VERSION"));

    let workspace = PathBuf::from(shellexpand::full(&cli.workspace)?.into_owned());
    let config_path = cli
        .config
        .unwrap_or_else(|| workspace.join("config.json"));
    let config = Config::load(&config_path)?;

    if command.needs_git() {
        let version = ensure_git_available().await?;
        info!("Using {}", version);
    }

    let log = RunLog::open(Path::new(LOG_FILE))?;
    let engine = SyncEngine::new(config, workspace, log);
    let summary = engine.run(command).await;

    if summary.has_failures() {
        bail!(
            "{} of {} operations failed across {} repositories; see {} for details",
            summary.failed,
            summary.done + summary.failed + summary.skipped,
            summary.repositories,
            LOG_FILE
        );
    }

    Ok(())
}

/// Initialize diagnostic logging based on verbosity level
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

fn to_sync_command(command: &Commands) -> SyncCommand {
    match command {
        Commands::Clone => SyncCommand::Clone,
        Commands::Push => SyncCommand::Push,
        Commands::Pull => SyncCommand::Pull,
        Commands::Clear => SyncCommand::Clear,
    }
}

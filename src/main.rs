//! offgrid - Offline-caching agent
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use offgrid::cli::{commands, Cli, Commands};
use offgrid::config::ConfigManager;
use offgrid::error::OffgridResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, log_format: &str) {
    // 0 = warn, 1 = info, 2+ = debug. RUST_LOG wins when set.
    let level = match verbose {
        0 => "offgrid=warn",
        1 => "offgrid=info",
        _ => "offgrid=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn run() -> OffgridResult<()> {
    let cli = Cli::parse();

    // Completions need neither config nor logging
    if let Commands::Completions(args) = cli.command {
        return commands::completions(args);
    }

    let manager = ConfigManager::resolve(cli.config.clone());
    let config = manager.load().await?;

    init_logging(cli.verbose, &config.general.log_format);
    debug!("Using config {}", manager.path().display());

    match cli.command {
        Commands::Run(args) => commands::run(args, &config).await,
        Commands::Plan(args) => commands::plan(args, &config).await,
        Commands::Config(args) => commands::config(args, &manager, &config).await,
        Commands::Completions(_) => Ok(()),
    }
}

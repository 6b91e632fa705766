//! Cascade - cascading file resolver
//!
//! CLI entry point that dispatches to subcommands.

use cascade::cli::{commands, Cli, Commands};
use cascade::config::ConfigManager;
use cascade::error::{CascadeError, CascadeResult};
use clap::Parser;
use console::style;
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

async fn run() -> CascadeResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    let local_config_path = if cli.no_local {
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| CascadeError::io("getting current directory", e))?;
        ConfigManager::find_local_config(&cwd)
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    // 0 = warn, 1 = info, 2+ = debug
    init_logging(cli.verbose, config.general.log_format == "json");
    if let Some(ref path) = local_config_path {
        debug!("Using local config: {}", path.display());
    }

    match cli.command {
        Commands::Locate(args) => commands::locate(args, &config).await,
        Commands::List(args) => commands::list(args, &config).await,
        Commands::Cache(args) => commands::cache(args, &config).await,
        Commands::Config(args) => commands::config(args, &config, &config_manager).await,
    }
}

fn init_logging(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::new("cascade=warn"),
        1 => EnvFilter::new("cascade=info"),
        _ => EnvFilter::new("cascade=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}

mod cli;
mod commands;
mod config;
mod error;

use crate::{
    cli::{Args, Commands},
    commands::CommandExecutor,
    config::AppConfig,
    error::{AppError, Result},
};
use clap::Parser;
use std::process;
use tracing::{Level, debug, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("Application error: {}", e);
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    init_logging(args.verbose, args.quiet)?;

    let config = AppConfig::load(args.config.as_deref())?;
    debug!("Loaded configuration: {:?}", config);

    let executor = CommandExecutor::new(config);

    match args.command {
        Commands::Clean { input, output } => {
            executor.clean(&input, output.as_deref()).await?;
        }
        Commands::Classify { urls } => {
            print!("{}", executor.classify(&urls));
        }
        Commands::Pac { output } => {
            executor.pac(output.as_deref()).await?;
        }
        Commands::Control { action } => {
            let response = executor.control(action).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.success {
                return Err(AppError::Control(
                    response.error.unwrap_or_else(|| action.to_string()),
                ));
            }
        }
    }

    Ok(())
}

/// Initialize logging based on verbosity flags
fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(verbose)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))
}

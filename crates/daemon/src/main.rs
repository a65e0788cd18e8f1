// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prattle daemon (prattled)
//!
//! Polls the configured printers, logs significant observations and posts
//! status chatter for each one.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod lifecycle;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use prattle_core::Config;
use tracing::{error, info};

use crate::lifecycle::{InstanceLock, LifecycleError};

#[derive(Parser)]
#[command(
    name = "prattled",
    version,
    about = "Prattle - chatty OctoPrint printer monitor"
)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "prattle.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll devices until interrupted (default)
    Run,
    /// Validate the configuration and device registry, then exit
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(&cli.config).await,
        Commands::Check => check(&cli.config),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("prattled: {e}");
            ExitCode::FAILURE
        }
    }
}

fn check(config_path: &Path) -> Result<(), LifecycleError> {
    let config = Config::load(config_path)?;
    println!("{}", lifecycle::check(&config)?);
    Ok(())
}

async fn run(config_path: &Path) -> Result<(), LifecycleError> {
    let config = Config::load(config_path)?;
    let _log_guard = lifecycle::setup_logging(&config.log)?;
    let lock = InstanceLock::acquire(config_path)?;

    info!(
        config = %config_path.display(),
        lock = %lock.path().display(),
        pid = std::process::id(),
        "starting prattled"
    );

    let result = lifecycle::run(&config).await;
    if let Err(e) = &result {
        error!(error = %e, "prattled failed");
    }
    info!("prattled stopped");
    result
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Vigil CLI
//!
//! The `vigil` binary deploys the monitoring stack and checks suppression
//! lists before they are submitted.
//!
//! ## Commands
//!
//! - `vigil deploy monitoring` - Generate dashboards, metrics and alarms, then apply the monitoring template
//! - `vigil suppressions validate FILE` - Check a suppression list against the configured limits
//! - `vigil config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use vigil::commands::{self, ConfigCommand, DeployCommand, SuppressionsCommand};

/// Vigil - monitoring stack deployer
#[derive(Parser)]
#[command(name = "vigil")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "VIGIL_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "VIGIL_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy stacks
    #[command(name = "deploy")]
    Deploy {
        #[command(subcommand)]
        command: DeployCommand,
    },

    /// Suppression list tools
    #[command(name = "suppressions")]
    Suppressions {
        #[command(subcommand)]
        command: SuppressionsCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level)?;

    let result = match cli.command {
        Some(Commands::Deploy { command }) => {
            commands::deploy::handle_command(command, cli.config).await
        }
        Some(Commands::Suppressions { command }) => {
            commands::suppressions::handle_command(command, cli.config).await
        }
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            // No command provided - show help
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    };

    if let Err(err) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        std::process::exit(commands::exit_code(&err));
    }

    Ok(())
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}

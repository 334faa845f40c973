// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Launchkit CLI
//!
//! The `launchkit` binary resolves command definitions against runtime
//! values and launches them as containers.
//!
//! ## Commands
//!
//! - `launchkit resolve <file> -i name=value` - Resolve and print a command
//! - `launchkit launch <file> -i name=value [--dry-run]` - Prepare and launch
//! - `launchkit command validate|show` - Command definition checks
//! - `launchkit config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use launchkit::commands::{self, CommandCommand, ConfigCommand, RunArgs};

/// Launchkit - Resolve and launch containerized commands
#[derive(Parser)]
#[command(name = "launchkit")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "LAUNCHKIT_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// User on whose behalf commands are resolved and launched
    #[arg(long, global = true, env = "LAUNCHKIT_USER", default_value = "admin")]
    user: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "LAUNCHKIT_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a command definition and print the result
    #[command(name = "resolve")]
    Resolve {
        #[command(flatten)]
        args: RunArgs,
    },

    /// Resolve, prepare and launch a command definition
    #[command(name = "launch")]
    Launch {
        #[command(flatten)]
        args: RunArgs,

        /// Stage mounts and print the prepared command without launching
        #[arg(long)]
        dry_run: bool,
    },

    /// Command definition management
    #[command(name = "command")]
    Command {
        #[command(subcommand)]
        command: CommandCommand,
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

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Resolve { args }) => {
            commands::run::resolve(args, cli.config, &cli.user).await
        }
        Some(Commands::Launch { args, dry_run }) => {
            commands::run::launch(args, cli.config, &cli.user, dry_run).await
        }
        Some(Commands::Command { command }) => commands::command::handle_command(command).await,
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use launchkit_core::domain::launch_config::LaunchConfigManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate a configuration file populated with defaults
    Generate {
        /// Output path (default: ./launchkit-config.yaml)
        #[arg(short, long, default_value = "./launchkit-config.yaml")]
        output: PathBuf,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output } => generate(output).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = LaunchConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. LAUNCHKIT_CONFIG_PATH: {}",
            std::env::var("LAUNCHKIT_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./launchkit-config.yaml");
        println!("  4. ~/.launchkit/config.yaml");
        println!("  5. /etc/launchkit/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    let spec = &config.spec;
    println!("{}", "Host:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    println!("{}", "Site:".bold());
    println!("  Site URL: {}", spec.site.site_url);
    println!("  Container-facing URL: {}", spec.site.container_facing_url());
    println!();

    println!("{}", "Build:".bold());
    println!("  Build root: {}", spec.build.build_root.display());
    println!();

    println!("{}", "Transport:".bold());
    if spec.transport.path_translations.is_empty() {
        println!("  {}", "(no path translations)".dimmed());
    }
    for translation in &spec.transport.path_translations {
        println!("  {} → {}", translation.local_prefix, translation.remote_prefix);
    }
    println!();

    println!("{}", "Runtime:".bold());
    println!("  Execution host: {}", spec.runtime.execution_host);
    println!(
        "  Docker socket: {}",
        spec.runtime.docker_socket_path.as_deref().unwrap_or("(auto-detect)")
    );
    println!("  Autopull: {}", spec.runtime.autopull);
    println!();

    println!("{}", "Stores:".bold());
    let store = |root: &Option<PathBuf>| {
        root.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(in-memory)".to_string())
    };
    println!("  Config root: {}", store(&spec.stores.config_root));
    println!("  Entity root: {}", store(&spec.stores.entity_root));

    if let Some(logging) = &spec.logging {
        println!();
        println!("{}", "Logging:".bold());
        println!("  Level: {}", logging.level);
        println!("  Format: {}", logging.format);
    }

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = LaunchConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf) -> Result<()> {
    let sample = serde_yaml::to_string(&LaunchConfigManifest::default())
        .context("Failed to serialize default configuration")?;

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

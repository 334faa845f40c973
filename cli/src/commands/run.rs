// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Resolve and launch commands
//!
//! Commands: resolve, launch

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::collections::HashMap;
use std::path::PathBuf;

use launchkit_core::application::launch_preparation::PASS_ENV;
use launchkit_core::domain::resolved::ResolvedCommand;
use launchkit_core::domain::user::UserContext;
use launchkit_core::infrastructure::command_parser::CommandParser;

use crate::embedded::EmbeddedLauncher;

const MASK: &str = "********";

#[derive(Args)]
pub struct RunArgs {
    /// Command definition file (JSON or YAML)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Runtime input value as name=value; a value of @path reads the file
    #[arg(short, long = "input", value_name = "NAME=VALUE", value_parser = parse_input)]
    pub inputs: Vec<(String, String)>,
}

impl RunArgs {
    fn values(&self) -> Result<HashMap<String, String>> {
        let mut values = HashMap::new();
        for (name, value) in &self.inputs {
            values.insert(name.clone(), load_value(value)?);
        }
        Ok(values)
    }
}

/// Split `name=value` at the first `=`.
pub fn parse_input(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("input name is empty in '{}'", raw));
    }
    Ok((name.to_string(), value.to_string()))
}

fn load_value(value: &str) -> Result<String> {
    match value.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input value from {}", path)),
        None => Ok(value.to_string()),
    }
}

pub async fn resolve(args: RunArgs, config_path: Option<PathBuf>, user: &str) -> Result<()> {
    let command = CommandParser::parse_file(&args.file)?;
    let values = args.values()?;
    let launcher = EmbeddedLauncher::new(config_path)?;

    let resolved = launcher
        .resolve(&command, &values, &UserContext::new(user))
        .await?;

    print_warnings(&resolved);
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}

pub async fn launch(
    args: RunArgs,
    config_path: Option<PathBuf>,
    user: &str,
    dry_run: bool,
) -> Result<()> {
    let command = CommandParser::parse_file(&args.file)?;
    let values = args.values()?;
    let launcher = EmbeddedLauncher::new(config_path)?;
    let user = UserContext::new(user);

    if dry_run {
        let prepared = launcher.prepare(&command, &values, &user).await?;
        print_warnings(&prepared);
        eprintln!(
            "{}",
            format!("Prepared {} (dry run, not launched)", prepared.command_name).bold()
        );
        println!("{}", serde_json::to_string_pretty(&masked(prepared))?);
        return Ok(());
    }

    let execution = launcher.launch(&command, &values, &user).await?;
    print_warnings(&execution.command);
    eprintln!(
        "{}",
        format!(
            "✓ Launched {} as container {}",
            execution.command.command_name, execution.container_id
        )
        .green()
    );

    let mut execution = execution;
    execution.command = masked(execution.command);
    println!("{}", serde_json::to_string_pretty(&execution)?);
    Ok(())
}

fn print_warnings(resolved: &ResolvedCommand) {
    for warning in &resolved.warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }
}

/// Hide the issued secret before printing.
fn masked(mut resolved: ResolvedCommand) -> ResolvedCommand {
    if let Some(secret) = resolved.environment_variables.get_mut(PASS_ENV) {
        *secret = MASK.to_string();
    }
    resolved
}

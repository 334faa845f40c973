// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command definition management
//!
//! Commands: validate, show

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use launchkit_core::infrastructure::command_parser::CommandParser;

#[derive(Subcommand)]
pub enum CommandCommand {
    /// Validate a command definition file
    Validate {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Show a command definition's inputs and mounts
    Show {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print the normalized definition as YAML
        #[arg(long)]
        yaml: bool,
    },
}

pub async fn handle_command(command: CommandCommand) -> Result<()> {
    match command {
        CommandCommand::Validate { file } => validate(file).await,
        CommandCommand::Show { file, yaml } => show(file, yaml).await,
    }
}

async fn validate(file: PathBuf) -> Result<()> {
    println!("Validating {}...", file.display());

    let command = CommandParser::parse_file(&file)?;

    println!(
        "{}",
        format!("✓ Command {} is valid", command.name).green()
    );
    Ok(())
}

async fn show(file: PathBuf, yaml: bool) -> Result<()> {
    let command = CommandParser::parse_file(&file)?;

    if yaml {
        print!("{}", CommandParser::to_yaml(&command)?);
        return Ok(());
    }

    println!("{}", command.name.bold());
    if let Some(description) = &command.description {
        println!("  {}", description.dimmed());
    }
    println!("  Image: {}", command.image);
    println!("  Command line: {}", command.command_line);
    println!();

    println!("{}", "Inputs:".bold());
    for input in &command.inputs {
        let mut line = format!("  {} ({})", input.name.bold(), input.input_type);
        if input.required {
            line.push_str(&format!(" {}", "required".yellow()));
        }
        if let Some(parent) = input.parent_name() {
            line.push_str(&format!(" ← {}", parent));
        }
        println!("{}", line);
    }
    println!();

    println!("{}", "Mounts:".bold());
    for mount in &command.mounts {
        let access = if mount.writable { "rw" } else { "ro" };
        match mount.file_input() {
            Some(source) => println!("  {} {} [{}] ← {}", mount.name.bold(), mount.path, access, source),
            None => println!("  {} {} [{}]", mount.name.bold(), mount.path, access),
        }
    }

    Ok(())
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command Definition Parser
//!
//! Loads command definitions from JSON or YAML into domain objects and
//! rejects definitions that fail static validation, so every command handed
//! to the resolver is well-ordered.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Parse external JSON/YAML → Domain objects
//! - **Anti-Corruption:** Translates the kebab-case definition schema to the domain model
//!
//! # Definition Format
//!
//! ```yaml
//! name: dcm2niix
//! image: nrg/dcm2niix:latest
//! command-line: "dcm2niix #BIAS# -o /output /input"
//! inputs:
//!   - name: session
//!     type: session
//!     required: true
//!   - name: bias
//!     type: boolean
//!     default-value: "true"
//!     true-value: "-b y"
//!     false-value: ""
//!     replacement-key: "#BIAS#"
//! mounts:
//!   - name: in
//!     path: /input
//!     file-input: session
//!   - name: out
//!     path: /output
//!     writable: true
//! ```

use anyhow::{Context, Result};
use std::path::Path;
use thiserror::Error;

use crate::domain::command::Command;

#[derive(Debug, Error)]
pub enum CommandParseError {
    #[error("Failed to parse command definition: {0}")]
    Syntax(String),

    #[error("Command definition is invalid:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Parser API
// ============================================================================

pub struct CommandParser;

impl CommandParser {
    pub fn parse_json(json: &str) -> Result<Command, CommandParseError> {
        let command: Command =
            serde_json::from_str(json).map_err(|e| CommandParseError::Syntax(e.to_string()))?;
        Self::checked(command)
    }

    pub fn parse_yaml(yaml: &str) -> Result<Command, CommandParseError> {
        let command: Command =
            serde_yaml::from_str(yaml).map_err(|e| CommandParseError::Syntax(e.to_string()))?;
        Self::checked(command)
    }

    /// Parse a definition file; `.json` files are read as JSON, anything
    /// else as YAML.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Command> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read command file: {:?}", path))?;

        let is_json = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let command = if is_json {
            Self::parse_json(&contents)
        } else {
            Self::parse_yaml(&contents)
        };
        command.with_context(|| format!("Invalid command file: {:?}", path))
    }

    /// Serialize a command definition to YAML string
    pub fn to_yaml(command: &Command) -> Result<String> {
        serde_yaml::to_string(command).context("Failed to serialize command to YAML")
    }

    fn checked(command: Command) -> Result<Command, CommandParseError> {
        let errors = command.validate();
        if errors.is_empty() {
            Ok(command)
        } else {
            Err(CommandParseError::Validation(errors))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::command::InputType;

    const YAML: &str = r##"
name: dcm2niix
version: "1.0"
image: nrg/dcm2niix:latest
command-line: "dcm2niix #BIAS# -o /output /input"
inputs:
  - name: session
    type: session
    required: true
  - name: bias
    type: boolean
    default-value: "true"
    true-value: "-b y"
    false-value: ""
    replacement-key: "#BIAS#"
mounts:
  - name: in
    path: /input
    file-input: session
  - name: out
    path: /output
    writable: true
environment-variables:
  BIAS: "#BIAS#"
"##;

    #[test]
    fn test_parse_yaml() {
        let command = CommandParser::parse_yaml(YAML).unwrap();
        assert_eq!(command.name, "dcm2niix");
        assert_eq!(command.inputs.len(), 2);
        assert_eq!(command.inputs[0].input_type, InputType::Session);
        assert_eq!(command.inputs[1].false_value.as_deref(), Some(""));
        assert_eq!(command.mounts[0].file_input(), Some("session"));
        assert_eq!(command.environment_variables["BIAS"], "#BIAS#");
    }

    #[test]
    fn test_yaml_round_trips_through_json() {
        let command = CommandParser::parse_yaml(YAML).unwrap();
        let json = serde_json::to_string(&command).unwrap();
        assert_eq!(CommandParser::parse_json(&json).unwrap(), command);
    }

    #[test]
    fn test_invalid_definition_lists_problems() {
        let yaml = r#"
name: broken
image: busybox
inputs:
  - name: scan
    type: scan
    parent: session
  - name: session
    type: session
"#;
        let err = CommandParser::parse_yaml(yaml).unwrap_err();
        match err {
            CommandParseError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("\"scan\" depends on \"session\""));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_syntax_error() {
        let err = CommandParser::parse_json("{\"name\": ").unwrap_err();
        assert!(matches!(err, CommandParseError::Syntax(_)));
    }

    #[test]
    fn test_parse_file_by_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("debug.json");
        std::fs::write(&path, r#"{"name": "debug", "image": "busybox"}"#).unwrap();
        let command = CommandParser::parse_file(&path).unwrap();
        assert_eq!(command.image, "busybox");

        assert!(CommandParser::parse_file(dir.path().join("missing.yaml")).is_err());
    }
}

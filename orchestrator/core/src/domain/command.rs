// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command Definitions
//!
//! A `Command` is the immutable, declarative description of a containerized
//! task: image, command-line template, typed inputs, mounts and an
//! environment template map. Definitions are owned by external configuration
//! storage and are read-only to the engine.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Command/Input/Mount value objects and definition validation

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Only container type the engine knows how to launch.
pub const DOCKER_COMMAND_TYPE: &str = "docker";

// ============================================================================
// Command
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Command {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,

    /// A URL where users can get more information about the command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_url: Option<String>,

    #[serde(rename = "type", default = "default_command_type")]
    pub command_type: String,

    pub image: String,

    /// Template executed in the container; replacement keys of the inputs
    /// are substituted before launch
    #[serde(default)]
    pub command_line: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,

    /// Declaration order is resolution order
    #[serde(default)]
    pub inputs: Vec<CommandInput>,

    #[serde(default)]
    pub mounts: Vec<CommandMount>,

    /// Both keys and values may contain replacement keys
    #[serde(default)]
    pub environment_variables: HashMap<String, String>,
}

fn default_command_type() -> String {
    DOCKER_COMMAND_TYPE.to_string()
}

impl Command {
    pub fn input(&self, name: &str) -> Option<&CommandInput> {
        self.inputs.iter().find(|i| i.name == name)
    }

    /// Collect every problem with this definition.
    ///
    /// An empty list means the command can be handed to the resolver. The
    /// forward-dependency check here mirrors the one the resolver enforces
    /// at runtime, so a definition that passes validation never raises an
    /// ordering error.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Command name cannot be blank.".to_string());
        }
        if self.image.trim().is_empty() {
            errors.push(format!("Command \"{}\" has a blank image.", self.name));
        }
        if self.command_type != DOCKER_COMMAND_TYPE {
            errors.push(format!(
                "Command \"{}\" has unsupported type \"{}\". Supported: {}",
                self.name, self.command_type, DOCKER_COMMAND_TYPE
            ));
        }

        let mut seen_inputs: HashSet<&str> = HashSet::new();
        for input in &self.inputs {
            if input.name.trim().is_empty() {
                errors.push("Input name cannot be blank.".to_string());
                continue;
            }
            for dependency in input.dependencies() {
                if !seen_inputs.contains(dependency.as_str()) {
                    errors.push(format!(
                        "Input \"{}\" depends on \"{}\", which is not declared before it.",
                        input.name, dependency
                    ));
                }
            }
            if !seen_inputs.insert(input.name.as_str()) {
                errors.push(format!("Input name \"{}\" is not unique.", input.name));
            }
            if input.input_type == InputType::Config && input.config_reference().is_none() {
                errors.push(format!(
                    "Config input \"{}\" must have a value of the form <tool>/<file>.",
                    input.name
                ));
            }
        }

        let mut seen_mounts: HashSet<&str> = HashSet::new();
        for mount in &self.mounts {
            if mount.name.trim().is_empty() {
                errors.push("Mount name cannot be blank.".to_string());
                continue;
            }
            if !seen_mounts.insert(mount.name.as_str()) {
                errors.push(format!("Mount name \"{}\" is not unique.", mount.name));
            }
            if mount.path.trim().is_empty() {
                errors.push(format!("Mount \"{}\" has a blank path.", mount.name));
            }
            if let Some(file_input) = mount.file_input() {
                if self.input(file_input).is_none() {
                    errors.push(format!(
                        "Mount \"{}\" references unknown input \"{}\".",
                        mount.name, file_input
                    ));
                }
            }
        }

        errors
    }
}

// ============================================================================
// Inputs
// ============================================================================

/// Closed set of input types; each variant has exactly one resolution rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    String,
    Boolean,
    Number,
    File,
    Project,
    Subject,
    Session,
    Scan,
    Assessor,
    Config,
    Resource,
}

impl InputType {
    /// Entity types that carry an embedded resource list.
    pub fn has_resources(self) -> bool {
        matches!(
            self,
            Self::Project | Self::Subject | Self::Session | Self::Scan | Self::Assessor
        )
    }
}

impl Default for InputType {
    fn default() -> Self {
        Self::String
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::File => "file",
            Self::Project => "project",
            Self::Subject => "subject",
            Self::Session => "session",
            Self::Scan => "scan",
            Self::Assessor => "assessor",
            Self::Config => "config",
            Self::Resource => "resource",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandInput {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "type", default)]
    pub input_type: InputType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    #[serde(default)]
    pub required: bool,

    /// Input whose resolved value supplies the context this input extracts from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Comma-separated names of inputs that must resolve before this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<String>,

    /// Token substituted into the command line and environment templates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_line_flag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_line_separator: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_value: Option<String>,

    /// Path expression evaluated against the parent's value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_property: Option<String>,

    /// Raw value; config inputs use it as a `<tool>/<file>` reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl CommandInput {
    pub fn new(name: impl Into<String>, input_type: InputType) -> Self {
        Self {
            name: name.into(),
            input_type,
            ..Default::default()
        }
    }

    /// Prerequisites followed by the parent, without duplicates.
    pub fn dependencies(&self) -> Vec<String> {
        let mut dependencies: Vec<String> = self
            .prerequisites
            .as_deref()
            .map(|p| {
                p.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if let Some(parent) = self.parent_name() {
            if !dependencies.iter().any(|d| d == parent) {
                dependencies.push(parent.to_string());
            }
        }
        dependencies
    }

    pub fn parent_name(&self) -> Option<&str> {
        non_blank(self.parent.as_deref())
    }

    pub fn replacement_key(&self) -> Option<&str> {
        non_blank(self.replacement_key.as_deref())
    }

    /// Split the raw value into `(tool, file)`.
    pub fn config_reference(&self) -> Option<(&str, &str)> {
        let value = self.value.as_deref()?;
        let mut parts = value.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(tool), Some(file), None) if !tool.is_empty() && !file.is_empty() => {
                Some((tool, file))
            }
            _ => None,
        }
    }

    /// Render a resolved value as it appears on the command line.
    pub fn command_line_argument(&self, value: &str) -> String {
        match non_blank(self.command_line_flag.as_deref()) {
            None => value.to_string(),
            Some(flag) => format!(
                "{}{}{}",
                flag,
                self.command_line_separator.as_deref().unwrap_or(" "),
                value
            ),
        }
    }
}

// ============================================================================
// Mounts
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandMount {
    pub name: String,

    /// Path inside the container
    pub path: String,

    #[serde(default)]
    pub writable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_input: Option<String>,

    /// Resource label used when the source entity has several resources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

impl CommandMount {
    pub fn file_input(&self) -> Option<&str> {
        non_blank(self.file_input.as_deref())
    }

    pub fn resource_selector(&self) -> Option<&str> {
        non_blank(self.resource.as_deref())
    }

    /// Writable mounts with no file input are output mounts; everything
    /// else must be resolved from an input.
    pub fn is_input(&self) -> bool {
        self.file_input().is_some() || !self.writable
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

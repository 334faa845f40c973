// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Resolved Command Model
//!
//! Output of resolution and input of launch preparation. A `ResolvedCommand`
//! lives for the duration of one launch and is discarded after handoff to
//! the container-control collaborator.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Launch-ready command, mounts and execution record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::command::{CommandInput, InputType};
use crate::domain::runtime::ContainerId;

/// An input declaration together with its concrete value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedInput {
    pub input: CommandInput,

    /// JSON text for structured types
    pub value: Option<String>,

    /// Rendering used for command-line substitution
    pub command_line_argument: Option<String>,
}

impl ResolvedInput {
    pub fn name(&self) -> &str {
        &self.input.name
    }

    pub fn input_type(&self) -> InputType {
        self.input.input_type
    }
}

/// A physical location backing (part of) a mount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MountSourceFiles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_directory: Option<String>,

    /// Relative to `root_directory` when that is set, absolute otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl MountSourceFiles {
    pub fn directory(root: impl Into<String>) -> Self {
        Self {
            root_directory: Some(root.into()),
            path: None,
        }
    }

    pub fn file(path: impl Into<String>) -> Self {
        Self {
            root_directory: None,
            path: Some(path.into()),
        }
    }

    pub fn root_directory(&self) -> Option<&str> {
        self.root_directory.as_deref().filter(|r| !r.trim().is_empty())
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref().filter(|p| !p.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedMount {
    pub name: String,

    /// Path inside the container
    pub remote_path: String,

    pub writable: bool,

    /// Path on the platform host, before staging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_path: Option<String>,

    #[serde(default)]
    pub input_files: Vec<MountSourceFiles>,

    /// Path as seen by the execution host, set during preparation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_host_path: Option<String>,
}

impl ResolvedMount {
    /// Docker bind specification `host:container[:ro]`.
    pub fn bind(&self) -> Option<String> {
        let host = self.container_host_path.as_deref()?;
        Some(if self.writable {
            format!("{}:{}", host, self.remote_path)
        } else {
            format!("{}:{}:ro", host, self.remote_path)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedCommand {
    pub command_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_version: Option<String>,

    pub image: String,

    pub command_line: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,

    /// Ordered for stable output
    pub environment_variables: BTreeMap<String, String>,

    pub inputs: Vec<ResolvedInput>,

    pub mounts: Vec<ResolvedMount>,

    /// Lossy decisions taken during resolution
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ResolvedCommand {
    pub fn input_value(&self, name: &str) -> Option<&str> {
        self.inputs
            .iter()
            .find(|i| i.name() == name)
            .and_then(|i| i.value.as_deref())
    }

    pub fn mount(&self, name: &str) -> Option<&ResolvedMount> {
        self.mounts.iter().find(|m| m.name == name)
    }

    /// Later values win over template values with the same key.
    pub fn add_environment_variables(&mut self, variables: BTreeMap<String, String>) {
        self.environment_variables.extend(variables);
    }
}

/// Record of a launched container. Persisting it is the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContainerExecution {
    pub container_id: ContainerId,
    pub user: String,
    pub command: ResolvedCommand,
    pub created_at: DateTime<Utc>,
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Command Resolution Service
//!
//! Turns a command definition plus runtime input values into a
//! `ResolvedCommand`: inputs are resolved in declaration order, their
//! replacement keys are substituted into the command line and environment
//! templates, and input mounts are given their host paths.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Orchestrates input resolution, substitution and mount resolution
//! - **Integration:** CLI `resolve`/`launch` → this service → `LaunchService`

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::application::input_resolver::InputResolver;
use crate::application::mount_resolver::resolve_mounts;
use crate::domain::command::Command;
use crate::domain::config_store::ConfigLookup;
use crate::domain::entity::EntityLoader;
use crate::domain::errors::ResolutionError;
use crate::domain::resolved::ResolvedCommand;
use crate::domain::user::UserContext;
use crate::infrastructure::template_substitutor::{substitute, substitute_map};

#[async_trait]
pub trait CommandResolutionService: Send + Sync {
    /// Resolve `command` against runtime `values` keyed by input name.
    async fn resolve(
        &self,
        command: &Command,
        values: &HashMap<String, String>,
        user: &UserContext,
    ) -> Result<ResolvedCommand, ResolutionError>;
}

pub struct StandardCommandResolutionService {
    input_resolver: InputResolver,
}

impl StandardCommandResolutionService {
    pub fn new(entity_loader: Arc<dyn EntityLoader>, config_lookup: Arc<dyn ConfigLookup>) -> Self {
        Self {
            input_resolver: InputResolver::new(entity_loader, config_lookup),
        }
    }
}

#[async_trait]
impl CommandResolutionService for StandardCommandResolutionService {
    async fn resolve(
        &self,
        command: &Command,
        values: &HashMap<String, String>,
        user: &UserContext,
    ) -> Result<ResolvedCommand, ResolutionError> {
        info!("Resolving command {} for user {}", command.name, user);

        let resolution = self
            .input_resolver
            .resolve(&command.inputs, values, user)
            .await?;

        let command_line = substitute(&command.command_line, &resolution.command_line_values);
        let environment_variables =
            substitute_map(&command.environment_variables, &resolution.values);
        let mounts = resolve_mounts(&command.mounts, &resolution.inputs)?;

        info!(
            "Resolved command {}: {} inputs, {} mounts, {} warnings",
            command.name,
            resolution.inputs.len(),
            mounts.len(),
            resolution.warnings.len()
        );

        Ok(ResolvedCommand {
            command_name: command.name.clone(),
            command_version: command.version.clone(),
            image: command.image.clone(),
            command_line,
            working_directory: command.working_directory.clone(),
            environment_variables,
            inputs: resolution.inputs,
            mounts,
            warnings: resolution.warnings,
        })
    }
}

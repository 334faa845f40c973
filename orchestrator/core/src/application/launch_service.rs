// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Launch Service
//!
//! Entry point for launching commands: prepares a resolved command, hands
//! it to the container engine and returns the execution record. Persisting
//! the record is left to the caller.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Resolve → prepare → launch pipeline
//! - **Integration:** CLI `launch` → this service → `ContainerControl`

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::application::command_resolution::CommandResolutionService;
use crate::application::launch_preparation::LaunchPreparator;
use crate::domain::command::Command;
use crate::domain::errors::{LaunchError, PreparationError};
use crate::domain::resolved::{ContainerExecution, ResolvedCommand};
use crate::domain::runtime::ContainerControl;
use crate::domain::user::UserContext;

#[async_trait]
pub trait LaunchService: Send + Sync {
    /// Prepare without launching.
    async fn prepare(
        &self,
        resolved: ResolvedCommand,
        user: &UserContext,
    ) -> Result<ResolvedCommand, PreparationError>;

    async fn prepare_and_launch(
        &self,
        resolved: ResolvedCommand,
        user: &UserContext,
    ) -> Result<ContainerExecution, PreparationError>;

    async fn resolve_and_launch(
        &self,
        command: &Command,
        values: &HashMap<String, String>,
        user: &UserContext,
    ) -> Result<ContainerExecution, LaunchError>;
}

pub struct StandardLaunchService {
    resolution: Arc<dyn CommandResolutionService>,
    preparator: LaunchPreparator,
    container_control: Arc<dyn ContainerControl>,
}

impl StandardLaunchService {
    pub fn new(
        resolution: Arc<dyn CommandResolutionService>,
        preparator: LaunchPreparator,
        container_control: Arc<dyn ContainerControl>,
    ) -> Self {
        Self {
            resolution,
            preparator,
            container_control,
        }
    }
}

#[async_trait]
impl LaunchService for StandardLaunchService {
    async fn prepare(
        &self,
        resolved: ResolvedCommand,
        user: &UserContext,
    ) -> Result<ResolvedCommand, PreparationError> {
        let host = self.container_control.host();
        self.preparator.prepare(resolved, user, &host).await
    }

    async fn prepare_and_launch(
        &self,
        resolved: ResolvedCommand,
        user: &UserContext,
    ) -> Result<ContainerExecution, PreparationError> {
        let prepared = self.prepare(resolved, user).await?;
        let container_id = self.container_control.launch(&prepared).await?;
        info!(
            "Launched command {} as container {} for {}",
            prepared.command_name, container_id, user
        );

        Ok(ContainerExecution {
            container_id,
            user: user.username.clone(),
            command: prepared,
            created_at: Utc::now(),
        })
    }

    async fn resolve_and_launch(
        &self,
        command: &Command,
        values: &HashMap<String, String>,
        user: &UserContext,
    ) -> Result<ContainerExecution, LaunchError> {
        let resolved = self.resolution.resolve(command, values, user).await?;
        Ok(self.prepare_and_launch(resolved, user).await?)
    }
}

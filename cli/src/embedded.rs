// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! In-process service wiring
//!
//! Builds the resolution and launch services from a `LaunchConfigManifest`
//! and runs them directly in the CLI process.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use launchkit_core::{
    application::{
        command_resolution::{CommandResolutionService, StandardCommandResolutionService},
        launch_preparation::LaunchPreparator,
        launch_service::{LaunchService, StandardLaunchService},
    },
    domain::{
        command::Command,
        config_store::ConfigLookup,
        credentials::CredentialIssuer,
        entity::EntityLoader,
        launch_config::LaunchConfigManifest,
        resolved::{ContainerExecution, ResolvedCommand},
        user::UserContext,
    },
    infrastructure::{
        config_store::{FileConfigStore, InMemoryConfigStore},
        credentials::LocalCredentialIssuer,
        entity_store::{FileEntityStore, InMemoryEntityStore},
        runtime::DockerContainerControl,
        staging::BuildDirectoryStager,
        transport::LocalTransporter,
    },
};

pub struct EmbeddedLauncher {
    config: LaunchConfigManifest,
    resolution: Arc<dyn CommandResolutionService>,
    credentials: Arc<dyn CredentialIssuer>,
}

impl EmbeddedLauncher {
    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let config = LaunchConfigManifest::load_or_default(config_path)
            .context("Failed to load configuration")?;

        config
            .validate()
            .context("Configuration validation failed")?;

        Ok(Self::from_config(config))
    }

    pub fn from_config(config: LaunchConfigManifest) -> Self {
        let entities: Arc<dyn EntityLoader> = match &config.spec.stores.entity_root {
            Some(root) => {
                debug!("Using file entity store at {:?}", root);
                Arc::new(FileEntityStore::new(root))
            }
            None => Arc::new(InMemoryEntityStore::new()),
        };
        let configs: Arc<dyn ConfigLookup> = match &config.spec.stores.config_root {
            Some(root) => {
                debug!("Using file config store at {:?}", root);
                Arc::new(FileConfigStore::new(root))
            }
            None => Arc::new(InMemoryConfigStore::new()),
        };

        Self {
            resolution: Arc::new(StandardCommandResolutionService::new(entities, configs)),
            credentials: Arc::new(LocalCredentialIssuer::default()),
            config,
        }
    }

    pub fn config(&self) -> &LaunchConfigManifest {
        &self.config
    }

    pub async fn resolve(
        &self,
        command: &Command,
        values: &HashMap<String, String>,
        user: &UserContext,
    ) -> Result<ResolvedCommand> {
        self.resolution
            .resolve(command, values, user)
            .await
            .with_context(|| format!("Failed to resolve command {}", command.name))
    }

    /// Resolve and prepare against the configured execution host without
    /// touching the container engine.
    pub async fn prepare(
        &self,
        command: &Command,
        values: &HashMap<String, String>,
        user: &UserContext,
    ) -> Result<ResolvedCommand> {
        let resolved = self.resolve(command, values, user).await?;
        self.preparator()
            .prepare(resolved, user, &self.config.spec.runtime.execution_host)
            .await
            .with_context(|| format!("Failed to prepare command {}", command.name))
    }

    pub async fn launch(
        &self,
        command: &Command,
        values: &HashMap<String, String>,
        user: &UserContext,
    ) -> Result<ContainerExecution> {
        let runtime = &self.config.spec.runtime;
        let control = DockerContainerControl::new(
            runtime.docker_socket_path.clone(),
            runtime.execution_host.clone(),
            runtime.autopull,
        )?;
        control.healthcheck().await?;

        let service = StandardLaunchService::new(
            self.resolution.clone(),
            self.preparator(),
            Arc::new(control),
        );
        service
            .resolve_and_launch(command, values, user)
            .await
            .with_context(|| format!("Failed to launch command {}", command.name))
    }

    fn preparator(&self) -> LaunchPreparator {
        LaunchPreparator::new(
            self.credentials.clone(),
            Arc::new(LocalTransporter::new(
                self.config.spec.transport.path_translations.clone(),
            )),
            BuildDirectoryStager::new(&self.config.spec.build.build_root),
            self.config.spec.site.container_facing_url(),
        )
    }
}

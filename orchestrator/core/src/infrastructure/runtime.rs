// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::resolved::ResolvedCommand;
use crate::domain::runtime::{ContainerControl, ContainerId, RuntimeError};
use async_trait::async_trait;
use bollard::container::{Config, CreateContainerOptions, StartContainerOptions};
use bollard::image::CreateImageOptions;
use bollard::Docker;
use futures::StreamExt;
use tracing::info;

pub struct DockerContainerControl {
    docker: Docker,
    host: String,
    autopull: bool,
}

impl DockerContainerControl {
    /// `host` is the execution host address handed to the transporter.
    pub fn new(socket_path: Option<String>, host: String, autopull: bool) -> Result<Self, RuntimeError> {
        // Connect to Docker daemon (custom socket or auto-detect)
        let docker = if let Some(path) = socket_path {
            #[cfg(unix)]
            let result = Docker::connect_with_unix(&path, 120, bollard::API_DEFAULT_VERSION);

            #[cfg(windows)]
            let result = Docker::connect_with_named_pipe(&path, 120, bollard::API_DEFAULT_VERSION);

            result.map_err(|e| RuntimeError::ConnectionFailed(format!(
                "Failed to connect to Docker at {}: {}\n\n\
                 Ensure Docker is running and the socket path is correct.",
                path, e
            )))?
        } else {
            Docker::connect_with_local_defaults()
                .map_err(|e| RuntimeError::ConnectionFailed(format!(
                    "Failed to connect to Docker: {}\n\n\
                     Common causes:\n\
                     - Docker daemon not running (check: docker ps)\n\
                     - Permission denied accessing Docker socket\n\
                     - On Linux: Current user not in 'docker' group",
                    e
                )))?
        };

        Ok(Self { docker, host, autopull })
    }

    /// Verify Docker daemon is accessible
    pub async fn healthcheck(&self) -> Result<(), RuntimeError> {
        self.docker.ping().await
            .map_err(|e| RuntimeError::ConnectionFailed(format!(
                "Cannot connect to Docker daemon: {}\n\nVerify with: docker ps",
                e
            )))?;
        Ok(())
    }

    async fn ensure_image(&self, image: &str) -> Result<(), RuntimeError> {
        if self.docker.inspect_image(image).await.is_ok() {
            return Ok(());
        }
        if !self.autopull {
            return Err(RuntimeError::LaunchFailed(format!(
                "Image {} not found locally and autopull is disabled",
                image
            )));
        }

        info!("Pulling image: {}", image);
        let options = Some(CreateImageOptions {
            from_image: image.to_string(),
            ..Default::default()
        });
        let mut stream = self.docker.create_image(options, None, None);
        while let Some(result) = stream.next().await {
            if let Err(e) = result {
                return Err(RuntimeError::LaunchFailed(format!(
                    "Failed to pull image {}: {}\n\nTry manually: docker pull {}",
                    image, e, image
                )));
            }
        }
        info!("Successfully pulled image: {}", image);
        Ok(())
    }
}

/// Container configuration for a prepared command. Every mount must
/// already carry its container-host path.
pub fn container_config(command: &ResolvedCommand) -> Result<Config<String>, RuntimeError> {
    let binds = command
        .mounts
        .iter()
        .map(|m| m.bind().ok_or_else(|| RuntimeError::UnpreparedMount(m.name.clone())))
        .collect::<Result<Vec<_>, _>>()?;

    // Convert map to "KEY=VALUE" strings
    let env: Vec<String> = command
        .environment_variables
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();

    let host_config = bollard::service::HostConfig {
        binds: Some(binds),
        ..Default::default()
    };

    Ok(Config {
        image: Some(command.image.clone()),
        cmd: Some(vec![
            "/bin/sh".to_string(),
            "-c".to_string(),
            command.command_line.clone(),
        ]),
        env: Some(env),
        working_dir: command.working_directory.clone(),
        attach_stdout: Some(true),
        attach_stderr: Some(true),
        host_config: Some(host_config),
        ..Default::default()
    })
}

#[async_trait]
impl ContainerControl for DockerContainerControl {
    fn host(&self) -> String {
        self.host.clone()
    }

    async fn launch(&self, command: &ResolvedCommand) -> Result<ContainerId, RuntimeError> {
        let config = container_config(command)?;
        self.ensure_image(&command.image).await?;

        let options = CreateContainerOptions {
            name: format!("launchkit-{}-{}", command.command_name, uuid::Uuid::new_v4()),
            platform: None,
        };

        let res = self.docker.create_container(Some(options), config).await
            .map_err(|e| RuntimeError::LaunchFailed(format!("Failed to create container: {}", e)))?;
        for warning in &res.warnings {
            tracing::warn!("Docker: {}", warning);
        }

        self.docker.start_container(&res.id, None::<StartContainerOptions<String>>).await
            .map_err(|e| RuntimeError::LaunchFailed(format!("Failed to start container: {}", e)))?;

        info!("Launched container {} for command {}", res.id, command.command_name);
        Ok(ContainerId::new(res.id))
    }
}

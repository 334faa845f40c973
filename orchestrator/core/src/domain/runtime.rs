// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::resolved::ResolvedCommand;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(pub String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Failed to connect to container engine: {0}")]
    ConnectionFailed(String),
    #[error("Failed to launch container: {0}")]
    LaunchFailed(String),
    #[error("Mount \"{0}\" has not been prepared for launch")]
    UnpreparedMount(String),
}

/// Container engine seam. Receives fully prepared commands only: every
/// mount carries its container-host path.
#[async_trait]
pub trait ContainerControl: Send + Sync {
    /// Address of the execution host, used as the transport target
    fn host(&self) -> String;

    async fn launch(&self, command: &ResolvedCommand) -> Result<ContainerId, RuntimeError>;
}

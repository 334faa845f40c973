// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a tool configuration is looked up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "lowercase")]
pub enum ConfigScope {
    Site,
    Project(String),
}

impl std::fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Site => write!(f, "site"),
            Self::Project(id) => write!(f, "project {}", id),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigStoreError {
    #[error("Failed to read config store: {0}")]
    Io(String),
}

/// Read-only lookup of named tool configurations.
#[async_trait]
pub trait ConfigLookup: Send + Sync {
    async fn get_config(
        &self,
        tool: &str,
        file: &str,
        scope: &ConfigScope,
    ) -> Result<Option<String>, ConfigStoreError>;
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Tool Configuration Stores
//!
//! `ConfigLookup` adapters. The file store lays configurations out as
//!
//! ```text
//! <root>/site/<tool>/<file>
//! <root>/projects/<project-id>/<tool>/<file>
//! ```
//!
//! and the in-memory store backs tests and embedded use.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::config_store::{ConfigLookup, ConfigScope, ConfigStoreError};
use crate::domain::path_sanitizer::{segment, PathSanitizerError};

pub struct FileConfigStore {
    root: PathBuf,
}

impl FileConfigStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn location(&self, tool: &str, file: &str, scope: &ConfigScope) -> Result<PathBuf, ConfigStoreError> {
        let invalid = |e: PathSanitizerError| ConfigStoreError::Io(e.to_string());
        let base = match scope {
            ConfigScope::Site => self.root.join("site"),
            ConfigScope::Project(id) => self.root.join("projects").join(segment(id).map_err(invalid)?),
        };
        Ok(base
            .join(segment(tool).map_err(invalid)?)
            .join(segment(file).map_err(invalid)?))
    }
}

#[async_trait]
impl ConfigLookup for FileConfigStore {
    async fn get_config(
        &self,
        tool: &str,
        file: &str,
        scope: &ConfigScope,
    ) -> Result<Option<String>, ConfigStoreError> {
        let path = self.location(tool, file, scope)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {:?}", path);
                Ok(None)
            }
            Err(e) => Err(ConfigStoreError::Io(format!("{:?}: {}", path, e))),
        }
    }
}

type ConfigKey = (ConfigScope, String, String);

#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    configs: Arc<RwLock<HashMap<ConfigKey, String>>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(
        &self,
        tool: &str,
        file: &str,
        scope: ConfigScope,
        contents: impl Into<String>,
    ) {
        let mut configs = self.configs.write().await;
        configs.insert((scope, tool.to_string(), file.to_string()), contents.into());
    }
}

#[async_trait]
impl ConfigLookup for InMemoryConfigStore {
    async fn get_config(
        &self,
        tool: &str,
        file: &str,
        scope: &ConfigScope,
    ) -> Result<Option<String>, ConfigStoreError> {
        let configs = self.configs.read().await;
        Ok(configs
            .get(&(scope.clone(), tool.to_string(), file.to_string()))
            .cloned())
    }
}

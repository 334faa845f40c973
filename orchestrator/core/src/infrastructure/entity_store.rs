// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Entity Snapshot Stores
//!
//! `EntityLoader` adapters. The file store keeps one JSON snapshot per
//! entity at `<root>/<entity-type>/<id>.json`. Neither store applies access
//! control; the user is only logged.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entity::{EntityError, EntityLoader, EntitySnapshot, EntityType};
use crate::domain::path_sanitizer::segment;
use crate::domain::user::UserContext;

pub struct FileEntityStore {
    root: PathBuf,
}

impl FileEntityStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl EntityLoader for FileEntityStore {
    async fn load_by_id(
        &self,
        entity_type: EntityType,
        id: &str,
        user: &UserContext,
    ) -> Result<Option<EntitySnapshot>, EntityError> {
        let file_name = format!("{}.json", segment(id).map_err(|e| EntityError::Io(e.to_string()))?);
        let path = self.root.join(entity_type.to_string()).join(file_name);
        tracing::debug!("Loading {} {} for {} from {:?}", entity_type, id, user, path);

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(EntityError::Io(format!("{:?}: {}", path, e))),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| EntityError::Malformed {
                entity_type,
                id: id.to_string(),
                reason: e.to_string(),
            })
    }
}

#[derive(Clone, Default)]
pub struct InMemoryEntityStore {
    entities: Arc<RwLock<HashMap<(EntityType, String), EntitySnapshot>>>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, entity_type: EntityType, snapshot: EntitySnapshot) {
        let mut entities = self.entities.write().await;
        entities.insert((entity_type, snapshot.id_text()), snapshot);
    }
}

#[async_trait]
impl EntityLoader for InMemoryEntityStore {
    async fn load_by_id(
        &self,
        entity_type: EntityType,
        id: &str,
        _user: &UserContext,
    ) -> Result<Option<EntitySnapshot>, EntityError> {
        let entities = self.entities.read().await;
        Ok(entities.get(&(entity_type, id.to_string())).cloned())
    }
}

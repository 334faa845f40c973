// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Domain Entity Snapshots
//!
//! Structured inputs (projects, sessions, scans, ...) travel through the
//! engine as JSON snapshots. Only the handful of fields the engine reads are
//! typed; everything else is carried through untouched so a snapshot can be
//! re-serialized without loss.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Snapshot shapes and the entity-loader port

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::user::UserContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Project,
    Subject,
    Session,
    Scan,
    Assessor,
    Resource,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Project => "project",
            Self::Subject => "subject",
            Self::Session => "session",
            Self::Scan => "scan",
            Self::Assessor => "assessor",
            Self::Resource => "resource",
        };
        f.write_str(name)
    }
}

/// A file-bearing collection attached to an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResourceSnapshot {
    #[serde(default)]
    pub id: Value,

    #[serde(default)]
    pub label: String,

    /// Absolute path of the resource on the platform host
    #[serde(default)]
    pub directory: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Canonical snapshot of a project, subject, session, scan or assessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EntitySnapshot {
    /// String or numeric identifier
    pub id: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", alias = "projectId")]
    pub project_id: Option<String>,

    #[serde(default)]
    pub resources: Vec<ResourceSnapshot>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntitySnapshot {
    /// Identifier as text; strings are returned without quotes.
    pub fn id_text(&self) -> String {
        match &self.id {
            Value::String(id) => id.clone(),
            other => other.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Error)]
pub enum EntityError {
    #[error("Failed to read entity store: {0}")]
    Io(String),
    #[error("Entity {entity_type} {id} is malformed: {reason}")]
    Malformed {
        entity_type: EntityType,
        id: String,
        reason: String,
    },
}

/// Loads an entity by identifier when a structured input is supplied as a
/// bare id instead of a snapshot.
#[async_trait]
pub trait EntityLoader: Send + Sync {
    async fn load_by_id(
        &self,
        entity_type: EntityType,
        id: &str,
        user: &UserContext,
    ) -> Result<Option<EntitySnapshot>, EntityError>;
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Path {path} cannot be transported to {host}: {reason}")]
    Unreachable {
        host: String,
        path: String,
        reason: String,
    },
    #[error("IO error: {0}")]
    Io(String),
}

/// Makes a local path accessible from the execution host's filesystem.
///
/// Must be safe to call concurrently for distinct local paths. There is no
/// timeout at this seam; deadlines belong to the caller.
#[async_trait]
pub trait Transporter: Send + Sync {
    async fn transport(&self, host: &str, local_path: &Path) -> Result<PathBuf, TransportError>;
}

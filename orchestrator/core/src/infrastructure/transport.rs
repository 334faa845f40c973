// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local Transporter
//!
//! For execution hosts that share the platform's filesystem, possibly
//! mounted at a different location. Paths are rewritten by prefix; paths
//! matching no translation are assumed identical on both hosts.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::launch_config::PathTranslation;
use crate::domain::transport::{TransportError, Transporter};

pub struct LocalTransporter {
    /// Longest local prefix first
    translations: Vec<PathTranslation>,
}

impl LocalTransporter {
    pub fn new(mut translations: Vec<PathTranslation>) -> Self {
        translations.sort_by(|a, b| {
            Path::new(&b.local_prefix)
                .components()
                .count()
                .cmp(&Path::new(&a.local_prefix).components().count())
        });
        Self { translations }
    }

    pub fn translate(&self, local_path: &Path) -> PathBuf {
        for translation in &self.translations {
            if let Ok(rest) = local_path.strip_prefix(&translation.local_prefix) {
                return Path::new(&translation.remote_prefix).join(rest);
            }
        }
        local_path.to_path_buf()
    }
}

#[async_trait]
impl Transporter for LocalTransporter {
    async fn transport(&self, host: &str, local_path: &Path) -> Result<PathBuf, TransportError> {
        if !local_path.is_absolute() {
            return Err(TransportError::Unreachable {
                host: host.to_string(),
                path: local_path.display().to_string(),
                reason: "path is not absolute".to_string(),
            });
        }
        if !tokio::fs::try_exists(local_path)
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?
        {
            return Err(TransportError::Unreachable {
                host: host.to_string(),
                path: local_path.display().to_string(),
                reason: "path does not exist".to_string(),
            });
        }

        let remote = self.translate(local_path);
        tracing::debug!("Transported {:?} to {:?} on {}", local_path, remote, host);
        Ok(remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translation(local: &str, remote: &str) -> PathTranslation {
        PathTranslation {
            local_prefix: local.to_string(),
            remote_prefix: remote.to_string(),
        }
    }

    #[test]
    fn test_longest_prefix_wins() {
        let transporter = LocalTransporter::new(vec![
            translation("/data", "/mnt/data"),
            translation("/data/build", "/scratch/build"),
        ]);

        assert_eq!(
            transporter.translate(Path::new("/data/build/abc")),
            PathBuf::from("/scratch/build/abc")
        );
        assert_eq!(
            transporter.translate(Path::new("/data/archive/p1")),
            PathBuf::from("/mnt/data/archive/p1")
        );
    }

    #[test]
    fn test_prefix_matches_whole_components() {
        let transporter = LocalTransporter::new(vec![translation("/data", "/mnt/data")]);
        assert_eq!(
            transporter.translate(Path::new("/database/x")),
            PathBuf::from("/database/x")
        );
    }

    #[tokio::test]
    async fn test_transport_requires_existing_absolute_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let transporter = LocalTransporter::new(vec![]);

        let result = transporter.transport("local", dir.path()).await.unwrap();
        assert_eq!(result, dir.path());

        assert!(transporter.transport("local", Path::new("relative")).await.is_err());
        assert!(transporter
            .transport("local", &dir.path().join("missing"))
            .await
            .is_err());
    }
}

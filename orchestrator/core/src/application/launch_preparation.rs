// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Launch Preparation
//!
//! Final step before a resolved command reaches the container engine:
//! default environment variables are injected, every mount gets a platform
//! host path (either its source directory or a freshly staged build
//! directory), and that path is transported to the execution host.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Default env injection, build-directory staging, transport
//!
//! # Staging Rules
//!
//! | Sources | Strategy |
//! |---|---|
//! | several | merge all into one new build directory |
//! | one root, with a path or writable mount | copy into a new build directory |
//! | one root, read-only, no path | mount the root in place |
//! | one path, no root | copy the file into a new build directory |
//! | none | new empty build directory, mount forced writable |

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::credentials::CredentialIssuer;
use crate::domain::errors::PreparationError;
use crate::domain::resolved::{ResolvedCommand, ResolvedMount};
use crate::domain::transport::Transporter;
use crate::domain::user::UserContext;
use crate::infrastructure::staging::{BuildDirectoryStager, StagingError};

pub const HOST_ENV: &str = "PLATFORM_HOST";
pub const USER_ENV: &str = "PLATFORM_USER";
pub const PASS_ENV: &str = "PLATFORM_PASS";

/// How a mount's platform host path is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagingPlan {
    /// Bind the source directory directly
    InPlace(String),
    /// Copy the mount's sources into a new build directory
    Copy,
    /// Allocate an empty build directory for output
    Empty,
}

pub fn plan_staging(mount: &ResolvedMount) -> Result<StagingPlan, PreparationError> {
    match mount.input_files.as_slice() {
        [] => Ok(StagingPlan::Empty),
        [files] => match (files.root_directory(), files.path()) {
            (Some(root), None) if !mount.writable => Ok(StagingPlan::InPlace(root.to_string())),
            (Some(_), _) | (None, Some(_)) => Ok(StagingPlan::Copy),
            (None, None) => Err(PreparationError::MountResolution {
                mount: mount.name.clone(),
            }),
        },
        _ => Ok(StagingPlan::Copy),
    }
}

pub struct LaunchPreparator {
    credentials: Arc<dyn CredentialIssuer>,
    transporter: Arc<dyn Transporter>,
    stager: BuildDirectoryStager,
    platform_url: String,
}

impl LaunchPreparator {
    /// `platform_url` is the address containers use to reach the platform.
    pub fn new(
        credentials: Arc<dyn CredentialIssuer>,
        transporter: Arc<dyn Transporter>,
        stager: BuildDirectoryStager,
        platform_url: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            transporter,
            stager,
            platform_url: platform_url.into(),
        }
    }

    pub async fn prepare(
        &self,
        mut command: ResolvedCommand,
        user: &UserContext,
        execution_host: &str,
    ) -> Result<ResolvedCommand, PreparationError> {
        let credential = self.credentials.issue(user).await?;

        let mut defaults = BTreeMap::new();
        defaults.insert(HOST_ENV.to_string(), self.platform_url.clone());
        defaults.insert(USER_ENV.to_string(), credential.alias);
        defaults.insert(PASS_ENV.to_string(), credential.secret);
        debug!(
            "Adding default environment variables: {}",
            defaults.keys().cloned().collect::<Vec<_>>().join(", ")
        );
        command.add_environment_variables(defaults);

        for mount in &mut command.mounts {
            self.prepare_mount(mount, execution_host).await?;
        }

        info!(
            "Prepared command {} with {} mounts for {}",
            command.command_name,
            command.mounts.len(),
            execution_host
        );
        Ok(command)
    }

    async fn prepare_mount(
        &self,
        mount: &mut ResolvedMount,
        execution_host: &str,
    ) -> Result<(), PreparationError> {
        let host_path = match plan_staging(mount)? {
            StagingPlan::InPlace(root) => {
                debug!("Mount {} can be mounted directly from {}", mount.name, root);
                PathBuf::from(root)
            }
            StagingPlan::Copy => {
                debug!(
                    "Mount {} needs {} source(s) copied to a build directory",
                    mount.name,
                    mount.input_files.len()
                );
                let stager = self.stager.clone();
                let sources = mount.input_files.clone();
                self.staged(&mount.name, move || stager.stage(&sources)).await?
            }
            StagingPlan::Empty => {
                debug!(
                    "Mount {} has no input files; allocating a writable build directory",
                    mount.name
                );
                mount.writable = true;
                let stager = self.stager.clone();
                self.staged(&mount.name, move || stager.allocate()).await?
            }
        };

        mount.host_path = Some(host_path.display().to_string());

        let remote = self
            .transporter
            .transport(execution_host, Path::new(&host_path))
            .await
            .map_err(|source| PreparationError::Transport {
                mount: mount.name.clone(),
                source,
            })?;
        debug!("Mount {} container host path is {:?}", mount.name, remote);
        mount.container_host_path = Some(remote.display().to_string());
        Ok(())
    }

    /// Run blocking filesystem work off the async executor.
    async fn staged<F>(&self, mount: &str, work: F) -> Result<PathBuf, PreparationError>
    where
        F: FnOnce() -> Result<PathBuf, StagingError> + Send + 'static,
    {
        let staging_error = |reason: String| PreparationError::Staging {
            mount: mount.to_string(),
            reason,
        };
        tokio::task::spawn_blocking(work)
            .await
            .map_err(|e| staging_error(e.to_string()))?
            .map_err(|e| staging_error(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::resolved::MountSourceFiles;

    fn mount(writable: bool, files: Vec<MountSourceFiles>) -> ResolvedMount {
        ResolvedMount {
            name: "m".to_string(),
            remote_path: "/m".to_string(),
            writable,
            host_path: None,
            input_files: files,
            container_host_path: None,
        }
    }

    #[test]
    fn test_read_only_root_mounts_in_place() {
        let plan = plan_staging(&mount(false, vec![MountSourceFiles::directory("/data/r")])).unwrap();
        assert_eq!(plan, StagingPlan::InPlace("/data/r".to_string()));
    }

    #[test]
    fn test_writable_root_is_copied() {
        let plan = plan_staging(&mount(true, vec![MountSourceFiles::directory("/data/r")])).unwrap();
        assert_eq!(plan, StagingPlan::Copy);
    }

    #[test]
    fn test_root_with_path_is_copied() {
        let files = MountSourceFiles {
            root_directory: Some("/data/r".to_string()),
            path: Some("a.txt".to_string()),
        };
        assert_eq!(plan_staging(&mount(false, vec![files])).unwrap(), StagingPlan::Copy);
    }

    #[test]
    fn test_lone_path_is_copied() {
        let plan = plan_staging(&mount(false, vec![MountSourceFiles::file("/data/a.txt")])).unwrap();
        assert_eq!(plan, StagingPlan::Copy);
    }

    #[test]
    fn test_multiple_sources_are_merged() {
        let files = vec![
            MountSourceFiles::directory("/data/r"),
            MountSourceFiles::directory("/data/s"),
        ];
        assert_eq!(plan_staging(&mount(false, files)).unwrap(), StagingPlan::Copy);
    }

    #[test]
    fn test_no_sources_is_empty() {
        assert_eq!(plan_staging(&mount(false, vec![])).unwrap(), StagingPlan::Empty);
    }

    #[test]
    fn test_source_without_root_or_path_fails() {
        let err = plan_staging(&mount(false, vec![MountSourceFiles::default()])).unwrap_err();
        assert!(err
            .to_string()
            .contains("should have a file path or a directory or both"));
    }
}

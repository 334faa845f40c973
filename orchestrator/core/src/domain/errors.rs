// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Resolution and Preparation Errors
//!
//! Every error is terminal for the attempt that raised it. The engine never
//! retries or repairs; callers correct the inputs or the definition.

use thiserror::Error;

use crate::domain::credentials::CredentialError;
use crate::domain::runtime::RuntimeError;
use crate::domain::transport::TransportError;

/// Failure to turn a command definition plus runtime values into a
/// resolved command.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The definition itself is misordered; never a runtime-data problem
    #[error(
        "Input {input} has prerequisite {dependency} which has not been resolved. \
         Re-order inputs so {input} appears after {dependency}."
    )]
    InputOrdering { input: String, dependency: String },

    #[error("Could not resolve input \"{input}\": {reason}")]
    InputResolution { input: String, reason: String },

    #[error("Could not resolve mount \"{mount}\": {reason}")]
    MountResolution { mount: String, reason: String },
}

impl ResolutionError {
    pub fn input(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InputResolution {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn mount(mount: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MountResolution {
            mount: mount.into(),
            reason: reason.into(),
        }
    }
}

/// Failure while staging, transporting or launching a resolved command.
/// The whole preparation may be retried; build directories are never reused.
#[derive(Debug, Error)]
pub enum PreparationError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("Mount \"{mount}\" should have a file path or a directory or both but it does not.")]
    MountResolution { mount: String },

    #[error("Failed to stage mount \"{mount}\": {reason}")]
    Staging { mount: String, reason: String },

    #[error("Failed to transport mount \"{mount}\": {source}")]
    Transport {
        mount: String,
        #[source]
        source: TransportError,
    },

    #[error(transparent)]
    Launch(#[from] RuntimeError),
}

/// Failure anywhere between a command definition and a running container.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Preparation(#[from] PreparationError),
}

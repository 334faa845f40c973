// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::user::UserContext;

/// Short-lived principal/secret pair handed to the container so it can call
/// back into the platform as the launching user.
#[derive(Clone, PartialEq, Eq)]
pub struct EphemeralCredential {
    pub alias: String,
    pub secret: String,
}

// Keep the secret out of logs.
impl std::fmt::Debug for EphemeralCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralCredential")
            .field("alias", &self.alias)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Failed to issue credential for user {user}: {reason}")]
    IssueFailed { user: String, reason: String },
}

/// Called once per launch.
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn issue(&self, user: &UserContext) -> Result<EphemeralCredential, CredentialError>;
}

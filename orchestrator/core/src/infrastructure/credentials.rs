// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local Credential Issuer
//!
//! Issues alias/secret pairs for containers to call back as the launching
//! user. Only the SHA-256 digest of each secret is retained, so issued
//! credentials can be verified but never recovered.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::credentials::{CredentialError, CredentialIssuer, EphemeralCredential};
use crate::domain::user::UserContext;

struct IssuedCredential {
    username: String,
    secret_digest: String,
    expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct LocalCredentialIssuer {
    ttl: Duration,
    issued: Arc<RwLock<HashMap<String, IssuedCredential>>>,
}

impl LocalCredentialIssuer {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            issued: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The user an unexpired alias/secret pair was issued to.
    pub async fn verify(&self, alias: &str, secret: &str) -> Option<String> {
        let issued = self.issued.read().await;
        let credential = issued.get(alias)?;
        if credential.expires_at < Utc::now() || credential.secret_digest != digest(secret) {
            return None;
        }
        Some(credential.username.clone())
    }
}

impl Default for LocalCredentialIssuer {
    fn default() -> Self {
        Self::new(Duration::hours(48))
    }
}

fn digest(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

#[async_trait]
impl CredentialIssuer for LocalCredentialIssuer {
    async fn issue(&self, user: &UserContext) -> Result<EphemeralCredential, CredentialError> {
        if user.username.trim().is_empty() {
            return Err(CredentialError::IssueFailed {
                user: user.username.clone(),
                reason: "username is blank".to_string(),
            });
        }

        let alias = Uuid::new_v4().simple().to_string();
        let secret = hex::encode(Sha256::digest(
            format!("{}:{}:{}", alias, user.username, Uuid::new_v4()).as_bytes(),
        ));

        let mut issued = self.issued.write().await;
        let now = Utc::now();
        issued.retain(|_, c| c.expires_at >= now);
        issued.insert(
            alias.clone(),
            IssuedCredential {
                username: user.username.clone(),
                secret_digest: digest(&secret),
                expires_at: now + self.ttl,
            },
        );
        tracing::debug!("Issued credential alias {} for {}", alias, user);

        Ok(EphemeralCredential { alias, secret })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_issue_and_verify() {
        let issuer = LocalCredentialIssuer::default();
        let user = UserContext::new("admin");

        let first = issuer.issue(&user).await.unwrap();
        let second = issuer.issue(&user).await.unwrap();
        assert_ne!(first.alias, second.alias);
        assert_ne!(first.secret, second.secret);

        assert_eq!(issuer.verify(&first.alias, &first.secret).await.as_deref(), Some("admin"));
        assert_eq!(issuer.verify(&first.alias, &second.secret).await, None);
    }

    #[tokio::test]
    async fn test_expired_credentials_fail_verification() {
        let issuer = LocalCredentialIssuer::new(Duration::seconds(-1));
        let credential = issuer.issue(&UserContext::new("admin")).await.unwrap();
        assert_eq!(issuer.verify(&credential.alias, &credential.secret).await, None);
    }

    #[tokio::test]
    async fn test_blank_user_is_rejected() {
        let issuer = LocalCredentialIssuer::default();
        assert!(issuer.issue(&UserContext::new(" ")).await.is_err());
    }
}

// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock identity provider for deterministic testing.
//!
//! Tokens are registered up front with [`MockIdentity::issue_token`]; any
//! other token is rejected as unauthenticated.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use civic_core::traits::{IdentityProvider, PluginAdapter};
use civic_core::types::{AdapterType, HealthStatus, NewIdentityAccount, VerifiedIdentity};
use civic_core::CivicError;

#[derive(Default)]
pub struct MockIdentity {
    tokens: Mutex<HashMap<String, VerifiedIdentity>>,
    accounts: Mutex<Vec<NewIdentityAccount>>,
    /// When set, `create_account` fails with this message.
    rejection: Mutex<Option<String>>,
}

impl MockIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for `email` and return it.
    pub fn issue_token(&self, email: &str) -> String {
        let token = format!("token-{email}");
        let identity = VerifiedIdentity {
            uid: format!("uid-{email}"),
            email: email.to_string(),
        };
        self.tokens
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(token.clone(), identity);
        token
    }

    /// Make subsequent account creations fail with `message`.
    pub fn reject_accounts(&self, message: &str) {
        *self.rejection.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.to_string());
    }

    /// Accounts created so far.
    pub fn created_accounts(&self) -> Vec<String> {
        self.accounts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|a| a.email.clone())
            .collect()
    }
}

#[async_trait]
impl PluginAdapter for MockIdentity {
    fn name(&self) -> &str {
        "mock-identity"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Identity
    }

    async fn health_check(&self) -> Result<HealthStatus, CivicError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn verify_token(&self, token: &str) -> Result<VerifiedIdentity, CivicError> {
        self.tokens
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(token)
            .cloned()
            .ok_or(CivicError::Unauthenticated)
    }

    async fn create_account(&self, account: &NewIdentityAccount) -> Result<String, CivicError> {
        if let Some(message) = self
            .rejection
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
        {
            return Err(CivicError::Identity {
                message,
                source: None,
            });
        }
        self.accounts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(account.clone());
        Ok(format!("uid-{}", account.email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issued_tokens_verify() {
        let identity = MockIdentity::new();
        let token = identity.issue_token("a@x.com");
        let verified = identity.verify_token(&token).await.unwrap();
        assert_eq!(verified.email, "a@x.com");
        assert!(matches!(
            identity.verify_token("bogus").await,
            Err(CivicError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn rejection_blocks_account_creation() {
        let identity = MockIdentity::new();
        identity.reject_accounts("EMAIL_EXISTS");
        let account = NewIdentityAccount {
            email: "s@x.com".into(),
            password: "secret1".into(),
            display_name: None,
            photo_url: None,
        };
        let err = identity.create_account(&account).await.unwrap_err();
        assert!(matches!(err, CivicError::Identity { ref message, .. } if message == "EMAIL_EXISTS"));
        assert!(identity.created_accounts().is_empty());
    }
}

// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity provider adapter backed by the Identity Toolkit REST API.
//!
//! Implements [`IdentityProvider`]: ID-token verification via
//! `accounts:lookup` and staff account creation via `accounts:signUp`.

pub mod client;
pub mod types;

use async_trait::async_trait;
use civic_config::model::IdentityConfig;
use civic_core::error::CivicError;
use civic_core::traits::{IdentityProvider, PluginAdapter};
use civic_core::types::{AdapterType, HealthStatus, NewIdentityAccount, VerifiedIdentity};
use tracing::{debug, info};

use crate::client::{IdentityToolkitClient, RequestError};
use crate::types::SignUpRequest;

/// Identity provider talking to the Identity Toolkit REST API.
pub struct ToolkitIdentity {
    client: IdentityToolkitClient,
}

impl ToolkitIdentity {
    /// Creates the adapter from configuration. `identity.api_key` is required.
    pub fn new(config: &IdentityConfig) -> Result<Self, CivicError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CivicError::Config("identity.api_key is not set".into()))?;
        let client = IdentityToolkitClient::new(api_key, config.base_url.clone())?;
        info!(base_url = %config.base_url, "identity provider initialized");
        Ok(Self { client })
    }

    /// Creates the adapter around an existing client.
    pub fn with_client(client: IdentityToolkitClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PluginAdapter for ToolkitIdentity {
    fn name(&self) -> &str {
        "identity-toolkit"
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
impl IdentityProvider for ToolkitIdentity {
    async fn verify_token(&self, token: &str) -> Result<VerifiedIdentity, CivicError> {
        match self.client.lookup(token).await {
            Ok(Some(account)) => match account.email {
                Some(email) if !email.is_empty() => Ok(VerifiedIdentity {
                    uid: account.local_id,
                    email,
                }),
                _ => {
                    debug!(uid = %account.local_id, "token account has no email");
                    Err(CivicError::Unauthenticated)
                }
            },
            Ok(None) => Err(CivicError::Unauthenticated),
            Err(RequestError::Rejected { message, .. }) => {
                debug!(reason = %message, "token rejected");
                Err(CivicError::Unauthenticated)
            }
            Err(RequestError::Unavailable(e)) => Err(e),
        }
    }

    async fn create_account(&self, account: &NewIdentityAccount) -> Result<String, CivicError> {
        let request = SignUpRequest {
            email: &account.email,
            password: &account.password,
            display_name: account.display_name.as_deref(),
            photo_url: account.photo_url.as_deref(),
            return_secure_token: false,
        };
        match self.client.sign_up(&request).await {
            Ok(uid) => {
                info!(email = %account.email, "identity account created");
                Ok(uid)
            }
            Err(RequestError::Rejected { message, .. }) => Err(CivicError::Identity {
                message,
                source: None,
            }),
            Err(RequestError::Unavailable(e)) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str) -> ToolkitIdentity {
        ToolkitIdentity::new(&IdentityConfig {
            api_key: Some("test-key".into()),
            base_url: base_url.to_string(),
        })
        .unwrap()
    }

    #[test]
    fn missing_api_key_is_config_error() {
        let result = ToolkitIdentity::new(&IdentityConfig {
            api_key: None,
            base_url: "http://localhost".into(),
        });
        assert!(matches!(result, Err(CivicError::Config(_))));
    }

    #[tokio::test]
    async fn verify_token_resolves_email() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts:lookup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "users": [{"localId": "uid-1", "email": "a@x.com"}]
            })))
            .mount(&server)
            .await;

        let identity = provider(&server.uri()).verify_token("tok").await.unwrap();
        assert_eq!(
            identity,
            VerifiedIdentity {
                uid: "uid-1".into(),
                email: "a@x.com".into()
            }
        );
    }

    #[tokio::test]
    async fn rejected_or_empty_lookup_is_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts:lookup"))
            .and(body_partial_json(serde_json::json!({"idToken": "expired"})))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "TOKEN_EXPIRED"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/accounts:lookup"))
            .and(body_partial_json(serde_json::json!({"idToken": "orphan"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let identity = provider(&server.uri());
        assert!(matches!(
            identity.verify_token("expired").await,
            Err(CivicError::Unauthenticated)
        ));
        assert!(matches!(
            identity.verify_token("orphan").await,
            Err(CivicError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn create_account_surfaces_provider_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts:signUp"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "EMAIL_EXISTS"}
            })))
            .mount(&server)
            .await;

        let account = NewIdentityAccount {
            email: "s@x.com".into(),
            password: "secret1".into(),
            display_name: Some("Staff".into()),
            photo_url: None,
        };
        let err = provider(&server.uri())
            .create_account(&account)
            .await
            .unwrap_err();
        match err {
            CivicError::Identity { message, .. } => assert_eq!(message, "EMAIL_EXISTS"),
            other => panic!("expected identity error, got {other:?}"),
        }
    }
}

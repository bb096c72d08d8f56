// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Identity Toolkit REST API.
//!
//! Provides [`IdentityToolkitClient`] which handles request construction,
//! API-key authentication, error envelopes, and transient error retry.

use std::time::Duration;

use civic_core::CivicError;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::types::{
    AccountInfo, ApiErrorResponse, LookupRequest, LookupResponse, SignUpRequest, SignUpResponse,
};

/// Failure of a single API call.
#[derive(Debug)]
pub enum RequestError {
    /// The API answered with a client error and a reason code.
    Rejected { status: u16, message: String },
    /// Transport failure, server error after retries, or unreadable body.
    Unavailable(CivicError),
}

/// HTTP client for Identity Toolkit communication.
///
/// Retries once on transient statuses (429, 500, 503).
#[derive(Debug, Clone)]
pub struct IdentityToolkitClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    max_retries: u32,
}

impl IdentityToolkitClient {
    /// Creates a client for `base_url` (e.g. `https://identitytoolkit.googleapis.com/v1`).
    pub fn new(api_key: String, base_url: String) -> Result<Self, CivicError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CivicError::Identity {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: 1,
        })
    }

    /// Resolves an ID token to the account it was issued for.
    ///
    /// Returns `Ok(None)` when the token is accepted but names no account.
    pub async fn lookup(&self, id_token: &str) -> Result<Option<AccountInfo>, RequestError> {
        let response: LookupResponse = self
            .post("accounts:lookup", &LookupRequest { id_token })
            .await?;
        Ok(response.users.into_iter().next())
    }

    /// Creates an email/password account and returns its `localId`.
    pub async fn sign_up(&self, request: &SignUpRequest<'_>) -> Result<String, RequestError> {
        let response: SignUpResponse = self.post("accounts:signUp", request).await?;
        Ok(response.local_id)
    }

    async fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R, RequestError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{endpoint}", self.base_url);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, endpoint, "retrying identity request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&url)
                .query(&[("key", self.api_key.as_str())])
                .json(body)
                .send()
                .await
                .map_err(|e| {
                    RequestError::Unavailable(CivicError::Identity {
                        message: format!("HTTP request failed: {e}"),
                        source: Some(Box::new(e)),
                    })
                })?;

            let status = response.status();
            debug!(status = %status, attempt, endpoint, "identity response received");

            if status.is_success() {
                return response.json::<R>().await.map_err(|e| {
                    RequestError::Unavailable(CivicError::Identity {
                        message: format!("failed to parse identity response: {e}"),
                        source: Some(Box::new(e)),
                    })
                });
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(format!("API returned {status}: {body}"));
                continue;
            }

            let reason = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("API returned {status}: {body}"));
            if status.is_client_error() {
                return Err(RequestError::Rejected {
                    status: status.as_u16(),
                    message: reason,
                });
            }
            return Err(RequestError::Unavailable(CivicError::Identity {
                message: reason,
                source: None,
            }));
        }

        Err(RequestError::Unavailable(CivicError::Identity {
            message: last_error.unwrap_or_else(|| "identity request failed after retries".into()),
            source: None,
        }))
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> IdentityToolkitClient {
        IdentityToolkitClient::new("test-key".into(), base_url.to_string()).unwrap()
    }

    #[tokio::test]
    async fn lookup_returns_first_account() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts:lookup"))
            .and(query_param("key", "test-key"))
            .and(body_json(serde_json::json!({"idToken": "tok-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "kind": "identitytoolkit#GetAccountInfoResponse",
                "users": [{"localId": "uid-1", "email": "a@x.com", "emailVerified": true}]
            })))
            .mount(&server)
            .await;

        let account = test_client(&server.uri()).lookup("tok-1").await.unwrap().unwrap();
        assert_eq!(account.local_id, "uid-1");
        assert_eq!(account.email.as_deref(), Some("a@x.com"));
    }

    #[tokio::test]
    async fn invalid_token_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts:lookup"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "INVALID_ID_TOKEN", "errors": []}
            })))
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).lookup("bad").await.unwrap_err();
        match err {
            RequestError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "INVALID_ID_TOKEN");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn retries_once_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts:signUp"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/accounts:signUp"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"localId": "uid-9"})),
            )
            .mount(&server)
            .await;

        let request = SignUpRequest {
            email: "s@x.com",
            password: "secret1",
            display_name: Some("Staff"),
            photo_url: None,
            return_secure_token: false,
        };
        let uid = test_client(&server.uri()).sign_up(&request).await.unwrap();
        assert_eq!(uid, "uid-9");
    }

    #[tokio::test]
    async fn persistent_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts:lookup"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).lookup("tok").await.unwrap_err();
        assert!(matches!(err, RequestError::Unavailable(CivicError::Identity { .. })));
    }
}

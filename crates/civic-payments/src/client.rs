// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Checkout Sessions API.
//!
//! Provides [`CheckoutClient`] which handles form-encoded session creation,
//! session retrieval, bearer authentication, and transient error retry.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use civic_core::CivicError;
use civic_core::types::{CheckoutRequest, PaymentType, SessionMetadata};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, SessionObject};

/// HTTP client for the Checkout Sessions API.
#[derive(Debug, Clone)]
pub struct CheckoutClient {
    client: reqwest::Client,
    secret_key: String,
    base_url: String,
    max_retries: u32,
}

impl CheckoutClient {
    /// Creates a client for `base_url` (e.g. `https://api.stripe.com/v1`).
    pub fn new(secret_key: String, base_url: String) -> Result<Self, CivicError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CivicError::Payment {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            secret_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: 1,
        })
    }

    /// Opens a hosted checkout session for a single line item.
    pub async fn create_session(&self, request: &CheckoutRequest) -> Result<SessionObject, CivicError> {
        let form = session_form(request);
        let url = format!("{}/checkout/sessions", self.base_url);
        self.send(|| self.client.post(&url).form(&form)).await
    }

    /// Fetches a session by id.
    pub async fn retrieve_session(&self, session_id: &str) -> Result<SessionObject, CivicError> {
        let url = format!("{}/checkout/sessions/{session_id}", self.base_url);
        self.send(|| self.client.get(&url)).await
    }

    async fn send<F>(&self, build: F) -> Result<SessionObject, CivicError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying checkout request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = build()
                .bearer_auth(&self.secret_key)
                .send()
                .await
                .map_err(|e| CivicError::Payment {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "checkout response received");

            if status.is_success() {
                return response
                    .json::<SessionObject>()
                    .await
                    .map_err(|e| CivicError::Payment {
                        message: format!("failed to parse checkout response: {e}"),
                        source: Some(Box::new(e)),
                    });
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(format!("API returned {status}: {body}"));
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "checkout API error ({}): {}",
                    api_err.error.type_, api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(CivicError::Payment {
                message,
                source: None,
            });
        }

        Err(CivicError::Payment {
            message: last_error.unwrap_or_else(|| "checkout request failed after retries".into()),
            source: None,
        })
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

/// Form fields for a one-item payment-mode session.
///
/// Amounts are whole currency units locally and minor units at the gateway.
fn session_form(request: &CheckoutRequest) -> Vec<(String, String)> {
    let meta = &request.metadata;
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("customer_email".to_string(), meta.user_email.clone()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        (
            "line_items[0][price_data][currency]".to_string(),
            request.currency.clone(),
        ),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            (meta.amount * 100).to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            request.product_name.clone(),
        ),
        ("metadata[userEmail]".to_string(), meta.user_email.clone()),
        ("metadata[type]".to_string(), meta.payment_type.to_string()),
        ("metadata[amount]".to_string(), meta.amount.to_string()),
    ];
    if let Some(issue_id) = &meta.issue_id {
        form.push(("metadata[issueId]".to_string(), issue_id.clone()));
    }
    form
}

/// Rebuild [`SessionMetadata`] from the string map the gateway echoes back.
pub fn parse_metadata(raw: &HashMap<String, String>) -> Result<SessionMetadata, CivicError> {
    let field = |key: &str| {
        raw.get(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| CivicError::Payment {
                message: format!("checkout session metadata is missing `{key}`"),
                source: None,
            })
    };

    let payment_type = PaymentType::from_str(field("type")?).map_err(|e| CivicError::Payment {
        message: format!("unknown payment type in session metadata: {e}"),
        source: None,
    })?;
    let amount = field("amount")?.parse::<i64>().map_err(|e| CivicError::Payment {
        message: format!("invalid amount in session metadata: {e}"),
        source: Some(Box::new(e)),
    })?;

    Ok(SessionMetadata {
        user_email: field("userEmail")?.clone(),
        payment_type,
        amount,
        issue_id: raw.get("issueId").filter(|v| !v.is_empty()).cloned(),
    })
}

// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checkout Sessions API response bodies.

use std::collections::HashMap;

use serde::Deserialize;

/// A checkout session as returned by create and retrieve.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionObject {
    pub id: String,
    /// Hosted payment page. Absent once the session has completed or expired.
    pub url: Option<String>,
    /// `paid`, `unpaid`, or `no_payment_required`.
    pub payment_status: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl SessionObject {
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }
}

/// Error envelope returned with non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub message: String,
}

// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment gateway trait: hosted checkout sessions.

use async_trait::async_trait;

use crate::error::CivicError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CheckoutRequest, CheckoutSession, GatewaySession};

/// Adapter for the external payment gateway.
///
/// Neither call writes local state; reconciliation decides what to persist.
#[async_trait]
pub trait PaymentGateway: PluginAdapter {
    /// Opens a hosted checkout session and returns its redirect URL.
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, CivicError>;

    /// Fetches a session and its payment status by session reference.
    async fn retrieve_session(&self, session_id: &str) -> Result<GatewaySession, CivicError>;
}

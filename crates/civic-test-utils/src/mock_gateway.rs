// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock payment gateway adapter for deterministic testing.
//!
//! Sessions open unpaid. Tests simulate the hosted checkout completing with
//! [`MockGateway::mark_paid`].

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use civic_core::traits::{PaymentGateway, PluginAdapter};
use civic_core::types::{
    AdapterType, CheckoutRequest, CheckoutSession, GatewaySession, HealthStatus,
};
use civic_core::CivicError;

#[derive(Default)]
pub struct MockGateway {
    sessions: Mutex<HashMap<String, GatewaySession>>,
    requests: Mutex<Vec<CheckoutRequest>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a session to paid. Returns `false` for unknown sessions.
    pub fn mark_paid(&self, session_id: &str) -> bool {
        match self
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(session_id)
        {
            Some(session) => {
                session.paid = true;
                true
            }
            None => false,
        }
    }

    /// Every checkout request received, oldest first.
    pub fn requests(&self) -> Vec<CheckoutRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl PluginAdapter for MockGateway {
    fn name(&self) -> &str {
        "mock-gateway"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Payment
    }

    async fn health_check(&self) -> Result<HealthStatus, CivicError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, CivicError> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let session_id = format!("cs_test_{}", sessions.len() + 1);
        sessions.insert(
            session_id.clone(),
            GatewaySession {
                session_id: session_id.clone(),
                paid: false,
                metadata: request.metadata.clone(),
            },
        );
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        Ok(CheckoutSession {
            url: format!("https://checkout.test/pay/{session_id}"),
            session_id,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<GatewaySession, CivicError> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(session_id)
            .cloned()
            .ok_or_else(|| CivicError::Payment {
                message: format!("no such checkout session: {session_id}"),
                source: None,
            })
    }
}

// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment gateway adapter and payment reconciliation.
//!
//! [`CheckoutGateway`] implements [`PaymentGateway`] over the hosted Checkout
//! Sessions API. [`reconcile::Reconciler`] drives the subscription and boost
//! flows on top of any gateway.

pub mod client;
pub mod reconcile;
pub mod types;

use async_trait::async_trait;
use civic_config::model::PaymentConfig;
use civic_core::error::CivicError;
use civic_core::traits::{PaymentGateway, PluginAdapter};
use civic_core::types::{
    AdapterType, CheckoutRequest, CheckoutSession, GatewaySession, HealthStatus,
};
use tracing::info;

use crate::client::{parse_metadata, CheckoutClient};

pub use reconcile::{Confirmation, Reconciler};

/// Payment gateway backed by hosted checkout sessions.
pub struct CheckoutGateway {
    client: CheckoutClient,
}

impl CheckoutGateway {
    /// Creates the adapter from configuration. `payment.secret_key` is required.
    pub fn new(config: &PaymentConfig) -> Result<Self, CivicError> {
        let secret_key = config
            .secret_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CivicError::Config("payment.secret_key is not set".into()))?;
        let client = CheckoutClient::new(secret_key, config.base_url.clone())?;
        info!(base_url = %config.base_url, "payment gateway initialized");
        Ok(Self { client })
    }
}

#[async_trait]
impl PluginAdapter for CheckoutGateway {
    fn name(&self) -> &str {
        "checkout"
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
impl PaymentGateway for CheckoutGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, CivicError> {
        let session = self.client.create_session(request).await?;
        let url = session.url.ok_or_else(|| CivicError::Payment {
            message: format!("checkout session {} has no redirect url", session.id),
            source: None,
        })?;
        Ok(CheckoutSession {
            session_id: session.id,
            url,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<GatewaySession, CivicError> {
        let session = self.client.retrieve_session(session_id).await?;
        let metadata = parse_metadata(&session.metadata)?;
        Ok(GatewaySession {
            paid: session.is_paid(),
            session_id: session.id,
            metadata,
        })
    }
}

// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription and boost payment flows.
//!
//! Checkout initiation only talks to the gateway. Confirmation re-reads the
//! session from the gateway and, when paid, applies the domain effect and
//! records the payment keyed by session id. Every write on the confirmation
//! path is idempotent, so clients may call confirmation again after any
//! failure or page refresh.

use std::sync::Arc;

use civic_config::model::PaymentConfig;
use civic_core::error::CivicError;
use civic_core::traits::PaymentGateway;
use civic_core::types::{
    new_record_id, now_timestamp, CheckoutRequest, CheckoutSession, GatewaySession, Payment,
    PaymentType, SessionMetadata, Tracking, TrackingKind, BOOST_NOTE,
};
use civic_storage::queries::{issues, payments, trackings, users};
use civic_storage::Database;
use tracing::{info, warn};

/// Placeholder the gateway substitutes with the real session id on redirect.
const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Outcome of a confirmation call.
#[derive(Debug, Clone, PartialEq)]
pub enum Confirmation {
    /// The gateway does not report the session as paid. Nothing was written.
    Unpaid,
    /// The session is paid and its effects are applied.
    Confirmed {
        payment: Payment,
        /// `false` when an earlier confirmation already recorded this session.
        newly_recorded: bool,
    },
}

/// Drives checkout and confirmation for both payment flows.
pub struct Reconciler {
    db: Database,
    gateway: Arc<dyn PaymentGateway>,
    config: PaymentConfig,
}

impl Reconciler {
    pub fn new(db: Database, gateway: Arc<dyn PaymentGateway>, config: PaymentConfig) -> Self {
        Self {
            db,
            gateway,
            config,
        }
    }

    /// Opens a premium subscription checkout for `user_email`.
    pub async fn start_subscription_checkout(
        &self,
        user_email: &str,
    ) -> Result<CheckoutSession, CivicError> {
        let metadata = SessionMetadata {
            user_email: user_email.to_string(),
            payment_type: PaymentType::Subscription,
            amount: self.config.subscription_amount,
            issue_id: None,
        };
        let request = self.checkout_request(metadata, "Premium subscription", "payment");
        let session = self.gateway.create_checkout_session(&request).await?;
        info!(session_id = %session.session_id, "subscription checkout opened");
        Ok(session)
    }

    /// Opens a checkout boosting `issue_id`, paid by `user_email`.
    pub async fn start_boost_checkout(
        &self,
        user_email: &str,
        issue_id: &str,
    ) -> Result<CheckoutSession, CivicError> {
        let metadata = SessionMetadata {
            user_email: user_email.to_string(),
            payment_type: PaymentType::Payment,
            amount: self.config.boost_amount,
            issue_id: Some(issue_id.to_string()),
        };
        let request = self.checkout_request(metadata, "Issue boost", "boost");
        let session = self.gateway.create_checkout_session(&request).await?;
        info!(session_id = %session.session_id, issue_id, "boost checkout opened");
        Ok(session)
    }

    /// Confirms a subscription session: marks the payer premium and records
    /// the payment once.
    pub async fn confirm_subscription(&self, session_id: &str) -> Result<Confirmation, CivicError> {
        let Some(session) = self.paid_session(session_id, PaymentType::Subscription).await? else {
            return Ok(Confirmation::Unpaid);
        };

        let updated = users::set_premium(&self.db, &session.metadata.user_email).await?;
        if updated.matched_count == 0 {
            warn!(session_id, "subscription paid by an email with no user account");
        }
        self.record(&session).await
    }

    /// Confirms a boost session: boosts the issue, records the payment once,
    /// and logs one boost tracking entry per issue.
    pub async fn confirm_boost(&self, session_id: &str) -> Result<Confirmation, CivicError> {
        let Some(session) = self.paid_session(session_id, PaymentType::Payment).await? else {
            return Ok(Confirmation::Unpaid);
        };
        let issue_id = session
            .metadata
            .issue_id
            .clone()
            .ok_or_else(|| CivicError::Payment {
                message: format!("boost session {session_id} carries no issue id"),
                source: None,
            })?;

        issues::set_boosted(&self.db, &issue_id).await?;
        let confirmation = self.record(&session).await?;
        let entry = Tracking::new(&issue_id, None, BOOST_NOTE, TrackingKind::Boost);
        let logged = trackings::insert_tracking_if_absent(&self.db, &entry).await?;
        info!(issue_id = %issue_id, logged = logged.inserted, "issue boosted");
        Ok(confirmation)
    }

    /// Fetch the session and check it is paid and of the expected kind.
    async fn paid_session(
        &self,
        session_id: &str,
        expected: PaymentType,
    ) -> Result<Option<GatewaySession>, CivicError> {
        let session = self.gateway.retrieve_session(session_id).await?;
        if !session.paid {
            info!(session_id, "checkout session not paid");
            return Ok(None);
        }
        if session.metadata.payment_type != expected {
            return Err(CivicError::Payment {
                message: format!(
                    "session {session_id} is a {} payment, expected {expected}",
                    session.metadata.payment_type
                ),
                source: None,
            });
        }
        Ok(Some(session))
    }

    async fn record(&self, session: &GatewaySession) -> Result<Confirmation, CivicError> {
        let payment = Payment {
            id: new_record_id(),
            session_id: session.session_id.clone(),
            payment_type: session.metadata.payment_type,
            user_email: session.metadata.user_email.clone(),
            issue_id: session.metadata.issue_id.clone(),
            amount: session.metadata.amount,
            created_at: now_timestamp(),
        };
        let outcome = payments::insert_payment_if_absent(&self.db, &payment).await?;
        if outcome.inserted {
            info!(session_id = %payment.session_id, amount = payment.amount, "payment recorded");
        }
        Ok(Confirmation::Confirmed {
            payment: outcome.record,
            newly_recorded: outcome.inserted,
        })
    }

    fn checkout_request(
        &self,
        metadata: SessionMetadata,
        product_name: &str,
        flow: &str,
    ) -> CheckoutRequest {
        let site = self.config.site_domain.trim_end_matches('/');
        CheckoutRequest {
            metadata,
            product_name: product_name.to_string(),
            currency: self.config.currency.clone(),
            success_url: format!("{site}/{flow}-success?session_id={SESSION_ID_PLACEHOLDER}"),
            cancel_url: format!("{site}/{flow}-cancelled"),
        }
    }
}

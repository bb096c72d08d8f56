// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checkout and confirmation for subscriptions and boosts.
//!
//! Confirmation endpoints take the session id the gateway appended to the
//! success redirect. They are safe to call any number of times.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use civic_core::types::{CheckoutSession, Payment};
use civic_payments::Confirmation;
use civic_storage::queries::{payments, staffs};
use serde::{Deserialize, Serialize};

use super::non_empty;
use crate::auth::AuthedUser;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct PaymentsQuery {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoostCheckoutBody {
    pub issue_id: String,
}

/// The gateway redirect appends `session_id`.
#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    #[serde(alias = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum ConfirmationResponse {
    Confirmed {
        success: bool,
        session_id: String,
        already_recorded: bool,
        payment: Payment,
    },
    Unpaid {
        success: bool,
        message: &'static str,
    },
}

impl ConfirmationResponse {
    fn new(session_id: String, confirmation: Confirmation) -> Self {
        match confirmation {
            Confirmation::Confirmed {
                payment,
                newly_recorded,
            } => ConfirmationResponse::Confirmed {
                success: true,
                session_id,
                already_recorded: !newly_recorded,
                payment,
            },
            Confirmation::Unpaid => ConfirmationResponse::Unpaid {
                success: false,
                message: "payment not completed",
            },
        }
    }
}

/// GET /payments
///
/// Admins see every payment, optionally filtered by `email`. Everyone else
/// sees only their own.
pub async fn list_payments(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Query(query): Query<PaymentsQuery>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    let is_admin = staffs::get_staff_by_email(&state.db, &user.email)
        .await?
        .is_some_and(|s| s.is_admin());
    let email = if is_admin {
        non_empty(query.email)
    } else {
        Some(user.email)
    };
    Ok(Json(payments::list_payments(&state.db, email.as_deref()).await?))
}

/// POST /payments/subscribe/checkout
pub async fn subscribe_checkout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
) -> Result<Json<CheckoutSession>, ApiError> {
    Ok(Json(
        state
            .reconciler
            .start_subscription_checkout(&user.email)
            .await?,
    ))
}

/// PATCH /update-subscription?session_id=
pub async fn confirm_subscription(
    State(state): State<AppState>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<ConfirmationResponse>, ApiError> {
    let confirmation = state
        .reconciler
        .confirm_subscription(&query.session_id)
        .await?;
    Ok(Json(ConfirmationResponse::new(query.session_id, confirmation)))
}

/// POST /payments/boost-issue/checkout
pub async fn boost_checkout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    ApiJson(body): ApiJson<BoostCheckoutBody>,
) -> Result<Json<CheckoutSession>, ApiError> {
    if body.issue_id.trim().is_empty() {
        return Err(ApiError::BadRequest("issueId is required".into()));
    }
    Ok(Json(
        state
            .reconciler
            .start_boost_checkout(&user.email, &body.issue_id)
            .await?,
    ))
}

/// PATCH /update-boost?session_id=
pub async fn confirm_boost(
    State(state): State<AppState>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<ConfirmationResponse>, ApiError> {
    let confirmation = state.reconciler.confirm_boost(&query.session_id).await?;
    Ok(Json(ConfirmationResponse::new(query.session_id, confirmation)))
}

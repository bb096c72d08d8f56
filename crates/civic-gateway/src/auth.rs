// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity gate middleware.
//!
//! [`require_auth`] resolves `Authorization: Bearer <token>` through the
//! identity provider and stores the caller in request extensions.
//! [`require_admin`] runs after it and admits only staff whose role is admin.
//! Nothing is cached between requests.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use civic_core::CivicError;
use civic_storage::queries::staffs;
use tracing::debug;

use crate::error::ApiError;
use crate::server::AppState;

/// The verified caller, available to handlers behind [`require_auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthedUser {
    pub uid: String,
    pub email: String,
}

/// Extract the token from an `Authorization` header value.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Reject requests without a valid bearer credential.
///
/// An unreachable identity provider yields 500, not 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .ok_or(CivicError::Unauthenticated)?
        .to_string();

    let identity = state.identity.verify_token(&token).await?;
    debug!(email = %identity.email, "request authenticated");
    request.extensions_mut().insert(AuthedUser {
        uid: identity.uid,
        email: identity.email,
    });
    Ok(next.run(request).await)
}

/// Reject callers without an admin staff record. Must run after [`require_auth`].
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let email = request
        .extensions()
        .get::<AuthedUser>()
        .map(|u| u.email.clone())
        .ok_or(CivicError::Unauthenticated)?;

    match staffs::get_staff_by_email(&state.db, &email).await? {
        Some(staff) if staff.is_admin() => Ok(next.run(request).await),
        _ => {
            debug!(email = %email, "admin access denied");
            Err(CivicError::Forbidden.into())
        }
    }
}

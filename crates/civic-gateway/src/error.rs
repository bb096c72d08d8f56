// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from domain errors to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use civic_core::CivicError;
use serde_json::json;
use thiserror::Error;

/// Error returned by every handler. Rendered as `{"message": ...}`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Rejected request input, or a failed staff provisioning call.
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Civic(#[from] CivicError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Civic(CivicError::Unauthenticated) => StatusCode::UNAUTHORIZED,
            ApiError::Civic(CivicError::Forbidden) => StatusCode::FORBIDDEN,
            ApiError::Civic(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Civic(CivicError::Unauthenticated) => "unauthorized access".to_string(),
            ApiError::Civic(CivicError::Forbidden) => "forbidden access".to_string(),
            other => other.to_string(),
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::from(CivicError::Unauthenticated).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(CivicError::Forbidden).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::BadRequest("EMAIL_EXISTS".into()).status(),
            StatusCode::BAD_REQUEST
        );
        let payment = CivicError::Payment {
            message: "gateway down".into(),
            source: None,
        };
        assert_eq!(
            ApiError::from(payment).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(CivicError::storage(std::io::Error::other("disk"))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn bad_request_message_is_verbatim() {
        let err = ApiError::BadRequest("EMAIL_EXISTS".into());
        assert_eq!(err.to_string(), "EMAIL_EXISTS");
    }
}

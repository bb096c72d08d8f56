// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Civic Connect backend.

use thiserror::Error;

/// The primary error type shared by every crate in the workspace.
#[derive(Debug, Error)]
pub enum CivicError {
    /// Configuration errors (invalid TOML, missing credentials, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Identity provider errors (token lookup or account creation failed).
    #[error("identity provider error: {message}")]
    Identity {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Payment gateway errors (session creation or retrieval failed).
    #[error("payment gateway error: {message}")]
    Payment {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Missing or invalid bearer credential.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Valid credential, insufficient role.
    #[error("forbidden")]
    Forbidden,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CivicError {
    /// Wrap any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CivicError::Storage {
            source: Box::new(err),
        }
    }
}

// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity provider trait: bearer credential verification and account creation.

use async_trait::async_trait;

use crate::error::CivicError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{NewIdentityAccount, VerifiedIdentity};

/// Adapter for the external identity provider.
#[async_trait]
pub trait IdentityProvider: PluginAdapter {
    /// Verifies a bearer credential.
    ///
    /// Returns [`CivicError::Unauthenticated`] when the provider rejects the
    /// token, and [`CivicError::Identity`] when the provider cannot be reached.
    async fn verify_token(&self, token: &str) -> Result<VerifiedIdentity, CivicError>;

    /// Creates a sign-in account and returns its provider subject (uid).
    async fn create_account(&self, account: &NewIdentityAccount) -> Result<String, CivicError>;
}

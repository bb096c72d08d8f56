// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Civic Connect backend.
//!
//! Holds the domain records and closed enums, the shared error type, and the
//! adapter traits for the identity provider and payment gateway.

pub mod error;
pub mod traits;
pub mod types;

pub use error::CivicError;
pub use types::{AdapterType, HealthStatus};

pub use traits::{IdentityProvider, PaymentGateway, PluginAdapter};

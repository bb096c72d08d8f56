// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers, one module per resource.
//!
//! Missing entities answer 200 with `null` or an empty list. Expected
//! business conflicts answer 200 with a `message` field.

pub mod health;
pub mod issues;
pub mod payments;
pub mod staffs;
pub mod stats;
pub mod trackings;
pub mod users;

use civic_core::types::InsertResult;
use civic_storage::Registration;
use serde::Serialize;

/// Body of an email-unique registration: the insert result or a conflict message.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RegistrationResponse {
    Inserted(InsertResult),
    Conflict { message: &'static str },
}

impl RegistrationResponse {
    pub(crate) fn from_registration(outcome: Registration, conflict: &'static str) -> Self {
        match outcome {
            Registration::Created(result) => RegistrationResponse::Inserted(result),
            Registration::AlreadyExists => RegistrationResponse::Conflict { message: conflict },
        }
    }
}

/// Treat empty query values as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

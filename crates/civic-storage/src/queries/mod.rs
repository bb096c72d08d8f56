// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules, one per store, plus read-only aggregations.

use civic_core::types::InsertResult;

pub mod issues;
pub mod payments;
pub mod staffs;
pub mod stats;
pub mod trackings;
pub mod users;

/// Outcome of an email-unique account insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// A new record was written.
    Created(InsertResult),
    /// A record with the same email already exists; nothing was written.
    AlreadyExists,
}

/// `true` when a rusqlite error is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

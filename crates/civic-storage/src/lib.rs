// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Civic Connect backend.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single
//! background connection via `tokio-rusqlite`, and one query module per
//! store (issues, trackings, users, staffs, payments) plus read-only stats.

pub mod database;
pub mod migrations;
pub mod queries;

pub use database::Database;
pub use queries::Registration;

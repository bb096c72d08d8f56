// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP API for the Civic Connect backend.
//!
//! Routes are split into three tiers: public, bearer-token, and admin. The
//! identity gate lives in [`auth`], error-to-status mapping in [`error`], and
//! one handler module per resource in [`handlers`].

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod server;

pub use auth::AuthedUser;
pub use error::ApiError;
pub use extract::ApiJson;
pub use server::{build_router, start_server, AppState};

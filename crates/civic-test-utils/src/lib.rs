// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Civic Connect integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockIdentity`] - Identity provider with a fixed token table
//! - [`MockGateway`] - In-memory checkout sessions that tests mark as paid
//! - [`TestHarness`] - Full router over a temp SQLite database

pub mod harness;
pub mod mock_gateway;
pub mod mock_identity;

pub use harness::TestHarness;
pub use mock_gateway::MockGateway;
pub use mock_identity::MockIdentity;

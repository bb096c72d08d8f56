// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits for the external collaborators of the backend.
//!
//! Every adapter extends [`PluginAdapter`] and uses `#[async_trait]` so the
//! gateway can hold them as `Arc<dyn ...>`.

pub mod adapter;
pub mod identity;
pub mod payment;

pub use adapter::PluginAdapter;
pub use identity::IdentityProvider;
pub use payment::PaymentGateway;

// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `civic serve` command implementation.
//!
//! Opens the SQLite store, builds the identity and payment adapters, and
//! serves the HTTP API until a shutdown signal arrives. The store is
//! checkpointed and closed after the server drains.

use std::sync::Arc;

use civic_config::model::CivicConfig;
use civic_core::error::CivicError;
use civic_core::traits::{IdentityProvider, PaymentGateway};
use civic_gateway::{start_server, AppState};
use civic_identity::ToolkitIdentity;
use civic_payments::CheckoutGateway;
use civic_storage::Database;
use tracing::info;

use crate::shutdown;

/// Runs the server with the given configuration.
pub async fn run_serve(config: CivicConfig) -> Result<(), CivicError> {
    init_tracing(&config.server.log_level);

    let db = Database::open_with(&config.storage).await?;
    info!(path = %config.storage.database_path, "database opened");

    let identity: Arc<dyn IdentityProvider> = Arc::new(ToolkitIdentity::new(&config.identity)?);
    let gateway: Arc<dyn PaymentGateway> = Arc::new(CheckoutGateway::new(&config.payment)?);
    let state = AppState::new(db.clone(), identity, gateway, config.payment.clone());

    let cancel = shutdown::install_signal_handler();
    let shutdown_signal = {
        let cancel = cancel.clone();
        async move { cancel.cancelled().await }
    };

    let served = start_server(&config.server, state, shutdown_signal).await;
    cancel.cancel();

    db.close().await?;
    served?;
    info!("civic serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("civic={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP server built on axum.
//!
//! Sets up routes, the identity gate, and shared state.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use civic_config::model::{PaymentConfig, ServerConfig};
use civic_core::traits::{IdentityProvider, PaymentGateway};
use civic_core::CivicError;
use civic_payments::Reconciler;
use civic_storage::Database;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{require_admin, require_auth};
use crate::handlers::{health, issues, payments, staffs, stats, trackings, users};

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub identity: Arc<dyn IdentityProvider>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub reconciler: Arc<Reconciler>,
    /// Process start time for uptime reporting.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        db: Database,
        identity: Arc<dyn IdentityProvider>,
        gateway: Arc<dyn PaymentGateway>,
        payment: PaymentConfig,
    ) -> Self {
        let reconciler = Arc::new(Reconciler::new(db.clone(), gateway.clone(), payment));
        Self {
            db,
            identity,
            gateway,
            reconciler,
            start_time: Instant::now(),
        }
    }
}

/// Build the full router.
///
/// Three tiers share paths where methods differ: public routes, routes
/// behind [`require_auth`], and routes behind both gates.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::get_health))
        .route("/issues", get(issues::list_issues))
        .route("/latest-issues", get(issues::latest_issues))
        .route("/users", post(users::signup))
        .route("/staffs", post(staffs::self_register));

    let token_routes = Router::new()
        .route("/issues", post(issues::create_issue))
        .route(
            "/issues/{id}",
            get(issues::get_issue)
                .patch(issues::update_issue)
                .delete(issues::delete_issue),
        )
        .route("/issues/{id}/change-status", patch(issues::change_status))
        .route("/issues/{id}/upvote", patch(issues::upvote))
        .route("/issues/trackings", post(trackings::add_tracking))
        .route("/issues/trackings/{id}", get(trackings::list_trackings))
        .route("/users", get(users::list_users))
        .route("/users/{id}", patch(users::update_profile))
        .route("/user/role/{email}", get(users::get_role))
        .route("/staffs", get(staffs::list_staffs))
        .route("/staffs/{id}", patch(staffs::update_staff))
        .route("/payments", get(payments::list_payments))
        .route(
            "/payments/subscribe/checkout",
            post(payments::subscribe_checkout),
        )
        .route("/update-subscription", patch(payments::confirm_subscription))
        .route(
            "/payments/boost-issue/checkout",
            post(payments::boost_checkout),
        )
        .route("/update-boost", patch(payments::confirm_boost))
        .route("/stats/users", get(stats::user_stats))
        .route("/stats/staffs", get(stats::staff_stats))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // Layers run outermost-last: authentication first, then the admin check.
    let admin_routes = Router::new()
        .route("/admin/create-staff", post(staffs::create_staff))
        .route("/staffs/{id}", axum::routing::delete(staffs::delete_staff))
        .route("/stats/admin", get(stats::admin_stats))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(token_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind to `config.host:config.port` and serve until `shutdown` resolves.
pub async fn start_server<F>(
    config: &ServerConfig,
    state: AppState,
    shutdown: F,
) -> Result<(), CivicError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CivicError::Internal(format!("failed to bind to {addr}: {e}")))?;

    tracing::info!("HTTP server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| CivicError::Internal(format!("server error: {e}")))?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

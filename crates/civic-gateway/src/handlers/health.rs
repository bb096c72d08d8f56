// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use axum::{extract::State, Json};
use civic_core::traits::PluginAdapter;
use civic_core::types::{AdapterType, HealthStatus};
use serde::Serialize;

use crate::server::AppState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `ok` when every adapter is healthy, otherwise `degraded`.
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub adapters: Vec<AdapterHealth>,
}

#[derive(Debug, Serialize)]
pub struct AdapterHealth {
    pub name: String,
    #[serde(rename = "type")]
    pub adapter_type: AdapterType,
    pub status: String,
}

async fn check_adapter<A: PluginAdapter + ?Sized>(adapter: &A) -> AdapterHealth {
    let status = match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => "healthy".to_string(),
        Ok(HealthStatus::Degraded(reason)) => format!("degraded: {reason}"),
        Ok(HealthStatus::Unhealthy(reason)) => format!("unhealthy: {reason}"),
        Err(e) => format!("unhealthy: {e}"),
    };
    AdapterHealth {
        name: adapter.name().to_string(),
        adapter_type: adapter.adapter_type(),
        status,
    }
}

/// GET /health
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let adapters = vec![
        check_adapter(&state.db).await,
        check_adapter(state.identity.as_ref()).await,
        check_adapter(state.gateway.as_ref()).await,
    ];
    let healthy = adapters.iter().all(|a| a.status == "healthy");
    Json(HealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        adapters,
    })
}

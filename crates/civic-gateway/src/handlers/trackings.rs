// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use axum::{
    extract::{Path, State},
    Json,
};
use civic_core::types::{InsertResult, Tracking, TrackingKind};
use civic_storage::queries::trackings;
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::server::AppState;

/// Body of `POST /issues/trackings`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrackingBody {
    pub issue_id: String,
    pub issue_status: Option<String>,
    #[serde(default)]
    pub issue_note: String,
}

/// GET /issues/trackings/{id}
pub async fn list_trackings(
    State(state): State<AppState>,
    Path(issue_id): Path<String>,
) -> Result<Json<Vec<Tracking>>, ApiError> {
    Ok(Json(trackings::list_for_issue(&state.db, &issue_id).await?))
}

/// POST /issues/trackings
pub async fn add_tracking(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewTrackingBody>,
) -> Result<Json<InsertResult>, ApiError> {
    let kind = TrackingKind::classify(&body.issue_note);
    let entry = Tracking::new(body.issue_id, body.issue_status, body.issue_note, kind);
    Ok(Json(trackings::insert_tracking(&state.db, &entry).await?))
}

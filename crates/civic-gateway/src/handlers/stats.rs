// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dashboard aggregates for citizens, staff and admins.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{FixedOffset, Utc};
use civic_core::types::{AssignedTask, Issue, Payment, StatusCount, User};
use civic_storage::queries::stats::{self, IssueScope};
use serde::{Deserialize, Serialize};

use crate::auth::AuthedUser;
use crate::error::ApiError;
use crate::server::AppState;

/// Rows per "latest" list on the admin dashboard.
const RECENT_LIMIT: u32 = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub status_counts: Vec<StatusCount>,
    pub total_issues: u64,
    pub total_paid: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffStatsQuery {
    /// Caller's UTC offset in minutes east of UTC. Defaults to UTC.
    pub tz_offset_minutes: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffStats {
    pub status_counts: Vec<StatusCount>,
    pub total_assigned: u64,
    pub todays_tasks: Vec<AssignedTask>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub status_counts: Vec<StatusCount>,
    pub total_issues: u64,
    pub total_users: u64,
    pub total_staffs: u64,
    pub total_revenue: i64,
    pub latest_issues: Vec<Issue>,
    pub latest_users: Vec<User>,
    pub latest_payments: Vec<Payment>,
}

fn total(counts: &[StatusCount]) -> u64 {
    counts.iter().map(|c| c.count).sum()
}

fn utc_offset(minutes: Option<i32>) -> Result<FixedOffset, ApiError> {
    let minutes = minutes.unwrap_or(0);
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| ApiError::BadRequest(format!("invalid tzOffsetMinutes `{minutes}`")))
}

/// GET /stats/users
pub async fn user_stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
) -> Result<Json<UserStats>, ApiError> {
    let status_counts =
        stats::status_counts(&state.db, &IssueScope::Reporter(user.email.clone())).await?;
    let total_paid = stats::payment_total(&state.db, Some(&user.email)).await?;
    Ok(Json(UserStats {
        total_issues: total(&status_counts),
        status_counts,
        total_paid,
    }))
}

/// GET /stats/staffs
pub async fn staff_stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Query(query): Query<StaffStatsQuery>,
) -> Result<Json<StaffStats>, ApiError> {
    let offset = utc_offset(query.tz_offset_minutes)?;
    let status_counts =
        stats::status_counts(&state.db, &IssueScope::Assignee(user.email.clone())).await?;
    let (start, end) = stats::local_day_bounds(Utc::now(), offset);
    let todays_tasks = stats::assigned_tasks(&state.db, &user.email, &start, &end).await?;
    Ok(Json(StaffStats {
        total_assigned: total(&status_counts),
        status_counts,
        todays_tasks,
    }))
}

/// GET /stats/admin
pub async fn admin_stats(State(state): State<AppState>) -> Result<Json<AdminStats>, ApiError> {
    let status_counts = stats::status_counts(&state.db, &IssueScope::All).await?;
    let (total_users, total_staffs) = stats::account_counts(&state.db).await?;
    Ok(Json(AdminStats {
        total_issues: total(&status_counts),
        status_counts,
        total_users,
        total_staffs,
        total_revenue: stats::payment_total(&state.db, None).await?,
        latest_issues: stats::recent_issues(&state.db, RECENT_LIMIT).await?,
        latest_users: stats::recent_users(&state.db, RECENT_LIMIT).await?,
        latest_payments: stats::recent_payments(&state.db, RECENT_LIMIT).await?,
    }))
}

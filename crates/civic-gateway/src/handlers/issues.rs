// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Issue lifecycle endpoints.

use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use civic_core::types::{
    DeleteResult, InsertResult, Issue, IssueFilter, IssuePatch, IssueStatus, NewIssue, Person,
    UpdateResult,
};
use civic_storage::queries::issues;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::non_empty;
use crate::auth::AuthedUser;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::server::AppState;

/// Number of issues returned by `GET /latest-issues`.
const LATEST_ISSUES_LIMIT: u32 = 6;

const UPVOTE_REFUSED: &str = "already upvoted or self-upvote";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListIssuesQuery {
    pub status: Option<String>,
    pub except_status: Option<String>,
    /// Reporter email.
    pub email: Option<String>,
    pub staff_email: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub skip: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct IssueListResponse {
    pub result: Vec<Issue>,
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub struct LatestIssuesQuery {
    pub status: Option<String>,
}

/// Body of `POST /issues`. Lifecycle fields sent by the caller are ignored.
#[derive(Debug, Deserialize)]
pub struct CreateIssueBody {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusBody {
    pub status: IssueStatus,
    pub note: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpvoteResponse {
    pub upvoted: bool,
    pub already_upvoted: bool,
    pub total_upvotes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

fn parse_status(raw: Option<String>) -> Result<Option<IssueStatus>, ApiError> {
    non_empty(raw)
        .map(|s| {
            IssueStatus::from_str(&s)
                .map_err(|_| ApiError::BadRequest(format!("unknown issue status `{s}`")))
        })
        .transpose()
}

/// GET /issues
pub async fn list_issues(
    State(state): State<AppState>,
    Query(query): Query<ListIssuesQuery>,
) -> Result<Json<IssueListResponse>, ApiError> {
    let filter = IssueFilter {
        status: parse_status(query.status)?,
        except_status: parse_status(query.except_status)?,
        reporter_email: non_empty(query.email),
        staff_email: non_empty(query.staff_email),
        category: non_empty(query.category),
        search: non_empty(query.search),
        limit: query.limit,
        skip: query.skip,
    };
    let page = issues::list_issues(&state.db, &filter).await?;
    Ok(Json(IssueListResponse {
        result: page.issues,
        total: page.total,
    }))
}

/// GET /issues/{id}
pub async fn get_issue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Option<Issue>>, ApiError> {
    Ok(Json(issues::get_issue(&state.db, &id).await?))
}

/// GET /latest-issues
pub async fn latest_issues(
    State(state): State<AppState>,
    Query(query): Query<LatestIssuesQuery>,
) -> Result<Json<Vec<Issue>>, ApiError> {
    let status = parse_status(query.status)?;
    Ok(Json(
        issues::latest_issues(&state.db, status, LATEST_ISSUES_LIMIT).await?,
    ))
}

/// POST /issues
///
/// The reporter email falls back to the caller's verified email.
pub async fn create_issue(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    ApiJson(body): ApiJson<CreateIssueBody>,
) -> Result<Json<InsertResult>, ApiError> {
    let issue = Issue::report(NewIssue {
        title: body.title,
        description: body.description,
        category: body.category,
        reported_by: Person {
            email: non_empty(body.email).or(Some(user.email)),
            name: body.name,
        },
        image: body.image,
        location: body.location,
    });
    let result = issues::insert_issue(&state.db, &issue).await?;
    info!(issue_id = %issue.id, "issue reported");
    Ok(Json(result))
}

/// PATCH /issues/{id}
pub async fn update_issue(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<IssuePatch>,
) -> Result<Json<UpdateResult>, ApiError> {
    Ok(Json(issues::update_issue(&state.db, &id, &patch).await?))
}

/// PATCH /issues/{id}/change-status
pub async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ChangeStatusBody>,
) -> Result<Json<UpdateResult>, ApiError> {
    let change = issues::change_status(&state.db, &id, body.status, body.note).await?;
    Ok(Json(change.result))
}

/// PATCH /issues/{id}/upvote
pub async fn upvote(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Path(id): Path<String>,
) -> Result<Json<UpvoteResponse>, ApiError> {
    let outcome = issues::upvote(&state.db, &id, &user.email).await?;
    Ok(Json(UpvoteResponse {
        upvoted: outcome.upvoted,
        already_upvoted: !outcome.upvoted,
        total_upvotes: outcome.total_upvotes,
        message: (!outcome.upvoted).then_some(UPVOTE_REFUSED),
    }))
}

/// DELETE /issues/{id}
pub async fn delete_issue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    let result = issues::delete_issue(&state.db, &id).await?;
    info!(issue_id = %id, deleted = result.deleted_count, "issue deleted");
    Ok(Json(result))
}

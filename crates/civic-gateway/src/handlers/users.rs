// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Citizen accounts and role lookup.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use civic_core::types::{NewUser, Role, UpdateResult, User, UserPatch};
use civic_storage::queries::{staffs, users};
use serde::{Deserialize, Serialize};

use super::{non_empty, RegistrationResponse};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    pub email: Option<String>,
}

/// Body of `POST /users`. Premium and role are never taken from the caller.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupBody {
    pub email: String,
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct RoleResponse {
    pub role: Option<Role>,
}

/// GET /users
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UsersQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    let email = non_empty(query.email);
    Ok(Json(users::list_users(&state.db, email.as_deref()).await?))
}

/// POST /users
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupBody>,
) -> Result<Json<RegistrationResponse>, ApiError> {
    if body.email.trim().is_empty() {
        return Err(ApiError::BadRequest("email is required".into()));
    }
    let user = User::signup(NewUser {
        email: body.email,
        display_name: body.display_name,
        photo_url: body.photo_url,
    });
    let outcome = users::register_user(&state.db, &user).await?;
    Ok(Json(RegistrationResponse::from_registration(
        outcome,
        "user already exists",
    )))
}

/// PATCH /users/{id}
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<UserPatch>,
) -> Result<Json<UpdateResult>, ApiError> {
    Ok(Json(users::update_profile(&state.db, &id, &patch).await?))
}

/// GET /user/role/{email}
///
/// Staff records win over user records; unknown emails have no role.
pub async fn get_role(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<RoleResponse>, ApiError> {
    if let Some(staff) = staffs::get_staff_by_email(&state.db, &email).await? {
        return Ok(Json(RoleResponse {
            role: Some(staff.role),
        }));
    }
    let role = users::get_user_by_email(&state.db, &email)
        .await?
        .map(|user| user.role);
    Ok(Json(RoleResponse { role }))
}

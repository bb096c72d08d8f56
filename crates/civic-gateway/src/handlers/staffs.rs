// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Staff accounts.
//!
//! Two creation paths share one email-uniqueness rule: admin provisioning,
//! which also opens an identity-provider account, and self-registration,
//! which does not.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use civic_core::types::{
    DeleteResult, NewIdentityAccount, NewStaff, Staff, StaffPatch, UpdateResult,
};
use civic_core::CivicError;
use civic_storage::queries::staffs;
use civic_storage::Registration;
use serde::Deserialize;
use tracing::{info, warn};

use super::RegistrationResponse;
use crate::auth::AuthedUser;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::server::AppState;

const ALREADY_STAFF: &str = "already registered as a staff";

/// Body of `POST /admin/create-staff`.
#[derive(Debug, Deserialize)]
pub struct CreateStaffBody {
    pub name: Option<String>,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

/// Body of `POST /staffs`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfRegisterBody {
    pub display_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

/// GET /staffs
pub async fn list_staffs(State(state): State<AppState>) -> Result<Json<Vec<Staff>>, ApiError> {
    Ok(Json(staffs::list_staffs(&state.db).await?))
}

/// POST /staffs
pub async fn self_register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SelfRegisterBody>,
) -> Result<Json<RegistrationResponse>, ApiError> {
    if body.email.trim().is_empty() {
        return Err(ApiError::BadRequest("email is required".into()));
    }
    let staff = Staff::self_registered(NewStaff {
        display_name: body.display_name,
        email: body.email,
        phone: body.phone,
        photo_url: body.photo_url,
    });
    let outcome = staffs::register_staff(&state.db, &staff).await?;
    Ok(Json(RegistrationResponse::from_registration(
        outcome,
        ALREADY_STAFF,
    )))
}

/// POST /admin/create-staff
///
/// A duplicate email short-circuits before the identity provider is called.
/// Provider rejections answer 400.
pub async fn create_staff(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateStaffBody>,
) -> Result<(StatusCode, Json<RegistrationResponse>), ApiError> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::BadRequest("email and password are required".into()));
    }
    if staffs::get_staff_by_email(&state.db, &body.email)
        .await?
        .is_some()
    {
        return Ok((
            StatusCode::OK,
            Json(RegistrationResponse::Conflict {
                message: ALREADY_STAFF,
            }),
        ));
    }

    let account = NewIdentityAccount {
        email: body.email.clone(),
        password: body.password,
        display_name: body.name.clone(),
        photo_url: body.photo_url.clone(),
    };
    let uid = match state.identity.create_account(&account).await {
        Ok(uid) => uid,
        Err(CivicError::Identity { message, .. }) => {
            warn!(email = %account.email, "identity account creation rejected: {message}");
            return Err(ApiError::BadRequest(message));
        }
        Err(e) => return Err(e.into()),
    };

    let staff = Staff::provisioned(
        NewStaff {
            display_name: body.name,
            email: body.email,
            phone: body.phone,
            photo_url: body.photo_url,
        },
        uid,
    );
    match staffs::register_staff(&state.db, &staff).await? {
        Registration::Created(result) => {
            info!(staff_id = %staff.id, "staff provisioned");
            Ok((
                StatusCode::CREATED,
                Json(RegistrationResponse::Inserted(result)),
            ))
        }
        // Lost a race with a concurrent registration of the same email.
        Registration::AlreadyExists => Ok((
            StatusCode::OK,
            Json(RegistrationResponse::Conflict {
                message: ALREADY_STAFF,
            }),
        )),
    }
}

/// PATCH /staffs/{id}
///
/// Admins may change any field of any record. Other callers may only edit
/// their own record, and never its status or role.
pub async fn update_staff(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<StaffPatch>,
) -> Result<Json<UpdateResult>, ApiError> {
    let caller = staffs::get_staff_by_email(&state.db, &user.email).await?;
    let patch = match caller {
        Some(staff) if staff.is_admin() => patch,
        Some(staff) if staff.id == id => patch.self_service(),
        _ => return Err(CivicError::Forbidden.into()),
    };
    Ok(Json(staffs::update_staff(&state.db, &id, &patch).await?))
}

/// DELETE /staffs/{id}
pub async fn delete_staff(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    let result = staffs::delete_staff(&state.db, &id).await?;
    info!(staff_id = %id, deleted = result.deleted_count, "staff deleted");
    Ok(Json(result))
}

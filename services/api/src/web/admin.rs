//! services/api/src/web/admin.rs
//!
//! Administrator endpoints: verification review and role assignment.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use compliance_core::{Role, VerificationRecord, VerificationStatus};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::{
    error::{ErrorBody, HttpError},
    state::{AppState, Caller},
};

#[derive(Deserialize, ToSchema)]
pub struct RolesRequest {
    /// The complete new role set, e.g. `["manager"]`.
    pub roles: Vec<String>,
}

/// Returns the admin's id, or 403 for any other caller.
async fn require_admin(state: &AppState, caller: Caller) -> Result<Uuid, HttpError> {
    let user_id = caller.account().ok_or_else(HttpError::unauthorized)?;
    let identity = state
        .identity
        .resolve_within_deadline(user_id)
        .await
        .ok_or_else(HttpError::unauthorized)?;
    if !identity.roles.contains(Role::Admin) {
        return Err(HttpError::forbidden("Administrator role required"));
    }
    Ok(user_id)
}

async fn review(
    state: &AppState,
    caller: Caller,
    target: Uuid,
    status: VerificationStatus,
) -> Result<Json<VerificationRecord>, HttpError> {
    let admin_id = require_admin(state, caller).await?;
    let record = state
        .accounts
        .set_verification_status(target, status)
        .await?;
    info!(
        "Admin {} marked verification of {} as {}",
        admin_id,
        target,
        status.as_str()
    );
    Ok(Json(record))
}

/// POST /admin/verifications/{user_id}/approve
#[utoipa::path(
    post,
    path = "/admin/verifications/{user_id}/approve",
    params(("user_id" = Uuid, Path, description = "Account whose submission is reviewed")),
    responses(
        (status = 200, description = "Verification approved"),
        (status = 403, description = "Administrator role required", body = ErrorBody),
        (status = 404, description = "No submission for this account", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn approve_verification_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<VerificationRecord>, HttpError> {
    review(&state, caller, user_id, VerificationStatus::Approved).await
}

/// POST /admin/verifications/{user_id}/reject
#[utoipa::path(
    post,
    path = "/admin/verifications/{user_id}/reject",
    params(("user_id" = Uuid, Path, description = "Account whose submission is reviewed")),
    responses(
        (status = 200, description = "Verification rejected"),
        (status = 403, description = "Administrator role required", body = ErrorBody),
        (status = 404, description = "No submission for this account", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn reject_verification_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<VerificationRecord>, HttpError> {
    review(&state, caller, user_id, VerificationStatus::Rejected).await
}

/// PUT /admin/users/{user_id}/roles - Replace an account's roles
#[utoipa::path(
    put,
    path = "/admin/users/{user_id}/roles",
    params(("user_id" = Uuid, Path, description = "Account to update")),
    request_body = RolesRequest,
    responses(
        (status = 204, description = "Roles replaced"),
        (status = 400, description = "Unknown role", body = ErrorBody),
        (status = 403, description = "Administrator role required", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn set_roles_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<Uuid>,
    body: Result<Json<RolesRequest>, JsonRejection>,
) -> Result<StatusCode, HttpError> {
    let admin_id = require_admin(&state, caller).await?;
    let Json(req) = body?;
    let roles = req
        .roles
        .iter()
        .map(|r| r.parse::<Role>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    state.accounts.set_roles(user_id, &roles).await?;
    info!("Admin {} set roles of {} to {:?}", admin_id, user_id, roles);
    Ok(StatusCode::NO_CONTENT)
}

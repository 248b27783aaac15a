//! services/api/src/web/identity.rs
//!
//! Endpoints that expose the resolved identity and the routing decisions built on it.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use compliance_core::{
    land, LandingState, Persona, Resolution, Role, RouteAccess, RouteGuard, VerificationRecord,
    VerificationSubmission,
};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr, sync::Arc};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::web::{
    error::{ErrorBody, HttpError},
    state::{AppState, Caller},
};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    pub user_id: Uuid,
    /// Held roles, highest priority first.
    #[schema(value_type = Vec<String>)]
    pub roles: Vec<Role>,
    #[schema(value_type = Option<String>)]
    pub primary_role: Option<Role>,
    #[schema(value_type = Option<String>)]
    pub persona: Option<Persona>,
    pub verified: bool,
}

#[derive(Deserialize, IntoParams)]
pub struct LandingQuery {
    /// The path the user was trying to reach.
    pub from: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LandingResponse {
    /// `unauthenticated`, `needs_role_selection`, `needs_verification` or `landed`.
    pub state: String,
    pub redirect_to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_to: Option<String>,
}

#[derive(Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct RouteAccessRequest {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub personas: Vec<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteAccessResponse {
    pub granted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct PersonaRequest {
    /// e.g. `company_owner`, `external_ca`, `in_house_lawyer`.
    pub persona: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub full_name: String,
    pub license_number: Option<String>,
    pub organization: Option<String>,
    pub document_url: Option<String>,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Resolves the caller for a routing decision. A lookup past its deadline counts as logged out.
async fn resolution_for(state: &AppState, caller: Caller) -> Resolution {
    match caller.account() {
        None => Resolution::Anonymous,
        Some(user_id) => state.identity.resolve_within_deadline(user_id).await.into(),
    }
}

fn parse_one<T>(raw: &str) -> Result<T, HttpError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse::<T>()
        .map_err(|e| HttpError::bad_request(e.to_string()))
}

fn parse_all<T>(raw: &[String]) -> Result<Vec<T>, HttpError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.iter().map(|value| parse_one(value)).collect()
}

fn require_account(caller: Caller) -> Result<Uuid, HttpError> {
    caller.account().ok_or_else(HttpError::unauthorized)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /me - The caller's roles, persona and verification state
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Resolved identity", body = IdentityResponse),
        (status = 401, description = "Not logged in", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<IdentityResponse>, HttpError> {
    let user_id = require_account(caller)?;
    let identity = state
        .identity
        .resolve_within_deadline(user_id)
        .await
        .ok_or_else(HttpError::unauthorized)?;

    Ok(Json(IdentityResponse {
        user_id: identity.user_id,
        roles: identity.roles.by_priority(),
        primary_role: identity.primary_role(),
        persona: identity.persona,
        verified: identity.verified,
    }))
}

/// GET /me/landing - Where the caller should land after login
#[utoipa::path(
    get,
    path = "/me/landing",
    params(LandingQuery),
    responses(
        (status = 200, description = "Landing decision", body = LandingResponse)
    ),
    security((), ("bearer" = []))
)]
pub async fn landing_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<LandingQuery>,
) -> Json<LandingResponse> {
    let resolution = resolution_for(&state, caller).await;
    let landing = land(&resolution, query.from.as_deref());

    // The server only answers once resolution is settled, so there is always a destination.
    let redirect_to = landing
        .destination()
        .map(|d| d.path().to_string())
        .unwrap_or_default();
    let return_to = match &landing {
        LandingState::Unauthenticated { return_to } => return_to.clone(),
        _ => None,
    };

    Json(LandingResponse {
        state: landing.name().to_string(),
        redirect_to,
        return_to,
    })
}

/// POST /me/route-access - Check the caller against a dashboard's allow-lists
#[utoipa::path(
    post,
    path = "/me/route-access",
    request_body = RouteAccessRequest,
    responses(
        (status = 200, description = "Access decision", body = RouteAccessResponse),
        (status = 400, description = "Unknown role or persona", body = ErrorBody)
    ),
    security((), ("bearer" = []))
)]
pub async fn route_access_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    body: Result<Json<RouteAccessRequest>, JsonRejection>,
) -> Result<Json<RouteAccessResponse>, HttpError> {
    let Json(req) = body?;
    let guard = RouteGuard::new(parse_all(&req.roles)?, parse_all(&req.personas)?);

    let resolution = resolution_for(&state, caller).await;
    let response = match guard.check(&resolution) {
        RouteAccess::Granted => RouteAccessResponse {
            granted: true,
            redirect_to: None,
        },
        RouteAccess::Redirect(destination) => RouteAccessResponse {
            granted: false,
            redirect_to: Some(destination.path().to_string()),
        },
        // Resolution has already finished by the time we check.
        RouteAccess::Checking => RouteAccessResponse {
            granted: false,
            redirect_to: None,
        },
    };
    Ok(Json(response))
}

/// PUT /me/persona - Record the caller's role-chooser selection
///
/// Only accepted while no persona is stored. Any verification on file must be resubmitted.
#[utoipa::path(
    put,
    path = "/me/persona",
    request_body = PersonaRequest,
    responses(
        (status = 204, description = "Persona saved"),
        (status = 400, description = "Unknown persona", body = ErrorBody),
        (status = 401, description = "Not logged in", body = ErrorBody),
        (status = 409, description = "A persona is already selected", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn set_persona_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    body: Result<Json<PersonaRequest>, JsonRejection>,
) -> Result<StatusCode, HttpError> {
    let user_id = require_account(caller)?;
    let Json(req) = body?;
    let persona: Persona = parse_one(&req.persona)?;

    state.accounts.set_persona(user_id, persona).await?;
    info!("Account {} selected persona {}", user_id, persona);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /me/verification - Submit credentials for review
#[utoipa::path(
    post,
    path = "/me/verification",
    request_body = VerificationRequest,
    responses(
        (status = 201, description = "Submitted; status is pending"),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 401, description = "Not logged in", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn submit_verification_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    body: Result<Json<VerificationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = require_account(caller)?;
    let Json(req) = body?;
    let full_name = req.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(HttpError::bad_request("fullName is required"));
    }

    let submission = VerificationSubmission {
        full_name,
        license_number: req.license_number,
        organization: req.organization,
        document_url: req.document_url,
    };
    let record: VerificationRecord = state
        .accounts
        .submit_verification(user_id, &submission)
        .await?;
    info!("Account {} submitted verification", user_id);

    Ok((StatusCode::CREATED, Json(record)))
}

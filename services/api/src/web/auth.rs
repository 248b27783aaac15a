//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for account signup, login, and logout.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use compliance_core::{Persona, PortError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::{
    error::{ErrorBody, HttpError},
    middleware::session_token,
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 8;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    /// Optional role-chooser selection, e.g. `external_ca`.
    pub persona: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
    /// Bearer token for the `Authorization` header.
    pub token: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Creates a bearer session and the matching cookie.
async fn open_session(state: &AppState, user_id: Uuid) -> Result<(String, String), HttpError> {
    let ttl = Duration::days(state.config.session_ttl_days);
    let auth_session_id = Uuid::new_v4().to_string();

    state
        .accounts
        .create_auth_session(&auth_session_id, user_id, Utc::now() + ttl)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            HttpError::internal()
        })?;

    let cookie = format!(
        "session={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        auth_session_id,
        ttl.num_seconds()
    );
    Ok((auth_session_id, cookie))
}

fn parse_persona(raw: Option<&str>) -> Result<Option<Persona>, HttpError> {
    raw.map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<Persona>())
        .transpose()
        .map_err(|e| HttpError::bad_request(e.to_string()))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let Json(req) = body?;
    let email = req.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(HttpError::bad_request("A valid email address is required"));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(HttpError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    let persona = parse_persona(req.persona.as_deref())?;

    // 1. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            HttpError::internal()
        })?
        .to_string();

    // 2. Create the account, then record the chosen persona
    let account = state
        .accounts
        .create_account(&email, &password_hash)
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => HttpError::from(e),
            other => {
                error!("Failed to create account: {:?}", other);
                HttpError::internal()
            }
        })?;

    if let Some(persona) = persona {
        state.accounts.set_persona(account.user_id, persona).await?;
    }

    // 3. Open a session
    let (token, cookie) = open_session(&state, account.user_id).await?;
    info!("Account {} created", account.user_id);

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            user_id: account.user_id,
            email: account.email,
            token,
        }),
    ))
}

/// POST /auth/login - Login with an existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let Json(req) = body?;
    let invalid = || HttpError::new(StatusCode::UNAUTHORIZED, "Invalid email or password");

    // 1. Get the account by email
    let creds = state
        .accounts
        .get_credentials_by_email(&req.email.trim().to_lowercase())
        .await
        .map_err(|e| {
            error!("Failed to get account: {:?}", e);
            invalid()
        })?;

    // 2. Verify the password
    let parsed_hash = PasswordHash::new(&creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        HttpError::internal()
    })?;

    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(invalid());
    }

    // 3. Open a session and sweep out expired ones
    let (token, cookie) = open_session(&state, creds.user_id).await?;
    match state.accounts.purge_expired_sessions().await {
        Ok(0) => {}
        Ok(purged) => info!("Purged {} expired auth sessions", purged),
        Err(e) => warn!("Failed to purge expired auth sessions: {:?}", e),
    }

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            user_id: creds.user_id,
            email: creds.email,
            token,
        }),
    ))
}

/// POST /auth/logout - Invalidate the current session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session", body = ErrorBody)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    let auth_session_id = session_token(&headers).ok_or_else(HttpError::unauthorized)?;

    state
        .accounts
        .delete_auth_session(&auth_session_id)
        .await
        .map_err(|e| {
            error!("Failed to delete auth session: {:?}", e);
            HttpError::internal()
        })?;

    let cookie = "session=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0";
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie.to_string())]))
}


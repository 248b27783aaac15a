//! services/api/src/web/middleware.rs
//!
//! Authentication and origin middleware.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use compliance_core::PortError;
use std::sync::Arc;
use tracing::{error, warn};

use crate::web::{
    error::HttpError,
    state::{AppState, Caller},
};

/// Reads the session token from `Authorization: Bearer` or the `session` cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    bearer.or_else(|| {
        headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())?
            .split(';')
            .find_map(|c| c.trim().strip_prefix("session="))
            .map(str::to_string)
            .filter(|t| !t.is_empty())
    })
}

/// Middleware that resolves the session token, if any, into a [`Caller`].
///
/// Never rejects: handlers decide whether an anonymous caller is acceptable.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let caller = match session_token(req.headers()) {
        None => Caller::Anonymous,
        Some(token) => match state.accounts.validate_auth_session(&token).await {
            Ok(user_id) => Caller::Account(user_id),
            Err(PortError::Unauthorized) => {
                warn!("Rejected unknown or expired session token");
                Caller::Anonymous
            }
            Err(e) => {
                error!("Failed to validate auth session: {:?}", e);
                Caller::Anonymous
            }
        },
    };

    req.extensions_mut().insert(caller);
    next.run(req).await
}

/// Middleware that returns 401 unless the request carries a valid session.
pub async fn require_auth(req: Request, next: Next) -> Response {
    match req.extensions().get::<Caller>() {
        Some(Caller::Account(_)) => next.run(req).await,
        _ => HttpError::unauthorized().into_response(),
    }
}

/// Middleware that returns 403 for browser origins outside the configured allow-list.
pub async fn enforce_origin(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match origin {
        Some(origin) if !state.config.origin_allowed(&origin) => {
            warn!("Blocked request from origin {}", origin);
            HttpError::forbidden("Origin not allowed").into_response()
        }
        _ => next.run(req).await,
    }
}

pub mod admin;
pub mod auth;
pub mod chat;
pub mod draft;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod rest;
pub mod sse;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use middleware::{authenticate, enforce_origin, require_auth};
use rest::ApiDoc;
use state::AppState;

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

fn cors_layer(config: Arc<Config>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _| {
                origin
                    .to_str()
                    .map(|o| config.origin_allowed(o))
                    .unwrap_or(false)
            },
        ))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
}

/// Builds the complete application: API routes, middleware stack and Swagger UI.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (handlers decide what an anonymous caller may do)
    let public_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/me/landing", get(identity::landing_handler))
        .route("/me/route-access", post(identity::route_access_handler))
        .route("/draft", post(draft::draft_handler))
        .route("/chat", post(chat::chat_handler));

    // Protected routes (a valid session is required)
    let protected_routes = Router::new()
        .route("/me", get(identity::me_handler))
        .route("/me/persona", put(identity::set_persona_handler))
        .route("/me/verification", post(identity::submit_verification_handler))
        .route(
            "/admin/verifications/{user_id}/approve",
            post(admin::approve_verification_handler),
        )
        .route(
            "/admin/verifications/{user_id}/reject",
            post(admin::reject_verification_handler),
        )
        .route("/admin/users/{user_id}/roles", put(admin::set_roles_handler))
        .route_layer(axum_middleware::from_fn(require_auth));

    // Layers run outermost-last: origin check, then CORS, then session resolution.
    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            authenticate,
        ))
        .layer(cors_layer(state.config.clone()))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            enforce_origin,
        ))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

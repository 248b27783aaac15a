//! services/api/src/web/rest.rs
//!
//! The health probe and the master definition for the OpenAPI specification.

use axum::Json;
use serde::Serialize;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

use crate::web::{admin, auth, chat, draft, error::ErrorBody, identity};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        identity::me_handler,
        identity::landing_handler,
        identity::route_access_handler,
        identity::set_persona_handler,
        identity::submit_verification_handler,
        admin::approve_verification_handler,
        admin::reject_verification_handler,
        admin::set_roles_handler,
        draft::draft_handler,
        chat::chat_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorBody,
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            identity::IdentityResponse,
            identity::LandingResponse,
            identity::RouteAccessRequest,
            identity::RouteAccessResponse,
            identity::PersonaRequest,
            identity::VerificationRequest,
            admin::RolesRequest,
            draft::DraftBody,
            draft::DraftResponse,
            chat::ChatBody,
            chat::ChatTurn,
            chat::TurnRole,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Compliance Platform API", description = "Identity routing, AI drafting of regulatory filings, and the compliance assistant.")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme referenced by protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

//=========================================================================================
// Health
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

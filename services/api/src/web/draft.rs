//! services/api/src/web/draft.rs
//!
//! The drafting endpoint: validates, optionally extracts, drafts and reviews.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use compliance_core::draft::{
    can_request_drafts, DraftMetadata, DraftMode, DraftOutcome, DraftRequest, NoticeIntelligence,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::web::{
    error::{ErrorBody, HttpError},
    sse,
    state::{AppState, Caller},
};

//=========================================================================================
// API Payloads
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DraftBody {
    pub document_type: String,
    pub company_name: String,
    /// `conservative`, `balanced` or `aggressive`; anything else drafts as `balanced`.
    #[serde(default)]
    pub draft_mode: Option<String>,
    pub industry: Option<String>,
    pub context: Option<String>,
    pub notice_details: Option<String>,
    #[serde(default)]
    pub advanced_mode: bool,
    #[serde(default)]
    pub strict_validation: bool,
    #[serde(default)]
    pub stream: bool,
}

impl From<DraftBody> for DraftRequest {
    fn from(body: DraftBody) -> Self {
        DraftRequest {
            document_type: body.document_type,
            company_name: body.company_name,
            draft_mode: body
                .draft_mode
                .as_deref()
                .map(DraftMode::parse_or_default)
                .unwrap_or_default(),
            industry: body.industry,
            context: body.context,
            notice_details: body.notice_details,
            advanced_mode: body.advanced_mode,
            strict_validation: body.strict_validation,
            stream: body.stream,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct DraftResponse {
    pub draft: String,
    #[schema(value_type = Object)]
    pub metadata: DraftMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub intelligence: Option<NoticeIntelligence>,
}

impl From<DraftOutcome> for DraftResponse {
    fn from(outcome: DraftOutcome) -> Self {
        Self {
            draft: outcome.draft,
            metadata: outcome.metadata,
            intelligence: outcome.intelligence,
        }
    }
}

//=========================================================================================
// Handler
//=========================================================================================

/// Only managers (CAs) and admins may draft when auth is enforced.
async fn authorize(state: &AppState, caller: Caller) -> Result<(), HttpError> {
    if !state.config.enforce_auth {
        return Ok(());
    }
    let user_id = caller.account().ok_or_else(HttpError::unauthorized)?;
    let identity = state
        .identity
        .resolve_within_deadline(user_id)
        .await
        .ok_or_else(HttpError::unauthorized)?;
    if !can_request_drafts(&identity) {
        return Err(HttpError::forbidden(
            "Drafting is available to Chartered Accountants and administrators only",
        ));
    }
    Ok(())
}

/// Generate a regulatory filing.
///
/// Streams `text/event-stream` when `stream` is set on a basic request;
/// advanced requests are always buffered.
#[utoipa::path(
    post,
    path = "/draft",
    request_body = DraftBody,
    responses(
        (status = 200, description = "Draft generated (JSON or event stream)", body = DraftResponse),
        (status = 400, description = "Malformed request or notice too short", body = ErrorBody),
        (status = 401, description = "Authentication required", body = ErrorBody),
        (status = 402, description = "Upstream quota exhausted", body = ErrorBody),
        (status = 403, description = "Role or origin not permitted", body = ErrorBody),
        (status = 422, description = "Extraction failed or critical fields missing", body = ErrorBody),
        (status = 429, description = "Upstream rate limit", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn draft_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    body: Result<Json<DraftBody>, JsonRejection>,
) -> Result<Response, HttpError> {
    authorize(&state, caller).await?;
    let Json(body) = body?;

    let request = DraftRequest::from(body);
    let wants_stream = request.stream && !request.advanced_mode;
    info!(
        "Draft requested: type={} mode={} advanced={} strict={} stream={}",
        request.document_type,
        request.draft_mode.as_str(),
        request.advanced_mode,
        request.strict_validation,
        wants_stream
    );

    let prepared = state.drafts.prepare(request).await?;

    if wants_stream {
        let chunks = state.drafts.stream(&prepared).await?;
        return sse::relay(chunks).await;
    }

    let outcome = state.drafts.generate(prepared).await?;
    Ok(Json(DraftResponse::from(outcome)).into_response())
}

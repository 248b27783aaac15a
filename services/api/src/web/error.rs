//! services/api/src/web/error.rs
//!
//! Maps core errors onto HTTP statuses and a JSON error body.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use compliance_core::{draft::DraftError, ChatError, PortError};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

/// The JSON body of every error response.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
    pub missing_fields: Option<Vec<String>>,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            missing_fields: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Authentication required")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            missing_fields: self.missing_fields,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        HttpError::bad_request(rejection.body_text())
    }
}

impl From<PortError> for HttpError {
    fn from(e: PortError) -> Self {
        match e {
            PortError::Unauthorized => HttpError::unauthorized(),
            PortError::NotFound(what) => HttpError::new(StatusCode::NOT_FOUND, what),
            PortError::Conflict(what) => HttpError::new(StatusCode::CONFLICT, what),
            PortError::RateLimited(_) => HttpError::new(
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded. Please try again shortly.",
            ),
            PortError::QuotaExhausted(_) => HttpError::new(
                StatusCode::PAYMENT_REQUIRED,
                "AI usage quota exhausted. Please add credits to continue.",
            ),
            PortError::Timeout(detail) => {
                error!("Upstream timeout: {}", detail);
                HttpError::new(
                    StatusCode::GATEWAY_TIMEOUT,
                    "The AI service took too long to respond. Please try again.",
                )
            }
            PortError::Unexpected(detail) => {
                error!("Unexpected upstream failure: {}", detail);
                HttpError::internal()
            }
        }
    }
}

impl From<DraftError> for HttpError {
    fn from(e: DraftError) -> Self {
        match e {
            DraftError::NoticeTooShort { .. } => HttpError::bad_request(e.to_string()),
            DraftError::ExtractionFailed(_) => {
                HttpError::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            }
            DraftError::MissingCriticalFields(ref fields) => {
                let fields = fields.clone();
                HttpError {
                    status: StatusCode::UNPROCESSABLE_ENTITY,
                    message: e.to_string(),
                    missing_fields: Some(fields),
                }
            }
            DraftError::Upstream(port) => port.into(),
        }
    }
}

impl From<ChatError> for HttpError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::EmptyConversation => HttpError::bad_request(e.to_string()),
            ChatError::Upstream(port) => port.into(),
        }
    }
}

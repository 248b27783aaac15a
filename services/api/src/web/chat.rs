//! services/api/src/web/chat.rs
//!
//! The compliance assistant endpoint. Always answers with an event stream.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Response,
    Extension, Json,
};
use compliance_core::{ChatMessage, ChatRole};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::web::{
    error::{ErrorBody, HttpError},
    sse,
    state::{AppState, Caller},
};

#[derive(Deserialize, ToSchema, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

#[derive(Deserialize, ToSchema)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ChatBody {
    #[serde(default)]
    pub messages: Option<Vec<ChatTurn>>,
}

impl From<ChatTurn> for ChatMessage {
    fn from(turn: ChatTurn) -> Self {
        let role = match turn.role {
            TurnRole::User => ChatRole::User,
            TurnRole::Assistant => ChatRole::Assistant,
        };
        ChatMessage {
            role,
            content: turn.content,
        }
    }
}

/// Ask the compliance assistant. Relays upstream chunks verbatim, ending with `[DONE]`.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatBody,
    responses(
        (status = 200, description = "text/event-stream of completion chunks"),
        (status = 400, description = "Missing or empty messages", body = ErrorBody),
        (status = 401, description = "Authentication required", body = ErrorBody),
        (status = 402, description = "Upstream quota exhausted", body = ErrorBody),
        (status = 403, description = "Origin not allowed", body = ErrorBody),
        (status = 429, description = "Upstream rate limit", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Response, HttpError> {
    if state.config.enforce_auth && caller.account().is_none() {
        return Err(HttpError::unauthorized());
    }
    let Json(body) = body?;

    let messages: Vec<ChatMessage> = body
        .messages
        .unwrap_or_default()
        .into_iter()
        .map(ChatMessage::from)
        .collect();

    let chunks = state.chat.open(&messages).await?;
    sse::relay(chunks).await
}

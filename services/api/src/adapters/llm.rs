//! services/api/src/adapters/llm.rs
//!
//! This module contains the adapter for the hosted LLM gateway.
//! It implements the `LlmService` port from the `core` crate over any
//! OpenAI-compatible chat-completion endpoint.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use compliance_core::domain::{ChatMessage, ChatRole};
use compliance_core::ports::{ChunkStream, LlmService, PortError, PortResult};
use futures::StreamExt;
use serde_json::value::RawValue;
use std::time::Duration;
use tracing::error;

/// Builds a gateway client that never retries on its own. Throttling and server
/// errors surface on the first response so callers can report them as they are.
pub fn build_client(api_key: &str, api_base: &str) -> Client<OpenAIConfig> {
    let no_retry = backoff::ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build();
    Client::with_config(
        OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base),
    )
    .with_backoff(no_retry)
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `LlmService` using an OpenAI-compatible gateway.
#[derive(Clone)]
pub struct OpenAiGatewayAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiGatewayAdapter {
    /// Creates a new `OpenAiGatewayAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String, timeout: Duration) -> Self {
        Self {
            client,
            model,
            timeout,
        }
    }

    fn build_request(
        &self,
        system: &str,
        messages: &[ChatMessage],
        stream: bool,
    ) -> PortResult<CreateChatCompletionRequest> {
        let mut request_messages: Vec<ChatCompletionRequestMessage> =
            Vec::with_capacity(messages.len() + 1);

        request_messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        );

        for message in messages {
            let converted: ChatCompletionRequestMessage = match message.role {
                ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(message.content.as_str())
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
                ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(message.content.as_str())
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
            };
            request_messages.push(converted);
        }

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(request_messages);
        if stream {
            args.stream(true);
        }
        args.build()
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

//=========================================================================================
// Upstream Error Classification
//=========================================================================================

#[derive(Debug, PartialEq, Eq)]
enum Throttle {
    RateLimited,
    QuotaExhausted,
}

/// Recognises throttling in gateway error codes, types or status text.
fn classify_throttle(text: &str) -> Option<Throttle> {
    let text = text.to_ascii_lowercase();
    if text.contains("429") || text.contains("rate limit") || text.contains("rate_limit")
        || text.contains("too many requests")
    {
        Some(Throttle::RateLimited)
    } else if text.contains("402")
        || text.contains("payment required")
        || text.contains("payment_required")
        || text.contains("insufficient_quota")
        || text.contains("quota")
        || text.contains("credits")
    {
        Some(Throttle::QuotaExhausted)
    } else {
        None
    }
}

fn map_openai_error(e: OpenAIError) -> PortError {
    let signal = match &e {
        OpenAIError::ApiError(api) => format!(
            "{} {} {}",
            api.code.as_deref().unwrap_or_default(),
            api.r#type.as_deref().unwrap_or_default(),
            api.message
        ),
        other => other.to_string(),
    };
    match classify_throttle(&signal) {
        Some(Throttle::RateLimited) => PortError::RateLimited(e.to_string()),
        Some(Throttle::QuotaExhausted) => PortError::QuotaExhausted(e.to_string()),
        None => {
            error!("LLM gateway error: {}", e);
            PortError::Unexpected(e.to_string())
        }
    }
}

//=========================================================================================
// `LlmService` Trait Implementation
//=========================================================================================

#[async_trait]
impl LlmService for OpenAiGatewayAdapter {
    async fn complete(&self, system: &str, messages: &[ChatMessage]) -> PortResult<String> {
        let request = self.build_request(system, messages, false)?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| PortError::Timeout(format!("no completion within {:?}", self.timeout)))?
            .map_err(map_openai_error)?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("LLM response contained no text content.".to_string())
            })
    }

    async fn stream(&self, system: &str, messages: &[ChatMessage]) -> PortResult<ChunkStream> {
        let request = self.build_request(system, messages, true)?;
        let timeout = self.timeout;

        // Chunks are kept as raw JSON so gateway-specific fields reach the caller untouched.
        let chat = self.client.chat();
        let opened = chat
            .create_stream_byot::<_, Box<RawValue>>(request);
        let mut upstream = tokio::time::timeout(timeout, opened)
            .await
            .map_err(|_| PortError::Timeout(format!("stream not opened within {:?}", timeout)))?
            .map_err(map_openai_error)?;

        let chunks = async_stream::stream! {
            loop {
                match tokio::time::timeout(timeout, upstream.next()).await {
                    Err(_) => {
                        yield Err(PortError::Timeout(format!("no chunk within {:?}", timeout)));
                        break;
                    }
                    Ok(None) => break,
                    Ok(Some(Err(e))) => {
                        yield Err(map_openai_error(e));
                        break;
                    }
                    Ok(Some(Ok(chunk))) => yield Ok(chunk.get().to_string()),
                }
            }
        };

        Ok(Box::pin(chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// A gateway that answers every completion request with the same canned response.
    struct Gateway {
        status: StatusCode,
        content_type: &'static str,
        body: String,
        hits: AtomicUsize,
    }

    async fn answer(State(gateway): State<Arc<Gateway>>) -> impl IntoResponse {
        gateway.hits.fetch_add(1, Ordering::SeqCst);
        (
            gateway.status,
            [("content-type", gateway.content_type)],
            gateway.body.clone(),
        )
    }

    async fn serve(
        status: StatusCode,
        content_type: &'static str,
        body: &str,
    ) -> (Arc<Gateway>, OpenAiGatewayAdapter) {
        let gateway = Arc::new(Gateway {
            status,
            content_type,
            body: body.to_string(),
            hits: AtomicUsize::new(0),
        });
        let app = Router::new()
            .route("/v1/chat/completions", post(answer))
            .with_state(gateway.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = build_client("test-key", &format!("http://{}/v1", addr));
        let adapter =
            OpenAiGatewayAdapter::new(client, "test-model".to_string(), Duration::from_secs(5));
        (gateway, adapter)
    }

    fn question() -> Vec<ChatMessage> {
        vec![ChatMessage {
            role: ChatRole::User,
            content: "When is GSTR-3B due?".to_string(),
        }]
    }

    fn api_error(kind: &str, code: &str, message: &str) -> String {
        serde_json::json!({
            "error": { "message": message, "type": kind, "param": null, "code": code }
        })
        .to_string()
    }

    #[test]
    fn throttling_signals_are_recognised() {
        assert_eq!(
            classify_throttle("rate_limit_exceeded requests Too many requests"),
            Some(Throttle::RateLimited)
        );
        assert_eq!(
            classify_throttle("stream failed: Invalid status code: 429 Too Many Requests"),
            Some(Throttle::RateLimited)
        );
        assert_eq!(
            classify_throttle("insufficient_quota  You exceeded your current quota"),
            Some(Throttle::QuotaExhausted)
        );
        assert_eq!(
            classify_throttle("Invalid status code: 402 Payment Required"),
            Some(Throttle::QuotaExhausted)
        );
        assert_eq!(classify_throttle("model_not_found"), None);
    }

    #[tokio::test]
    async fn rate_limit_is_reported_after_a_single_attempt() {
        let body = api_error("requests", "rate_limit_exceeded", "Rate limit reached for requests");
        let (gateway, adapter) =
            serve(StatusCode::TOO_MANY_REQUESTS, "application/json", &body).await;

        let result = adapter.complete("You are terse.", &question()).await;

        assert!(matches!(result, Err(PortError::RateLimited(_))), "{:?}", result);
        assert_eq!(gateway.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn payment_required_is_quota_exhaustion() {
        let body = api_error("insufficient_quota", "payment_required", "Add credits to continue");
        let (gateway, adapter) =
            serve(StatusCode::PAYMENT_REQUIRED, "application/json", &body).await;

        let result = adapter.complete("You are terse.", &question()).await;

        assert!(matches!(result, Err(PortError::QuotaExhausted(_))), "{:?}", result);
        assert_eq!(gateway.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_error_is_not_retried() {
        let (gateway, adapter) = serve(
            StatusCode::INTERNAL_SERVER_ERROR,
            "text/plain",
            "upstream exploded",
        )
        .await;

        let result = adapter.complete("You are terse.", &question()).await;

        assert!(matches!(result, Err(PortError::Unexpected(_))), "{:?}", result);
        assert_eq!(gateway.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn streamed_chunks_are_relayed_verbatim() {
        let chunk = r#"{"id":"gen-1","object":"chat.completion.chunk","created":1718000000,"model":"test-model","provider":"Gateway","choices":[{"index":0,"delta":{"role":"assistant","content":"Due on the 20th."},"finish_reason":null,"native_finish_reason":null}],"usage":{"cost":0.00012}}"#;
        let body = format!("data: {}\n\ndata: [DONE]\n\n", chunk);
        let (gateway, adapter) = serve(StatusCode::OK, "text/event-stream", &body).await;

        let relayed: Vec<PortResult<String>> = adapter
            .stream("You are terse.", &question())
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(relayed.len(), 1);
        assert_eq!(relayed[0].as_deref().unwrap(), chunk);
        assert_eq!(gateway.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn throttled_stream_fails_on_its_first_item() {
        let body = api_error("requests", "rate_limit_exceeded", "Rate limit reached for requests");
        let (_gateway, adapter) =
            serve(StatusCode::TOO_MANY_REQUESTS, "application/json", &body).await;

        let mut relayed = adapter.stream("You are terse.", &question()).await.unwrap();

        assert!(matches!(relayed.next().await, Some(Err(PortError::RateLimited(_)))));
        assert!(relayed.next().await.is_none());
    }
}

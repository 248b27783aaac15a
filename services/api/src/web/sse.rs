//! services/api/src/web/sse.rs
//!
//! Relays an upstream chunk stream to the client as server-sent events.

use axum::response::{
    sse::{Event, Sse},
    IntoResponse, Response,
};
use compliance_core::ChunkStream;
use futures::StreamExt;
use std::convert::Infallible;
use tracing::error;

use crate::web::error::HttpError;

pub const DONE_MARKER: &str = "[DONE]";

/// Turns `chunks` into a `text/event-stream` response.
///
/// The first upstream item is awaited before any header is sent, so an upstream
/// that rejects the call up front (rate limit, quota) still yields its own status.
pub async fn relay(mut chunks: ChunkStream) -> Result<Response, HttpError> {
    let first = match chunks.next().await {
        Some(Err(e)) => return Err(e.into()),
        Some(Ok(chunk)) => Some(chunk),
        None => None,
    };

    let events = async_stream::stream! {
        if let Some(chunk) = first {
            yield Ok::<Event, Infallible>(Event::default().data(chunk));
            while let Some(item) = chunks.next().await {
                match item {
                    Ok(chunk) => yield Ok(Event::default().data(chunk)),
                    Err(e) => {
                        error!("Upstream stream failed mid-response: {}", e);
                        return;
                    }
                }
            }
        }
        yield Ok(Event::default().data(DONE_MARKER));
    };

    Ok(Sse::new(events).into_response())
}

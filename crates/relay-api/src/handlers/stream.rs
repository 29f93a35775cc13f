use axum::{
    extract::{rejection::JsonRejection, State},
    response::sse::{Event, Sse},
    Json,
};
use futures::stream::{Stream, StreamExt};
use relay_types::{ConversationRequest, ErrorBody, StreamEvent};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{error::ApiResult, routes::conversation::validate, state::AppState};

/// Stream a conversation as Server-Sent Events
///
/// One `data: <json>` record per event, written as soon as it is produced.
/// Dropping the connection cancels the vendor request.
#[utoipa::path(
    post,
    path = "/conversation_stream",
    request_body = ConversationRequest,
    responses(
        (status = 200, description = "Streaming deltas and status events", content_type = "text/event-stream"),
        (status = 400, description = "Malformed request", body = ErrorBody),
        (status = 404, description = "Unknown model", body = ErrorBody)
    ),
    tag = "conversation"
)]
pub async fn conversation_stream(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConversationRequest>, JsonRejection>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let Json(req) = payload?;
    validate(&req)?;

    tracing::debug!(
        model = %req.model_name,
        messages = req.messages.len(),
        show_reasoning = req.show_reasoning,
        "Starting conversation stream"
    );

    let receiver = state.service.spawn_conversation_stream(
        &req.model_name,
        req.messages,
        req.show_reasoning,
    )?;

    let sse_stream = ReceiverStream::new(receiver).map(|event| Ok::<_, Infallible>(to_sse_event(&event)));

    Ok(Sse::new(sse_stream))
}

fn to_sse_event(event: &StreamEvent) -> Event {
    Event::default().json_data(event).unwrap_or_else(|e| {
        tracing::error!("Failed to encode stream event: {}", e);
        Event::default().data(r#"{"error":"failed to encode stream event"}"#)
    })
}

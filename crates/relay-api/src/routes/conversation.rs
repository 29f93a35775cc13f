use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use relay_types::{ConversationReply, ConversationRequest, ErrorBody};
use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

pub(crate) fn validate(req: &ConversationRequest) -> ApiResult<()> {
    if req.messages.is_empty() {
        return Err(ApiError::BadRequest("messages must not be empty".to_string()));
    }
    Ok(())
}

/// Non-streaming conversation with reasoning/answer split
#[utoipa::path(
    post,
    path = "/conversation",
    request_body = ConversationRequest,
    responses(
        (status = 200, description = "Final answer", body = ConversationReply),
        (status = 400, description = "Malformed request", body = ErrorBody),
        (status = 404, description = "Unknown model", body = ErrorBody),
        (status = 502, description = "Vendor failure", body = ErrorBody)
    ),
    tag = "conversation"
)]
pub async fn conversation(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConversationRequest>, JsonRejection>,
) -> ApiResult<Json<ConversationReply>> {
    let Json(req) = payload?;
    validate(&req)?;

    let reply = state
        .service
        .conversation(&req.model_name, req.messages, req.show_reasoning)
        .await?;
    Ok(Json(reply))
}

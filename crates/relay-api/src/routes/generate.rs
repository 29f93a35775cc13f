use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use relay_types::{ErrorBody, GenerateRequest, GenerateResponse};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{error::ApiResult, state::AppState};

/// Single-shot completion by one model
#[utoipa::path(
    post,
    path = "/generate/{model_name}",
    params(("model_name" = String, Path, description = "Registered model name")),
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Model output", body = GenerateResponse),
        (status = 404, description = "Unknown model", body = ErrorBody),
        (status = 502, description = "Vendor failure", body = ErrorBody)
    ),
    tag = "generate"
)]
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Path(model_name): Path<String>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Json<GenerateResponse>> {
    let Json(req) = payload?;
    let response = state.service.generate(&model_name, &req.prompt).await?;
    Ok(Json(GenerateResponse { response }))
}

/// Same prompt against every model; failed models are omitted
#[utoipa::path(
    post,
    path = "/generate_all",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Map of model name to output", content_type = "application/json"),
        (status = 502, description = "Every model failed", body = ErrorBody)
    ),
    tag = "generate"
)]
pub async fn generate_all(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Json<BTreeMap<String, String>>> {
    let Json(req) = payload?;
    let responses = state.service.generate_all(&req.prompt).await?;
    Ok(Json(responses))
}

use axum::{extract::State, Json};
use relay_types::ModelsResponse;
use std::sync::Arc;

use crate::state::AppState;

/// List registered model names
#[utoipa::path(
    get,
    path = "/models",
    responses(
        (status = 200, description = "Registered models, sorted", body = ModelsResponse)
    ),
    tag = "models"
)]
pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.service.model_names(),
    })
}

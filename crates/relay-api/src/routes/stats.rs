use axum::{extract::State, Json};
use relay_types::StatsSnapshot;
use std::sync::Arc;

use crate::state::AppState;

/// Request timing statistics since startup
#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Aggregated request timings", body = StatsSnapshot)
    ),
    tag = "stats"
)]
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsSnapshot> {
    Json(state.service.stats())
}

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::config::Config;
use crate::handlers::stream;
use crate::routes::{conversation, generate, health, models, stats};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        models::list_models,
        stats::get_stats,
        generate::generate,
        generate::generate_all,
        conversation::conversation,
        stream::conversation_stream,
    ),
    components(schemas(
        relay_types::GenerateRequest,
        relay_types::GenerateResponse,
        relay_types::ConversationRequest,
        relay_types::ConversationReply,
        relay_types::ModelsResponse,
        relay_types::ErrorBody,
        relay_types::HealthResponse,
        relay_types::StatsSnapshot,
    )),
    tags(
        (name = "conversation", description = "Chat with reasoning/answer split"),
        (name = "generate", description = "Single-shot prompts"),
    )
)]
pub struct ApiDoc;

/// Build the application router with all routes and layers.
///
/// No compression layer: it would buffer SSE records.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/stats", get(stats::get_stats))
        .route("/models", get(models::list_models))
        .route("/generate/:model_name", post(generate::generate))
        .route("/generate_all", post(generate::generate_all))
        .route("/conversation", post(conversation::conversation))
        .route("/conversation_stream", post(stream::conversation_stream))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }));

    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    api_routes
        .layer(axum_middleware::from_fn(middleware::logging::log_request))
        .layer(TimeoutLayer::new(timeout))
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors.enabled {
        let mut cors = CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any);

        if config.cors.origins.iter().any(|o| o == "*") {
            cors = cors.allow_origin(Any);
        } else {
            let origins: Vec<axum::http::HeaderValue> = config
                .cors
                .origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();
            cors = cors.allow_origin(origins);
        }

        cors
    } else {
        CorsLayer::permissive()
    }
}

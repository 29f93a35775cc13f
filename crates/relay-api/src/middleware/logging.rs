use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Request logging middleware
///
/// For `/conversation_stream` the duration covers time to response
/// headers; the stream itself is timed by the service. Health probes log at
/// debug, server errors at warn.
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(req).await;

    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let status = response.status();

    if status.is_server_error() {
        tracing::warn!(%method, %path, status = status.as_u16(), elapsed_ms, "Request failed");
    } else if path == "/health" {
        tracing::debug!(%method, %path, status = status.as_u16(), elapsed_ms, "Health probe");
    } else {
        tracing::info!(%method, %path, status = status.as_u16(), elapsed_ms, "Request processed");
    }

    response
}

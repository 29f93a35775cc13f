use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use relay_core::ServiceError;
use relay_llm::LlmError;
use relay_types::ErrorBody;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Model {0} not found")]
    ModelNotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Vendor(LlmError),

    #[error("No models available")]
    NoModels,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::ModelNotFound(name) => ApiError::ModelNotFound(name),
            ServiceError::NoModels => ApiError::NoModels,
            ServiceError::Llm(e @ LlmError::Configuration { .. }) => ApiError::Config(e.to_string()),
            ServiceError::Llm(e) => ApiError::Vendor(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ModelNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Vendor(_) => StatusCode::BAD_GATEWAY,
            ApiError::NoModels => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Vendor(e) => tracing::error!("Vendor error: {}", e),
            ApiError::Config(msg) => tracing::error!("Config error: {}", msg),
            _ => tracing::debug!("Request rejected: {}", self),
        }

        let body = Json(ErrorBody {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(ServiceError::ModelNotFound("x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::BadRequest("bad".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ServiceError::Llm(LlmError::vendor("DeepSeek", Some(500), "x"))).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(ServiceError::Llm(LlmError::configuration("dsr1", "missing"))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_vendor_message_keeps_detail() {
        let err = ApiError::from(ServiceError::Llm(LlmError::vendor(
            "VolcEngine",
            Some(429),
            "rate limited",
        )));
        assert_eq!(err.to_string(), "VolcEngine request failed (HTTP 429): rate limited");
    }
}

use thiserror::Error;

/// Failures raised by model adapters.
///
/// Every variant carries enough context (vendor, config key, status) to be
/// reported to a caller as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Missing credential or endpoint while constructing an adapter
    #[error("Configuration error for {model}: {reason}")]
    Configuration { model: String, reason: String },

    /// HTTP or transport failure while talking to a vendor
    #[error("{vendor} request failed{}: {detail}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    VendorRequest {
        vendor: String,
        status: Option<u16>,
        detail: String,
    },

    /// Malformed event on a server-sent-event stream
    #[error("Stream decode error: {0}")]
    StreamDecode(String),

    /// Network failure in the middle of a stream
    #[error("Connection lost: {0}")]
    ConnectionLost(String),
}

impl LlmError {
    pub fn configuration(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            model: model.into(),
            reason: reason.into(),
        }
    }

    pub fn vendor(vendor: impl Into<String>, status: Option<u16>, detail: impl Into<String>) -> Self {
        Self::VendorRequest {
            vendor: vendor.into(),
            status,
            detail: detail.into(),
        }
    }

    /// Missing required config key, named in the message
    pub fn missing_key(model: impl Into<String>, key: &str) -> Self {
        Self::configuration(model, format!("missing required config: {key}"))
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_error_includes_status() {
        let err = LlmError::vendor("DeepSeek", Some(503), "upstream overloaded");
        assert_eq!(
            err.to_string(),
            "DeepSeek request failed (HTTP 503): upstream overloaded"
        );
    }

    #[test]
    fn test_vendor_error_without_status() {
        let err = LlmError::vendor("Ark", None, "connection refused");
        assert_eq!(err.to_string(), "Ark request failed: connection refused");
    }

    #[test]
    fn test_missing_key_names_the_key() {
        let err = LlmError::missing_key("dsr1", "api_key");
        assert!(err.to_string().contains("api_key"));
        assert!(err.to_string().contains("dsr1"));
    }
}

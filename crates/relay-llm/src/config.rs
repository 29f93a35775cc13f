// Configuration layer for vendor adapter creation
// Factory pattern: one entry per configured model name -> one adapter

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::ark::ArkAdapter;
use crate::deepseek::DeepSeekAdapter;
use crate::error::{LlmError, Result};
use crate::retry::RetryPolicy;
use crate::traits::{ChatOptions, ModelAdapter};

/// Vendor family an adapter talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// VolcEngine Ark (OpenAI-compatible)
    Ark,
    DeepSeek,
}

impl ProviderKind {
    /// Provider implied by a reserved short model name
    pub fn for_model_name(name: &str) -> Option<Self> {
        match name {
            "dsr1" | "dsv3" => Some(Self::Ark),
            "deepseek" | "deepseek-r1" => Some(Self::DeepSeek),
            _ => None,
        }
    }

    /// Environment variable that overrides the configured API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::Ark => "ARK_API_KEY",
            Self::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }

    pub fn vendor_name(&self) -> &'static str {
        match self {
            Self::Ark => "VolcEngine",
            Self::DeepSeek => "DeepSeek",
        }
    }
}

/// Per-model configuration entry, keyed by short name in the config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Explicit provider; defaults from the reserved short name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

impl ModelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    /// Provider for the entry named `name`: explicit, else reserved name
    pub fn resolve_provider(&self, name: &str) -> Result<ProviderKind> {
        self.provider
            .or_else(|| ProviderKind::for_model_name(name))
            .ok_or_else(|| {
                LlmError::configuration(
                    name,
                    "unknown model name; set `provider` to \"ark\" or \"deepseek\"",
                )
            })
    }

    /// Credential lookup: environment override, else config, else error
    pub fn resolve_api_key(&self, name: &str, env_value: Option<String>) -> Result<String> {
        env_value
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|v| !v.trim().is_empty()))
            .ok_or_else(|| LlmError::missing_key(name, "api_key"))
    }

    /// Required key lookup, naming the missing key in the error
    pub fn required<'a>(name: &str, key: &str, value: &'a Option<String>) -> Result<&'a str> {
        value
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| LlmError::missing_key(name, key))
    }

    /// Optional key lookup: the default when unset, an error when set blank
    pub fn or_default<'a>(
        name: &str,
        key: &str,
        value: &'a Option<String>,
        default: &'a str,
    ) -> Result<&'a str> {
        match value.as_deref() {
            None => Ok(default),
            Some(v) if v.trim().is_empty() => Err(LlmError::missing_key(name, key)),
            Some(v) => Ok(v),
        }
    }
}

/// HTTP behaviour shared by every adapter
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Fail fast when the vendor is unreachable
    pub connect_timeout: Duration,
    /// Upper bound for a whole request, streamed body included
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub chat: ChatOptions,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(800),
            request_timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
            chat: ChatOptions::default(),
        }
    }
}

/// Factory for creating adapters from configuration
pub struct ClientFactory;

impl ClientFactory {
    /// Create the adapter for model `name`, reading the provider's API key
    /// override from the environment
    pub fn create_adapter(
        name: &str,
        config: &ModelConfig,
        http: &HttpOptions,
    ) -> Result<Arc<dyn ModelAdapter>> {
        let provider = config.resolve_provider(name)?;
        let env_key = std::env::var(provider.api_key_env()).ok();
        Self::create_adapter_with_key(name, config, http, env_key)
    }

    /// Same as [`ClientFactory::create_adapter`] with an explicit override value
    pub fn create_adapter_with_key(
        name: &str,
        config: &ModelConfig,
        http: &HttpOptions,
        env_key: Option<String>,
    ) -> Result<Arc<dyn ModelAdapter>> {
        let provider = config.resolve_provider(name)?;
        let api_key = config.resolve_api_key(name, env_key)?;

        let adapter: Arc<dyn ModelAdapter> = match provider {
            ProviderKind::Ark => Arc::new(ArkAdapter::from_config(name, config, api_key, http)?),
            ProviderKind::DeepSeek => {
                Arc::new(DeepSeekAdapter::from_config(name, config, api_key, http)?)
            }
        };

        tracing::debug!(
            model = name,
            vendor = adapter.vendor(),
            vendor_model = adapter.model(),
            "Adapter created"
        );
        Ok(adapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_names() {
        assert_eq!(ProviderKind::for_model_name("dsr1"), Some(ProviderKind::Ark));
        assert_eq!(ProviderKind::for_model_name("dsv3"), Some(ProviderKind::Ark));
        assert_eq!(
            ProviderKind::for_model_name("deepseek"),
            Some(ProviderKind::DeepSeek)
        );
        assert_eq!(ProviderKind::for_model_name("gpt-4"), None);
    }

    #[test]
    fn test_explicit_provider_wins() {
        let config = ModelConfig::new().provider(ProviderKind::DeepSeek);
        assert_eq!(config.resolve_provider("dsr1").unwrap(), ProviderKind::DeepSeek);
    }

    #[test]
    fn test_unknown_name_without_provider_fails() {
        let err = ModelConfig::new().resolve_provider("mystery").unwrap_err();
        assert!(matches!(err, LlmError::Configuration { .. }));
    }

    #[test]
    fn test_env_key_overrides_config() {
        let config = ModelConfig::new().api_key("from-config");
        let key = config
            .resolve_api_key("dsr1", Some("from-env".to_string()))
            .unwrap();
        assert_eq!(key, "from-env");
    }

    #[test]
    fn test_config_key_used_without_env() {
        let config = ModelConfig::new().api_key("from-config");
        assert_eq!(config.resolve_api_key("dsr1", None).unwrap(), "from-config");
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let err = ModelConfig::new()
            .resolve_api_key("dsr1", Some("  ".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn test_unset_key_uses_default() {
        let value = None;
        assert_eq!(
            ModelConfig::or_default("dsr1", "base_url", &value, "https://example.com").unwrap(),
            "https://example.com"
        );
    }

    #[test]
    fn test_blank_key_is_configuration_error() {
        let value = Some("  ".to_string());
        let err = ModelConfig::or_default("dsr1", "base_url", &value, "https://example.com")
            .unwrap_err();
        assert!(matches!(err, LlmError::Configuration { .. }));
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_serde_provider_names() {
        let config: ModelConfig =
            serde_json::from_str(r#"{"provider":"deepseek","model_name":"deepseek-chat"}"#).unwrap();
        assert_eq!(config.provider, Some(ProviderKind::DeepSeek));
        assert_eq!(config.model_name.as_deref(), Some("deepseek-chat"));
    }

    #[test]
    fn test_factory_builds_ark_adapter() {
        let config = ModelConfig::new()
            .api_key("k")
            .model_name("ep-20250217050306-c7sc5");
        let adapter =
            ClientFactory::create_adapter_with_key("dsr1", &config, &HttpOptions::default(), None)
                .unwrap();
        assert_eq!(adapter.vendor(), "VolcEngine");
        assert_eq!(adapter.model(), "ep-20250217050306-c7sc5");
    }

    #[test]
    fn test_factory_reports_missing_model_name() {
        let config = ModelConfig::new().api_key("k");
        let err = ClientFactory::create_adapter_with_key(
            "dsv3",
            &config,
            &HttpOptions::default(),
            None,
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("model_name"));
    }
}

// VolcEngine Ark adapter (OpenAI-compatible endpoint)

use async_trait::async_trait;

use crate::config::{HttpOptions, ModelConfig};
use crate::endpoint::{as_base, normalize_endpoint};
use crate::error::Result;
use crate::openai::ChatCompletionsClient;
use crate::traits::{ChatRequest, FragmentStream, ModelAdapter};
use crate::types::Message;

pub const ARK_DEFAULT_BASE_URL: &str = "https://ark.cn-beijing.volces.com/api/v3";

const VENDOR: &str = "VolcEngine";

/// Adapter for models hosted on VolcEngine Ark.
///
/// `model_name` is the Ark endpoint id (e.g. `ep-2025...`) and is required.
pub struct ArkAdapter {
    client: ChatCompletionsClient,
    model: String,
}

impl ArkAdapter {
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: impl Into<String>,
        http: &HttpOptions,
    ) -> Result<Self> {
        let model = model.into();
        let base = normalize_endpoint(&model, base_url)?;
        let client = ChatCompletionsClient::new(VENDOR, api_key, as_base(&base), http)?;
        Ok(Self { client, model })
    }

    pub fn from_config(
        name: &str,
        config: &ModelConfig,
        api_key: String,
        http: &HttpOptions,
    ) -> Result<Self> {
        let model = ModelConfig::required(name, "model_name", &config.model_name)?;
        let base_url = ModelConfig::or_default(name, "base_url", &config.base_url, ARK_DEFAULT_BASE_URL)?;
        let base = normalize_endpoint(name, base_url)?;
        let client = ChatCompletionsClient::new(VENDOR, &api_key, as_base(&base), http)?;
        Ok(Self {
            client,
            model: model.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }
}

#[async_trait]
impl ModelAdapter for ArkAdapter {
    fn vendor(&self) -> &str {
        self.client.vendor()
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.converse(vec![Message::user(prompt)]).await
    }

    async fn converse(&self, messages: Vec<Message>) -> Result<String> {
        self.client
            .complete(ChatRequest::new(&self.model, messages))
            .await
    }

    async fn converse_stream(&self, messages: Vec<Message>) -> Result<FragmentStream> {
        tracing::debug!(model = %self.model, messages = messages.len(), "Ark stream request");
        self.client
            .complete_stream(ChatRequest::new(&self.model, messages))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;

    #[test]
    fn test_default_endpoint() {
        let config = ModelConfig::new().model_name("ep-1");
        let adapter =
            ArkAdapter::from_config("dsr1", &config, "k".into(), &HttpOptions::default()).unwrap();
        assert_eq!(adapter.base_url(), ARK_DEFAULT_BASE_URL);
        assert_eq!(adapter.vendor(), "VolcEngine");
    }

    #[test]
    fn test_custom_endpoint_normalized() {
        let config = ModelConfig::new()
            .model_name("ep-1")
            .base_url("ark.ap-southeast.bytepluses.com/api/v3/");
        let adapter =
            ArkAdapter::from_config("dsv3", &config, "k".into(), &HttpOptions::default()).unwrap();
        assert_eq!(adapter.base_url(), "https://ark.ap-southeast.bytepluses.com/api/v3");
    }

    #[test]
    fn test_missing_model_name() {
        let err = ArkAdapter::from_config("dsr1", &ModelConfig::new(), "k".into(), &HttpOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, LlmError::Configuration { .. }));
        assert!(err.to_string().contains("model_name"));
    }

    #[test]
    fn test_blank_endpoint_rejected() {
        let config = ModelConfig::new().model_name("ep-1").base_url("");
        let err = ArkAdapter::from_config("dsr1", &config, "k".into(), &HttpOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, LlmError::Configuration { .. }));
        assert!(err.to_string().contains("base_url"));
    }
}

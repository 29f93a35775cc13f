// DeepSeek adapter (OpenAI-compatible endpoint under /v1)

use async_trait::async_trait;

use crate::config::{HttpOptions, ModelConfig};
use crate::endpoint::{as_base, normalize_endpoint, strip_version_path};
use crate::error::Result;
use crate::openai::ChatCompletionsClient;
use crate::traits::{ChatRequest, FragmentStream, ModelAdapter};
use crate::types::Message;

pub const DEEPSEEK_DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_DEFAULT_MODEL: &str = "deepseek-chat";

const VENDOR: &str = "DeepSeek";

/// Model ids not in the `deepseek-` family fall back to `deepseek-chat`
pub fn normalize_model_name(model: &str) -> String {
    let model = model.trim();
    if model.starts_with("deepseek-") {
        model.to_string()
    } else {
        tracing::warn!(
            requested = model,
            fallback = DEEPSEEK_DEFAULT_MODEL,
            "Unrecognized DeepSeek model id"
        );
        DEEPSEEK_DEFAULT_MODEL.to_string()
    }
}

/// Adapter for the DeepSeek public API.
///
/// Whatever version path the configured URL carries is replaced by `/v1`.
pub struct DeepSeekAdapter {
    client: ChatCompletionsClient,
    model: String,
}

impl DeepSeekAdapter {
    pub fn new(api_key: &str, base_url: &str, model: &str, http: &HttpOptions) -> Result<Self> {
        let model = normalize_model_name(model);
        let base = Self::versioned_base(&model, base_url)?;
        let client = ChatCompletionsClient::new(VENDOR, api_key, base, http)?;
        Ok(Self { client, model })
    }

    pub fn from_config(
        name: &str,
        config: &ModelConfig,
        api_key: String,
        http: &HttpOptions,
    ) -> Result<Self> {
        let model = ModelConfig::required(name, "model_name", &config.model_name)?;
        let model = normalize_model_name(model);
        let base_url = ModelConfig::or_default(name, "base_url", &config.base_url, DEEPSEEK_DEFAULT_BASE_URL)?;
        let base = Self::versioned_base(name, base_url)?;
        let client = ChatCompletionsClient::new(VENDOR, &api_key, base, http)?;
        Ok(Self { client, model })
    }

    fn versioned_base(name: &str, base_url: &str) -> Result<String> {
        let url = normalize_endpoint(name, base_url)?;
        Ok(format!("{}/v1", as_base(&strip_version_path(&url))))
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }
}

#[async_trait]
impl ModelAdapter for DeepSeekAdapter {
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
        tracing::debug!(model = %self.model, messages = messages.len(), "DeepSeek stream request");
        self.client
            .complete_stream(ChatRequest::new(&self.model, messages))
            .await
    }
}

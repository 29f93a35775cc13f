use crate::error::Result;
use crate::types::Message;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Raw incremental text from a vendor's streaming completion.
///
/// Every non-null content fragment is forwarded verbatim, empty strings
/// included. The stream ends after the vendor's terminator.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Capability set every vendor adapter provides
///
/// One implementation per vendor family. Non-streaming calls may retry
/// internally; `converse_stream` never does.
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    /// Human-readable vendor name used in error messages
    fn vendor(&self) -> &str;

    /// Vendor-side model identifier sent with each request
    fn model(&self) -> &str;

    /// Single-shot completion of one user prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Non-streaming chat completion
    async fn converse(&self, messages: Vec<Message>) -> Result<String>;

    /// Streaming chat completion
    async fn converse_stream(&self, messages: Vec<Message>) -> Result<FragmentStream>;
}

/// Request options shared by the OpenAI-compatible adapters
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: ChatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }
}

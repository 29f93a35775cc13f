// OpenAI-compatible chat completions client, shared by the vendor adapters

use crate::config::HttpOptions;
use crate::error::{LlmError, Result};
use crate::retry::{send_with_retry, RetryPolicy};
use crate::streaming::parse_chat_sse_stream;
use crate::traits::{ChatOptions, ChatRequest, FragmentStream};
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP direct client for `{base_url}/chat/completions` (no SDK)
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    http_client: reqwest::Client,
    base_url: String,
    vendor: String,
    retry: RetryPolicy,
    defaults: ChatOptions,
}

impl ChatCompletionsClient {
    /// Create new client; `base_url` must already be normalized
    pub fn new(
        vendor: impl Into<String>,
        api_key: &str,
        base_url: impl Into<String>,
        http: &HttpOptions,
    ) -> Result<Self> {
        let vendor = vendor.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| LlmError::configuration(&vendor, "invalid API key format"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(http.connect_timeout)
            .timeout(http.request_timeout)
            .build()
            .map_err(|e| {
                LlmError::configuration(&vendor, format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
            vendor,
            retry: http.retry.clone(),
            defaults: http.chat.clone(),
        })
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Build chat completion request payload
    fn build_chat_request(&self, request: &ChatRequest, stream: bool) -> Value {
        let mut payload = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "stream": stream,
        });

        if let Some(obj) = payload.as_object_mut() {
            let temperature = request.options.temperature.or(self.defaults.temperature);
            if let Some(temp) = temperature {
                obj.insert("temperature".to_string(), serde_json::json!(temp));
            }
            let max_tokens = request.options.max_tokens.or(self.defaults.max_tokens);
            if let Some(max_tokens) = max_tokens {
                obj.insert("max_tokens".to_string(), serde_json::json!(max_tokens));
            }
        }

        payload
    }

    fn transport_error(&self, err: reqwest::Error) -> LlmError {
        let detail = if err.is_timeout() {
            format!("timed out: {err}")
        } else if err.is_connect() {
            format!("connection failed: {err}")
        } else {
            err.to_string()
        };
        LlmError::vendor(&self.vendor, err.status().map(|s| s.as_u16()), detail)
    }

    async fn status_error(&self, response: reqwest::Response) -> LlmError {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        LlmError::vendor(&self.vendor, Some(status.as_u16()), error_text)
    }

    /// Non-streaming completion, retried per the configured policy
    pub async fn complete(&self, request: ChatRequest) -> Result<String> {
        let payload = self.build_chat_request(&request, false);
        let url = self.url();

        let response = send_with_retry(&self.retry, || self.http_client.post(&url).json(&payload))
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(self.status_error(response).await);
        }

        let raw: ChatCompletionResponse = response.json().await.map_err(|e| {
            LlmError::vendor(&self.vendor, None, format!("failed to parse response: {e}"))
        })?;

        raw.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| LlmError::vendor(&self.vendor, None, "response contained no choices"))
    }

    /// Streaming completion. Never retried: a failure surfaces to the caller.
    pub async fn complete_stream(&self, request: ChatRequest) -> Result<FragmentStream> {
        let payload = self.build_chat_request(&request, true);

        let response = self
            .http_client
            .post(self.url())
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(self.status_error(response).await);
        }

        let vendor = self.vendor.clone();
        let fragments = parse_chat_sse_stream(response).map(move |item| {
            item.map_err(|e| match e {
                LlmError::ConnectionLost(detail) => {
                    LlmError::ConnectionLost(format!("{vendor}: {detail}"))
                }
                LlmError::StreamDecode(detail) => {
                    LlmError::StreamDecode(format!("{vendor}: {detail}"))
                }
                other => other,
            })
        });

        Ok(Box::pin(fragments))
    }
}

// ============================================================================
// OPENAI-COMPATIBLE RESPONSE TYPES (non-streaming)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResponseMessage {
    pub role: String,
    pub content: Option<String>,
}

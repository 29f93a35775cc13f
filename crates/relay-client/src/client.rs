use futures::StreamExt;
use relay_llm::retry::send_with_retry;
use relay_llm::RetryPolicy;
use relay_types::{
    ConversationReply, ConversationRequest, ErrorBody, GenerateRequest, GenerateResponse,
    ModelsResponse, StreamEvent,
};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

use crate::error::{ClientError, Result};
use crate::session::ConversationSession;
use crate::sse::{decode_frames, EventStream, Frame};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8088";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Total time per call, streaming bodies included
    pub request_timeout: Duration,
    /// Applied to model listing and single-shot generate only
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            connect_timeout: Duration::from_millis(500),
            request_timeout: Duration::from_secs(60),
            retry: RetryPolicy {
                max_retries: 2,
                ..RetryPolicy::default()
            },
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Client for a relay server's HTTP API
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl RelayClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(config.base_url));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            retry: config.retry,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Whether the server answers `GET /models`
    pub async fn check_connection(&self) -> bool {
        match self.list_models().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(url = %self.base_url, "Relay server unreachable: {}", e);
                false
            }
        }
    }

    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = self.endpoint(&["models"])?;
        let response = send_with_retry(&self.retry, || self.http.get(url.clone())).await?;
        let body: ModelsResponse = read_json(response).await?;
        Ok(body.models)
    }

    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let url = self.endpoint(&["generate", model])?;
        let request = GenerateRequest {
            prompt: prompt.to_string(),
        };
        let response =
            send_with_retry(&self.retry, || self.http.post(url.clone()).json(&request)).await?;
        let body: GenerateResponse = read_json(response).await?;
        Ok(body.response)
    }

    /// Output of every model that answered, keyed by model name
    pub async fn generate_all(&self, prompt: &str) -> Result<BTreeMap<String, String>> {
        let url = self.endpoint(&["generate_all"])?;
        let request = GenerateRequest {
            prompt: prompt.to_string(),
        };
        let response = self.http.post(url).json(&request).send().await?;
        read_json(response).await
    }

    /// Non-streaming conversation over the session's history.
    ///
    /// The caller pushes the user turn first; a non-empty reply is appended
    /// as the assistant turn. Sent once: the server already retries the
    /// vendor call.
    pub async fn conversation(
        &self,
        model: &str,
        session: &mut ConversationSession,
        show_reasoning: bool,
    ) -> Result<ConversationReply> {
        let url = self.endpoint(&["conversation"])?;
        let request = ConversationRequest::new(model, session.messages().to_vec())
            .with_reasoning(show_reasoning);
        let response = self.http.post(url).json(&request).send().await?;
        let reply: ConversationReply = read_json(response).await?;

        if !reply.response.is_empty() {
            session.push_assistant(reply.response.clone());
        }
        Ok(reply)
    }

    /// Streaming conversation over the session's history.
    ///
    /// Failures arrive as a final `error` event. The last non-empty
    /// `response` is appended to the session once, before the final
    /// `completed` or `error` event is yielded. Never retried.
    pub fn conversation_stream<'a>(
        &'a self,
        model: &str,
        session: &'a mut ConversationSession,
        show_reasoning: bool,
    ) -> EventStream<'a> {
        let request = ConversationRequest::new(model, session.messages().to_vec())
            .with_reasoning(show_reasoning);
        let url = self.endpoint(&["conversation_stream"]);

        Box::pin(async_stream::stream! {
            let url = match url {
                Ok(url) => url,
                Err(e) => {
                    yield StreamEvent::error(e.to_string());
                    return;
                }
            };

            let response = match self.http.post(url).json(&request).send().await {
                Ok(response) => response,
                Err(e) => {
                    yield StreamEvent::error(ClientError::from(e).to_string());
                    return;
                }
            };
            let response = match check_status(response).await {
                Ok(response) => response,
                Err(e) => {
                    yield StreamEvent::error(e.to_string());
                    return;
                }
            };

            let mut frames = decode_frames(response.bytes_stream());
            let mut last_response = String::new();

            while let Some(Frame { event, terminal }) = frames.next().await {
                if let Some(delta) = event.as_delta() {
                    if !delta.response.is_empty() {
                        last_response.clone_from(&delta.response);
                    }
                }
                if terminal && !last_response.is_empty() {
                    session.push_assistant(std::mem::take(&mut last_response));
                }
                yield event;
            }
        })
    }
}

/// Pass a success response through; turn anything else into `ClientError::Status`
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let response = check_status(response).await?;
    response
        .json()
        .await
        .map_err(|e| ClientError::Decode(e.to_string()))
}

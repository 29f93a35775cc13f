use async_stream::stream;
use futures::future::join_all;
use futures::{Stream, StreamExt};
use relay_llm::{Message, ModelAdapter};
use relay_types::{ConversationReply, StatsSnapshot, StreamEvent, StreamStatus};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::builder::RelayServiceBuilder;
use crate::error::{Result, ServiceError};
use crate::prompt::inject_reasoning_prompt;
use crate::splitter::{split_stream, split_text, ReasoningFallback, SplitOptions};
use crate::stats::RequestStats;

pub(crate) const WAITING_MESSAGE: &str = "waiting for model output";

/// Dispatches requests to registered model adapters.
///
/// The registry is fixed at build time, so the service can be shared
/// behind an `Arc` without locking.
pub struct RelayService {
    models: BTreeMap<String, Arc<dyn ModelAdapter>>,
    fallback: ReasoningFallback,
    waiting_notice: Option<Duration>,
    stats: Arc<RequestStats>,
}

/// Records one request duration when dropped
struct RequestTimer {
    stats: Arc<RequestStats>,
    operation: &'static str,
    model: String,
    started: Instant,
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed();
        self.stats.record(elapsed);
        tracing::info!(
            operation = self.operation,
            model = %self.model,
            elapsed_ms = elapsed.as_millis() as u64,
            "[perf] request finished"
        );
    }
}

impl RelayService {
    pub(crate) fn new(
        models: BTreeMap<String, Arc<dyn ModelAdapter>>,
        fallback: ReasoningFallback,
        waiting_notice: Option<Duration>,
        stats: Arc<RequestStats>,
    ) -> Self {
        Self {
            models,
            fallback,
            waiting_notice,
            stats,
        }
    }

    /// Create a builder for fluent construction
    pub fn builder() -> RelayServiceBuilder {
        RelayServiceBuilder::new()
    }

    /// Registered model names, sorted
    pub fn model_names(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }

    pub fn adapter(&self, model: &str) -> Result<Arc<dyn ModelAdapter>> {
        self.models
            .get(model)
            .cloned()
            .ok_or_else(|| ServiceError::ModelNotFound(model.to_string()))
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    fn timer(&self, operation: &'static str, model: &str) -> RequestTimer {
        RequestTimer {
            stats: Arc::clone(&self.stats),
            operation,
            model: model.to_string(),
            started: Instant::now(),
        }
    }

    fn split_options(&self, show_reasoning: bool) -> SplitOptions {
        SplitOptions::new(show_reasoning).with_fallback(self.fallback)
    }

    /// Single-shot completion of `prompt` by one model
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let adapter = self.adapter(model)?;
        let _timer = self.timer("generate", model);

        adapter.generate(prompt).await.map_err(|e| {
            tracing::error!(model, error = %e, "generate failed");
            ServiceError::from(e)
        })
    }

    /// Run `prompt` against every model concurrently.
    ///
    /// Failed models are left out of the result; the call only fails when
    /// no model succeeded.
    pub async fn generate_all(&self, prompt: &str) -> Result<BTreeMap<String, String>> {
        if self.models.is_empty() {
            return Err(ServiceError::NoModels);
        }

        let calls = self.models.keys().map(|name| async move {
            let result = self.generate(name, prompt).await;
            (name.clone(), result)
        });

        let mut responses = BTreeMap::new();
        let mut first_error = None;
        for (name, result) in join_all(calls).await {
            match result {
                Ok(text) => {
                    responses.insert(name, text);
                }
                Err(e) => {
                    tracing::warn!(model = %name, error = %e, "Model skipped in generate_all");
                    first_error.get_or_insert(e);
                }
            }
        }

        if responses.is_empty() {
            return Err(first_error.unwrap_or(ServiceError::NoModels));
        }
        Ok(responses)
    }

    /// Non-streaming conversation, classified the same way as the stream
    pub async fn conversation(
        &self,
        model: &str,
        messages: Vec<Message>,
        show_reasoning: bool,
    ) -> Result<ConversationReply> {
        let adapter = self.adapter(model)?;
        let _timer = self.timer("conversation", model);

        let messages = inject_reasoning_prompt(messages);
        let text = adapter.converse(messages).await.map_err(|e| {
            tracing::error!(model, error = %e, "conversation failed");
            ServiceError::from(e)
        })?;

        let delta = split_text(&text, self.split_options(show_reasoning));
        Ok(ConversationReply {
            response: delta.response,
            reasoning: show_reasoning.then_some(delta.reasoning),
        })
    }

    /// Streaming conversation: deltas, then at most one error event.
    ///
    /// The model is resolved eagerly, so an unknown name fails here and
    /// is never timed. Dropping the stream closes the vendor connection.
    pub fn conversation_stream(
        &self,
        model: &str,
        messages: Vec<Message>,
        show_reasoning: bool,
    ) -> Result<impl Stream<Item = StreamEvent> + Send + 'static> {
        let adapter = self.adapter(model)?;
        let timer = self.timer("conversation_stream", model);
        let options = self.split_options(show_reasoning);
        let messages = inject_reasoning_prompt(messages);

        Ok(stream! {
            let _timer = timer;
            match adapter.converse_stream(messages).await {
                Ok(fragments) => {
                    let events = split_stream(fragments, options);
                    futures::pin_mut!(events);
                    while let Some(event) = events.next().await {
                        if let StreamEvent::Error { error } = &event {
                            tracing::error!(model = adapter.model(), error = %error, "stream failed");
                        }
                        yield event;
                    }
                }
                Err(e) => {
                    tracing::error!(model = adapter.model(), error = %e, "stream request failed");
                    yield StreamEvent::error(e.to_string());
                }
            }
        })
    }

    /// Spawn the stream pipeline in background, return event receiver.
    ///
    /// Framing: `connected` first, `waiting` whenever the vendor stays
    /// silent for the notice interval, `completed` last unless an error
    /// event ended the stream. When the receiver is dropped the task stops
    /// and the vendor stream is released.
    pub fn spawn_conversation_stream(
        &self,
        model: &str,
        messages: Vec<Message>,
        show_reasoning: bool,
    ) -> Result<mpsc::Receiver<StreamEvent>> {
        let events = self.conversation_stream(model, messages, show_reasoning)?;
        let waiting_notice = self.waiting_notice;
        let model = model.to_string();
        let (tx, rx) = mpsc::channel(64);

        tokio::spawn(async move {
            futures::pin_mut!(events);

            if tx.send(StreamEvent::connected()).await.is_err() {
                return;
            }

            loop {
                let next = tokio::select! {
                    _ = tx.closed() => {
                        tracing::info!(model = %model, "Client disconnected, cancelling stream");
                        return;
                    }
                    next = next_or_notice(&mut events, waiting_notice) => next,
                };

                let event = match next {
                    Some(Some(event)) => event,
                    Some(None) => break,
                    None => StreamEvent::status_with_message(StreamStatus::Waiting, WAITING_MESSAGE),
                };

                let failed = event.is_error();
                if tx.send(event).await.is_err() {
                    tracing::info!(model = %model, "Client disconnected, cancelling stream");
                    return;
                }
                if failed {
                    return;
                }
            }

            let _ = tx.send(StreamEvent::completed()).await;
        });

        Ok(rx)
    }
}

/// Next event, or `None` when nothing arrived within `notice`
async fn next_or_notice<S>(events: &mut S, notice: Option<Duration>) -> Option<Option<StreamEvent>>
where
    S: Stream<Item = StreamEvent> + Unpin,
{
    match notice {
        Some(notice) => tokio::time::timeout(notice, events.next()).await.ok(),
        None => Some(events.next().await),
    }
}

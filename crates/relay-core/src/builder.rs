use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use relay_llm::{ClientFactory, HttpOptions, ModelAdapter, ModelConfig};

use crate::service::RelayService;
use crate::splitter::ReasoningFallback;
use crate::stats::RequestStats;

/// Builder for constructing a RelayService
pub struct RelayServiceBuilder {
    models: BTreeMap<String, Arc<dyn ModelAdapter>>,
    fallback: ReasoningFallback,
    waiting_notice: Option<Duration>,
    stats: Option<Arc<RequestStats>>,
}

impl RelayServiceBuilder {
    pub fn new() -> Self {
        Self {
            models: BTreeMap::new(),
            fallback: ReasoningFallback::default(),
            waiting_notice: Some(Duration::from_secs(5)),
            stats: None,
        }
    }

    /// Register an adapter under a short model name; a later registration
    /// with the same name replaces the earlier one
    pub fn register(mut self, name: impl Into<String>, adapter: Arc<dyn ModelAdapter>) -> Self {
        self.models.insert(name.into(), adapter);
        self
    }

    /// Build and register an adapter per config entry.
    ///
    /// An entry whose adapter cannot be constructed is logged and skipped;
    /// the other models stay usable.
    pub fn register_configs<'a, I, K>(mut self, configs: I, http: &HttpOptions) -> Self
    where
        I: IntoIterator<Item = (K, &'a ModelConfig)>,
        K: AsRef<str>,
    {
        for (name, config) in configs {
            let name = name.as_ref();
            match ClientFactory::create_adapter(name, config, http) {
                Ok(adapter) => {
                    tracing::info!(model = name, vendor = adapter.vendor(), "Model registered");
                    self.models.insert(name.to_string(), adapter);
                }
                Err(e) => {
                    tracing::warn!(model = name, error = %e, "Skipping model");
                }
            }
        }
        self
    }

    /// Terminal policy when the answer marker never arrives
    pub fn reasoning_fallback(mut self, fallback: ReasoningFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Silence interval before a `waiting` status; `None` disables it
    pub fn waiting_notice(mut self, interval: Option<Duration>) -> Self {
        self.waiting_notice = interval.filter(|d| !d.is_zero());
        self
    }

    /// Share an existing statistics aggregator
    pub fn stats(mut self, stats: Arc<RequestStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn build(self) -> RelayService {
        if self.models.is_empty() {
            tracing::warn!("RelayService built without any model");
        }
        RelayService::new(
            self.models,
            self.fallback,
            self.waiting_notice,
            self.stats.unwrap_or_default(),
        )
    }
}

impl Default for RelayServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

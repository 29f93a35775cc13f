use relay_core::RelayService;
use std::sync::Arc;

use crate::config::Config;

/// Shared application state passed to all handlers
///
/// The service owns the immutable model registry and the statistics
/// aggregator, so cloning the state is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub service: Arc<RelayService>,
}

impl AppState {
    pub fn new(config: Config, service: RelayService) -> Self {
        Self {
            config: Arc::new(config),
            service: Arc::new(service),
        }
    }

    /// Build the service from `config.models`, skipping models whose
    /// adapter cannot be constructed
    pub fn from_config(config: Config) -> Self {
        let service = RelayService::builder()
            .register_configs(&config.models, &config.http.to_options())
            .waiting_notice(config.stream.waiting_notice())
            .reasoning_fallback(config.stream.reasoning_fallback)
            .build();
        Self::new(config, service)
    }
}

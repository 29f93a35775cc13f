use config::{Config as ConfigLoader, ConfigError, Environment, File};
use relay_core::ReasoningFallback;
use relay_llm::{ChatOptions, HttpOptions, ModelConfig, RetryPolicy};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Model entries keyed by the short name clients use
    #[serde(default)]
    pub models: BTreeMap<String, ModelConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound until response headers are sent; SSE bodies are not cut
    #[serde(default = "default_server_timeout")]
    pub request_timeout_secs: u64,
}

fn default_server_timeout() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8088,
            request_timeout_secs: default_server_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            origins: vec!["*".to_string()],
        }
    }
}

/// Outbound vendor HTTP settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_ms: u64,
    pub request_timeout_secs: u64,
    pub retry: RetryPolicy,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 800,
            request_timeout_secs: 120,
            retry: RetryPolicy::default(),
            temperature: None,
            max_tokens: None,
        }
    }
}

impl HttpConfig {
    pub fn to_options(&self) -> HttpOptions {
        HttpOptions {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            retry: self.retry.clone(),
            chat: ChatOptions {
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Silence before a `waiting` status is sent; 0 disables it
    pub waiting_notice_ms: u64,
    pub reasoning_fallback: ReasoningFallback,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            waiting_notice_ms: 5000,
            reasoning_fallback: ReasoningFallback::default(),
        }
    }
}

impl StreamConfig {
    pub fn waiting_notice(&self) -> Option<Duration> {
        (self.waiting_notice_ms > 0).then(|| Duration::from_millis(self.waiting_notice_ms))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, overridden by `RUST_LOG`
    pub level: String,
    /// `pretty`, `compact` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables `RELAY_<SECTION>__<KEY>`, e.g. `RELAY_SERVER__PORT`
    ///
    /// Vendor API keys are not read here: `ARK_API_KEY` and `DEEPSEEK_API_KEY`
    /// override `models.<name>.api_key` when each adapter is built.
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("RELAY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let cfg: Config = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let cfg: Config = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.http.connect_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "http.connect_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.models.is_empty() {
            tracing::warn!("No models configured");
        }
        Ok(())
    }
}

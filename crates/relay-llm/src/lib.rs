pub mod error;
pub mod types;
pub mod traits;
pub mod streaming;
pub mod buffer_utils;
pub mod retry;
pub mod endpoint;
pub mod config;
pub mod openai;
pub mod ark;
pub mod deepseek;

pub use error::{LlmError, Result};
pub use traits::{ChatOptions, ChatRequest, FragmentStream, ModelAdapter};

pub use buffer_utils::{parse_sse_stream, CircularLineBuffer, SseLineParser};
pub use config::{ClientFactory, HttpOptions, ModelConfig, ProviderKind};
pub use retry::RetryPolicy;
pub use openai::ChatCompletionsClient;
pub use ark::ArkAdapter;
pub use deepseek::DeepSeekAdapter;
pub use types::{Message, Role};

pub mod builder;
pub mod error;
pub mod prompt;
pub mod service;
pub mod splitter;
pub mod stats;

pub use builder::RelayServiceBuilder;
pub use error::{Result, ServiceError};
pub use prompt::{inject_reasoning_prompt, REASONING_SYSTEM_PROMPT};
pub use service::RelayService;
pub use splitter::{
    split_stream, split_text, Phase, ReasoningFallback, ReasoningSplitter, SplitOptions,
    ANSWER_MARKER, REASONING_MARKER,
};
pub use stats::RequestStats;

// Re-export wire types used across the service surface
pub use relay_types::{ConversationReply, Delta, StatsSnapshot, StreamEvent, StreamStatus};

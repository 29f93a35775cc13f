pub mod api;
pub mod events;
pub mod stats;

pub use api::{
    ConversationReply, ConversationRequest, ErrorBody, GenerateRequest, GenerateResponse,
    HealthResponse, ModelsResponse,
};
pub use events::{Delta, StreamEvent, StreamStatus};
pub use stats::StatsSnapshot;

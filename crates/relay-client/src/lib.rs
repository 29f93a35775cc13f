//! Client for the relay HTTP API.
//!
//! ```no_run
//! use futures::StreamExt;
//! use relay_client::{ClientConfig, ConversationSession, RelayClient};
//!
//! # async fn run() -> relay_client::Result<()> {
//! let client = RelayClient::new(ClientConfig::default())?;
//! let mut session = ConversationSession::new();
//! session.push_user("你好");
//!
//! let mut events = client.conversation_stream("dsr1", &mut session, true);
//! while let Some(event) = events.next().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod render;
pub mod session;
pub mod sse;

pub use client::{ClientConfig, RelayClient, DEFAULT_SERVER_URL};
pub use error::{ClientError, Result};
pub use render::{DeltaPrinter, Segment};
pub use session::ConversationSession;
pub use sse::{decode_event_stream, EventStream};

pub use relay_types::{ConversationReply, Delta, StreamEvent, StreamStatus};

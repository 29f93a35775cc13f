use serde::{Deserialize, Serialize};
use std::fmt;

/// Cumulative reasoning/response pair for one stream.
///
/// Each field holds everything classified into that channel so far, not
/// only the newly arrived text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Delta {
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub response: String,
}

impl Delta {
    pub fn new(reasoning: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            reasoning: reasoning.into(),
            response: response.into(),
        }
    }

    pub fn response_only(response: impl Into<String>) -> Self {
        Self::new(String::new(), response)
    }
}

/// Control signals framing a conversation stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    /// Stream accepted, vendor request in flight
    Connected,
    /// No output from the vendor for a while
    Waiting,
    /// Last record of a healthy stream
    Completed,
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connected => "connected",
            Self::Waiting => "waiting",
            Self::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// One SSE record of `/conversation_stream`.
///
/// Serialized without a tag: `{"reasoning","response"}`, `{"error"}` or
/// `{"status","message"?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamEvent {
    /// Terminal failure; nothing follows
    Error { error: String },

    Status {
        status: StreamStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    Delta(Delta),
}

impl StreamEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    pub fn status(status: StreamStatus) -> Self {
        Self::Status {
            status,
            message: None,
        }
    }

    pub fn status_with_message(status: StreamStatus, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: Some(message.into()),
        }
    }

    pub fn connected() -> Self {
        Self::status(StreamStatus::Connected)
    }

    pub fn completed() -> Self {
        Self::status(StreamStatus::Completed)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn is_completed(&self) -> bool {
        matches!(
            self,
            Self::Status {
                status: StreamStatus::Completed,
                ..
            }
        )
    }

    pub fn as_delta(&self) -> Option<&Delta> {
        match self {
            Self::Delta(delta) => Some(delta),
            _ => None,
        }
    }
}

impl From<Delta> for StreamEvent {
    fn from(delta: Delta) -> Self {
        Self::Delta(delta)
    }
}

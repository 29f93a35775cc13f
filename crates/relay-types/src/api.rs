use relay_llm::Message;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /generate/:model_name` and `POST /generate_all`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GenerateResponse {
    pub response: String,
}

/// Body of `POST /conversation` and `POST /conversation_stream`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConversationRequest {
    pub model_name: String,
    #[schema(value_type = Vec<Object>)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub show_reasoning: bool,
    /// Accepted for compatibility; fragments are always forwarded as they arrive
    #[serde(default = "default_char_by_char")]
    pub char_by_char: bool,
}

fn default_char_by_char() -> bool {
    true
}

impl ConversationRequest {
    pub fn new(model_name: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model_name: model_name.into(),
            messages,
            show_reasoning: false,
            char_by_char: true,
        }
    }

    pub fn with_reasoning(mut self, show_reasoning: bool) -> Self {
        self.show_reasoning = show_reasoning;
        self
    }
}

/// Result of a non-streaming conversation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConversationReply {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}

/// Uniform failure body returned by every route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_request_defaults() {
        let req: ConversationRequest = serde_json::from_str(
            r#"{"model_name":"dsr1","messages":[{"role":"user","content":"hi"}]}"#,
        )
        .unwrap();
        assert!(!req.show_reasoning);
        assert!(req.char_by_char);
        assert_eq!(req.messages.len(), 1);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let result = serde_json::from_str::<ConversationRequest>(
            r#"{"model_name":"dsr1","messages":[{"role":"tool","content":"x"}]}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_reply_omits_absent_reasoning() {
        let reply = ConversationReply {
            response: "42".into(),
            reasoning: None,
        };
        assert_eq!(serde_json::to_string(&reply).unwrap(), r#"{"response":"42"}"#);
    }
}

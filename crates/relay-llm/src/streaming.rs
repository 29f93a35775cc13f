use serde::{Deserialize, Serialize};

use crate::buffer_utils::{parse_sse_stream, SseLineParser};
use crate::error::{LlmError, Result};
use crate::traits::FragmentStream;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatStreamChunk {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub index: u32,
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delta {
    pub role: Option<String>,
    pub content: Option<String>,
}

impl ChatStreamChunk {
    /// Content fragment of the first choice, `None` when the vendor sent null
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
    }
}

/// Parses OpenAI-compatible `chat.completion.chunk` payloads into raw text
/// fragments. Empty strings are kept: only null content is skipped.
pub struct ChatChunkParser;

impl SseLineParser for ChatChunkParser {
    type Item = String;

    fn parse_data_line(&self, data: &str) -> Result<Vec<String>> {
        let chunk: ChatStreamChunk = serde_json::from_str(data)
            .map_err(|e| LlmError::StreamDecode(format!("failed to parse chat chunk: {e}")))?;

        Ok(chunk.content().map(str::to_string).into_iter().collect())
    }
}

/// Turn a streaming chat-completions response body into a fragment stream
pub fn parse_chat_sse_stream(response: reqwest::Response) -> FragmentStream {
    parse_sse_stream(response.bytes_stream(), ChatChunkParser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_content_is_forwarded() {
        let items = ChatChunkParser
            .parse_data_line(r#"{"id":"1","choices":[{"index":0,"delta":{"role":"assistant","content":""},"finish_reason":null}]}"#)
            .unwrap();
        assert_eq!(items, vec![String::new()]);
    }

    #[test]
    fn test_null_content_is_skipped() {
        let items = ChatChunkParser
            .parse_data_line(r#"{"choices":[{"index":0,"delta":{"content":null},"finish_reason":"stop"}]}"#)
            .unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_chunk_without_choices() {
        let items = ChatChunkParser
            .parse_data_line(r#"{"id":"x","choices":[]}"#)
            .unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_malformed_chunk_is_decode_error() {
        let err = ChatChunkParser.parse_data_line("{not json").unwrap_err();
        assert!(matches!(err, LlmError::StreamDecode(_)));
    }

    #[test]
    fn test_finish_chunk_has_no_content() {
        let fragments = ChatChunkParser
            .parse_data_line(r#"{"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#)
            .unwrap();
        assert!(fragments.is_empty());
    }
}

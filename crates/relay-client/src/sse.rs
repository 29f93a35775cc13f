use futures::{Stream, StreamExt};
use relay_llm::{parse_sse_stream, LlmError, SseLineParser};
use relay_types::StreamEvent;
use std::fmt::Display;
use std::pin::Pin;

use crate::error::ClientError;

pub type EventStream<'a> = Pin<Box<dyn Stream<Item = StreamEvent> + Send + 'a>>;

/// Message of the error event synthesized when the body ends early
pub const CLOSED_EARLY: &str = "connection closed before the stream completed";

/// Decodes relay `data:` records into [`StreamEvent`]s.
///
/// The relay never sends `[DONE]`; `completed` is the end marker and is
/// handled by [`decode_event_stream`] so it still reaches the caller.
struct RelayEventParser;

impl SseLineParser for RelayEventParser {
    type Item = StreamEvent;

    fn parse_data_line(&self, data: &str) -> relay_llm::Result<Vec<StreamEvent>> {
        serde_json::from_str(data)
            .map(|event| vec![event])
            .map_err(|e| LlmError::StreamDecode(format!("malformed relay event: {e}")))
    }

    fn is_done_marker(&self, _data: &str) -> bool {
        false
    }
}

/// Decoded event plus whether it is the last one of the body
pub(crate) struct Frame {
    pub event: StreamEvent,
    pub terminal: bool,
}

/// Turn a `/conversation_stream` body into a stream of events.
///
/// - a malformed record becomes an `error` event and decoding continues
/// - a server `error` or `completed` event ends the stream after it is yielded
/// - a transport failure, or a body that ends without `completed`, becomes
///   a final `error` event
pub fn decode_event_stream<S, B, E>(byte_stream: S) -> EventStream<'static>
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    Box::pin(decode_frames(byte_stream).map(|frame| frame.event))
}

pub(crate) fn decode_frames<S, B, E>(
    byte_stream: S,
) -> Pin<Box<dyn Stream<Item = Frame> + Send + 'static>>
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    let mut records = parse_sse_stream(byte_stream, RelayEventParser);

    Box::pin(async_stream::stream! {
        while let Some(record) = records.next().await {
            match record {
                Ok(event) => {
                    let terminal = event.is_completed() || event.is_error();
                    yield Frame { event, terminal };
                    if terminal {
                        return;
                    }
                }
                Err(LlmError::ConnectionLost(detail)) => {
                    let event = StreamEvent::error(ClientError::ConnectionLost(detail).to_string());
                    yield Frame { event, terminal: true };
                    return;
                }
                Err(err) => {
                    tracing::warn!("Skipping undecodable record: {}", err);
                    let event = StreamEvent::error(ClientError::Decode(err.to_string()).to_string());
                    yield Frame { event, terminal: false };
                }
            }
        }

        let event = StreamEvent::error(ClientError::ConnectionLost(CLOSED_EARLY.to_string()).to_string());
        yield Frame { event, terminal: true };
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_types::{Delta, StreamStatus};

    type Chunk = std::result::Result<Vec<u8>, String>;

    async fn decode(chunks: Vec<Chunk>) -> Vec<StreamEvent> {
        decode_event_stream(futures::stream::iter(chunks))
            .collect()
            .await
    }

    fn ok(text: &str) -> Chunk {
        Ok(text.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_record_split_inside_marker() {
        let body = "data: {\"status\":\"connected\"}\n\ndata: {\"reasoning\":\"\",\"response\":\"思考：\"}\n\ndata: {\"status\":\"completed\"}\n\n";
        let bytes = body.as_bytes();
        let cut = body.find("思").unwrap() + 1;

        let events = decode(vec![Ok(bytes[..cut].to_vec()), Ok(bytes[cut..].to_vec())]).await;

        assert_eq!(
            events,
            vec![
                StreamEvent::connected(),
                StreamEvent::from(Delta::response_only("思考：")),
                StreamEvent::completed(),
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_record_does_not_end_stream() {
        let events = decode(vec![ok(
            "data: {\"reasoning\":\n\ndata: {\"reasoning\":\"\",\"response\":\"ok\"}\n\ndata: {\"status\":\"completed\"}\n\n",
        )])
        .await;

        assert_eq!(events.len(), 3);
        assert!(events[0].is_error());
        assert_eq!(events[1], StreamEvent::from(Delta::response_only("ok")));
        assert!(events[2].is_completed());
    }

    #[tokio::test]
    async fn test_completed_stops_iteration() {
        let events = decode(vec![ok(
            "data: {\"status\":\"completed\"}\n\ndata: {\"reasoning\":\"\",\"response\":\"late\"}\n\n",
        )])
        .await;
        assert_eq!(events, vec![StreamEvent::completed()]);
    }

    #[tokio::test]
    async fn test_server_error_is_terminal() {
        let events = decode(vec![ok(
            "data: {\"error\":\"DeepSeek request failed\"}\n\ndata: {\"status\":\"completed\"}\n\n",
        )])
        .await;
        assert_eq!(events, vec![StreamEvent::error("DeepSeek request failed")]);
    }

    #[tokio::test]
    async fn test_transport_failure_ends_with_error() {
        let events = decode(vec![
            ok("data: {\"status\":\"connected\"}\n\n"),
            Err("connection reset".to_string()),
            ok("data: {\"status\":\"completed\"}\n\n"),
        ])
        .await;

        assert_eq!(events.len(), 2);
        match &events[1] {
            StreamEvent::Error { error } => assert!(error.contains("connection reset")),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_body_end_without_completed() {
        let events = decode(vec![ok(
            "data: {\"status\":\"waiting\",\"message\":\"waiting for model output\"}\n\n",
        )])
        .await;

        assert_eq!(
            events,
            vec![
                StreamEvent::status_with_message(StreamStatus::Waiting, "waiting for model output"),
                StreamEvent::error(format!("Connection lost: {CLOSED_EARLY}")),
            ]
        );
    }

    #[tokio::test]
    async fn test_only_last_frame_is_terminal() {
        let frames: Vec<Frame> = decode_frames(futures::stream::iter(vec![ok(
            "data: {oops\n\ndata: {\"reasoning\":\"\",\"response\":\"ok\"}\n\n",
        )]))
        .collect()
        .await;

        let terminal: Vec<bool> = frames.iter().map(|f| f.terminal).collect();
        assert_eq!(terminal, vec![false, false, true]);
        assert!(frames[0].event.is_error());
        assert!(frames[2].event.is_error());
    }
}

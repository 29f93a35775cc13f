use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::pin::Pin;

use super::buffering::CircularLineBuffer;
use crate::error::{LlmError, Result};

/// Strategy pattern for parsing different SSE payloads
pub trait SseLineParser: Send {
    type Item: Send;

    /// Parse the payload of one `data: ` line into items
    fn parse_data_line(&self, data: &str) -> Result<Vec<Self::Item>>;

    /// Check if this payload signals end of stream
    fn is_done_marker(&self, data: &str) -> bool {
        data == "[DONE]"
    }
}

/// Generic SSE stream parser using circular buffer
///
/// Lines other than `data: ` (comments, `event:`, `id:`) are ignored. A
/// parse failure is yielded as `Err` and parsing continues with the next
/// line; a transport failure is yielded as `Err(ConnectionLost)` and ends the
/// stream. The stream also ends after the parser's done marker.
pub fn parse_sse_stream<S, B, E, P>(
    byte_stream: S,
    parser: P,
) -> Pin<Box<dyn Stream<Item = Result<P::Item>> + Send>>
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
    P: SseLineParser + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(byte_stream);
        let mut buffer = CircularLineBuffer::with_capacity(4096);

        'read: while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(bytes) => {
                    buffer.extend(bytes.as_ref());

                    while let Some(line_result) = buffer.next_line() {
                        let line = match line_result {
                            Ok(line) => line,
                            Err(e) => {
                                yield Err(e);
                                continue;
                            }
                        };

                        let Some(data) = line.strip_prefix("data:") else {
                            continue;
                        };
                        let data = data.strip_prefix(' ').unwrap_or(data);
                        if data.is_empty() {
                            continue;
                        }

                        if parser.is_done_marker(data) {
                            break 'read;
                        }

                        match parser.parse_data_line(data) {
                            Ok(items) => {
                                for item in items {
                                    yield Ok(item);
                                }
                            }
                            Err(e) => yield Err(e),
                        }
                    }
                }
                Err(e) => {
                    yield Err(LlmError::ConnectionLost(e.to_string()));
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UpperParser;

    impl SseLineParser for UpperParser {
        type Item = String;

        fn parse_data_line(&self, data: &str) -> Result<Vec<String>> {
            if data == "bad" {
                return Err(LlmError::StreamDecode("bad line".to_string()));
            }
            Ok(vec![data.to_uppercase()])
        }
    }

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = std::result::Result<&'static [u8], String>> {
        futures::stream::iter(parts.iter().map(|p| Ok(p.as_bytes())).collect::<Vec<_>>())
    }

    #[tokio::test]
    async fn test_lines_reassembled_across_chunks() {
        let stream = parse_sse_stream(chunks(&["data: ab", "c\n\ndata: d\n\n"]), UpperParser);
        let items: Vec<_> = stream.collect().await;
        let items: Vec<String> = items.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(items, vec!["ABC", "D"]);
    }

    #[tokio::test]
    async fn test_done_marker_stops_stream() {
        let stream = parse_sse_stream(chunks(&["data: a\n\ndata: [DONE]\n\ndata: b\n\n"]), UpperParser);
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_parse_error_does_not_end_stream() {
        let stream = parse_sse_stream(chunks(&["data: bad\n\ndata: ok\n\n"]), UpperParser);
        let items: Vec<_> = stream.collect().await;
        assert!(matches!(items[0], Err(LlmError::StreamDecode(_))));
        assert_eq!(items[1].as_ref().unwrap(), "OK");
    }

    #[tokio::test]
    async fn test_comment_and_event_lines_ignored() {
        let stream = parse_sse_stream(chunks(&[": keep-alive\nevent: x\ndata: a\n\n"]), UpperParser);
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let parts: Vec<std::result::Result<&'static [u8], String>> = vec![
            Ok(b"data: a\n\n"),
            Err("reset by peer".to_string()),
            Ok(b"data: b\n\n"),
        ];
        let stream = parse_sse_stream(futures::stream::iter(parts), UpperParser);
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 2);
        assert!(matches!(items[1], Err(LlmError::ConnectionLost(_))));
    }
}

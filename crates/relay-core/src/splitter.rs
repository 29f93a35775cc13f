//! Streaming classifier that separates a model's "thinking" from its final
//! answer using the literal markers `思考：` and `回答：`.
//!
//! The model is instructed (see [`crate::prompt`]) to answer in the form
//! `思考：<reasoning> 回答：<answer>`. Fragments arrive with arbitrary
//! boundaries, so a marker can be split across two of them; the splitter
//! keeps the full text and resumes each marker search a few bytes before
//! the previously scanned end, which keeps the scan linear in the input.

use async_stream::stream;
use futures::{Stream, StreamExt};
use relay_types::{Delta, StreamEvent};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub const REASONING_MARKER: &str = "思考：";
pub const ANSWER_MARKER: &str = "回答：";

/// What the terminal delta carries when the answer marker never showed up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningFallback {
    /// Repeat the reasoning text as the response
    #[default]
    ReasoningAsResponse,
    /// Leave the response empty
    EmptyResponse,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitOptions {
    /// When false every delta carries an empty `reasoning`
    pub show_reasoning: bool,
    pub fallback: ReasoningFallback,
}

impl SplitOptions {
    pub fn new(show_reasoning: bool) -> Self {
        Self {
            show_reasoning,
            ..Self::default()
        }
    }

    pub fn with_fallback(mut self, fallback: ReasoningFallback) -> Self {
        self.fallback = fallback;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Reasoning,
    Response,
}

/// Per-stream classifier state. Never shared between streams.
#[derive(Debug)]
pub struct ReasoningSplitter {
    options: SplitOptions,
    phase: Phase,
    text: String,
    /// Bytes of `text` already searched for the pending marker
    scanned: usize,
    reasoning_start: usize,
    reasoning_end: usize,
    response_start: usize,
    last: Delta,
}

impl ReasoningSplitter {
    pub fn new(options: SplitOptions) -> Self {
        Self {
            options,
            phase: Phase::Init,
            text: String::new(),
            scanned: 0,
            reasoning_start: 0,
            reasoning_end: 0,
            response_start: 0,
            last: Delta::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Feed one fragment. Returns a delta when the visible
    /// `(reasoning, response)` pair differs from the last one returned.
    pub fn push(&mut self, fragment: &str) -> Option<Delta> {
        if fragment.is_empty() {
            return None;
        }
        self.text.push_str(fragment);
        self.advance();

        let (reasoning, response) = self.visible();
        if reasoning == self.last.reasoning && response == self.last.response {
            return None;
        }
        let delta = Delta::new(reasoning, response);
        self.last = delta.clone();
        Some(delta)
    }

    /// Terminal reconciliation; always produces a delta
    pub fn finish(self) -> Delta {
        match self.phase {
            Phase::Init => Delta::response_only(self.text),
            Phase::Reasoning => {
                let reasoning = self.reasoning_slice();
                let response = match self.options.fallback {
                    ReasoningFallback::ReasoningAsResponse => reasoning,
                    ReasoningFallback::EmptyResponse => "",
                };
                Delta::new(self.shown(reasoning), response)
            }
            Phase::Response => {
                let (reasoning, response) = self.visible();
                Delta::new(reasoning, response)
            }
        }
    }

    fn advance(&mut self) {
        if self.phase == Phase::Init {
            match self.scan(0, REASONING_MARKER) {
                Some(at) => {
                    self.phase = Phase::Reasoning;
                    self.reasoning_start = at + REASONING_MARKER.len();
                    self.scanned = self.reasoning_start;
                }
                None => {
                    self.scanned = self.text.len();
                    return;
                }
            }
        }

        // Both markers may arrive in the same fragment
        if self.phase == Phase::Reasoning {
            if let Some(at) = self.scan(self.reasoning_start, ANSWER_MARKER) {
                self.phase = Phase::Response;
                self.reasoning_end = at;
                self.response_start = at + ANSWER_MARKER.len();
            }
            self.scanned = self.text.len();
        }
    }

    /// Find `marker` in the unscanned tail, starting `marker.len() - 1`
    /// bytes early so a marker split across fragments is still found.
    fn scan(&self, floor: usize, marker: &str) -> Option<usize> {
        let mut start = self
            .scanned
            .saturating_sub(marker.len() - 1)
            .max(floor);
        while !self.text.is_char_boundary(start) {
            start -= 1;
        }
        self.text[start..].find(marker).map(|i| start + i)
    }

    fn reasoning_slice(&self) -> &str {
        match self.phase {
            Phase::Init => "",
            Phase::Reasoning => self.text[self.reasoning_start..].trim(),
            Phase::Response => self.text[self.reasoning_start..self.reasoning_end].trim(),
        }
    }

    fn response_slice(&self) -> &str {
        match self.phase {
            Phase::Response => self.text[self.response_start..].trim(),
            _ => "",
        }
    }

    fn shown<'a>(&self, reasoning: &'a str) -> &'a str {
        if self.options.show_reasoning {
            reasoning
        } else {
            ""
        }
    }

    fn visible(&self) -> (&str, &str) {
        (self.shown(self.reasoning_slice()), self.response_slice())
    }
}

/// Classify a complete text in one go
pub fn split_text(text: &str, options: SplitOptions) -> Delta {
    let mut splitter = ReasoningSplitter::new(options);
    splitter.push(text);
    splitter.finish()
}

/// Lazily classify a fragment stream.
///
/// Yields a delta whenever the visible pair changes, then one terminal
/// delta. A fragment error yields one [`StreamEvent::Error`] and ends the
/// stream with no further deltas.
pub fn split_stream<S, E>(fragments: S, options: SplitOptions) -> impl Stream<Item = StreamEvent> + Send
where
    S: Stream<Item = Result<String, E>> + Send,
    E: Display + Send,
{
    stream! {
        futures::pin_mut!(fragments);
        let mut splitter = ReasoningSplitter::new(options);

        while let Some(item) = fragments.next().await {
            match item {
                Ok(fragment) => {
                    if let Some(delta) = splitter.push(&fragment) {
                        yield StreamEvent::Delta(delta);
                    }
                }
                Err(e) => {
                    yield StreamEvent::error(e.to_string());
                    return;
                }
            }
        }

        yield StreamEvent::Delta(splitter.finish());
    }
}

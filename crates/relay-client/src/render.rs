use relay_types::Delta;

/// Piece of terminal output produced from a cumulative delta
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// First reasoning text of the turn is about to follow
    ReasoningStart,
    Reasoning(String),
    /// First response text of the turn is about to follow
    ResponseStart { after_reasoning: bool },
    Response(String),
}

/// Turns cumulative deltas into the newly appended text only.
///
/// Deltas repeat everything seen so far in each channel; printing them as
/// they arrive would duplicate output.
#[derive(Debug, Default)]
pub struct DeltaPrinter {
    show_reasoning: bool,
    reasoning: String,
    response: String,
}

impl DeltaPrinter {
    pub fn new(show_reasoning: bool) -> Self {
        Self {
            show_reasoning,
            ..Self::default()
        }
    }

    pub fn update(&mut self, delta: &Delta) -> Vec<Segment> {
        let mut segments = Vec::new();

        if self.show_reasoning && !delta.reasoning.is_empty() {
            let suffix = new_suffix(&self.reasoning, &delta.reasoning);
            if !suffix.is_empty() {
                if self.reasoning.is_empty() {
                    segments.push(Segment::ReasoningStart);
                }
                segments.push(Segment::Reasoning(suffix));
                self.reasoning.clone_from(&delta.reasoning);
            }
        }

        if !delta.response.is_empty() {
            let suffix = new_suffix(&self.response, &delta.response);
            if !suffix.is_empty() {
                if self.response.is_empty() {
                    segments.push(Segment::ResponseStart {
                        after_reasoning: !self.reasoning.is_empty(),
                    });
                }
                segments.push(Segment::Response(suffix));
                self.response.clone_from(&delta.response);
            }
        }

        segments
    }

    /// Whether anything has been printed this turn
    pub fn has_output(&self) -> bool {
        !self.response.is_empty() || !self.reasoning.is_empty()
    }

    pub fn response(&self) -> &str {
        &self.response
    }
}

/// Text of `current` past what was already printed. Falls back to skipping
/// by character count when `current` does not extend `printed`.
fn new_suffix(printed: &str, current: &str) -> String {
    match current.strip_prefix(printed) {
        Some(suffix) => suffix.to_string(),
        None => current.chars().skip(printed.chars().count()).collect(),
    }
}

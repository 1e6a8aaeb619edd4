//! Reply segmentation.
//!
//! Splits a raw model reply into an ordered list of prose and fenced-code
//! segments so the renderer can display each kind differently.

use regex::Regex;
use std::sync::OnceLock;

/// One classified unit of a model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Markdown prose found between code fences. Never blank.
    Prose { text: String },
    /// A fenced code block.
    Code {
        /// Tag from the opening fence; empty when the fence had none.
        language: String,
        /// Trimmed body. May be empty.
        body: String,
    },
}

impl Segment {
    /// Create a prose segment.
    pub fn prose(text: impl Into<String>) -> Self {
        Segment::Prose { text: text.into() }
    }

    /// Create a code segment.
    pub fn code(language: impl Into<String>, body: impl Into<String>) -> Self {
        Segment::Code {
            language: language.into(),
            body: body.into(),
        }
    }
}

/// Opening backticks, an optional language tag glued to them, a newline, the
/// body, then the first newline + closing backticks.
fn fence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)```(\w*)\n(.*?)\n```").expect("fence pattern is valid"))
}

/// Split a reply into prose and code segments, in order of appearance.
///
/// Never fails. An unterminated fence is left in the surrounding prose, and
/// the first closing fence ends a block even if the body holds more backticks.
pub fn segment(raw: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for caps in fence_pattern().captures_iter(raw) {
        let Some(fence) = caps.get(0) else {
            continue;
        };

        push_prose(&mut segments, &raw[cursor..fence.start()]);

        let language = caps.get(1).map_or("", |m| m.as_str());
        let body = caps.get(2).map_or("", |m| m.as_str());
        segments.push(Segment::code(language, body.trim()));

        cursor = fence.end();
    }

    push_prose(&mut segments, &raw[cursor..]);
    segments
}

/// Blank spans between fences produce no segment.
fn push_prose(segments: &mut Vec<Segment>, span: &str) {
    let text = span.trim();
    if !text.is_empty() {
        segments.push(Segment::prose(text));
    }
}

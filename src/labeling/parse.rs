//! Tolerant extraction of label arrays from model output.
//!
//! Models wrap JSON in markdown fences, add chatter before or after it, or
//! invent categories. Extraction proceeds in order:
//! 1. Trim, then drop a leading ```` ``` ```` / ```` ```json ```` fence line and a trailing fence.
//! 2. Strict JSON parse of what remains.
//! 3. On failure, parse the substring between the first `[` and the last `]`.
//!
//! Array entries that do not deserialize into a `LabelSegment` (unknown label,
//! missing fields) are skipped one by one; the rest of the array is kept.

use crate::error::{ChapterizeError, Result};
use crate::pipeline::types::LabelSegment;
use serde_json::Value;
use std::fmt;

/// Why a response could not be turned into a label array.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseFailure {
    /// Nothing left after trimming and fence removal.
    Empty,
    /// Neither the body nor any bracketed substring is valid JSON.
    NotJson { message: String },
    /// Valid JSON, but not an array.
    NotAnArray,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseFailure::Empty => f.write_str("empty response"),
            ParseFailure::NotJson { message } => write!(f, "invalid JSON: {message}"),
            ParseFailure::NotAnArray => f.write_str("JSON value is not an array"),
        }
    }
}

impl From<ParseFailure> for ChapterizeError {
    fn from(failure: ParseFailure) -> Self {
        ChapterizeError::BackendParse {
            message: failure.to_string(),
        }
    }
}

/// Labels recovered from one response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedLabels {
    pub labels: Vec<LabelSegment>,
    /// Array entries dropped because they were not valid label records.
    pub skipped: usize,
}

/// Remove an optional markdown code fence around `raw`.
pub fn strip_code_fence(raw: &str) -> &str {
    let mut body = raw.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = match rest.find('\n') {
            Some(pos) => &rest[pos + 1..],
            // Single-line fence: ```json[...]```
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
        body = body.trim_end();
        if let Some(inner) = body.strip_suffix("```") {
            body = inner;
        }
    }
    body.trim()
}

/// Parse a model response into label segments.
pub fn parse_label_response(raw: &str) -> std::result::Result<ParsedLabels, ParseFailure> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(ParseFailure::Empty);
    }

    let value = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(strict_err) => bracketed(body).ok_or_else(|| ParseFailure::NotJson {
            message: strict_err.to_string(),
        })?,
    };

    let Value::Array(entries) = value else {
        return Err(ParseFailure::NotAnArray);
    };

    let mut parsed = ParsedLabels::default();
    for entry in entries {
        match serde_json::from_value::<LabelSegment>(entry) {
            Ok(label) => parsed.labels.push(label),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed label entry");
                parsed.skipped += 1;
            }
        }
    }
    Ok(parsed)
}

/// Parse `raw` for `backend` into labels, warning about dropped entries.
///
/// An unusable response is a `BackendParse` error; the dispatcher records it
/// as a failed chunk.
pub fn labels_from_response(backend: &str, raw: &str) -> Result<Vec<LabelSegment>> {
    let parsed = parse_label_response(raw)?;
    if parsed.skipped > 0 {
        tracing::warn!(backend, skipped = parsed.skipped, "dropped invalid label entries");
    }
    Ok(parsed.labels)
}

/// Fallback: the first `[` through the last `]`, if that parses as JSON.
fn bracketed(body: &str) -> Option<Value> {
    let open = body.find('[')?;
    let close = body.rfind(']')?;
    if close <= open {
        return None;
    }
    serde_json::from_str(&body[open..=close]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{ChapterLabel, Timestamp};

    const PLAIN: &str = r#"[{"start": "00:00", "end": "01:10", "label": "Introduction"}]"#;

    #[test]
    fn test_plain_array() {
        let parsed = parse_label_response(PLAIN).unwrap();
        assert_eq!(parsed.labels.len(), 1);
        assert_eq!(parsed.labels[0].label, ChapterLabel::Introduction);
        assert_eq!(parsed.skipped, 0);
    }

    #[test]
    fn test_json_fence_is_stripped() {
        let raw = format!("```json\n{PLAIN}\n```");
        assert_eq!(strip_code_fence(&raw), PLAIN);
        assert_eq!(parse_label_response(&raw).unwrap().labels.len(), 1);
    }

    #[test]
    fn test_bare_fence_is_stripped() {
        let raw = format!("```\n{PLAIN}\n```\n");
        assert_eq!(strip_code_fence(&raw), PLAIN);
    }

    #[test]
    fn test_single_line_fence_is_stripped() {
        let raw = format!("```json{PLAIN}```");
        assert_eq!(strip_code_fence(&raw), PLAIN);
    }

    #[test]
    fn test_unfenced_text_is_untouched() {
        assert_eq!(strip_code_fence("  [1, 2]  "), "[1, 2]");
    }

    #[test]
    fn test_surrounding_chatter_uses_bracket_fallback() {
        let raw = format!("Sure! Here are the segments:\n{PLAIN}\nLet me know if you need more.");
        let parsed = parse_label_response(&raw).unwrap();
        assert_eq!(parsed.labels.len(), 1);
        assert_eq!(parsed.labels[0].end, Timestamp::Clock("01:10".into()));
    }

    #[test]
    fn test_unknown_labels_are_skipped_individually() {
        let raw = r#"[
            {"start": "00:00", "end": "00:30", "label": "Weather"},
            {"start": "00:30", "end": "01:00", "label": "topic b"},
            {"start": "01:00"}
        ]"#;
        let parsed = parse_label_response(raw).unwrap();
        assert_eq!(parsed.labels.len(), 1);
        assert_eq!(parsed.labels[0].label, ChapterLabel::TopicB);
        assert_eq!(parsed.skipped, 2);
    }

    #[test]
    fn test_numeric_timestamps() {
        let raw = r#"[{"start": 0, "end": 42.5, "label": "Summary"}]"#;
        let parsed = parse_label_response(raw).unwrap();
        assert_eq!(parsed.labels[0].start, Timestamp::Seconds(0.0));
        assert_eq!(parsed.labels[0].end, Timestamp::Seconds(42.5));
    }

    #[test]
    fn test_empty_response() {
        assert_eq!(parse_label_response("   "), Err(ParseFailure::Empty));
        assert_eq!(parse_label_response("```json\n```"), Err(ParseFailure::Empty));
    }

    #[test]
    fn test_prose_is_not_json() {
        let result = parse_label_response("I could not find any segments.");
        assert!(matches!(result, Err(ParseFailure::NotJson { .. })));
    }

    #[test]
    fn test_object_is_not_an_array() {
        let result = parse_label_response(r#"{"label": "Ad"}"#);
        assert_eq!(result, Err(ParseFailure::NotAnArray));
    }

    #[test]
    fn test_reversed_brackets_are_not_json() {
        let result = parse_label_response("] nothing here [");
        assert!(matches!(result, Err(ParseFailure::NotJson { .. })));
    }

    #[test]
    fn test_unusable_response_is_a_parse_error() {
        assert!(matches!(
            labels_from_response("test", "not json at all"),
            Err(ChapterizeError::BackendParse { .. })
        ));
        assert_eq!(labels_from_response("test", PLAIN).unwrap().len(), 1);
    }

    #[test]
    fn test_failure_converts_to_backend_parse_error() {
        let error: ChapterizeError = ParseFailure::NotAnArray.into();
        assert!(matches!(error, ChapterizeError::BackendParse { .. }));
    }
}

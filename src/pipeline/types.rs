//! Data types flowing between pipeline stages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One transcribed speech segment. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptSegment {
    /// Creates a new transcript segment.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Recognized on-screen text per frame filename.
///
/// A `BTreeMap` so prompt rendering and sampling iterate frames in sorted order.
pub type OcrResults = BTreeMap<String, Vec<String>>;

/// A detected scene. `end` is unknown for the last scene of the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub start: f64,
    pub end: Option<f64>,
}

/// Chapter boundary as produced by the labeling model.
///
/// Models answer with either clock strings (`"01:10"`) or raw seconds; both are
/// kept verbatim and rendered back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Seconds(f64),
    Clock(String),
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Seconds(secs) => write!(f, "{secs}"),
            Timestamp::Clock(clock) => f.write_str(clock),
        }
    }
}

impl From<&str> for Timestamp {
    fn from(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<f64>() {
            Ok(secs) if secs.is_finite() => Timestamp::Seconds(secs),
            _ => Timestamp::Clock(raw.to_string()),
        }
    }
}

/// The closed set of chapter categories a segment can be labeled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChapterLabel {
    Introduction,
    GuestIntroduction,
    TopicA,
    TopicB,
    Promo,
    Ad,
    Summary,
}

impl ChapterLabel {
    /// Every category, in the order presented to the model.
    pub const ALL: [ChapterLabel; 7] = [
        ChapterLabel::Introduction,
        ChapterLabel::GuestIntroduction,
        ChapterLabel::TopicA,
        ChapterLabel::TopicB,
        ChapterLabel::Promo,
        ChapterLabel::Ad,
        ChapterLabel::Summary,
    ];

    /// Display name, as it appears in prompts and in `chapters.txt`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChapterLabel::Introduction => "Introduction",
            ChapterLabel::GuestIntroduction => "Guest Introduction",
            ChapterLabel::TopicA => "Topic A",
            ChapterLabel::TopicB => "Topic B",
            ChapterLabel::Promo => "Promo",
            ChapterLabel::Ad => "Ad",
            ChapterLabel::Summary => "Summary",
        }
    }
}

impl fmt::Display for ChapterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChapterLabel {
    type Err = String;

    /// Case-insensitive match on the display name, ignoring surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ChapterLabel::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown chapter label: {wanted:?}"))
    }
}

impl TryFrom<String> for ChapterLabel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChapterLabel> for String {
    fn from(label: ChapterLabel) -> Self {
        label.as_str().to_string()
    }
}

/// One labeled chapter span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSegment {
    pub start: Timestamp,
    pub end: Timestamp,
    pub label: ChapterLabel,
}

impl LabelSegment {
    /// Creates a new label segment.
    pub fn new(
        start: impl Into<Timestamp>,
        end: impl Into<Timestamp>,
        label: ChapterLabel,
    ) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            label,
        }
    }
}

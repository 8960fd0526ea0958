//! Resumable video-to-chapters pipeline.
//!
//! Each stage persists one artifact; its presence is the checkpoint that lets
//! a later run skip the stage.

pub mod cache;
pub mod chapters;
pub mod orchestrator;
pub mod stage;
pub mod types;

pub use chapters::{parse_chapter_line, read_chapters, render_chapters, write_chapters};
pub use orchestrator::{Pipeline, clean_stages, sample_ocr, sample_transcript, stage_status};
pub use stage::{RunSummary, Stage, StageOutcome, StageReport, StageState, StageStatus};
pub use types::{ChapterLabel, LabelSegment, OcrResults, Scene, Timestamp, TranscriptSegment};

//! External media and ML collaborators.
//!
//! Each stage of the pipeline except labeling is a single call into an
//! external tool. The `MediaTools` trait is the seam between the orchestrator
//! and those tools: `CommandMediaTools` drives real binaries, `MockMediaTools`
//! produces canned outputs for tests.

pub mod command;

pub use command::{CommandMediaTools, parse_scene_cuts, scenes_from_cuts};

use crate::error::{ChapterizeError, Result};
use crate::pipeline::types::{OcrResults, Scene, TranscriptSegment};
use std::path::Path;
use std::sync::Mutex;

/// I/O contract of the collaborator stages.
///
/// Any error returned here is fatal for the run.
pub trait MediaTools: Send + Sync {
    /// Write a 16 kHz mono WAV of the video's audio track to `out`.
    fn extract_audio(&self, video: &Path, out: &Path) -> Result<()>;

    /// Detect scene boundaries. The first scene always starts at 0.
    fn detect_scenes(&self, video: &Path) -> Result<Vec<Scene>>;

    /// Write one JPEG per scene start into `dir` and return the file names in scene order.
    fn extract_frames(&self, video: &Path, scenes: &[Scene], dir: &Path) -> Result<Vec<String>>;

    /// Transcribe the audio into ordered timestamped segments.
    fn transcribe(&self, audio: &Path) -> Result<Vec<TranscriptSegment>>;

    /// Recognize on-screen text for each frame in `dir`.
    fn recognize_text(&self, dir: &Path, frames: &[String]) -> Result<OcrResults>;
}

/// Frame file name for the scene at `index`.
pub fn frame_name(index: usize) -> String {
    format!("scene_{index:03}.jpg")
}

/// Mock collaborators for testing.
///
/// Writes small but valid files where a real tool would, and records every
/// call by stage name.
#[derive(Debug, Default)]
pub struct MockMediaTools {
    scenes: Vec<Scene>,
    transcript: Vec<TranscriptSegment>,
    ocr: OcrResults,
    failing_stage: Option<&'static str>,
    calls: Mutex<Vec<&'static str>>,
}

impl MockMediaTools {
    /// One scene covering the whole video, no speech, no on-screen text.
    pub fn new() -> Self {
        Self {
            scenes: vec![Scene {
                start: 0.0,
                end: None,
            }],
            ..Self::default()
        }
    }

    pub fn with_scenes(mut self, scenes: Vec<Scene>) -> Self {
        self.scenes = scenes;
        self
    }

    pub fn with_transcript(mut self, transcript: Vec<TranscriptSegment>) -> Self {
        self.transcript = transcript;
        self
    }

    pub fn with_ocr(mut self, ocr: OcrResults) -> Self {
        self.ocr = ocr;
        self
    }

    /// Make the named stage (`audio`, `scenes`, `frames`, `transcript`, `ocr`) fail.
    pub fn failing_on(mut self, stage: &'static str) -> Self {
        self.failing_stage = Some(stage);
        self
    }

    /// Stage names of every call so far, in call order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// How many times the named stage was invoked.
    pub fn call_count(&self, stage: &str) -> usize {
        self.calls().iter().filter(|s| **s == stage).count()
    }

    fn record(&self, stage: &'static str) -> Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(stage);
        }
        if self.failing_stage == Some(stage) {
            return Err(ChapterizeError::collaborator(stage, "mock collaborator failure"));
        }
        Ok(())
    }
}

impl MediaTools for MockMediaTools {
    fn extract_audio(&self, _video: &Path, out: &Path) -> Result<()> {
        self.record("audio")?;
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: crate::defaults::SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(out, spec)
            .map_err(|e| ChapterizeError::collaborator("audio", e.to_string()))?;
        for _ in 0..160 {
            writer
                .write_sample(0i16)
                .map_err(|e| ChapterizeError::collaborator("audio", e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| ChapterizeError::collaborator("audio", e.to_string()))
    }

    fn detect_scenes(&self, _video: &Path) -> Result<Vec<Scene>> {
        self.record("scenes")?;
        Ok(self.scenes.clone())
    }

    fn extract_frames(&self, _video: &Path, scenes: &[Scene], dir: &Path) -> Result<Vec<String>> {
        self.record("frames")?;
        std::fs::create_dir_all(dir)?;
        let mut frames = Vec::with_capacity(scenes.len());
        for index in 0..scenes.len() {
            let name = frame_name(index);
            std::fs::write(dir.join(&name), b"")?;
            frames.push(name);
        }
        Ok(frames)
    }

    fn transcribe(&self, _audio: &Path) -> Result<Vec<TranscriptSegment>> {
        self.record("transcript")?;
        Ok(self.transcript.clone())
    }

    fn recognize_text(&self, _dir: &Path, _frames: &[String]) -> Result<OcrResults> {
        self.record("ocr")?;
        Ok(self.ocr.clone())
    }
}

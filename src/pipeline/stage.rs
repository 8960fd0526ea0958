//! Pipeline stages, their artifacts and their lifecycle.

use crate::config::PathsConfig;
use crate::error::{ChapterizeError, Result};
use std::fmt;
use std::path::PathBuf;

/// One step of the pipeline with a single persisted artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Stage {
    Audio,
    Scenes,
    Frames,
    Transcript,
    Ocr,
    Labels,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 6] = [
        Stage::Audio,
        Stage::Scenes,
        Stage::Frames,
        Stage::Transcript,
        Stage::Ocr,
        Stage::Labels,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Audio => "audio",
            Stage::Scenes => "scenes",
            Stage::Frames => "frames",
            Stage::Transcript => "transcript",
            Stage::Ocr => "ocr",
            Stage::Labels => "labels",
        }
    }

    /// The artifact whose presence marks this stage as done.
    pub fn artifact(&self, paths: &PathsConfig) -> PathBuf {
        match self {
            Stage::Audio => paths.audio.clone(),
            Stage::Scenes => paths.scenes_file(),
            Stage::Frames => paths.frames_file(),
            Stage::Transcript => paths.transcript.clone(),
            Stage::Ocr => paths.ocr.clone(),
            Stage::Labels => paths.chapters.clone(),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Lifecycle of one stage within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Pending,
    Running,
    Done,
    Failed,
}

impl StageState {
    /// Move to `next`, rejecting transitions the lifecycle does not allow.
    ///
    /// Allowed: Pending→Done (cache hit), Pending→Running, Running→Done,
    /// Running→Failed. Done and Failed are terminal.
    pub fn transition(self, stage: Stage, next: StageState) -> Result<StageState> {
        use StageState::*;
        match (self, next) {
            (Pending, Done) | (Pending, Running) | (Running, Done) | (Running, Failed) => Ok(next),
            (from, to) => Err(ChapterizeError::Other(format!(
                "invalid {stage} stage transition {from:?} -> {to:?}"
            ))),
        }
    }
}

/// How a stage reached `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The artifact was already present and was loaded.
    Cached,
    /// The collaborator ran and the artifact was written.
    Computed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub outcome: StageOutcome,
}

/// Result of a complete run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub reports: Vec<StageReport>,
    pub chapters: usize,
    pub failed_chunks: usize,
}

impl RunSummary {
    pub fn outcome(&self, stage: Stage) -> Option<StageOutcome> {
        self.reports
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| r.outcome)
    }
}

/// Whether a stage's artifact exists, for status display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageStatus {
    pub stage: Stage,
    pub artifact: PathBuf,
    pub cached: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_cache_hit_goes_straight_to_done() {
        let state = StageState::Pending
            .transition(Stage::Audio, StageState::Done)
            .unwrap();
        assert_eq!(state, StageState::Done);
    }

    #[test]
    fn test_compute_path() {
        let running = StageState::Pending
            .transition(Stage::Ocr, StageState::Running)
            .unwrap();
        assert_eq!(
            running.transition(Stage::Ocr, StageState::Failed).unwrap(),
            StageState::Failed
        );
    }

    #[test]
    fn test_done_never_reenters_running() {
        let err = StageState::Done
            .transition(Stage::Transcript, StageState::Running)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid transcript stage transition Done -> Running"
        );
        assert!(
            StageState::Pending
                .transition(Stage::Labels, StageState::Failed)
                .is_err()
        );
        assert!(
            StageState::Failed
                .transition(Stage::Labels, StageState::Done)
                .is_err()
        );
    }

    #[test]
    fn test_artifacts_follow_paths_config() {
        let paths = PathsConfig::default().resolve(Path::new("/work"));
        assert_eq!(
            Stage::Audio.artifact(&paths),
            PathBuf::from("/work/audio/audio.wav")
        );
        assert_eq!(
            Stage::Scenes.artifact(&paths),
            PathBuf::from("/work/scenes/scenes.json")
        );
        assert_eq!(
            Stage::Frames.artifact(&paths),
            PathBuf::from("/work/scenes/frames.json")
        );
        assert_eq!(
            Stage::Labels.artifact(&paths),
            PathBuf::from("/work/output/chapters.txt")
        );
    }

    #[test]
    fn test_summary_outcome_lookup() {
        let summary = RunSummary {
            reports: vec![StageReport {
                stage: Stage::Audio,
                outcome: StageOutcome::Cached,
            }],
            ..RunSummary::default()
        };
        assert_eq!(summary.outcome(Stage::Audio), Some(StageOutcome::Cached));
        assert_eq!(summary.outcome(Stage::Labels), None);
    }
}

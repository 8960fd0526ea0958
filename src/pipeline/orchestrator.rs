//! Resumable pipeline from video to chapters.
//!
//! Stages run strictly in order: audio, scenes, frames, transcript, OCR,
//! labels. Before each one the stage cache is consulted; a present artifact is
//! loaded and the collaborator is skipped. Collaborator failures abort the
//! run. Labeling failures stay local to their chunk.

use crate::config::{Config, PathsConfig};
use crate::error::{ChapterizeError, Result};
use crate::labeling::{
    ChunkDispatcher, LabelBackend, chunk_transcript, create_backend, failed_chunks, merge_results,
};
use crate::media::{CommandMediaTools, MediaTools};
use crate::pipeline::cache;
use crate::pipeline::chapters::{read_chapters, write_chapters};
use crate::pipeline::stage::{
    RunSummary, Stage, StageOutcome, StageReport, StageState, StageStatus,
};
use crate::pipeline::types::{LabelSegment, OcrResults, Scene, TranscriptSegment};
use crate::process::SystemCommandRunner;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// The staged pipeline, wired to its collaborators and labeling backend.
pub struct Pipeline {
    config: Config,
    media: Arc<dyn MediaTools>,
    backend: Arc<dyn LabelBackend>,
}

impl Pipeline {
    /// Create a pipeline over explicit collaborators.
    ///
    /// `config.paths` must already be resolved against the working directory.
    pub fn new(
        config: Config,
        media: Arc<dyn MediaTools>,
        backend: Arc<dyn LabelBackend>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            media,
            backend,
        })
    }

    /// Create a pipeline that drives the configured system tools and backend.
    pub fn from_config(config: Config) -> Result<Self> {
        let runner = Arc::new(SystemCommandRunner::new());
        let media = Arc::new(CommandMediaTools::new(config.tools.clone(), runner));
        let backend = create_backend(&config)?;
        Self::new(config, media, backend)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every stage, reusing cached artifacts.
    pub fn run(&self) -> Result<RunSummary> {
        let paths = &self.config.paths;
        let mut summary = RunSummary::default();
        let started = Instant::now();

        self.run_stage(Stage::Audio, &mut summary, cache::validate_wav, |artifact| {
            self.require_video(Stage::Audio)?;
            let partial = cache::begin_partial(artifact)?;
            self.media.extract_audio(&paths.video, &partial)?;
            cache::commit_partial(artifact)
        })?;

        let scenes: Vec<Scene> =
            self.run_stage(Stage::Scenes, &mut summary, cache::load_json, |artifact| {
                self.require_video(Stage::Scenes)?;
                let scenes = self.media.detect_scenes(&paths.video)?;
                tracing::info!(scenes = scenes.len(), "detected scenes");
                cache::store_json(artifact, &scenes)?;
                Ok(scenes)
            })?;

        let frames: Vec<String> =
            self.run_stage(Stage::Frames, &mut summary, cache::load_json, |artifact| {
                self.require_video(Stage::Frames)?;
                let frames = self
                    .media
                    .extract_frames(&paths.video, &scenes, &paths.scenes_dir)?;
                // The manifest goes last; it is the frames checkpoint.
                cache::store_json(artifact, &frames)?;
                Ok(frames)
            })?;

        let transcript: Vec<TranscriptSegment> =
            self.run_stage(Stage::Transcript, &mut summary, cache::load_json, |artifact| {
                let transcript = self.media.transcribe(&paths.audio)?;
                tracing::info!(segments = transcript.len(), "transcribed audio");
                cache::store_json(artifact, &transcript)?;
                Ok(transcript)
            })?;

        let ocr: OcrResults =
            self.run_stage(Stage::Ocr, &mut summary, cache::load_json, |artifact| {
                let ocr = self.media.recognize_text(&paths.scenes_dir, &frames)?;
                cache::store_json(artifact, &ocr)?;
                Ok(ocr)
            })?;

        let mut failed = 0;
        let chapters = self.run_stage(Stage::Labels, &mut summary, read_chapters, |artifact| {
            let (labels, failed_count) = self.label(&transcript, &ocr);
            failed = failed_count;
            write_chapters(artifact, &labels)?;
            Ok(labels)
        })?;

        summary.chapters = chapters.len();
        summary.failed_chunks = failed;
        tracing::info!(
            chapters = summary.chapters,
            failed_chunks = summary.failed_chunks,
            elapsed = ?started.elapsed(),
            "pipeline finished"
        );
        Ok(summary)
    }

    /// Label the transcript; returns merged labels and the failed-chunk count.
    fn label(
        &self,
        transcript: &[TranscriptSegment],
        ocr: &OcrResults,
    ) -> (Vec<LabelSegment>, usize) {
        let labeling = &self.config.labeling;
        let sampled_ocr;
        let (transcript, ocr) = match labeling.sample_fraction {
            Some(fraction) => {
                sampled_ocr = sample_ocr(ocr, fraction);
                let transcript = sample_transcript(transcript, fraction);
                tracing::info!(
                    fraction,
                    segments = transcript.len(),
                    frames = sampled_ocr.len(),
                    "labeling a sample of the inputs"
                );
                (transcript, &sampled_ocr)
            }
            None => (transcript, ocr),
        };

        let chunks = chunk_transcript(transcript, labeling.chunk_size);
        tracing::info!(
            chunks = chunks.len(),
            chunk_size = labeling.chunk_size,
            parallelism = labeling.parallelism,
            backend = self.backend.name(),
            "labeling transcript"
        );

        let dispatcher = ChunkDispatcher::new(self.backend.clone(), labeling.parallelism);
        let results = dispatcher.dispatch(&chunks, ocr);
        let failed = failed_chunks(&results);
        if failed > 0 {
            tracing::warn!(failed, total = chunks.len(), "some chunks produced no labels");
        }
        (merge_results(results), failed)
    }

    /// Consult the cache for `stage`, then either load its artifact or compute it.
    fn run_stage<T>(
        &self,
        stage: Stage,
        summary: &mut RunSummary,
        load: impl FnOnce(&Path) -> Result<T>,
        compute: impl FnOnce(&Path) -> Result<T>,
    ) -> Result<T> {
        let artifact = stage.artifact(&self.config.paths);
        let state = StageState::Pending;

        if cache::has_artifact(&artifact) {
            state.transition(stage, StageState::Done)?;
            tracing::info!(%stage, path = %artifact.display(), "artifact present, skipping");
            let value = load(&artifact)?;
            summary.reports.push(StageReport {
                stage,
                outcome: StageOutcome::Cached,
            });
            return Ok(value);
        }

        let state = state.transition(stage, StageState::Running)?;
        tracing::info!(%stage, "running stage");
        let started = Instant::now();

        match compute(&artifact) {
            Ok(value) => {
                state.transition(stage, StageState::Done)?;
                tracing::info!(%stage, elapsed = ?started.elapsed(), "stage done");
                summary.reports.push(StageReport {
                    stage,
                    outcome: StageOutcome::Computed,
                });
                Ok(value)
            }
            Err(e) => {
                state.transition(stage, StageState::Failed)?;
                tracing::error!(%stage, error = %e, "stage failed");
                Err(e)
            }
        }
    }

    fn require_video(&self, stage: Stage) -> Result<()> {
        let video = &self.config.paths.video;
        if video.is_file() {
            Ok(())
        } else {
            Err(ChapterizeError::collaborator(
                stage.as_str(),
                format!("input video not found: {}", video.display()),
            ))
        }
    }

    /// Artifact presence for every stage.
    pub fn status(&self) -> Vec<StageStatus> {
        stage_status(&self.config.paths)
    }
}

/// Artifact presence for every stage, in execution order.
pub fn stage_status(paths: &PathsConfig) -> Vec<StageStatus> {
    Stage::ALL
        .into_iter()
        .map(|stage| {
            let artifact = stage.artifact(paths);
            StageStatus {
                stage,
                cached: cache::has_artifact(&artifact),
                artifact,
            }
        })
        .collect()
}

/// Delete the artifacts of `stages` so the next run recomputes them.
///
/// Returns the paths that were actually removed.
pub fn clean_stages(paths: &PathsConfig, stages: &[Stage]) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for stage in stages {
        let artifact = stage.artifact(paths);
        for path in [cache::partial_path(&artifact), artifact] {
            if cache::remove_artifact(&path)? {
                tracing::info!(%stage, path = %path.display(), "removed artifact");
                removed.push(path);
            }
        }
    }
    Ok(removed)
}

/// The first `floor(len * fraction)` transcript segments.
pub fn sample_transcript(transcript: &[TranscriptSegment], fraction: f64) -> &[TranscriptSegment] {
    let keep = sample_len(transcript.len(), fraction);
    &transcript[..keep]
}

/// The first `floor(frames * fraction)` OCR entries in frame-name order.
pub fn sample_ocr(ocr: &OcrResults, fraction: f64) -> OcrResults {
    let keep = sample_len(ocr.len(), fraction);
    ocr.iter()
        .take(keep)
        .map(|(frame, texts)| (frame.clone(), texts.clone()))
        .collect()
}

fn sample_len(len: usize, fraction: f64) -> usize {
    let keep = (len as f64 * fraction.clamp(0.0, 1.0)).floor() as usize;
    keep.min(len)
}

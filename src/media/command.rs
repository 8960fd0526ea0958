//! `MediaTools` backed by external command-line tools.
//!
//! ffmpeg handles audio, scenes and frames. Transcription and OCR run the
//! configured commands with `{audio}` / `{image}` substituted into their args.

use crate::config::ToolsConfig;
use crate::defaults::{AUDIO_PLACEHOLDER, IMAGE_PLACEHOLDER, SAMPLE_RATE};
use crate::error::{ChapterizeError, Result};
use crate::media::{MediaTools, frame_name};
use crate::pipeline::types::{OcrResults, Scene, TranscriptSegment};
use crate::process::{CommandOutput, CommandRunner, substitute};
use std::path::Path;
use std::sync::Arc;

pub struct CommandMediaTools {
    tools: ToolsConfig,
    runner: Arc<dyn CommandRunner>,
}

impl CommandMediaTools {
    pub fn new(tools: ToolsConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { tools, runner }
    }

    fn ffmpeg(&self, stage: &str, args: Vec<String>) -> Result<CommandOutput> {
        self.run(stage, &self.tools.ffmpeg, &args)
    }

    /// Run a collaborator and attribute any failure to `stage`.
    fn run(&self, stage: &str, program: &str, args: &[String]) -> Result<CommandOutput> {
        tracing::debug!(stage, program, ?args, "running collaborator");
        match self.runner.run(program, args, None, None) {
            Ok(output) => Ok(output),
            Err(ChapterizeError::Collaborator { message, .. }) => Err(
                ChapterizeError::collaborator(stage, format!("{program} {message}")),
            ),
            Err(e) => Err(e),
        }
    }
}

impl MediaTools for CommandMediaTools {
    fn extract_audio(&self, video: &Path, out: &Path) -> Result<()> {
        let args = vec![
            "-y".to_string(),
            "-i".to_string(),
            path_arg(video),
            "-ac".to_string(),
            "1".to_string(),
            "-ar".to_string(),
            SAMPLE_RATE.to_string(),
            path_arg(out),
        ];
        self.ffmpeg("audio", args).map(|_| ())
    }

    fn detect_scenes(&self, video: &Path) -> Result<Vec<Scene>> {
        let filter = format!("select='gt(scene,{})',showinfo", self.tools.scene_threshold);
        let args = vec![
            "-i".to_string(),
            path_arg(video),
            "-vf".to_string(),
            filter,
            "-f".to_string(),
            "null".to_string(),
            "-".to_string(),
        ];
        // showinfo reports on stderr
        let output = self.ffmpeg("scenes", args)?;
        Ok(scenes_from_cuts(&parse_scene_cuts(&output.stderr)))
    }

    fn extract_frames(&self, video: &Path, scenes: &[Scene], dir: &Path) -> Result<Vec<String>> {
        std::fs::create_dir_all(dir)?;
        let mut frames = Vec::with_capacity(scenes.len());
        for (index, scene) in scenes.iter().enumerate() {
            let name = frame_name(index);
            let args = vec![
                "-y".to_string(),
                "-ss".to_string(),
                format!("{:.3}", scene.start),
                "-i".to_string(),
                path_arg(video),
                "-frames:v".to_string(),
                "1".to_string(),
                "-q:v".to_string(),
                "2".to_string(),
                path_arg(&dir.join(&name)),
            ];
            self.ffmpeg("frames", args)?;
            frames.push(name);
        }
        Ok(frames)
    }

    fn transcribe(&self, audio: &Path) -> Result<Vec<TranscriptSegment>> {
        let args = substitute(&self.tools.transcribe_args, AUDIO_PLACEHOLDER, &path_arg(audio));
        let output = self.run("transcript", &self.tools.transcribe_command, &args)?;
        serde_json::from_str(output.stdout.trim()).map_err(|e| {
            ChapterizeError::collaborator(
                "transcript",
                format!("{} produced invalid JSON: {e}", self.tools.transcribe_command),
            )
        })
    }

    fn recognize_text(&self, dir: &Path, frames: &[String]) -> Result<OcrResults> {
        let mut results = OcrResults::new();
        for frame in frames {
            let image = path_arg(&dir.join(frame));
            let args = substitute(&self.tools.ocr_args, IMAGE_PLACEHOLDER, &image);
            let output = self.run("ocr", &self.tools.ocr_command, &args)?;
            let lines = output
                .stdout
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();
            results.insert(frame.clone(), lines);
        }
        Ok(results)
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Extract scene-cut timestamps from ffmpeg `showinfo` output.
///
/// Every `pts_time:<seconds>` occurrence is one cut. Unparseable values are skipped.
pub fn parse_scene_cuts(stderr: &str) -> Vec<f64> {
    stderr
        .lines()
        .filter_map(|line| {
            let (_, rest) = line.split_once("pts_time:")?;
            let value = rest.split_whitespace().next()?;
            value.parse::<f64>().ok()
        })
        .collect()
}

/// Turn cut timestamps into contiguous scenes; the first starts at 0, the last is open.
pub fn scenes_from_cuts(cuts: &[f64]) -> Vec<Scene> {
    let mut starts = vec![0.0];
    for &cut in cuts {
        if cut > starts[starts.len() - 1] {
            starts.push(cut);
        }
    }
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| Scene {
            start,
            end: starts.get(i + 1).copied(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::tests::MockCommandRunner;

    const SHOWINFO: &str = "\
[Parsed_showinfo_1 @ 0x5581] config in time_base: 1/12800, frame_rate: 25/1
[Parsed_showinfo_1 @ 0x5581] n:   0 pts: 160768 pts_time:12.56   duration:    512 fmt:yuv420p
[Parsed_showinfo_1 @ 0x5581] n:   1 pts: 491520 pts_time:38.4    duration:    512 fmt:yuv420p
frame=    2 fps=0.0 q=-0.0 Lsize=N/A time=00:01:00.00 bitrate=N/A speed= 120x
";

    fn tools(runner: MockCommandRunner) -> (CommandMediaTools, Arc<MockCommandRunner>) {
        let runner = Arc::new(runner);
        (
            CommandMediaTools::new(ToolsConfig::default(), runner.clone()),
            runner,
        )
    }

    #[test]
    fn test_parse_scene_cuts() {
        assert_eq!(parse_scene_cuts(SHOWINFO), vec![12.56, 38.4]);
        assert!(parse_scene_cuts("no scene changes").is_empty());
    }

    #[test]
    fn test_scenes_from_cuts() {
        let scenes = scenes_from_cuts(&[12.56, 38.4]);
        assert_eq!(scenes.len(), 3);
        assert_eq!(scenes[0].start, 0.0);
        assert_eq!(scenes[0].end, Some(12.56));
        assert_eq!(scenes[2].start, 38.4);
        assert_eq!(scenes[2].end, None);
    }

    #[test]
    fn test_scenes_from_no_cuts_is_one_scene() {
        let scenes = scenes_from_cuts(&[]);
        assert_eq!(scenes, vec![Scene { start: 0.0, end: None }]);
    }

    #[test]
    fn test_cut_at_zero_is_not_a_new_scene() {
        assert_eq!(scenes_from_cuts(&[0.0, 5.0]).len(), 2);
    }

    #[test]
    fn test_extract_audio_args() {
        let (media, runner) = tools(MockCommandRunner::new());
        media
            .extract_audio(Path::new("in/video.mp4"), Path::new("audio/a.partial.wav"))
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls[0].0, "ffmpeg");
        assert_eq!(
            calls[0].1,
            vec!["-y", "-i", "in/video.mp4", "-ac", "1", "-ar", "16000", "audio/a.partial.wav"]
        );
    }

    #[test]
    fn test_detect_scenes_reads_stderr() {
        let (media, runner) = tools(MockCommandRunner::new().with_stderr(SHOWINFO));
        let scenes = media.detect_scenes(Path::new("v.mp4")).unwrap();
        assert_eq!(scenes.len(), 3);
        assert!(runner.calls()[0].1.contains(&"select='gt(scene,0.3)',showinfo".to_string()));
    }

    #[test]
    fn test_extract_frames_one_per_scene() {
        let dir = tempfile::tempdir().unwrap();
        let (media, runner) = tools(MockCommandRunner::new());
        let scenes = scenes_from_cuts(&[10.0]);

        let frames = media
            .extract_frames(Path::new("v.mp4"), &scenes, dir.path())
            .unwrap();

        assert_eq!(frames, vec!["scene_000.jpg", "scene_001.jpg"]);
        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].1.contains(&"10.000".to_string()));
    }

    #[test]
    fn test_transcribe_parses_stdout() {
        let stdout = r#"[
            {"start": 0.0, "end": 2.5, "text": "Namaste"},
            {"start": 2.5, "end": 4.0, "text": "Khabar"}
        ]"#;
        let (media, runner) = tools(MockCommandRunner::new().with_stdout(stdout));
        let transcript = media.transcribe(Path::new("audio.wav")).unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].text, "Khabar");
        assert_eq!(runner.calls()[0].1, vec!["--language", "hi", "audio.wav"]);
    }

    #[test]
    fn test_transcribe_invalid_json_is_collaborator_error() {
        let (media, _) = tools(MockCommandRunner::new().with_stdout("Segmentation fault"));
        assert!(matches!(
            media.transcribe(Path::new("audio.wav")),
            Err(ChapterizeError::Collaborator { stage, .. }) if stage == "transcript"
        ));
    }

    #[test]
    fn test_recognize_text_trims_lines() {
        let (media, runner) = tools(
            MockCommandRunner::new()
                .with_stdout("  BREAKING NEWS \n\n LIVE\n")
                .with_stdout(""),
        );
        let frames = vec!["scene_000.jpg".to_string(), "scene_001.jpg".to_string()];

        let ocr = media.recognize_text(Path::new("scenes"), &frames).unwrap();

        assert_eq!(ocr["scene_000.jpg"], vec!["BREAKING NEWS", "LIVE"]);
        assert!(ocr["scene_001.jpg"].is_empty());
        let image = Path::new("scenes").join("scene_000.jpg");
        assert_eq!(runner.calls()[0].1[0], image.to_string_lossy());
    }

    #[test]
    fn test_failure_is_attributed_to_stage() {
        let (media, _) = tools(
            MockCommandRunner::new()
                .with_error(ChapterizeError::collaborator("ffmpeg", "exited with 1")),
        );
        let err = media
            .extract_audio(Path::new("v.mp4"), Path::new("a.wav"))
            .unwrap_err();
        assert_eq!(err.to_string(), "audio stage failed: ffmpeg exited with 1");
    }
}

//! Default configuration constants for chapterize.
//!
//! Shared between the config layer, the CLI and the pipeline so every entry
//! point agrees on paths, batch sizes and backend settings.

/// Default input video, relative to the working directory.
pub const VIDEO_PATH: &str = "input/input_video.mp4";

/// Default extracted audio artifact.
pub const AUDIO_PATH: &str = "audio/audio.wav";

/// Default directory holding scene frames, the scene list and the frame manifest.
pub const SCENES_DIR: &str = "scenes";

/// Default transcript artifact.
pub const TRANSCRIPT_PATH: &str = "transcripts/transcript.json";

/// Default OCR artifact.
pub const OCR_PATH: &str = "scenes/ocr_results.json";

/// Default chapter report.
pub const CHAPTERS_PATH: &str = "output/chapters.txt";

/// Scene list artifact name inside the scenes directory.
pub const SCENES_FILE: &str = "scenes.json";

/// Frame manifest artifact name inside the scenes directory.
pub const FRAMES_FILE: &str = "frames.json";

/// Number of transcript segments per labeling chunk.
pub const CHUNK_SIZE: usize = 10;

/// Number of chunk workers started together in one batch.
pub const PARALLELISM: usize = 1;

/// Sample rate of the extracted audio track in Hz.
///
/// 16kHz mono is what speech recognizers expect.
pub const SAMPLE_RATE: u32 = 16000;

/// ffmpeg scene-change score above which a new scene starts.
pub const SCENE_THRESHOLD: f64 = 0.3;

/// Default OpenAI-compatible endpoint for the remote backend.
pub const REMOTE_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default chat model for the remote backend.
pub const REMOTE_MODEL: &str = "gpt-4o";

/// Sampling temperature for the remote backend.
///
/// Kept low so label output stays close to the requested JSON shape.
pub const REMOTE_TEMPERATURE: f32 = 0.2;

/// Environment variable carrying the remote-service credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default local labeling command.
pub const LOCAL_COMMAND: &str = "ollama";

/// Default arguments for the local labeling command.
pub const LOCAL_ARGS: &[&str] = &["run", "llama3"];

/// Wall-clock limit for one local labeling call, in seconds.
pub const LOCAL_TIMEOUT_SECS: u64 = 120;

/// Default ffmpeg binary.
pub const FFMPEG: &str = "ffmpeg";

/// Default transcription command. Its stdout must be a transcript JSON array.
pub const TRANSCRIBE_COMMAND: &str = "whisper-json";

/// Default transcription arguments; `{audio}` is replaced with the audio path.
pub const TRANSCRIBE_ARGS: &[&str] = &["--language", "hi", "{audio}"];

/// Default OCR command.
pub const OCR_COMMAND: &str = "tesseract";

/// Default OCR arguments; `{image}` is replaced with the frame path.
pub const OCR_ARGS: &[&str] = &["{image}", "stdout", "-l", "eng+hin"];

/// Placeholder substituted with the audio path in transcription arguments.
pub const AUDIO_PLACEHOLDER: &str = "{audio}";

/// Placeholder substituted with the frame path in OCR arguments.
pub const IMAGE_PLACEHOLDER: &str = "{image}";

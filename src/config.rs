use crate::defaults;
use crate::error::{ChapterizeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub labeling: LabelingConfig,
    pub remote: RemoteConfig,
    pub local: LocalConfig,
    pub tools: ToolsConfig,
}

/// Stage artifact locations, relative to the working directory unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    pub video: PathBuf,
    pub audio: PathBuf,
    pub scenes_dir: PathBuf,
    pub transcript: PathBuf,
    pub ocr: PathBuf,
    pub chapters: PathBuf,
}

/// Chunking and dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LabelingConfig {
    pub backend: BackendChoice,
    pub chunk_size: usize,
    pub parallelism: usize,
    /// Label only this leading fraction of the transcript and OCR frames.
    pub sample_fraction: Option<f64>,
}

/// Remote (OpenAI-compatible) backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    /// Per-request timeout. Unset means the request may wait indefinitely.
    pub request_timeout_secs: Option<u64>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

/// Local subprocess backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LocalConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

/// External media tool configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg: String,
    pub scene_threshold: f64,
    pub transcribe_command: String,
    pub transcribe_args: Vec<String>,
    pub ocr_command: String,
    pub ocr_args: Vec<String>,
}

/// Which labeling backend the run should use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum BackendChoice {
    /// Remote when an API key is configured, local otherwise
    #[default]
    Auto,
    Remote,
    Local,
}

/// Backend actually used after resolving `BackendChoice::Auto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Remote,
    Local,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            video: PathBuf::from(defaults::VIDEO_PATH),
            audio: PathBuf::from(defaults::AUDIO_PATH),
            scenes_dir: PathBuf::from(defaults::SCENES_DIR),
            transcript: PathBuf::from(defaults::TRANSCRIPT_PATH),
            ocr: PathBuf::from(defaults::OCR_PATH),
            chapters: PathBuf::from(defaults::CHAPTERS_PATH),
        }
    }
}

impl Default for LabelingConfig {
    fn default() -> Self {
        Self {
            backend: BackendChoice::Auto,
            chunk_size: defaults::CHUNK_SIZE,
            parallelism: defaults::PARALLELISM,
            sample_fraction: None,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::REMOTE_ENDPOINT.to_string(),
            model: defaults::REMOTE_MODEL.to_string(),
            temperature: defaults::REMOTE_TEMPERATURE,
            request_timeout_secs: None,
            api_key: None,
        }
    }
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            command: defaults::LOCAL_COMMAND.to_string(),
            args: to_strings(defaults::LOCAL_ARGS),
            timeout_secs: defaults::LOCAL_TIMEOUT_SECS,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: defaults::FFMPEG.to_string(),
            scene_threshold: defaults::SCENE_THRESHOLD,
            transcribe_command: defaults::TRANSCRIBE_COMMAND.to_string(),
            transcribe_args: to_strings(defaults::TRANSCRIBE_ARGS),
            ocr_command: defaults::OCR_COMMAND.to_string(),
            ocr_args: to_strings(defaults::OCR_ARGS),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl PathsConfig {
    /// Resolve every relative path against `root`.
    pub fn resolve(&self, root: &Path) -> Self {
        let join = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                root.join(p)
            }
        };
        Self {
            video: join(&self.video),
            audio: join(&self.audio),
            scenes_dir: join(&self.scenes_dir),
            transcript: join(&self.transcript),
            ocr: join(&self.ocr),
            chapters: join(&self.chapters),
        }
    }

    /// Scene list artifact.
    pub fn scenes_file(&self) -> PathBuf {
        self.scenes_dir.join(defaults::SCENES_FILE)
    }

    /// Frame manifest artifact.
    pub fn frames_file(&self) -> PathBuf {
        self.scenes_dir.join(defaults::FRAMES_FILE)
    }
}

impl LocalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RemoteConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e)
                if e.downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound) =>
            {
                Ok(Self::default())
            }
            Err(e) => Err(e.context(format!("Failed to load config from {}", path.display()))),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - OPENAI_API_KEY → remote.api_key
    /// - CHAPTERIZE_BACKEND → labeling.backend
    /// - CHAPTERIZE_CHUNK_SIZE → labeling.chunk_size
    /// - CHAPTERIZE_PARALLELISM → labeling.parallelism
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(key) = std::env::var(defaults::API_KEY_ENV)
            && !key.is_empty()
        {
            self.remote.api_key = Some(key);
        }

        if let Ok(backend) = std::env::var("CHAPTERIZE_BACKEND")
            && !backend.is_empty()
        {
            self.labeling.backend = match backend.to_ascii_lowercase().as_str() {
                "auto" => BackendChoice::Auto,
                "remote" => BackendChoice::Remote,
                "local" => BackendChoice::Local,
                other => {
                    return Err(ChapterizeError::ConfigInvalidValue {
                        key: "CHAPTERIZE_BACKEND".to_string(),
                        message: format!("expected auto, remote or local, got {other:?}"),
                    });
                }
            };
        }

        if let Some(size) = env_usize("CHAPTERIZE_CHUNK_SIZE")? {
            self.labeling.chunk_size = size;
        }

        if let Some(parallelism) = env_usize("CHAPTERIZE_PARALLELISM")? {
            self.labeling.parallelism = parallelism;
        }

        Ok(self)
    }

    /// Check value ranges that TOML types alone cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.labeling.chunk_size == 0 {
            return Err(invalid("labeling.chunk_size", "must be at least 1"));
        }
        if self.labeling.parallelism == 0 {
            return Err(invalid("labeling.parallelism", "must be at least 1"));
        }
        if let Some(fraction) = self.labeling.sample_fraction
            && !(fraction > 0.0 && fraction <= 1.0)
        {
            return Err(invalid(
                "labeling.sample_fraction",
                &format!("must be in (0, 1], got {fraction}"),
            ));
        }
        if self.labeling.backend == BackendChoice::Remote && !self.remote.has_api_key() {
            return Err(invalid(
                "labeling.backend",
                &format!("remote backend needs {} to be set", defaults::API_KEY_ENV),
            ));
        }
        if self.local.timeout_secs == 0 {
            return Err(invalid("local.timeout_secs", "must be at least 1"));
        }
        Ok(())
    }

    /// Resolve `auto` into a concrete backend: remote iff a credential is configured.
    pub fn backend_kind(&self) -> BackendKind {
        match self.labeling.backend {
            BackendChoice::Remote => BackendKind::Remote,
            BackendChoice::Local => BackendKind::Local,
            BackendChoice::Auto if self.remote.has_api_key() => BackendKind::Remote,
            BackendChoice::Auto => BackendKind::Local,
        }
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/chapterize/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("chapterize")
            .join("config.toml")
    }

    /// Render the effective configuration as TOML (the API key is never included).
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ChapterizeError::ConfigParse {
            message: e.to_string(),
        })
    }
}

fn invalid(key: &str, message: &str) -> ChapterizeError {
    ChapterizeError::ConfigInvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

fn env_usize(key: &str) -> Result<Option<usize>> {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| invalid(key, &format!("{value:?} is not a number: {e}"))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_chapterize_env() {
        remove_env("OPENAI_API_KEY");
        remove_env("CHAPTERIZE_BACKEND");
        remove_env("CHAPTERIZE_CHUNK_SIZE");
        remove_env("CHAPTERIZE_PARALLELISM");
    }

    fn write_toml(contents: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        temp_file
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.paths.video, PathBuf::from("input/input_video.mp4"));
        assert_eq!(config.paths.audio, PathBuf::from("audio/audio.wav"));
        assert_eq!(config.paths.scenes_dir, PathBuf::from("scenes"));
        assert_eq!(
            config.paths.transcript,
            PathBuf::from("transcripts/transcript.json")
        );
        assert_eq!(config.paths.ocr, PathBuf::from("scenes/ocr_results.json"));
        assert_eq!(config.paths.chapters, PathBuf::from("output/chapters.txt"));

        assert_eq!(config.labeling.backend, BackendChoice::Auto);
        assert_eq!(config.labeling.chunk_size, 10);
        assert_eq!(config.labeling.parallelism, 1);
        assert_eq!(config.labeling.sample_fraction, None);

        assert_eq!(config.remote.model, "gpt-4o");
        assert_eq!(config.remote.temperature, 0.2);
        assert_eq!(config.remote.api_key, None);

        assert_eq!(config.local.command, "ollama");
        assert_eq!(config.local.args, vec!["run", "llama3"]);
        assert_eq!(config.local.timeout_secs, 120);
    }

    #[test]
    fn test_load_from_toml_file() {
        let temp_file = write_toml(
            r#"
            [paths]
            video = "clips/news.mp4"

            [labeling]
            backend = "local"
            chunk_size = 4
            parallelism = 3
            sample_fraction = 0.1

            [local]
            command = "llama-cli"
            args = ["-m", "model.gguf"]
            timeout_secs = 30

            [tools]
            scene_threshold = 0.45
        "#,
        );

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.paths.video, PathBuf::from("clips/news.mp4"));
        assert_eq!(config.paths.audio, PathBuf::from("audio/audio.wav"));
        assert_eq!(config.labeling.backend, BackendChoice::Local);
        assert_eq!(config.labeling.chunk_size, 4);
        assert_eq!(config.labeling.parallelism, 3);
        assert_eq!(config.labeling.sample_fraction, Some(0.1));
        assert_eq!(config.local.command, "llama-cli");
        assert_eq!(config.local.timeout(), Duration::from_secs(30));
        assert_eq!(config.tools.scene_threshold, 0.45);
        assert_eq!(config.tools.ffmpeg, "ffmpeg");
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let temp_file = write_toml("[labeling\nchunk_size = ");
        assert!(Config::load(temp_file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let missing_path = Path::new("/tmp/nonexistent_chapterize_config_12345.toml");
        let config = Config::load_or_default(missing_path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_errors_on_invalid_toml() {
        let temp_file = write_toml("[labeling\nchunk_size = ");
        let err = Config::load_or_default(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }

    #[test]
    fn test_env_api_key_selects_remote_backend() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_chapterize_env();

        set_env("OPENAI_API_KEY", "sk-test");
        let config = Config::default().with_env_overrides().unwrap();

        assert_eq!(config.remote.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.backend_kind(), BackendKind::Remote);

        clear_chapterize_env();
    }

    #[test]
    fn test_no_api_key_selects_local_backend() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_chapterize_env();

        let config = Config::default().with_env_overrides().unwrap();
        assert_eq!(config.backend_kind(), BackendKind::Local);
    }

    #[test]
    fn test_env_override_empty_api_key_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_chapterize_env();

        set_env("OPENAI_API_KEY", "");
        let config = Config::default().with_env_overrides().unwrap();
        assert_eq!(config.remote.api_key, None);
        assert_eq!(config.backend_kind(), BackendKind::Local);

        clear_chapterize_env();
    }

    #[test]
    fn test_env_override_labeling_values() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_chapterize_env();

        set_env("CHAPTERIZE_BACKEND", "Local");
        set_env("CHAPTERIZE_CHUNK_SIZE", "25");
        set_env("CHAPTERIZE_PARALLELISM", "4");
        set_env("OPENAI_API_KEY", "sk-test");
        let config = Config::default().with_env_overrides().unwrap();

        assert_eq!(config.labeling.backend, BackendChoice::Local);
        assert_eq!(config.labeling.chunk_size, 25);
        assert_eq!(config.labeling.parallelism, 4);
        assert_eq!(config.backend_kind(), BackendKind::Local);

        clear_chapterize_env();
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_chapterize_env();

        set_env("CHAPTERIZE_CHUNK_SIZE", "ten");
        let result = Config::default().with_env_overrides();
        assert!(matches!(
            result,
            Err(ChapterizeError::ConfigInvalidValue { .. })
        ));

        clear_chapterize_env();
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let mut config = Config::default();
        config.labeling.chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_parallelism() {
        let mut config = Config::default();
        config.labeling.parallelism = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_fraction() {
        let mut config = Config::default();
        config.labeling.sample_fraction = Some(1.5);
        assert!(config.validate().is_err());
        config.labeling.sample_fraction = Some(0.0);
        assert!(config.validate().is_err());
        config.labeling.sample_fraction = Some(0.1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_remote_requires_key() {
        let mut config = Config::default();
        config.labeling.backend = BackendChoice::Remote;
        assert!(config.validate().is_err());
        config.remote.api_key = Some("sk-test".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_joins_relative_paths() {
        let mut paths = PathsConfig::default();
        paths.chapters = PathBuf::from("/abs/chapters.txt");
        let resolved = paths.resolve(Path::new("/work"));

        assert_eq!(resolved.video, PathBuf::from("/work/input/input_video.mp4"));
        assert_eq!(resolved.chapters, PathBuf::from("/abs/chapters.txt"));
        assert_eq!(
            resolved.scenes_file(),
            PathBuf::from("/work/scenes/scenes.json")
        );
        assert_eq!(
            resolved.frames_file(),
            PathBuf::from("/work/scenes/frames.json")
        );
    }

    #[test]
    fn test_to_toml_omits_api_key() {
        let mut config = Config::default();
        config.remote.api_key = Some("sk-secret".into());
        let rendered = config.to_toml().unwrap();
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("chunk_size = 10"));
    }

    #[test]
    fn test_default_path_ends_with_config_toml() {
        let path = Config::default_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.contains("chapterize"));
        assert!(path_str.ends_with("config.toml"));
    }
}

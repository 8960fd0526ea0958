//! Error types for chapterize.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChapterizeError {
    // Configuration errors
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Stage artifact errors
    #[error("Stage artifact at {path} is corrupt: {message}")]
    ArtifactCorrupt { path: String, message: String },

    #[error("Failed to write stage artifact {path}: {message}")]
    ArtifactWrite { path: String, message: String },

    // External collaborator errors
    #[error("External tool not found: {tool}")]
    ToolNotFound { tool: String },

    #[error("{stage} stage failed: {message}")]
    Collaborator { stage: String, message: String },

    // Labeling backend errors
    #[error("Labeling backend timed out after {timeout_secs}s")]
    BackendTimeout { timeout_secs: u64 },

    #[error("Labeling response is not a JSON label array: {message}")]
    BackendParse { message: String },

    #[error("Labeling request failed: {message}")]
    BackendRequest { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl ChapterizeError {
    /// Builds a collaborator failure for the named stage.
    pub fn collaborator(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Collaborator {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Builds an artifact corruption error for `path`.
    pub fn corrupt(path: &std::path::Path, message: impl Into<String>) -> Self {
        Self::ArtifactCorrupt {
            path: path.display().to_string(),
            message: message.into(),
        }
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ChapterizeError>;

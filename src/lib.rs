//! chapterize - turn a raw video into a labeled chapter list
//!
//! A resumable staged pipeline (audio, scenes, frames, transcript, OCR,
//! labels) whose labeling stage sends transcript chunks to an LLM backend in
//! barrier-separated concurrent batches.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod labeling;
pub mod media;
#[cfg(feature = "cli")]
pub mod output;
pub mod pipeline;
pub mod process;

// Seams (collaborators, labeling backend, subprocesses)
pub use labeling::{LabelBackend, MockBackend};
pub use media::{MediaTools, MockMediaTools};
pub use process::{CommandRunner, SystemCommandRunner};

// Pipeline
pub use pipeline::{Pipeline, RunSummary, Stage};

// Error handling
pub use error::{ChapterizeError, Result};

// Config
pub use config::{BackendChoice, Config};

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

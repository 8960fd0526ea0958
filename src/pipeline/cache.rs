//! Presence-based stage checkpoints.
//!
//! An artifact file that exists means its stage is done. Its content is
//! trusted as-is on load; a file that cannot be read in the expected format
//! is an `ArtifactCorrupt` error, never a silent recompute.
//!
//! Writes never leave a half-written artifact at the final path: JSON and
//! text go through a temporary file in the target directory that is
//! persisted over the destination, and tool-produced binaries are written to
//! a `*.partial.*` sibling that is renamed once complete.

use crate::error::{ChapterizeError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Whether the stage owning `path` has completed.
pub fn has_artifact(path: &Path) -> bool {
    path.is_file()
}

/// Load a JSON artifact.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).map_err(|e| ChapterizeError::corrupt(path, e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| ChapterizeError::corrupt(path, e.to_string()))
}

/// Store `value` as pretty-printed JSON, creating parent directories.
pub fn store_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| write_error(path, e))?;
    store_text(path, &json)
}

/// Load a UTF-8 text artifact.
pub fn load_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| ChapterizeError::corrupt(path, e.to_string()))
}

/// Store `content` atomically, creating parent directories.
pub fn store_text(path: &Path, content: &str) -> Result<()> {
    let dir = parent_dir(path);
    fs::create_dir_all(&dir).map_err(|e| write_error(path, e))?;

    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| write_error(path, e))?;
    tmp.write_all(content.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| write_error(path, e))?;
    tmp.persist(path).map_err(|e| write_error(path, e.error))?;

    tracing::debug!(path = %path.display(), bytes = content.len(), "stored artifact");
    Ok(())
}

/// Sibling path a tool writes to before the artifact is committed.
///
/// `audio/audio.wav` becomes `audio/audio.partial.wav`.
pub fn partial_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}.partial.{}", ext.to_string_lossy()),
        None => format!("{stem}.partial"),
    };
    path.with_file_name(name)
}

/// Prepare a partial path for a tool: parent created, stale leftovers removed.
pub fn begin_partial(path: &Path) -> Result<PathBuf> {
    let partial = partial_path(path);
    fs::create_dir_all(parent_dir(path)).map_err(|e| write_error(path, e))?;
    if partial.exists() {
        tracing::debug!(path = %partial.display(), "removing stale partial artifact");
        fs::remove_file(&partial).map_err(|e| write_error(&partial, e))?;
    }
    Ok(partial)
}

/// Promote a finished partial file to its final artifact path.
pub fn commit_partial(path: &Path) -> Result<()> {
    let partial = partial_path(path);
    fs::rename(&partial, path).map_err(|e| write_error(path, e))
}

/// Check that a WAV artifact has a readable header.
pub fn validate_wav(path: &Path) -> Result<()> {
    let reader =
        hound::WavReader::open(path).map_err(|e| ChapterizeError::corrupt(path, e.to_string()))?;
    let spec = reader.spec();
    tracing::debug!(
        path = %path.display(),
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        "audio artifact is a valid WAV"
    );
    Ok(())
}

/// Delete an artifact. Returns whether a file was removed.
pub fn remove_artifact(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn write_error(path: &Path, error: impl std::fmt::Display) -> ChapterizeError {
    ChapterizeError::ArtifactWrite {
        path: path.display().to_string(),
        message: error.to_string(),
    }
}

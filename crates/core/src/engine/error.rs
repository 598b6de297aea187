//! Error types for the engine module.

use std::path::PathBuf;
use thiserror::Error;

/// stderr fragments FFmpeg prints when the input itself is unusable.
const INVALID_INPUT_MARKERS: &[&str] = &[
    "Invalid data found when processing input",
    "does not contain any stream",
    "matches no streams",
    "Could not find codec parameters",
    "could not find codec parameters",
];

/// Errors that can occur while driving the transcoding engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine binary could not be started.
    #[error("Engine binary not found at path: {path}")]
    BinaryNotFound { path: PathBuf },

    /// Fetching a remote engine asset failed.
    #[error("Failed to fetch engine asset {url}: {reason}")]
    AssetFetch { url: String, reason: String },

    /// A fetched asset did not match its pinned checksum.
    #[error("Checksum mismatch for {asset}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        asset: String,
        expected: String,
        actual: String,
    },

    /// Engine binary exists but did not answer a version query.
    #[error("Engine failed to start: {reason}")]
    StartupFailed { reason: String },

    /// An operation was attempted before `load` completed.
    #[error("Engine is not loaded")]
    NotLoaded,

    /// Scratch file name is not a plain file name.
    #[error("Invalid scratch file name: {name:?}")]
    InvalidName { name: String },

    /// Scratch file does not exist.
    #[error("Scratch file not found: {name}")]
    FileNotFound { name: String },

    /// The engine exited unsuccessfully.
    #[error("Engine exited with code {code:?}")]
    ExecFailed { code: Option<i32>, stderr: String },

    /// The engine ran longer than the configured limit.
    #[error("Engine timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Failed to probe a scratch file.
    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// I/O error against the scratch filesystem or a child process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Creates a new asset fetch error.
    pub fn asset_fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AssetFetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new probe failed error.
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }

    /// stderr captured from a failed engine run, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::ExecFailed { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }

    /// Whether the engine rejected its input rather than failing on its own.
    pub fn is_invalid_input(&self) -> bool {
        match self {
            Self::ProbeFailed { .. } => true,
            Self::ExecFailed { stderr, .. } => {
                INVALID_INPUT_MARKERS.iter().any(|m| stderr.contains(m))
            }
            _ => false,
        }
    }

    /// Whether the run produced no output because the input lacked the stream
    /// the command maps.
    pub fn is_missing_stream(&self) -> bool {
        matches!(self, Self::ExecFailed { stderr, .. }
            if stderr.contains("does not contain any stream") || stderr.contains("matches no streams"))
    }
}

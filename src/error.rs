//! Unified error types for audiometa
//!
//! Error strategy:
//! - Input errors (missing argument, missing file): fatal, exit non-zero
//! - Per-extractor errors (tags, probe, decode, network, transcription):
//!   recoverable, embedded in the report slot that produced them
//! - Output errors (serialization, writing output.json): fatal at the emitter
//!
//! All errors include actionable suggestions where possible.

use std::path::PathBuf;
use thiserror::Error;

/// Supported audio formats for helpful error messages
pub const SUPPORTED_FORMATS: &str = "MP3, WAV, FLAC, AIFF, OGG, M4A";

/// Top-level error type for audiometa operations
#[derive(Debug, Error)]
pub enum AudiometaError {
    // =========================================================================
    // Input errors - abort the run
    // =========================================================================
    #[error("Usage: audiometa <audiofile>")]
    MissingArgument,

    #[error("File does not exist: '{0}'\n  Tip: Check the path exists and is accessible")]
    FileNotFound(PathBuf),

    // =========================================================================
    // Per-extractor errors - captured into the report, run continues
    // =========================================================================
    #[error("unreadable container: {reason}")]
    UnreadableContainer { path: PathBuf, reason: String },

    #[error("Failed to decode audio file '{path}': {reason}\n  Supported formats: {SUPPORTED_FORMATS}")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Analysis failed for '{path}': {reason}")]
    AnalysisError { path: PathBuf, reason: String },

    #[error("stream probe failed: {0}")]
    Probe(String),

    #[error("reputation lookup failed: {0}")]
    Reputation(String),

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("missing command `{command}` on PATH\n  Tip: install it or point the matching AUDIOMETA_*_BIN variable at it")]
    CommandMissing { command: String },

    #[error("command failed: `{command}` (status: {status}){stderr_suffix}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr_suffix: String,
    },

    #[error("command timed out after {timeout_ms}ms: `{command}`{stderr_suffix}")]
    CommandTimedOut {
        command: String,
        timeout_ms: u64,
        stderr_suffix: String,
    },

    // =========================================================================
    // Output errors - surface at the report emitter
    // =========================================================================
    #[error("Cannot write output to '{path}': {reason}\n  Tip: Check write permissions for the working directory")]
    OutputError { path: PathBuf, reason: String },

    #[error("Report could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for audiometa operations
pub type Result<T> = std::result::Result<T, AudiometaError>;

impl AudiometaError {
    /// Returns true for errors caused by the caller's input (exit code 1, no report)
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AudiometaError::MissingArgument | AudiometaError::FileNotFound(_)
        )
    }

    /// Returns true if this error belongs to a single extractor slot and must
    /// not abort the run
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AudiometaError::UnreadableContainer { .. }
                | AudiometaError::DecodeError { .. }
                | AudiometaError::AnalysisError { .. }
                | AudiometaError::Probe(_)
                | AudiometaError::Reputation(_)
                | AudiometaError::Transcription(_)
                | AudiometaError::CommandMissing { .. }
                | AudiometaError::CommandFailed { .. }
                | AudiometaError::CommandTimedOut { .. }
        )
    }

    /// Create a decode error with context about the issue
    pub fn decode_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        AudiometaError::DecodeError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a failed-command error, keeping only a trimmed stderr tail
    pub fn from_command_failure(command: String, status: i32, stderr: &str) -> Self {
        AudiometaError::CommandFailed {
            command,
            status,
            stderr_suffix: stderr_suffix(stderr),
        }
    }

    /// Create a timed-out-command error
    pub fn from_command_timeout(command: String, timeout_ms: u64, stderr: &str) -> Self {
        AudiometaError::CommandTimedOut {
            command,
            timeout_ms,
            stderr_suffix: stderr_suffix(stderr),
        }
    }

    /// Create an output error, checking for common issues
    pub fn output_error(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        let reason = match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                format!("Permission denied. Check that you have write access to {}", path.display())
            }
            std::io::ErrorKind::NotFound => {
                format!("Directory does not exist: {}", path.parent().map(|p| p.display().to_string()).unwrap_or_default())
            }
            _ => err.to_string(),
        };
        AudiometaError::OutputError { path, reason }
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("; stderr: {trimmed}")
    }
}

//! Speech transcription via whisper.cpp
//!
//! Runs `whisper-cli` as a child process with its JSON output directed into
//! a temporary directory and reads the transcript back. Only invoked when the capability
//! probe found both the binary and a model.

use crate::config::TranscriptionSettings;
use crate::error::{AudiometaError, Result};
use crate::extract::traits::{Transcriber, Transcript};
use crate::process;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Reported in place of a transcript when the capability is missing
pub const UNAVAILABLE_MESSAGE: &str =
    "transcription unavailable: whisper-cli or its model is not installed";

const OUTPUT_STEM: &str = "transcript";

/// whisper.cpp command-line backend
pub struct WhisperCliTranscriber {
    binary: String,
    model: PathBuf,
    timeout: Duration,
}

impl WhisperCliTranscriber {
    pub fn new(binary: impl Into<String>, model: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            model: model.into(),
            timeout,
        }
    }

    /// `None` when no model is configured
    pub fn from_settings(settings: &TranscriptionSettings) -> Option<Self> {
        let model = settings.model.clone()?;
        Some(Self::new(settings.binary.clone(), model, settings.timeout()))
    }

    fn args(&self, input: &Path, output_prefix: &Path) -> Vec<OsString> {
        vec![
            "-f".into(),
            input.as_os_str().to_owned(),
            "-m".into(),
            self.model.as_os_str().to_owned(),
            "-oj".into(),
            "-of".into(),
            output_prefix.as_os_str().to_owned(),
            "-l".into(),
            "auto".into(),
        ]
    }
}

impl Transcriber for WhisperCliTranscriber {
    fn transcribe(&self, path: &Path) -> Result<Transcript> {
        let workdir = tempfile::tempdir()?;
        let prefix = workdir.path().join(OUTPUT_STEM);

        // Inherit the caller's cwd so relative input and model paths resolve;
        // only the output prefix points into the temp dir
        process::run_command_with_timeout(
            &self.binary,
            &self.args(path, &prefix),
            None,
            self.timeout,
        )?;

        let json_path = prefix.with_extension("json");
        let raw = std::fs::read_to_string(&json_path).map_err(|e| {
            AudiometaError::Transcription(format!(
                "whisper-cli produced no {}: {}",
                json_path.display(),
                e
            ))
        })?;

        let transcript = parse_whisper_json(&raw)?;
        debug!(
            "Transcribed {} chars, language {}",
            transcript.text.len(),
            transcript.language
        );
        Ok(transcript)
    }

    fn name(&self) -> &'static str {
        "whisper-cli"
    }
}

/// Read text and detected language from whisper.cpp `-oj` output
///
/// Text is the concatenation of all segment texts, trimmed. The language
/// is `result.language`, falling back to a top-level `language` key.
pub fn parse_whisper_json(raw: &str) -> Result<Transcript> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| AudiometaError::Transcription(format!("unparsable whisper output: {}", e)))?;

    let text = match value.get("transcription").and_then(|t| t.as_array()) {
        Some(segments) => segments
            .iter()
            .filter_map(|s| s.get("text").and_then(|t| t.as_str()))
            .collect::<String>(),
        None => value
            .get("text")
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .to_string(),
    };

    let language = value
        .pointer("/result/language")
        .or_else(|| value.get("language"))
        .and_then(|l| l.as_str())
        .ok_or_else(|| {
            AudiometaError::Transcription("whisper output carries no language".to_string())
        })?;

    Ok(Transcript {
        text: text.trim().to_string(),
        language: language.to_string(),
    })
}

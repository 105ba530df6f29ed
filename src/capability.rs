//! Optional-subsystem capability probe
//!
//! Transcription needs an external whisper.cpp binary and a model file.
//! Whether both are present is decided once per process; a failed probe
//! disables transcription until restart.

use crate::config::TranscriptionSettings;
use crate::process;
use once_cell::sync::OnceCell;
use tracing::{debug, warn};

static PROCESS_CAPABILITIES: OnceCell<Capabilities> = OnceCell::new();

/// Availability of each optional extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub transcription: bool,
}

impl Capabilities {
    /// Check the environment for the transcription binary and model
    pub fn probe(settings: &TranscriptionSettings) -> Self {
        let transcription = match transcription_unavailable_reason(settings) {
            None => {
                debug!("Transcription available via {}", settings.binary);
                true
            }
            Some(reason) => {
                warn!("Transcription disabled: {}", reason);
                false
            }
        };
        Self { transcription }
    }

    /// A fixed verdict, for tests and embedding callers
    pub fn with_transcription(transcription: bool) -> Self {
        Self { transcription }
    }
}

fn transcription_unavailable_reason(settings: &TranscriptionSettings) -> Option<String> {
    if !settings.enabled {
        return Some("turned off by configuration".to_string());
    }
    if !process::command_exists(&settings.binary) {
        return Some(format!("`{}` not found on PATH", settings.binary));
    }
    match &settings.model {
        None => Some("no model configured (set AUDIOMETA_WHISPER_MODEL)".to_string()),
        Some(model) if !model.is_file() => {
            Some(format!("model file {} does not exist", model.display()))
        }
        Some(_) => None,
    }
}

/// Process-wide verdict; the first caller's settings decide it
pub fn process_capabilities(settings: &TranscriptionSettings) -> Capabilities {
    *PROCESS_CAPABILITIES.get_or_init(|| Capabilities::probe(settings))
}

//! Runtime configuration settings

use crate::analysis::AcousticThresholds;
use crate::error::{AudiometaError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default VirusTotal v3 API root
pub const DEFAULT_REPUTATION_URL: &str = "https://www.virustotal.com/api/v3";

/// Runtime settings for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where the report is persisted
    pub output: PathBuf,
    /// Acoustic classifier thresholds
    pub thresholds: AcousticThresholds,
    /// Which embedded picture, if any, is written next to the input
    pub artwork: ArtworkPolicy,
    pub probe: ProbeSettings,
    pub reputation: ReputationSettings,
    pub transcription: TranscriptionSettings,
}

/// Artwork extraction policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtworkPolicy {
    /// Write the first attached picture found
    #[default]
    FirstPicture,
    /// Never write artwork
    Skip,
}

/// Technical prober (ffprobe) settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    pub binary: String,
    pub timeout_secs: u64,
}

impl ProbeSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            binary: "ffprobe".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Reputation service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReputationSettings {
    /// API credential; unset or blank disables the lookup
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl ReputationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The credential, if one is configured and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl Default for ReputationSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_REPUTATION_URL.to_string(),
            timeout_secs: 15,
        }
    }
}

/// Speech transcription (whisper.cpp) settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Turn transcription off regardless of what is installed
    pub enabled: bool,
    pub binary: String,
    /// ggml model file
    pub model: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl TranscriptionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: "whisper-cli".to_string(),
            model: None,
            timeout_secs: 600,
        }
    }
}

impl Settings {
    /// Create settings from CLI arguments
    pub fn from_cli(cli: &super::cli::Cli) -> Result<Self> {
        let defaults = AcousticThresholds::default();
        let settings = Self {
            output: cli.output.clone(),
            thresholds: AcousticThresholds {
                tempo_bpm: cli.tempo_threshold.unwrap_or(defaults.tempo_bpm),
                zero_crossing_rate: cli.zcr_threshold.unwrap_or(defaults.zero_crossing_rate),
            },
            artwork: if cli.no_artwork {
                ArtworkPolicy::Skip
            } else {
                ArtworkPolicy::FirstPicture
            },
            probe: ProbeSettings {
                binary: cli.ffprobe_bin.clone(),
                timeout_secs: cli.probe_timeout,
            },
            reputation: ReputationSettings {
                api_key: cli.api_key.clone(),
                base_url: cli.reputation_url.clone(),
                timeout_secs: cli.reputation_timeout,
            },
            transcription: TranscriptionSettings {
                enabled: !cli.no_transcription,
                binary: cli.whisper_bin.clone(),
                model: cli.whisper_model.clone(),
                timeout_secs: cli.transcription_timeout,
            },
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values no run could use
    pub fn validate(&self) -> Result<()> {
        let AcousticThresholds {
            tempo_bpm,
            zero_crossing_rate,
        } = self.thresholds;
        if !tempo_bpm.is_finite() || tempo_bpm < 0.0 {
            return Err(AudiometaError::ConfigError(format!(
                "tempo threshold must be a non-negative BPM value, got {}",
                tempo_bpm
            )));
        }
        if !zero_crossing_rate.is_finite() || !(0.0..=1.0).contains(&zero_crossing_rate) {
            return Err(AudiometaError::ConfigError(format!(
                "zero-crossing-rate threshold must be within 0..=1, got {}",
                zero_crossing_rate
            )));
        }
        for (name, secs) in [
            ("probe", self.probe.timeout_secs),
            ("reputation", self.reputation.timeout_secs),
            ("transcription", self.transcription.timeout_secs),
        ] {
            if secs == 0 {
                return Err(AudiometaError::ConfigError(format!(
                    "{} timeout must be at least one second",
                    name
                )));
            }
        }
        if self.reputation.base_url.trim().is_empty() {
            return Err(AudiometaError::ConfigError(
                "reputation service URL is empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output: PathBuf::from(crate::report::emit::DEFAULT_OUTPUT),
            thresholds: AcousticThresholds::default(),
            artwork: ArtworkPolicy::default(),
            probe: ProbeSettings::default(),
            reputation: ReputationSettings::default(),
            transcription: TranscriptionSettings::default(),
        }
    }
}

//! Acoustic heuristic classifier
//!
//! Computes tempo, mean zero-crossing rate and mean spectral centroid of a
//! decoded waveform and labels it with two fixed threshold rules:
//!
//! - `mood = "energetic"` if tempo > `tempo_bpm`, else `"calm"`
//! - `genre_estimate = "electronic"` if mean ZCR > `zero_crossing_rate`,
//!   else `"acoustic"`
//!
//! The thresholds are uncalibrated heuristics and live in
//! [`AcousticThresholds`] so callers can move them.

use crate::analysis::features::{self, Spectrogram, FRAME_LENGTH, HOP_LENGTH};
use crate::analysis::tempo::StratumTempoEstimator;
use crate::analysis::traits::TempoEstimator;
use crate::audio;
use crate::error::{AudiometaError, Result};
use crate::report::NativeValue;
use crate::types::AudioBuffer;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Threshold configuration for the heuristic labels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcousticThresholds {
    /// Tempo above which a track is "energetic" (BPM)
    pub tempo_bpm: f32,
    /// Mean zero-crossing rate above which a track is "electronic"
    pub zero_crossing_rate: f32,
}

impl Default for AcousticThresholds {
    fn default() -> Self {
        Self {
            tempo_bpm: 120.0,
            zero_crossing_rate: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Energetic,
    Calm,
}

impl Mood {
    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Energetic => "energetic",
            Mood::Calm => "calm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenreEstimate {
    Electronic,
    Acoustic,
}

impl GenreEstimate {
    pub fn as_str(self) -> &'static str {
        match self {
            GenreEstimate::Electronic => "electronic",
            GenreEstimate::Acoustic => "acoustic",
        }
    }
}

/// Raw features and the labels derived from them
#[derive(Debug, Clone, PartialEq)]
pub struct AcousticAnalysis {
    pub tempo: f32,
    pub mood: Mood,
    pub genre_estimate: GenreEstimate,
    pub spectral_centroid_mean: f32,
    pub zero_crossing_rate_mean: f32,
}

impl AcousticAnalysis {
    /// Extractor-native payload (single-precision scalars, widened later
    /// by the normalizer)
    pub fn to_native(&self) -> NativeValue {
        NativeValue::map([
            ("tempo", NativeValue::F32(self.tempo)),
            ("mood", NativeValue::from(self.mood.as_str())),
            ("genre_estimate", NativeValue::from(self.genre_estimate.as_str())),
            (
                "spectral_centroid_mean",
                NativeValue::F32(self.spectral_centroid_mean),
            ),
            (
                "zero_crossing_rate_mean",
                NativeValue::F32(self.zero_crossing_rate_mean),
            ),
        ])
    }
}

/// Tempo/mood/genre heuristic classifier
pub struct AcousticClassifier {
    thresholds: AcousticThresholds,
    tempo_estimator: Box<dyn TempoEstimator>,
}

impl AcousticClassifier {
    pub fn new(thresholds: AcousticThresholds) -> Self {
        Self {
            thresholds,
            tempo_estimator: Box::new(StratumTempoEstimator::new()),
        }
    }

    /// Replace the tempo backend
    pub fn with_tempo_estimator(mut self, estimator: Box<dyn TempoEstimator>) -> Self {
        self.tempo_estimator = estimator;
        self
    }

    pub fn thresholds(&self) -> AcousticThresholds {
        self.thresholds
    }

    /// Decode `path` and classify it; any failure becomes `{error: <message>}`
    pub fn analyze(&self, path: &Path) -> NativeValue {
        match self.classify_file(path) {
            Ok(analysis) => analysis.to_native(),
            Err(e) => {
                warn!("Acoustic analysis failed for {}: {}", path.display(), e);
                NativeValue::map([("error", NativeValue::Str(e.to_string()))])
            }
        }
    }

    /// Decode `path` and classify it
    pub fn classify_file(&self, path: &Path) -> Result<AcousticAnalysis> {
        let buffer = audio::decode(path)?;
        self.classify(&buffer).map_err(|e| match e {
            AudiometaError::AnalysisError { reason, .. } => AudiometaError::AnalysisError {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Classify an already decoded buffer
    pub fn classify(&self, buffer: &AudioBuffer) -> Result<AcousticAnalysis> {
        if buffer.len() < FRAME_LENGTH {
            return Err(AudiometaError::AnalysisError {
                path: Default::default(),
                reason: format!(
                    "Audio too short ({:.3}s). At least one {}-sample frame is required.",
                    buffer.duration, FRAME_LENGTH
                ),
            });
        }

        let spectrogram =
            Spectrogram::compute(&buffer.samples, buffer.sample_rate, FRAME_LENGTH, HOP_LENGTH);

        let tempo = self.tempo_estimator.estimate(buffer)?;
        let zcr = features::zero_crossing_rate(&buffer.samples, FRAME_LENGTH, HOP_LENGTH);
        let centroid = features::spectral_centroid(&spectrogram);

        let zero_crossing_rate_mean = features::mean(&zcr);
        let spectral_centroid_mean = features::mean(&centroid);

        let analysis = AcousticAnalysis {
            tempo,
            mood: self.mood_for(tempo),
            genre_estimate: self.genre_for(zero_crossing_rate_mean),
            spectral_centroid_mean,
            zero_crossing_rate_mean,
        };

        debug!(
            "Acoustic analysis via {}: tempo={:.1} zcr={:.4} centroid={:.1}Hz -> {}/{}",
            self.tempo_estimator.name(),
            analysis.tempo,
            analysis.zero_crossing_rate_mean,
            analysis.spectral_centroid_mean,
            analysis.mood.as_str(),
            analysis.genre_estimate.as_str()
        );

        Ok(analysis)
    }

    fn mood_for(&self, tempo: f32) -> Mood {
        if tempo > self.thresholds.tempo_bpm {
            Mood::Energetic
        } else {
            Mood::Calm
        }
    }

    fn genre_for(&self, zcr_mean: f32) -> GenreEstimate {
        if zcr_mean > self.thresholds.zero_crossing_rate {
            GenreEstimate::Electronic
        } else {
            GenreEstimate::Acoustic
        }
    }
}

impl Default for AcousticClassifier {
    fn default() -> Self {
        Self::new(AcousticThresholds::default())
    }
}

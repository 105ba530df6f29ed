//! Stratum-DSP based tempo estimation
//!
//! Wraps the stratum-dsp analyzer, a pure-Rust DJ-oriented beat tracker,
//! and keeps only its global BPM estimate.

use crate::analysis::traits::TempoEstimator;
use crate::error::{AudiometaError, Result};
use crate::types::AudioBuffer;
use std::path::PathBuf;
use stratum_dsp::{analyze_audio, AnalysisConfig};
use tracing::debug;

/// Tempo estimator using stratum-dsp
pub struct StratumTempoEstimator;

impl StratumTempoEstimator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StratumTempoEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl TempoEstimator for StratumTempoEstimator {
    fn estimate(&self, buffer: &AudioBuffer) -> Result<f32> {
        debug!(
            "Estimating tempo with stratum-dsp ({} samples, {}Hz)",
            buffer.len(),
            buffer.sample_rate
        );

        let result = analyze_audio(&buffer.samples, buffer.sample_rate, AnalysisConfig::default())
            .map_err(|e| AudiometaError::AnalysisError {
                path: PathBuf::new(),
                reason: format!("Tempo analysis failed: {}", e),
            })?;

        if !result.bpm.is_finite() || result.bpm < 0.0 {
            return Err(AudiometaError::AnalysisError {
                path: PathBuf::new(),
                reason: format!("Tempo analysis produced an invalid BPM ({})", result.bpm),
            });
        }

        debug!(
            "Detected tempo: {:.2} BPM (confidence: {:.2})",
            result.bpm, result.bpm_confidence
        );
        Ok(result.bpm)
    }

    fn name(&self) -> &'static str {
        "stratum-dsp"
    }
}

//! Analysis trait abstractions
//!
//! The tempo estimator is the one swappable backend of the acoustic
//! classifier; the frame-level features are fixed formulas.

use crate::error::Result;
use crate::types::AudioBuffer;

/// Tempo estimation backend
pub trait TempoEstimator: Send + Sync {
    /// Estimate the global tempo of a mono buffer in BPM
    fn estimate(&self, buffer: &AudioBuffer) -> Result<f32>;

    /// Get the name of this estimator (for logging)
    fn name(&self) -> &'static str;
}

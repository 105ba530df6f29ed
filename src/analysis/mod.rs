//! Acoustic analysis
//!
//! Frame features, tempo estimation and the threshold classifier built on
//! them. The tempo backend sits behind a trait so it can be swapped.

pub mod acoustic;
pub mod features;
pub mod tempo;
pub mod traits;

pub use acoustic::{AcousticAnalysis, AcousticClassifier, AcousticThresholds, GenreEstimate, Mood};
pub use tempo::StratumTempoEstimator;
pub use traits::TempoEstimator;

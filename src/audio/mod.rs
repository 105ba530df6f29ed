//! Audio decoding

pub mod decoder;

pub use decoder::{decode, decode_at, ANALYSIS_SAMPLE_RATE};

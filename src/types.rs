//! Core data types for audiometa
//!
//! These types represent the domain model and flow through the pipeline.

use crate::error::{AudiometaError, Result};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

// =============================================================================
// Input
// =============================================================================

/// One audio file supplied by the caller for a single pipeline run
///
/// The byte content is read lazily and at most once; every consumer that
/// needs the raw bytes (content hashing) shares the same buffer.
#[derive(Debug)]
pub struct AudioSource {
    path: PathBuf,
    bytes: OnceCell<Arc<[u8]>>,
}

impl AudioSource {
    /// Reference an existing audio file
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(AudiometaError::FileNotFound(path));
        }
        Ok(Self {
            path,
            bytes: OnceCell::new(),
        })
    }

    /// Path the caller supplied
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full file content, read on first access
    pub fn bytes(&self) -> Result<Arc<[u8]>> {
        let bytes = self.bytes.get_or_try_init(|| {
            debug!("Reading {} into memory", self.path.display());
            std::fs::read(&self.path).map(Arc::from)
        })?;
        Ok(Arc::clone(bytes))
    }

}

// =============================================================================
// Extractor outcome
// =============================================================================

/// Outcome of exactly one extractor invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractorResult<T> {
    Success(T),
    Failure(String),
}

impl<T> ExtractorResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ExtractorResult::Success(_))
    }

    /// Transform the success payload, keeping a failure as-is
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ExtractorResult<U> {
        match self {
            ExtractorResult::Success(value) => ExtractorResult::Success(f(value)),
            ExtractorResult::Failure(reason) => ExtractorResult::Failure(reason),
        }
    }

    /// Capture a fallible extractor call
    pub fn from_result<E: std::fmt::Display>(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(value) => ExtractorResult::Success(value),
            Err(e) => ExtractorResult::Failure(e.to_string()),
        }
    }

    pub fn success(self) -> Option<T> {
        match self {
            ExtractorResult::Success(value) => Some(value),
            ExtractorResult::Failure(_) => None,
        }
    }
}

impl<T, E: std::fmt::Display> From<std::result::Result<T, E>> for ExtractorResult<T> {
    fn from(result: std::result::Result<T, E>) -> Self {
        ExtractorResult::from_result(result)
    }
}

// =============================================================================
// Audio buffer types
// =============================================================================

/// Decoded audio samples ready for analysis
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Mono samples normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Duration in seconds
    pub duration: f64,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        // Guard against division by zero - use 0 duration for invalid sample rate
        let duration = if sample_rate > 0 {
            samples.len() as f64 / sample_rate as f64
        } else {
            0.0
        };
        Self {
            samples,
            sample_rate,
            duration,
        }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

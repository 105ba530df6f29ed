//! Seams to the external collaborators
//!
//! Each collaborator the pipeline talks to (a child process or a remote
//! service) sits behind a trait so the aggregator can be driven by fakes.

use crate::error::Result;
use std::path::Path;

/// Technical stream prober backend
pub trait TechnicalProber: Send + Sync {
    /// Probe `path` and return the prober's JSON document unchanged
    fn probe(&self, path: &Path) -> Result<serde_json::Value>;

    /// Get the name of this prober (for logging)
    fn name(&self) -> &'static str;
}

/// Raw HTTP response from the reputation service
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Reputation service transport
pub trait ReputationTransport: Send + Sync {
    /// Fetch the report for a SHA-256 digest
    ///
    /// Transport-level failures (DNS, connect, timeout, body read) are
    /// errors; any HTTP status is a response.
    fn fetch(&self, sha256: &str, api_key: &str) -> Result<HttpResponse>;
}

/// Text and ISO 639-1 language code of a transcription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    pub language: String,
}

/// Speech-to-text backend
pub trait Transcriber: Send + Sync {
    fn transcribe(&self, path: &Path) -> Result<Transcript>;

    /// Get the name of this transcriber (for logging)
    fn name(&self) -> &'static str;
}

//! File reputation lookup
//!
//! Hashes the full file content with SHA-256 and asks a VirusTotal v3
//! compatible service for its last analysis of that digest.

use crate::config::ReputationSettings;
use crate::error::{AudiometaError, Result};
use crate::extract::traits::{HttpResponse, ReputationTransport};
use crate::report::NativeValue;
use crate::types::AudioSource;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Status code reported for transport-level failures
pub const TRANSPORT_ERROR_CODE: u16 = 0;

/// Outcome of one reputation lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReputationVerdict {
    /// Engine category (`malicious`, `undetected`, ...) to engine count
    Stats(BTreeMap<String, u64>),
    NotFound,
    KeyMissing,
    QueryError(u16),
}

impl ReputationVerdict {
    pub fn to_native(&self) -> NativeValue {
        match self {
            ReputationVerdict::Stats(stats) => NativeValue::map([(
                "malware_analysis",
                NativeValue::Map(
                    stats
                        .iter()
                        .map(|(k, &v)| (k.clone(), NativeValue::U64(v)))
                        .collect(),
                ),
            )]),
            ReputationVerdict::NotFound => status("not found in reputation database"),
            ReputationVerdict::KeyMissing => status("API key not set"),
            ReputationVerdict::QueryError(code) => {
                status(&format!("error querying reputation service: {}", code))
            }
        }
    }
}

fn status(message: &str) -> NativeValue {
    NativeValue::map([("status", NativeValue::from(message))])
}

/// Lowercase hex SHA-256 of `bytes`
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

// Missing levels read as empty stats; only malformed JSON is an error
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileReport {
    data: FileData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileData {
    attributes: FileAttributes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileAttributes {
    last_analysis_stats: BTreeMap<String, u64>,
}

/// Look up `source` with the configured credential
///
/// A missing or blank credential returns [`ReputationVerdict::KeyMissing`]
/// without touching the transport.
pub fn lookup(
    source: &AudioSource,
    settings: &ReputationSettings,
    transport: &dyn ReputationTransport,
) -> Result<ReputationVerdict> {
    let Some(api_key) = settings.api_key() else {
        info!("No reputation API key configured, skipping lookup");
        return Ok(ReputationVerdict::KeyMissing);
    };

    let digest = sha256_hex(&source.bytes()?);
    debug!("Reputation lookup for sha256 {}", digest);

    let response = match transport.fetch(&digest, api_key) {
        Ok(response) => response,
        Err(e) => {
            warn!("Reputation service unreachable: {}", e);
            return Ok(ReputationVerdict::QueryError(TRANSPORT_ERROR_CODE));
        }
    };

    Ok(classify_response(&response))
}

fn classify_response(response: &HttpResponse) -> ReputationVerdict {
    match response.status {
        200 => match serde_json::from_str::<FileReport>(&response.body) {
            Ok(report) => ReputationVerdict::Stats(report.data.attributes.last_analysis_stats),
            Err(e) => {
                warn!("Unparsable reputation response: {}", e);
                ReputationVerdict::QueryError(200)
            }
        },
        404 => ReputationVerdict::NotFound,
        other => ReputationVerdict::QueryError(other),
    }
}

/// Blocking HTTP transport using reqwest
pub struct HttpReputationTransport {
    base_url: String,
    timeout: Duration,
}

impl HttpReputationTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }

    pub fn from_settings(settings: &ReputationSettings) -> Self {
        Self::new(settings.base_url.clone(), settings.timeout())
    }

    fn url_for(&self, sha256: &str) -> String {
        format!("{}/files/{}", self.base_url.trim_end_matches('/'), sha256)
    }
}

impl ReputationTransport for HttpReputationTransport {
    fn fetch(&self, sha256: &str, api_key: &str) -> Result<HttpResponse> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("audiometa/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AudiometaError::Reputation(format!("failed to build HTTP client: {}", e)))?;

        let url = self.url_for(sha256);
        let response = client
            .get(&url)
            .header("x-apikey", api_key)
            .send()
            .map_err(|e| AudiometaError::Reputation(format!("request to {} failed: {}", url, e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| AudiometaError::Reputation(format!("failed to read response body: {}", e)))?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeTransport {
        calls: AtomicUsize,
        response: std::result::Result<HttpResponse, String>,
    }

    impl FakeTransport {
        fn responding(status: u16, body: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: Ok(HttpResponse {
                    status,
                    body: body.to_string(),
                }),
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: Err("connection refused".to_string()),
            }
        }
    }

    impl ReputationTransport for FakeTransport {
        fn fetch(&self, sha256: &str, api_key: &str) -> Result<HttpResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(sha256.len(), 64);
            assert_eq!(api_key, "secret");
            self.response
                .clone()
                .map_err(AudiometaError::Reputation)
        }
    }

    fn source() -> (tempfile::TempDir, AudioSource) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp3");
        std::fs::write(&path, b"abc").unwrap();
        let source = AudioSource::open(&path).unwrap();
        (dir, source)
    }

    fn keyed() -> ReputationSettings {
        ReputationSettings {
            api_key: Some("secret".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_missing_key_makes_no_call() {
        let (_dir, source) = source();
        let transport = FakeTransport::responding(200, "{}");
        for key in [None, Some("  ".to_string())] {
            let settings = ReputationSettings {
                api_key: key,
                ..Default::default()
            };
            let verdict = lookup(&source, &settings, &transport).unwrap();
            assert_eq!(verdict, ReputationVerdict::KeyMissing);
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            ReputationVerdict::KeyMissing.to_native(),
            status("API key not set")
        );
    }

    #[test]
    fn test_stats_on_200() {
        let (_dir, source) = source();
        let body = r#"{"data": {"attributes": {"last_analysis_stats":
            {"malicious": 0, "suspicious": 1, "undetected": 60}}}}"#;
        let transport = FakeTransport::responding(200, body);

        let verdict = lookup(&source, &keyed(), &transport).unwrap();
        let ReputationVerdict::Stats(stats) = &verdict else {
            panic!("expected stats, got {:?}", verdict);
        };
        assert_eq!(stats.get("undetected"), Some(&60));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert!(verdict.to_native().get("malware_analysis").is_some());
    }

    #[test]
    fn test_not_found_on_404() {
        let (_dir, source) = source();
        let transport = FakeTransport::responding(404, "");
        let verdict = lookup(&source, &keyed(), &transport).unwrap();
        assert_eq!(verdict, ReputationVerdict::NotFound);
        assert_eq!(
            verdict.to_native(),
            status("not found in reputation database")
        );
    }

    #[test]
    fn test_other_status_is_query_error() {
        let (_dir, source) = source();
        let transport = FakeTransport::responding(429, "quota");
        let verdict = lookup(&source, &keyed(), &transport).unwrap();
        assert_eq!(
            verdict.to_native(),
            status("error querying reputation service: 429")
        );
    }

    #[test]
    fn test_transport_failure_is_query_error_zero() {
        let (_dir, source) = source();
        let transport = FakeTransport::failing();
        let verdict = lookup(&source, &keyed(), &transport).unwrap();
        assert_eq!(verdict, ReputationVerdict::QueryError(TRANSPORT_ERROR_CODE));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_200_without_stats_is_empty() {
        let response = HttpResponse {
            status: 200,
            body: "{\"data\": {}}".into(),
        };
        assert_eq!(
            classify_response(&response),
            ReputationVerdict::Stats(BTreeMap::new())
        );
    }

    #[test]
    fn test_malformed_200_body() {
        let response = HttpResponse {
            status: 200,
            body: "<html>".into(),
        };
        assert_eq!(classify_response(&response), ReputationVerdict::QueryError(200));
    }

    #[test]
    fn test_url_for() {
        let transport = HttpReputationTransport::new("https://example.test/api/v3/", Duration::from_secs(1));
        assert_eq!(
            transport.url_for("ab"),
            "https://example.test/api/v3/files/ab"
        );
    }
}

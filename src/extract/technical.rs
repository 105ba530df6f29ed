//! Technical stream properties via ffprobe

use crate::config::ProbeSettings;
use crate::error::{AudiometaError, Result};
use crate::extract::traits::TechnicalProber;
use crate::process;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Entries requested from ffprobe
const SHOW_ENTRIES: &str = "format=duration:stream=bit_rate,sample_rate,channels";

/// Runs the ffprobe executable as a child process
pub struct FfprobeProber {
    binary: String,
    timeout: Duration,
}

impl FfprobeProber {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn from_settings(settings: &ProbeSettings) -> Self {
        Self::new(settings.binary.clone(), settings.timeout())
    }

    fn args(path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-v", "error", "-show_entries", SHOW_ENTRIES, "-of", "json"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(path.as_os_str().to_owned());
        args
    }
}

impl TechnicalProber for FfprobeProber {
    fn probe(&self, path: &Path) -> Result<serde_json::Value> {
        let output = process::run_command_with_timeout(
            &self.binary,
            &Self::args(path),
            None,
            self.timeout,
        )?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let value: serde_json::Value = serde_json::from_str(&stdout).map_err(|e| {
            AudiometaError::Probe(format!("unparsable ffprobe output ({}): {}", e, stdout.trim()))
        })?;

        if let Ok(props) = parse_probe_output(&value) {
            debug!(
                "ffprobe: duration={:?}s bit_rate={:?} sample_rate={:?} channels={:?}",
                props.duration_seconds, props.bit_rate, props.sample_rate, props.channels
            );
        }

        Ok(value)
    }

    fn name(&self) -> &'static str {
        "ffprobe"
    }
}

/// Typed view of the ffprobe document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamProperties {
    pub duration_seconds: Option<f64>,
    pub bit_rate: Option<u64>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    sample_rate: Option<String>,
    channels: Option<u32>,
    bit_rate: Option<String>,
}

/// Extract duration, bit rate, sample rate and channel count
///
/// ffprobe reports most numbers as strings; values that fail to parse are
/// `None`. The first stream that carries a sample rate is taken as the
/// audio stream.
pub fn parse_probe_output(value: &serde_json::Value) -> Result<StreamProperties> {
    let probe = FfprobeOutput::deserialize(value)
        .map_err(|e| AudiometaError::Probe(format!("unexpected ffprobe document: {}", e)))?;

    let stream = probe
        .streams
        .iter()
        .find(|s| s.sample_rate.is_some())
        .or_else(|| probe.streams.first());

    Ok(StreamProperties {
        duration_seconds: probe
            .format
            .as_ref()
            .and_then(|f| f.duration.as_deref())
            .and_then(|d| d.parse().ok()),
        bit_rate: stream
            .and_then(|s| s.bit_rate.as_deref())
            .and_then(|b| b.parse().ok()),
        sample_rate: stream
            .and_then(|s| s.sample_rate.as_deref())
            .and_then(|r| r.parse().ok()),
        channels: stream.and_then(|s| s.channels),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_args_shape() {
        let args = FfprobeProber::args(Path::new("song.mp3"));
        let rendered: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            rendered,
            [
                "-v",
                "error",
                "-show_entries",
                "format=duration:stream=bit_rate,sample_rate,channels",
                "-of",
                "json",
                "song.mp3"
            ]
        );
    }

    #[test]
    fn test_parse_probe_output() {
        let doc = json!({
            "programs": [],
            "streams": [{"sample_rate": "44100", "channels": 2, "bit_rate": "128000"}],
            "format": {"duration": "3.448163"}
        });
        let props = parse_probe_output(&doc).unwrap();
        assert_eq!(props.sample_rate, Some(44100));
        assert_eq!(props.channels, Some(2));
        assert_eq!(props.bit_rate, Some(128000));
        assert!((props.duration_seconds.unwrap() - 3.448163).abs() < 1e-9);
    }

    #[test]
    fn test_parse_tolerates_missing_fields() {
        let props = parse_probe_output(&json!({"streams": [{"bit_rate": "N/A"}]})).unwrap();
        assert_eq!(props, StreamProperties::default());
    }

    #[test]
    fn test_missing_binary_is_error() {
        let prober = FfprobeProber::new("audiometa-no-such-ffprobe", Duration::from_secs(1));
        let err = prober.probe(Path::new("song.mp3")).unwrap_err();
        assert!(matches!(err, AudiometaError::CommandMissing { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_unparsable_stdout_is_probe_error() {
        // `echo` ignores ffprobe's flags and prints them back
        let prober = FfprobeProber::new("echo", Duration::from_secs(5));
        let err = prober.probe(Path::new("song.mp3")).unwrap_err();
        assert!(matches!(err, AudiometaError::Probe(_)));
        assert!(err.to_string().contains("unparsable"));
    }
}

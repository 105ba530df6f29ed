//! Integration tests for the audiometa pipeline
//!
//! These tests run the aggregator end to end on generated WAV files, with
//! the external collaborators (ffprobe, the reputation service, whisper)
//! replaced by in-process fakes.

use audiometa::analysis::{AcousticClassifier, StratumTempoEstimator, TempoEstimator};
use audiometa::audio;
use audiometa::capability::Capabilities;
use audiometa::config::{ReputationSettings, Settings};
use audiometa::extract::{
    HttpResponse, ReputationTransport, TechnicalProber, Transcriber, Transcript,
};
use audiometa::pipeline::{self, Aggregator};
use audiometa::report::{emit, is_json_safe, normalize, MetadataReport};
use audiometa::{AudioSource, AudiometaError, Field, NativeValue, Result};
use lofty::config::WriteOptions;
use lofty::id3::v2::Id3v2Tag;
use lofty::prelude::*;
use lofty::probe::Probe;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Generate a sine wave WAV file for testing
///
/// Creates a mono 16-bit WAV file at the specified path.
fn generate_sine_wav(path: &Path, frequency_hz: f32, duration_secs: f32, sample_rate: u32) {
    use std::f32::consts::PI;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create WAV file");

    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let amplitude = 0.5f32;

    for i in 0..num_samples {
        let t = i as f32 / sample_rate as f32;
        let sample = (2.0 * PI * frequency_hz * t).sin() * amplitude;
        writer
            .write_sample((sample * 32767.0) as i16)
            .expect("Failed to write sample");
    }

    writer.finalize().expect("Failed to finalize WAV");
}

/// Generate a click track WAV file for tempo testing
///
/// Short exponentially decaying impulses at every beat.
fn generate_click_track(path: &Path, bpm: f32, duration_secs: f32, sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create WAV file");

    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let samples_per_beat = (60.0 / bpm * sample_rate as f32) as usize;
    let impulse_samples = (0.005 * sample_rate as f32) as usize;

    for i in 0..num_samples {
        let position_in_beat = i % samples_per_beat;
        let sample = if position_in_beat < impulse_samples {
            let decay = (-5.0 * position_in_beat as f32 / impulse_samples as f32).exp();
            0.8 * decay
        } else {
            0.0
        };
        writer
            .write_sample((sample * 32767.0) as i16)
            .expect("Failed to write sample");
    }

    writer.finalize().expect("Failed to finalize WAV");
}

/// Add an ID3v2 chunk with title and artist to an existing file
fn tag_file(path: &Path, title: &str, artist: &str) {
    let mut tagged = Probe::open(path)
        .expect("Failed to open for tagging")
        .read()
        .expect("Failed to read for tagging");
    let mut tag = Id3v2Tag::default();
    tag.set_title(title.to_string());
    tag.set_artist(artist.to_string());
    tagged.insert_tag(tag.into());
    tagged
        .save_to_path(path, WriteOptions::default())
        .expect("Failed to save tags");
}

struct FakeProber;

impl TechnicalProber for FakeProber {
    fn probe(&self, _path: &Path) -> Result<serde_json::Value> {
        Ok(serde_json::json!({
            "streams": [{"sample_rate": "44100", "channels": 1, "bit_rate": "705600"}],
            "format": {"duration": "3.000000"}
        }))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

struct PanickingProber;

impl TechnicalProber for PanickingProber {
    fn probe(&self, _path: &Path) -> Result<serde_json::Value> {
        panic!("prober blew up")
    }

    fn name(&self) -> &'static str {
        "panicking"
    }
}

#[derive(Clone)]
struct CountingTransport {
    calls: Arc<AtomicUsize>,
    status: u16,
    body: &'static str,
}

impl CountingTransport {
    fn new(status: u16, body: &'static str) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            status,
            body,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReputationTransport for CountingTransport {
    fn fetch(&self, _sha256: &str, _api_key: &str) -> Result<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(HttpResponse {
            status: self.status,
            body: self.body.to_string(),
        })
    }
}

struct FakeTranscriber {
    calls: Arc<AtomicUsize>,
}

impl Transcriber for FakeTranscriber {
    fn transcribe(&self, _path: &Path) -> Result<Transcript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Transcript {
            text: "hello there".to_string(),
            language: "en".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

fn offline_aggregator(settings: Settings, transport: CountingTransport) -> Aggregator {
    Aggregator::new(settings, Capabilities::with_transcription(false))
        .with_prober(Box::new(FakeProber))
        .with_reputation_transport(Box::new(transport))
}

fn report_json(report: &MetadataReport) -> serde_json::Value {
    let rendered = emit::to_pretty_json(report).expect("report must serialize");
    serde_json::from_str(&rendered).expect("report must be valid JSON")
}

#[test]
fn test_tagged_file_without_artwork() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tagged.wav");
    generate_sine_wav(&path, 440.0, 5.0, 44100);
    tag_file(&path, "Apshansh", "Artist Example");

    let transport = CountingTransport::new(200, "{}");
    let source = AudioSource::open(&path).unwrap();
    let report = offline_aggregator(Settings::default(), transport.clone()).run(&source);
    let json = report_json(&report);

    assert_eq!(json["basic"]["tags"]["title"], "Apshansh");
    assert_eq!(json["basic"]["tags"]["artist"], "Artist Example");
    assert!(json["cover_art_path"].is_null());
    assert!(!dir.path().join("tagged.wav_cover.jpg").exists());
    assert_eq!(json["technical"]["format"]["duration"], "3.000000");
    assert_eq!(json["malware_scan"]["status"], "API key not set");
    assert_eq!(transport.calls(), 0);

    // A 440 Hz sine crosses zero well below the electronic threshold
    let genre = &json["genre_mood_analysis"];
    assert!(genre.get("error").is_none(), "unexpected error: {}", genre);
    assert!(genre["tempo"].is_number());
    assert!(genre["mood"].is_string());
    assert_eq!(genre["genre_estimate"], "acoustic");
}

#[test]
fn test_report_has_every_key() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plain.wav");
    generate_sine_wav(&path, 220.0, 2.0, 22050);

    let source = AudioSource::open(&path).unwrap();
    let report =
        offline_aggregator(Settings::default(), CountingTransport::new(404, "")).run(&source);
    let json = report_json(&report);

    for key in &MetadataReport::KEYS[..6] {
        assert!(json.get(*key).is_some(), "missing key {}", key);
    }
    assert!(json.get("language_detected").is_none());
    assert!(json["transcription"].is_string());
}

#[test]
fn test_corrupt_file_keeps_all_keys() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("corrupt.mp3");
    fs::write(&path, b"definitely not an mpeg stream").unwrap();

    let source = AudioSource::open(&path).unwrap();
    let report =
        offline_aggregator(Settings::default(), CountingTransport::new(200, "{}")).run(&source);
    let json = report_json(&report);

    assert_eq!(json["basic"]["info"], "N/A");
    assert!(json["basic"]["error"].is_string());
    assert!(json["genre_mood_analysis"]["error"].is_string());
    assert!(json["cover_art_path"].is_null());
    for key in &MetadataReport::KEYS[..6] {
        assert!(json.get(*key).is_some(), "missing key {}", key);
    }
}

#[test]
fn test_reputation_lookup_with_key() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clip.wav");
    generate_sine_wav(&path, 330.0, 1.0, 22050);

    let settings = Settings {
        reputation: ReputationSettings {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    let transport = CountingTransport::new(
        200,
        r#"{"data": {"attributes": {"last_analysis_stats": {"malicious": 0, "undetected": 72}}}}"#,
    );

    let source = AudioSource::open(&path).unwrap();
    let report = offline_aggregator(settings, transport.clone()).run(&source);
    let json = report_json(&report);

    assert_eq!(transport.calls(), 1);
    assert_eq!(json["malware_scan"]["malware_analysis"]["undetected"], 72);
    assert_eq!(json["malware_scan"]["malware_analysis"]["malicious"], 0);
}

#[test]
fn test_panicking_prober_only_fails_technical() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tagged.wav");
    generate_sine_wav(&path, 440.0, 1.0, 22050);
    tag_file(&path, "Apshansh", "Artist Example");

    let source = AudioSource::open(&path).unwrap();
    let report = offline_aggregator(Settings::default(), CountingTransport::new(200, "{}"))
        .with_prober(Box::new(PanickingProber))
        .run(&source);

    assert!(report.technical.is_failed());
    assert!(!report.basic.is_failed());
    let json = report_json(&report);
    assert!(json["technical"]["error"]
        .as_str()
        .unwrap()
        .contains("prober blew up"));
    assert_eq!(json["basic"]["tags"]["title"], "Apshansh");
}

#[test]
fn test_transcription_capability_states() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("speech.wav");
    generate_sine_wav(&path, 200.0, 1.0, 16000);
    let source = AudioSource::open(&path).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let unavailable = Aggregator::new(Settings::default(), Capabilities::with_transcription(false))
        .with_prober(Box::new(FakeProber))
        .with_transcriber(Box::new(FakeTranscriber {
            calls: calls.clone(),
        }))
        .run(&source);
    assert!(matches!(unavailable.transcription, Field::Unavailable(_)));
    assert!(unavailable.language_detected.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let available = Aggregator::new(Settings::default(), Capabilities::with_transcription(true))
        .with_prober(Box::new(FakeProber))
        .with_transcriber(Box::new(FakeTranscriber {
            calls: calls.clone(),
        }))
        .run(&source);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        available.language_detected,
        Some(Field::Value(NativeValue::from("english")))
    );
    let json = report_json(&available);
    assert_eq!(json["transcription"]["text"], "hello there");
    assert_eq!(json["language_detected"], "english");
}

#[test]
fn test_click_track_tempo() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("click_120.wav");
    generate_click_track(&path, 120.0, 10.0, 44100);

    let buffer = audio::decode(&path).unwrap();
    let bpm = StratumTempoEstimator::new().estimate(&buffer).unwrap();

    let near = |target: f32| (bpm - target).abs() <= 5.0;
    assert!(
        near(120.0) || near(60.0) || near(240.0),
        "expected ~120 BPM (or an octave), got {}",
        bpm
    );
}

#[test]
fn test_classifier_on_click_track() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("click_140.wav");
    generate_click_track(&path, 140.0, 8.0, 22050);

    let analysis = AcousticClassifier::default().classify_file(&path).unwrap();
    assert!(analysis.tempo > 0.0);
    assert!(analysis.zero_crossing_rate_mean >= 0.0);
    assert!(analysis.spectral_centroid_mean > 0.0);
    assert!(!is_json_safe(&analysis.to_native()));
    assert!(is_json_safe(&normalize(analysis.to_native())));
}

#[test]
fn test_emit_writes_report_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tagged.wav");
    generate_sine_wav(&path, 440.0, 1.0, 22050);
    tag_file(&path, "Apshansh", "Artist Example");
    let output = dir.path().join("output.json");

    let source = AudioSource::open(&path).unwrap();
    let report =
        offline_aggregator(Settings::default(), CountingTransport::new(200, "{}")).run(&source);

    let mut stdout = Vec::new();
    emit::emit(&report, &mut stdout, &output).unwrap();

    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(String::from_utf8(stdout).unwrap().trim_end(), written.trim_end());
    let json: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(json["basic"]["tags"]["artist"], "Artist Example");
    assert!(written.contains("\n    \"basic\""));
}

#[test]
fn test_pipeline_run_rejects_missing_input() {
    let dir = TempDir::new().unwrap();
    let err = pipeline::run(&dir.path().join("missing.mp3"), &Settings::default()).unwrap_err();
    assert!(matches!(err, AudiometaError::FileNotFound(_)));
    assert!(err.is_input_error());
}

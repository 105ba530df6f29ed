//! Report aggregation
//!
//! Runs every extractor against the same input, one after another, and
//! merges their normalized payloads into the fixed report schema. Each slot
//! is isolated: an error, or even a panic, in one extractor only affects
//! the slot it fills.

use crate::analysis::AcousticClassifier;
use crate::capability::Capabilities;
use crate::config::Settings;
use crate::extract::{
    self, transcription::UNAVAILABLE_MESSAGE, FfprobeProber, HttpReputationTransport,
    ReputationTransport, TechnicalProber, Transcriber, Transcript, WhisperCliTranscriber,
};
use crate::report::{normalize, Field, MetadataReport, NativeValue};
use crate::error::Result;
use crate::types::{AudioSource, ExtractorResult};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Runs the extractor set and assembles a [`MetadataReport`]
pub struct Aggregator {
    settings: Settings,
    capabilities: Capabilities,
    classifier: AcousticClassifier,
    prober: Box<dyn TechnicalProber>,
    transport: Box<dyn ReputationTransport>,
    transcriber: Option<Box<dyn Transcriber>>,
}

impl Aggregator {
    /// Build an aggregator with the production collaborators
    pub fn new(settings: Settings, capabilities: Capabilities) -> Self {
        let transcriber = WhisperCliTranscriber::from_settings(&settings.transcription)
            .map(|t| Box::new(t) as Box<dyn Transcriber>);
        Self {
            classifier: AcousticClassifier::new(settings.thresholds),
            prober: Box::new(FfprobeProber::from_settings(&settings.probe)),
            transport: Box::new(HttpReputationTransport::from_settings(&settings.reputation)),
            transcriber,
            capabilities,
            settings,
        }
    }

    pub fn with_prober(mut self, prober: Box<dyn TechnicalProber>) -> Self {
        self.prober = prober;
        self
    }

    pub fn with_reputation_transport(mut self, transport: Box<dyn ReputationTransport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_transcriber(mut self, transcriber: Box<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn with_classifier(mut self, classifier: AcousticClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Produce the full report for `source`
    ///
    /// Never fails: every extractor problem is recorded in its own slot.
    pub fn run(&self, source: &AudioSource) -> MetadataReport {
        let started = Instant::now();
        let path = source.path();
        info!("Extracting metadata from {}", path.display());

        let basic = match run_slot("basic", || {
            capture(extract::extract_tags(path))
        }) {
            ExtractorResult::Success(tags) => Field::Value(normalize(tags.to_native())),
            ExtractorResult::Failure(reason) => Field::Value(NativeValue::map([
                ("tags", NativeValue::map::<String, _>([])),
                ("info", NativeValue::from("N/A")),
                ("error", NativeValue::from(reason)),
            ])),
        };

        let technical = into_field(
            run_slot("technical", || capture(self.prober.probe(path))),
            NativeValue::from,
        );

        let cover_art_path = into_field(
            run_slot("cover_art_path", || {
                ExtractorResult::Success(extract::extract_artwork(source, self.settings.artwork))
            }),
            |cover| NativeValue::from(cover.map(|p| p.to_string_lossy().into_owned())),
        );

        let genre_mood_analysis = into_field(
            run_slot("genre_mood_analysis", || {
                ExtractorResult::Success(self.classifier.analyze(path))
            }),
            std::convert::identity,
        );

        let malware_scan = into_field(
            run_slot("malware_scan", || {
                capture(extract::lookup(
                    source,
                    &self.settings.reputation,
                    self.transport.as_ref(),
                ))
            }),
            |verdict| verdict.to_native(),
        );

        let (transcription, language_detected) = self.transcribe(source);

        info!(
            "Report for {} assembled in {:.2}s",
            path.display(),
            started.elapsed().as_secs_f64()
        );

        MetadataReport {
            basic,
            technical,
            cover_art_path,
            genre_mood_analysis,
            malware_scan,
            transcription,
            language_detected,
        }
    }

    /// Transcription slot plus the language derived from the same result
    fn transcribe(&self, source: &AudioSource) -> (Field, Option<Field>) {
        let transcriber = match (&self.transcriber, self.capabilities.transcription) {
            (Some(transcriber), true) => transcriber,
            _ => {
                debug!("Transcription unavailable, not attempting it");
                return (Field::Unavailable(UNAVAILABLE_MESSAGE.to_string()), None);
            }
        };

        debug!("Transcribing with {}", transcriber.name());
        match run_slot("transcription", || {
            capture(transcriber.transcribe(source.path()))
        }) {
            ExtractorResult::Success(Transcript { text, language }) => {
                let language_detected = (!text.is_empty()).then(|| {
                    Field::Value(NativeValue::from(extract::language_name(&language)))
                });
                let payload = NativeValue::map([
                    ("text", NativeValue::from(text)),
                    ("language", NativeValue::from(language)),
                ]);
                (Field::Value(payload), language_detected)
            }
            ExtractorResult::Failure(reason) => (Field::failed(reason), None),
        }
    }
}

/// Run one extractor, turning a panic into a failure of that slot
fn run_slot<T>(slot: &'static str, extractor: impl FnOnce() -> ExtractorResult<T>) -> ExtractorResult<T> {
    let started = Instant::now();
    let outcome = match panic::catch_unwind(AssertUnwindSafe(extractor)) {
        Ok(outcome) => outcome,
        Err(payload) => ExtractorResult::Failure(format!(
            "extractor panicked: {}",
            panic_message(payload.as_ref())
        )),
    };

    match &outcome {
        ExtractorResult::Success(_) => debug!(
            "{} finished in {:.3}s",
            slot,
            started.elapsed().as_secs_f64()
        ),
        ExtractorResult::Failure(reason) => warn!("{} failed: {}", slot, reason),
    }
    outcome
}

/// Record an extractor's outcome; I/O and other non-slot errors log at `error`
fn capture<T>(result: Result<T>) -> ExtractorResult<T> {
    if let Err(e) = &result {
        if !e.is_recoverable() {
            error!("Unexpected extractor error: {}", e);
        }
    }
    ExtractorResult::from_result(result)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn into_field<T>(outcome: ExtractorResult<T>, to_native: impl FnOnce(T) -> NativeValue) -> Field {
    match outcome {
        ExtractorResult::Success(value) => Field::Value(normalize(to_native(value))),
        ExtractorResult::Failure(reason) => Field::failed(reason),
    }
}

//! Per-slot extractors
//!
//! Every extractor works on the same [`crate::types::AudioSource`] and is
//! independent of the others.

pub mod artwork;
pub mod language;
pub mod reputation;
pub mod tags;
pub mod technical;
pub mod traits;
pub mod transcription;

pub use artwork::extract_artwork;
pub use language::language_name;
pub use reputation::{lookup, HttpReputationTransport, ReputationVerdict};
pub use tags::{extract_tags, TagReport};
pub use technical::{parse_probe_output, FfprobeProber, StreamProperties};
pub use traits::{HttpResponse, ReputationTransport, TechnicalProber, Transcriber, Transcript};
pub use transcription::WhisperCliTranscriber;

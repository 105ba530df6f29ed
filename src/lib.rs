//! audiometa - Audio Metadata Aggregation
//!
//! Extracts everything knowable about a single audio file into one JSON
//! report: container tags, stream properties, embedded cover art, a coarse
//! acoustic mood/genre guess, a file reputation verdict and an optional
//! speech transcription.
//!
//! # Architecture
//!
//! - `config`: CLI argument parsing and runtime settings
//! - `audio`: Audio decoding using symphonia
//! - `analysis`: Frame features, tempo and the acoustic classifier
//! - `extract`: Tag, probe, artwork, reputation and transcription extractors
//! - `capability`: One-time probe for optional subsystems
//! - `pipeline`: Runs the extractors and assembles the report
//! - `report`: Value model, JSON normalization and output
//!
//! # Example
//!
//! ```no_run
//! use audiometa::{config::Settings, pipeline};
//! use std::path::Path;
//!
//! let settings = Settings::default();
//! let report = pipeline::run(Path::new("song.mp3"), &settings).expect("missing input");
//! println!("{}", audiometa::report::emit::to_pretty_json(&report).unwrap());
//! ```

pub mod analysis;
pub mod audio;
pub mod capability;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod process;
pub mod report;
pub mod types;

// Re-export key types at crate root
pub use error::{AudiometaError, Result};
pub use report::{Field, MetadataReport, NativeValue};
pub use types::{AudioBuffer, AudioSource, ExtractorResult};

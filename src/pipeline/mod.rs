//! Pipeline orchestration
//!
//! Opens the input, settles the optional capabilities and hands the source
//! to the [`Aggregator`].

pub mod aggregator;

pub use aggregator::Aggregator;

use crate::capability::process_capabilities;
use crate::config::Settings;
use crate::error::Result;
use crate::report::MetadataReport;
use crate::types::AudioSource;
use std::path::Path;

/// Build the report for one file with the production collaborators
///
/// Fails only when the input itself is missing; extractor problems end up
/// inside the report.
pub fn run(path: &Path, settings: &Settings) -> Result<MetadataReport> {
    let source = AudioSource::open(path)?;
    let capabilities = process_capabilities(&settings.transcription);
    Ok(Aggregator::new(settings.clone(), capabilities).run(&source))
}

//! Embedded artwork extraction
//!
//! Reads the ID3v2 tag (id3 finds it at the file start for MPEG and in the
//! `id3 ` chunk for WAV/AIFF) and writes the first attached picture next to
//! the input file as `<input path>_cover.jpg`. Absence of artwork is a normal outcome, so every
//! failure here resolves to `None`.

use crate::config::ArtworkPolicy;
use crate::types::AudioSource;
use std::ffi::OsString;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extract artwork per `policy`, returning where it was written
pub fn extract_artwork(source: &AudioSource, policy: ArtworkPolicy) -> Option<PathBuf> {
    if policy == ArtworkPolicy::Skip {
        return None;
    }

    let path = source.path();
    let tag = match id3::Tag::read_from_path(path) {
        Ok(tag) => tag,
        Err(e) => {
            debug!("No readable ID3 tag in {}: {}", path.display(), e);
            return None;
        }
    };

    let picture = tag.pictures().next()?;
    let cover_path = cover_path_for(path);

    match write_atomic(&picture.data, &cover_path) {
        Ok(()) => {
            info!(
                "Wrote {} bytes of {} artwork to {}",
                picture.data.len(),
                picture.mime_type,
                cover_path.display()
            );
            Some(cover_path)
        }
        Err(e) => {
            warn!("Failed to write artwork to {}: {}", cover_path.display(), e);
            None
        }
    }
}

/// `<input path>_cover.jpg`
pub fn cover_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push("_cover.jpg");
    PathBuf::from(name)
}

/// Write to a temporary sibling and rename, so a concurrent run over the
/// same input never observes a torn image
fn write_atomic(data: &[u8], target: &Path) -> std::io::Result<()> {
    let mut temp_name = OsString::from(target.as_os_str());
    temp_name.push(format!(".{}.tmp", std::process::id()));
    let temp_path = PathBuf::from(temp_name);

    let result = File::create(&temp_path)
        .and_then(|mut file| file.write_all(data).and_then(|_| file.sync_all()))
        .and_then(|_| std::fs::rename(&temp_path, target));

    if result.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }
    result
}

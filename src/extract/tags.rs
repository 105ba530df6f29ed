//! Container tag extraction
//!
//! Uses lofty to read ID3v2/ID3v1 (MP3, WAV, AIFF), Vorbis comments (FLAC,
//! OGG), MP4 atoms and APE tags, and exposes every text item under a
//! lowercase, format-agnostic key.

use crate::error::{AudiometaError, Result};
use crate::report::NativeValue;
use lofty::file::{FileType, TaggedFile, TaggedFileExt};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::{ItemKey, Tag};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Tags and a one-line technical summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagReport {
    pub tags: BTreeMap<String, String>,
    pub info: String,
}

impl TagReport {
    pub fn to_native(&self) -> NativeValue {
        NativeValue::map([
            ("tags", NativeValue::from(self.tags.clone())),
            ("info", NativeValue::from(self.info.as_str())),
        ])
    }
}

/// Read all tags from an audio file
///
/// Fails with [`AudiometaError::UnreadableContainer`] if lofty cannot parse
/// the file as audio.
pub fn extract_tags(path: &Path) -> Result<TagReport> {
    let unreadable = |reason: String| AudiometaError::UnreadableContainer {
        path: path.to_path_buf(),
        reason,
    };
    let tagged_file = Probe::open(path)
        .map_err(|e| unreadable(e.to_string()))?
        .guess_file_type()
        .map_err(|e| unreadable(e.to_string()))?
        .read()
        .map_err(|e| unreadable(e.to_string()))?;

    let mut tags = BTreeMap::new();

    // Primary tag first so its values win over secondary blocks
    let primary_type = tagged_file.primary_tag_type();
    let ordered = tagged_file
        .tag(primary_type)
        .into_iter()
        .chain(
            tagged_file
                .tags()
                .iter()
                .filter(|t| t.tag_type() != primary_type),
        );

    for tag in ordered {
        collect_items(tag, &mut tags);
    }

    if tags.is_empty() {
        debug!("No tags found in {}", path.display());
    }

    Ok(TagReport {
        tags,
        info: summarize(&tagged_file),
    })
}

fn collect_items(tag: &Tag, out: &mut BTreeMap<String, String>) {
    for item in tag.items() {
        let Some(text) = item.value().text() else {
            continue;
        };
        let key = easy_key(item.key(), tag);
        out.entry(key).or_insert_with(|| text.to_string());
    }
}

/// Lowercase key name shared across tag formats
fn easy_key(key: &ItemKey, tag: &Tag) -> String {
    let known = match key {
        ItemKey::TrackTitle => "title",
        ItemKey::TrackArtist => "artist",
        ItemKey::AlbumTitle => "album",
        ItemKey::AlbumArtist => "albumartist",
        ItemKey::Genre => "genre",
        ItemKey::RecordingDate | ItemKey::Year => "date",
        ItemKey::TrackNumber => "tracknumber",
        ItemKey::TrackTotal => "tracktotal",
        ItemKey::DiscNumber => "discnumber",
        ItemKey::DiscTotal => "disctotal",
        ItemKey::Composer => "composer",
        ItemKey::Conductor => "conductor",
        ItemKey::Lyricist => "lyricist",
        ItemKey::EncodedBy => "encodedby",
        ItemKey::Comment => "comment",
        ItemKey::CopyrightMessage => "copyright",
        ItemKey::Bpm => "bpm",
        ItemKey::Language => "language",
        ItemKey::Isrc => "isrc",
        ItemKey::Publisher => "organization",
        ItemKey::Unknown(raw) => return raw.to_lowercase(),
        other => {
            return other
                .map_key(tag.tag_type(), true)
                .map(str::to_lowercase)
                .unwrap_or_else(|| format!("{:?}", other).to_lowercase())
        }
    };
    known.to_string()
}

/// e.g. `MPEG, 128000 bps, 44100 Hz, 2 chn, 3.45 seconds`
fn summarize(file: &TaggedFile) -> String {
    let props = file.properties();
    format!(
        "{}, {} bps, {} Hz, {} chn, {:.2} seconds",
        file_type_name(file.file_type()),
        props.audio_bitrate().unwrap_or(0) as u64 * 1000,
        props.sample_rate().unwrap_or(0),
        props.channels().unwrap_or(0),
        props.duration().as_secs_f64()
    )
}

fn file_type_name(file_type: FileType) -> String {
    match file_type {
        FileType::Mpeg => "MPEG".to_string(),
        FileType::Flac => "FLAC".to_string(),
        FileType::Wav => "WAVE".to_string(),
        FileType::Aiff => "AIFF".to_string(),
        FileType::Vorbis => "Ogg Vorbis".to_string(),
        FileType::Opus => "Ogg Opus".to_string(),
        FileType::Mp4 => "MP4".to_string(),
        other => format!("{:?}", other),
    }
}

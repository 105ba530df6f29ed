//! Fixed report schema
//!
//! Every top-level key except `language_detected` is present in every run,
//! whether its extractor succeeded, failed or was unavailable.

use crate::report::value::NativeValue;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// One report slot
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Normalized extractor payload, emitted as-is
    Value(NativeValue),
    /// Extractor error, emitted as `{"error": "..."}`
    Failed { error: String },
    /// Informational status, emitted as a bare string
    Unavailable(String),
}

impl Field {
    pub fn failed(error: impl Into<String>) -> Self {
        Field::Failed {
            error: error.into(),
        }
    }

    pub fn value(&self) -> Option<&NativeValue> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Field::Failed { .. })
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Value(value) => value.serialize(serializer),
            Field::Failed { error } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", error)?;
                map.end()
            }
            Field::Unavailable(status) => serializer.serialize_str(status),
        }
    }
}

/// Consolidated metadata for one audio file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataReport {
    pub basic: Field,
    pub technical: Field,
    pub cover_art_path: Field,
    pub genre_mood_analysis: Field,
    pub malware_scan: Field,
    pub transcription: Field,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_detected: Option<Field>,
}

impl MetadataReport {
    /// Top-level keys in emission order
    pub const KEYS: [&'static str; 7] = [
        "basic",
        "technical",
        "cover_art_path",
        "genre_mood_analysis",
        "malware_scan",
        "transcription",
        "language_detected",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report() -> MetadataReport {
        MetadataReport {
            basic: Field::Value(NativeValue::map([
                ("tags", NativeValue::map::<String, _>([])),
                ("info", NativeValue::from("N/A")),
            ])),
            technical: Field::failed("ffprobe: not found"),
            cover_art_path: Field::Value(NativeValue::Null),
            genre_mood_analysis: Field::Value(NativeValue::map([(
                "error",
                NativeValue::from("decode failed"),
            )])),
            malware_scan: Field::Value(NativeValue::map([(
                "status",
                NativeValue::from("API key not set"),
            )])),
            transcription: Field::Unavailable("transcription unavailable".into()),
            language_detected: None,
        }
    }

    #[test]
    fn test_field_serialization_shapes() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["technical"], json!({"error": "ffprobe: not found"}));
        assert_eq!(json["cover_art_path"], json!(null));
        assert_eq!(json["transcription"], json!("transcription unavailable"));
        assert_eq!(json["malware_scan"]["status"], json!("API key not set"));
    }

    #[test]
    fn test_language_detected_omitted_when_absent() {
        let json = serde_json::to_value(report()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("language_detected"));
        assert_eq!(obj.len(), 6);

        let mut with_language = report();
        with_language.language_detected = Some(Field::Value(NativeValue::from("english")));
        let json = serde_json::to_value(with_language).unwrap();
        assert_eq!(json["language_detected"], json!("english"));
    }

    #[test]
    fn test_key_order_is_fixed() {
        let text = serde_json::to_string(&report()).unwrap();
        let positions: Vec<usize> = MetadataReport::KEYS[..6]
            .iter()
            .map(|k| text.find(&format!("\"{}\"", k)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}

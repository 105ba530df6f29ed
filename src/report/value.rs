//! Extractor-native payloads and the JSON-safety normalizer
//!
//! Extractors hand back [`NativeValue`]s that may still carry single-precision
//! floats, narrow integers or raw numeric buffers. [`normalize`] folds those
//! into the JSON-safe subset (`Null`, `Bool`, `Int`, `Float`, `Str`, `Seq`,
//! `Map`) before anything reaches the report.

use serde::ser::{Error as SerError, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// A payload value as produced by an extractor
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<NativeValue>),
    Map(BTreeMap<String, NativeValue>),

    // Native kinds, folded away by `normalize`
    F32(f32),
    I32(i32),
    U32(u32),
    U64(u64),
    F32Buffer(Vec<f32>),
    F64Buffer(Vec<f64>),
    I16Buffer(Vec<i16>),

    /// Opaque binary data; not a numeric kind, passed through untouched
    Bytes(Vec<u8>),
}

impl NativeValue {
    /// Build a `Map` from key/value pairs
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, NativeValue)>,
    {
        NativeValue::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Look up a key if this is a `Map`
    pub fn get(&self, key: &str) -> Option<&NativeValue> {
        match self {
            NativeValue::Map(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            NativeValue::Float(v) => Some(v),
            NativeValue::F32(v) => Some(v as f64),
            NativeValue::Int(v) => Some(v as f64),
            NativeValue::I32(v) => Some(v as f64),
            NativeValue::U32(v) => Some(v as f64),
            NativeValue::U64(v) => Some(v as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, NativeValue::Null)
    }
}

impl From<&str> for NativeValue {
    fn from(s: &str) -> Self {
        NativeValue::Str(s.to_string())
    }
}

impl From<String> for NativeValue {
    fn from(s: String) -> Self {
        NativeValue::Str(s)
    }
}

impl From<bool> for NativeValue {
    fn from(b: bool) -> Self {
        NativeValue::Bool(b)
    }
}

impl From<i64> for NativeValue {
    fn from(v: i64) -> Self {
        NativeValue::Int(v)
    }
}

impl From<f64> for NativeValue {
    fn from(v: f64) -> Self {
        NativeValue::Float(v)
    }
}

impl<T: Into<NativeValue>> From<Option<T>> for NativeValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(NativeValue::Null, Into::into)
    }
}

impl From<BTreeMap<String, String>> for NativeValue {
    fn from(map: BTreeMap<String, String>) -> Self {
        NativeValue::Map(map.into_iter().map(|(k, v)| (k, NativeValue::Str(v))).collect())
    }
}

impl From<serde_json::Value> for NativeValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => NativeValue::Null,
            Value::Bool(b) => NativeValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    NativeValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    NativeValue::U64(u)
                } else {
                    NativeValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => NativeValue::Str(s),
            Value::Array(items) => NativeValue::Seq(items.into_iter().map(Into::into).collect()),
            Value::Object(obj) => {
                NativeValue::Map(obj.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// Convert native numeric kinds into JSON-safe primitives, recursively
///
/// Idempotent: `normalize(normalize(v)) == normalize(v)`. Kinds that are
/// neither numeric nor containers pass through unchanged.
pub fn normalize(value: NativeValue) -> NativeValue {
    match value {
        NativeValue::F32(v) => NativeValue::Float(v as f64),
        NativeValue::I32(v) => NativeValue::Int(v as i64),
        NativeValue::U32(v) => NativeValue::Int(v as i64),
        NativeValue::U64(v) => match i64::try_from(v) {
            Ok(i) => NativeValue::Int(i),
            Err(_) => NativeValue::Float(v as f64),
        },
        NativeValue::F32Buffer(buf) => {
            NativeValue::Seq(buf.into_iter().map(|v| NativeValue::Float(v as f64)).collect())
        }
        NativeValue::F64Buffer(buf) => {
            NativeValue::Seq(buf.into_iter().map(NativeValue::Float).collect())
        }
        NativeValue::I16Buffer(buf) => {
            NativeValue::Seq(buf.into_iter().map(|v| NativeValue::Float(v as f64)).collect())
        }
        NativeValue::Seq(items) => NativeValue::Seq(items.into_iter().map(normalize).collect()),
        NativeValue::Map(map) => {
            NativeValue::Map(map.into_iter().map(|(k, v)| (k, normalize(v))).collect())
        }
        other => other,
    }
}

/// True if `value` contains only JSON-safe kinds
pub fn is_json_safe(value: &NativeValue) -> bool {
    match value {
        NativeValue::Null
        | NativeValue::Bool(_)
        | NativeValue::Int(_)
        | NativeValue::Float(_)
        | NativeValue::Str(_) => true,
        NativeValue::Seq(items) => items.iter().all(is_json_safe),
        NativeValue::Map(map) => map.values().all(is_json_safe),
        _ => false,
    }
}

fn serialize_float<S: Serializer>(v: f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !v.is_finite() {
        return Err(S::Error::custom(format!("non-finite float {v} has no JSON form")));
    }
    serializer.serialize_f64(v)
}

fn serialize_floats<S, I>(values: I, len: usize, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    I: Iterator<Item = f64>,
{
    let mut seq = serializer.serialize_seq(Some(len))?;
    for v in values {
        if !v.is_finite() {
            return Err(S::Error::custom(format!("non-finite float {v} has no JSON form")));
        }
        seq.serialize_element(&v)?;
    }
    seq.end()
}

impl Serialize for NativeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NativeValue::Null => serializer.serialize_unit(),
            NativeValue::Bool(b) => serializer.serialize_bool(*b),
            NativeValue::Int(v) => serializer.serialize_i64(*v),
            NativeValue::Float(v) => serialize_float(*v, serializer),
            NativeValue::Str(s) => serializer.serialize_str(s),
            NativeValue::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            NativeValue::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            NativeValue::F32(v) => serialize_float(*v as f64, serializer),
            NativeValue::I32(v) => serializer.serialize_i32(*v),
            NativeValue::U32(v) => serializer.serialize_u32(*v),
            NativeValue::U64(v) => serializer.serialize_u64(*v),
            NativeValue::F32Buffer(buf) => {
                serialize_floats(buf.iter().map(|&v| v as f64), buf.len(), serializer)
            }
            NativeValue::F64Buffer(buf) => serialize_floats(buf.iter().copied(), buf.len(), serializer),
            NativeValue::I16Buffer(buf) => buf.serialize(serializer),
            NativeValue::Bytes(bytes) => bytes.serialize(serializer),
        }
    }
}

//! Report model, normalization and emission

pub mod emit;
pub mod schema;
pub mod value;

pub use schema::{Field, MetadataReport};
pub use value::{is_json_safe, normalize, NativeValue};

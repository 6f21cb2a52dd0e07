//! Field descriptors and wire payloads

mod field_data;
mod field_meta;
mod types;

pub use field_data::FieldData;
pub use field_meta::FieldMeta;
pub use types::{DataType, FieldId, SegmentId};

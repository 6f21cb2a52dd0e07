//! Wire container for one column of field data
//!
//! Mirrors the tagged payload an upstream deserializer produces: one case per
//! storage representation. Int8, Int16 and Int32 fields all travel widened in
//! the `Int` case.

use serde::{Deserialize, Serialize};

/// Column payload, one variant per wire representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldData {
    Bool(Vec<bool>),
    /// Int8, Int16 and Int32 values, widened to 32 bits
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    String(Vec<String>),
    /// Dense vectors, `data.len() == rows * dim`
    FloatVector { dim: usize, data: Vec<f32> },
    /// Bit-packed vectors, `data.len() == rows * dim / 8`
    BinaryVector { dim: usize, data: Vec<u8> },
}

impl FieldData {
    /// Number of rows carried
    pub fn len(&self) -> usize {
        match self {
            FieldData::Bool(v) => v.len(),
            FieldData::Int(v) => v.len(),
            FieldData::Long(v) => v.len(),
            FieldData::Float(v) => v.len(),
            FieldData::Double(v) => v.len(),
            FieldData::String(v) => v.len(),
            FieldData::FloatVector { dim, data } => {
                if *dim == 0 { 0 } else { data.len() / dim }
            }
            FieldData::BinaryVector { dim, data } => {
                let row_bytes = dim / 8;
                if row_bytes == 0 { 0 } else { data.len() / row_bytes }
            }
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the wire representation, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            FieldData::Bool(_) => "bool_data",
            FieldData::Int(_) => "int_data",
            FieldData::Long(_) => "long_data",
            FieldData::Float(_) => "float_data",
            FieldData::Double(_) => "double_data",
            FieldData::String(_) => "string_data",
            FieldData::FloatVector { .. } => "float_vector",
            FieldData::BinaryVector { .. } => "binary_vector",
        }
    }

    /// Offset table for string payloads: `[0, l0, l0 + l1, ...]`.
    ///
    /// Materialized strings carry no separators, so readers need this table
    /// to recover element boundaries.
    pub fn string_offsets(&self) -> Option<Vec<usize>> {
        let FieldData::String(values) = self else {
            return None;
        };
        let mut offsets = Vec::with_capacity(values.len() + 1);
        let mut end = 0usize;
        offsets.push(end);
        for v in values {
            end += v.len();
            offsets.push(end);
        }
        Some(offsets)
    }
}

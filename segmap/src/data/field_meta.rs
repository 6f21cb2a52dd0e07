//! Field descriptor

use super::{DataType, FieldId};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};

/// Field definition as seen by the segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    /// Field ID (unique within a collection)
    pub id: FieldId,
    /// Field name
    pub name: String,
    /// Data type
    pub data_type: DataType,
    /// Vector dimension (floats for dense vectors, bits for binary vectors)
    pub dim: Option<usize>,
    /// Declared maximum byte length of a string element
    pub max_length: Option<usize>,
}

impl FieldMeta {
    /// Create a new field definition
    pub fn new(id: FieldId, name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            id,
            name: name.into(),
            data_type,
            dim: None,
            max_length: None,
        }
    }

    /// Set vector dimension
    pub fn with_dim(mut self, dim: usize) -> Self {
        self.dim = Some(dim);
        self
    }

    /// Set maximum string length
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Width of one row of this field in bytes.
    ///
    /// For strings this is the declared `max_length`, an upper bound rather
    /// than the materialized size. Vector fields must declare a dimension.
    pub fn size_of(&self) -> Result<usize> {
        let width = match self.data_type {
            DataType::FloatVector => self.dim()?.checked_mul(std::mem::size_of::<f32>()),
            DataType::BinaryVector => Some(self.dim()? / 8),
            DataType::String | DataType::VarChar => Some(self.max_length.unwrap_or(0)),
            dt => Some(dt.fixed_size()),
        };
        width.ok_or(MapError::SizeOverflow { field: self.id, rows: 1 })
    }

    /// `size_of() * rows`, failing instead of wrapping
    pub fn size_of_rows(&self, rows: usize) -> Result<usize> {
        self.size_of()?
            .checked_mul(rows)
            .ok_or(MapError::SizeOverflow { field: self.id, rows })
    }

    fn dim(&self) -> Result<usize> {
        self.dim.ok_or(MapError::MissingDimension(self.id))
    }

    pub fn is_vector(&self) -> bool {
        self.data_type.is_vector()
    }
}

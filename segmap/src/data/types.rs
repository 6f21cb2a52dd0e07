// Core types: DataType, FieldId, SegmentId

use serde::{Deserialize, Serialize};
use std::fmt;

const TYPE_NONE: u8 = 0;
const TYPE_BOOL: u8 = 1;
const TYPE_INT8: u8 = 2;
const TYPE_INT16: u8 = 3;
const TYPE_INT32: u8 = 4;
const TYPE_INT64: u8 = 5;
const TYPE_FLOAT: u8 = 10;
const TYPE_DOUBLE: u8 = 11;
const TYPE_STRING: u8 = 20;
const TYPE_VARCHAR: u8 = 21;
const TYPE_JSON: u8 = 23;
const TYPE_VECTOR_BINARY: u8 = 100;
const TYPE_VECTOR_FLOAT: u8 = 101;

/// Logical field type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DataType {
    None = TYPE_NONE,
    Bool = TYPE_BOOL,
    Int8 = TYPE_INT8,
    Int16 = TYPE_INT16,
    Int32 = TYPE_INT32,
    Int64 = TYPE_INT64,
    Float = TYPE_FLOAT,
    Double = TYPE_DOUBLE,
    String = TYPE_STRING,
    VarChar = TYPE_VARCHAR,
    /// Known to the wire format but without a mappable binary layout.
    Json = TYPE_JSON,
    /// Bit-packed vector, `dim` counts bits.
    BinaryVector = TYPE_VECTOR_BINARY,
    /// Dense f32 vector, `dim` counts floats.
    FloatVector = TYPE_VECTOR_FLOAT,
}

impl DataType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            TYPE_NONE => Some(DataType::None),
            TYPE_BOOL => Some(DataType::Bool),
            TYPE_INT8 => Some(DataType::Int8),
            TYPE_INT16 => Some(DataType::Int16),
            TYPE_INT32 => Some(DataType::Int32),
            TYPE_INT64 => Some(DataType::Int64),
            TYPE_FLOAT => Some(DataType::Float),
            TYPE_DOUBLE => Some(DataType::Double),
            TYPE_STRING => Some(DataType::String),
            TYPE_VARCHAR => Some(DataType::VarChar),
            TYPE_JSON => Some(DataType::Json),
            TYPE_VECTOR_BINARY => Some(DataType::BinaryVector),
            TYPE_VECTOR_FLOAT => Some(DataType::FloatVector),
            _ => None,
        }
    }

    /// Width of one scalar element in bytes (0 for variable-length and vector types)
    pub fn fixed_size(&self) -> usize {
        match self {
            DataType::Bool | DataType::Int8 => 1,
            DataType::Int16 => 2,
            DataType::Int32 | DataType::Float => 4,
            DataType::Int64 | DataType::Double => 8,
            DataType::None
            | DataType::String
            | DataType::VarChar
            | DataType::Json
            | DataType::BinaryVector
            | DataType::FloatVector => 0,
        }
    }

    pub fn is_variable_length(&self) -> bool {
        matches!(self, DataType::String | DataType::VarChar | DataType::Json)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, DataType::String | DataType::VarChar)
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, DataType::BinaryVector | DataType::FloatVector)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::None => "none",
            DataType::Bool => "bool",
            DataType::Int8 => "int8_t",
            DataType::Int16 => "int16_t",
            DataType::Int32 => "int32_t",
            DataType::Int64 => "int64_t",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::String => "string",
            DataType::VarChar => "varChar",
            DataType::Json => "json",
            DataType::BinaryVector => "vector_binary",
            DataType::FloatVector => "vector_float",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Field identifier, unique within a collection schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldId(pub i64);

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Segment identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentId(pub i64);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

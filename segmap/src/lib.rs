//! Segmap Field Mapping Core
//!
//! Materializes a typed column delivered in a wire container into one
//! contiguous, directly addressable memory region. The region is either
//! anonymous process memory or a private read-only mapping of a transient
//! file that the OS page cache may evict and re-fault.

pub mod config;
pub mod data;
pub mod segment;
pub mod storage;

// Re-export main types
pub use config::{MapConfig, SegmentConfig};
pub use data::{DataType, FieldData, FieldId, FieldMeta, SegmentId};
pub use segment::{LoadedField, SealedSegment};
pub use storage::{
    create_map, create_map_with, fill_field, get_data_size, try_create_map, write_field_data,
    Backing, FieldMap, LoadFieldDataInfo, PopulateStrategy,
};

use std::path::PathBuf;

/// Field mapping error type
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{op} {}, err: {source}", path.display())]
    PathIo {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create anon map, err: {0}")]
    AnonMap(#[source] std::io::Error),

    #[error("not supported data type {0}")]
    UnsupportedType(DataType),

    #[error("vector field {0} has no dimension")]
    MissingDimension(FieldId),

    #[error("materialized size of field {field} overflows for {rows} rows")]
    SizeOverflow { field: FieldId, rows: usize },

    #[error("field of type {expected} cannot be built from {actual} data")]
    TypeMismatch { expected: DataType, actual: &'static str },

    #[error("field data holds {available} bytes but {required} are required")]
    ShortData { available: usize, required: usize },

    #[error("materialized field needs {required} bytes but destination holds {capacity}")]
    DestinationTooSmall { required: usize, capacity: usize },

    #[error("failed to write data file {}, written {written} but total {total}", path.display())]
    ShortWrite { path: PathBuf, written: usize, total: usize },

    #[error("Field not found: {0}")]
    FieldNotFound(FieldId),

    #[error("Field already loaded: {0}")]
    FieldAlreadyLoaded(FieldId),

    #[error("Segment {0} is unloadable")]
    SegmentUnloadable(SegmentId),
}

pub type Result<T> = std::result::Result<T, MapError>;

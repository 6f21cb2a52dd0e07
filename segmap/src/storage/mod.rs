//! Storage module - field materialization and mapping
//!
//! Size calculation, the per-type materializer and the mapping manager that
//! turns a loaded field into one addressable region.

mod fill;
mod load_info;
pub mod mmap;
mod size;

pub use fill::{fill_field, write_field_data};
pub use load_info::LoadFieldDataInfo;
pub use mmap::{create_map, create_map_with, try_create_map, Backing, FieldMap, PopulateStrategy};
pub use size::get_data_size;

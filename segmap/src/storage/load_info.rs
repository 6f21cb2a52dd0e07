//! Load request for one field of a sealed segment

use std::path::{Path, PathBuf};

use crate::data::{FieldData, FieldId};

/// Everything needed to map one field's data
#[derive(Debug, Clone)]
pub struct LoadFieldDataInfo<'a> {
    pub field_id: FieldId,
    pub row_count: usize,
    /// Serve from a file-backed mapping under this directory when set
    pub mmap_dir_path: Option<PathBuf>,
    pub field_data: &'a FieldData,
}

impl<'a> LoadFieldDataInfo<'a> {
    /// Request served from anonymous memory
    pub fn new(field_id: FieldId, row_count: usize, field_data: &'a FieldData) -> Self {
        Self {
            field_id,
            row_count,
            mmap_dir_path: None,
            field_data,
        }
    }

    /// Serve the request from a file-backed mapping rooted at `dir`
    pub fn with_mmap_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.mmap_dir_path = Some(dir.into());
        self
    }

    /// `<dir>/<segment_id>/<field_id>`, when file-backed
    pub fn mmap_file_path(&self, segment_id: impl std::fmt::Display) -> Option<PathBuf> {
        self.mmap_dir_path
            .as_deref()
            .map(|dir: &Path| dir.join(segment_id.to_string()).join(self.field_id.to_string()))
    }
}

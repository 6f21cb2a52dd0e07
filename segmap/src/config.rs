//! Mapping and segment configuration

use std::path::PathBuf;

use crate::storage::PopulateStrategy;

/// Stride used when faulting in a mapping by hand
pub const DEFAULT_TOUCH_PAGE_SIZE: usize = 4 << 10;

/// How mappings are created
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Eager population strategy
    pub populate: PopulateStrategy,
    /// Bytes between touched addresses for `PopulateStrategy::TouchPages`
    pub touch_page_size: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            populate: PopulateStrategy::detect(),
            touch_page_size: DEFAULT_TOUCH_PAGE_SIZE,
        }
    }
}

impl MapConfig {
    pub fn with_populate(mut self, populate: PopulateStrategy) -> Self {
        self.populate = populate;
        self
    }

    pub fn with_touch_page_size(mut self, touch_page_size: usize) -> Self {
        self.touch_page_size = touch_page_size.max(1);
        self
    }
}

/// Segment loader configuration
#[derive(Debug, Clone, Default)]
pub struct SegmentConfig {
    /// Root of file-backed mappings; `None` keeps field data in anonymous memory
    pub mmap_dir_path: Option<PathBuf>,
    /// Mapping options
    pub map: MapConfig,
}

impl SegmentConfig {
    /// Serve loads from file-backed mappings under `dir`
    pub fn with_mmap_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.mmap_dir_path = Some(dir.into());
        self
    }

    pub fn with_map_config(mut self, map: MapConfig) -> Self {
        self.map = map;
        self
    }
}

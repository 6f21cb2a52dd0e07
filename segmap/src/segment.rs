//! Sealed segment field loading
//!
//! Owns the mapped regions of a sealed segment's fields. Each field is loaded
//! at most once until dropped; loads of different fields may proceed in
//! parallel. A mapping failure marks the whole segment unloadable instead of
//! taking the process down.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error};

use crate::config::SegmentConfig;
use crate::data::{FieldData, FieldId, FieldMeta, SegmentId};
use crate::storage::{try_create_map, FieldMap, LoadFieldDataInfo};
use crate::{MapError, Result};

/// One loaded field and the metadata needed to read it back
#[derive(Debug)]
pub struct LoadedField {
    meta: FieldMeta,
    row_count: usize,
    /// `None` for an empty field
    map: Option<FieldMap>,
    /// Element boundaries for string fields, `row_count + 1` entries
    offsets: Option<Vec<usize>>,
}

impl LoadedField {
    pub fn meta(&self) -> &FieldMeta {
        &self.meta
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn map(&self) -> Option<&FieldMap> {
        self.map.as_ref()
    }

    /// Materialized bytes (empty for an empty field)
    pub fn bytes(&self) -> &[u8] {
        self.map.as_ref().map(|m| m.as_slice()).unwrap_or(&[])
    }

    pub fn offsets(&self) -> Option<&[usize]> {
        self.offsets.as_deref()
    }

    /// Raw bytes of one row
    pub fn value_bytes(&self, row: usize) -> Option<&[u8]> {
        if row >= self.row_count {
            return None;
        }
        let (start, end) = match &self.offsets {
            Some(offsets) => (*offsets.get(row)?, *offsets.get(row + 1)?),
            None => {
                let width = self.meta.size_of().ok()?;
                (row.checked_mul(width)?, (row + 1).checked_mul(width)?)
            }
        };
        self.bytes().get(start..end)
    }

    /// One row of a string field
    pub fn str_value(&self, row: usize) -> Option<&str> {
        if !self.meta.data_type.is_string() {
            return None;
        }
        std::str::from_utf8(self.value_bytes(row)?).ok()
    }
}

/// Removes a field from the in-flight set when its load ends
struct LoadingGuard<'a> {
    loading: &'a Mutex<HashSet<FieldId>>,
    field_id: FieldId,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.loading.lock().remove(&self.field_id);
    }
}

/// A sealed segment whose field data is mapped on demand
pub struct SealedSegment {
    id: SegmentId,
    schema: HashMap<FieldId, FieldMeta>,
    config: SegmentConfig,
    fields: RwLock<HashMap<FieldId, Arc<LoadedField>>>,
    loading: Mutex<HashSet<FieldId>>,
    unloadable: AtomicBool,
}

impl SealedSegment {
    pub fn new(id: SegmentId, schema: Vec<FieldMeta>, config: SegmentConfig) -> Self {
        Self {
            id,
            schema: schema.into_iter().map(|f| (f.id, f)).collect(),
            config,
            fields: RwLock::new(HashMap::new()),
            loading: Mutex::new(HashSet::new()),
            unloadable: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn field_meta(&self, field_id: FieldId) -> Option<&FieldMeta> {
        self.schema.get(&field_id)
    }

    /// Whether a previous load failed and left the segment unusable
    pub fn is_unloadable(&self) -> bool {
        self.unloadable.load(Ordering::Acquire)
    }

    /// Map `row_count` rows of `data` for `field_id`.
    ///
    /// A field loads at most once until dropped. A second load of the same
    /// field fails with `FieldAlreadyLoaded`, whether the first one has
    /// finished or is still in flight.
    pub fn load_field_data(&self, field_id: FieldId, row_count: usize, data: &FieldData) -> Result<()> {
        if self.is_unloadable() {
            return Err(MapError::SegmentUnloadable(self.id));
        }
        let meta = self.schema.get(&field_id).ok_or(MapError::FieldNotFound(field_id))?;

        if !self.loading.lock().insert(field_id) {
            return Err(MapError::FieldAlreadyLoaded(field_id));
        }
        let _guard = LoadingGuard { loading: &self.loading, field_id };
        // a finished load publishes to `fields` before leaving `loading`
        if self.fields.read().contains_key(&field_id) {
            return Err(MapError::FieldAlreadyLoaded(field_id));
        }

        let mut info = LoadFieldDataInfo::new(field_id, row_count, data);
        if let Some(dir) = &self.config.mmap_dir_path {
            info = info.with_mmap_dir(dir);
        }

        let map = match try_create_map(self.id, meta, &info, &self.config.map) {
            Ok(map) => map,
            Err(err) => {
                self.unloadable.store(true, Ordering::Release);
                error!(segment_id = %self.id, %field_id, %err, "marking segment unloadable");
                return Err(err);
            }
        };

        let offsets = if meta.data_type.is_string() { data.string_offsets() } else { None };
        let loaded = LoadedField {
            meta: meta.clone(),
            row_count,
            map,
            offsets,
        };
        self.fields.write().insert(field_id, Arc::new(loaded));
        Ok(())
    }

    pub fn field(&self, field_id: FieldId) -> Option<Arc<LoadedField>> {
        self.fields.read().get(&field_id).cloned()
    }

    /// Release a field's region. Readers holding the field keep it mapped
    /// until they let go.
    pub fn drop_field_data(&self, field_id: FieldId) -> bool {
        let removed = self.fields.write().remove(&field_id);
        if removed.is_some() {
            debug!(segment_id = %self.id, %field_id, "field data dropped");
        }
        removed.is_some()
    }

    pub fn loaded_fields(&self) -> Vec<FieldId> {
        let mut ids: Vec<FieldId> = self.fields.read().keys().copied().collect();
        ids.sort();
        ids
    }
}

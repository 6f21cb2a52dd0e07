//! Mapping manager
//!
//! Produces one contiguous region per loaded field. Without a mmap directory
//! the field is materialized straight into an anonymous private mapping.
//! With one, the field is written to `<dir>/<segment_id>/<field_id>`, synced,
//! mapped private read-only, and the file is unlinked before returning, so the
//! mapping stays alive through the open inode while no path refers to it.
//!
//! ```text
//! LoadFieldDataInfo ──┬─ mmap_dir_path = None ──> map_anon ── fill_field ─────────┐
//!                     └─ mmap_dir_path = dir ───> create ─ write ─ fsync ─ mmap ──┤
//!                                                 ─ touch? ─ unlink ─ close       │
//!                                                                                 v
//!                                                          FieldMap (released by unmap)
//! ```
//!
//! Both backings release through the same primitive: dropping the `FieldMap`
//! unmaps exactly its length.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapMut, MmapOptions};
use once_cell::sync::Lazy;
use tracing::{debug, error};

use super::{fill_field, get_data_size, write_field_data, LoadFieldDataInfo};
use crate::config::MapConfig;
use crate::data::{FieldId, FieldMeta, SegmentId};
use crate::{MapError, Result};

// ============================================================================
// Eager population capability
// ============================================================================

/// How pages of a new mapping are made resident
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulateStrategy {
    /// Ask the kernel to pre-fault the mapping (MAP_POPULATE)
    Kernel,
    /// Read one byte per page after mapping a file
    TouchPages,
    /// Leave pages to fault in on first access
    Lazy,
}

static DETECTED_POPULATE: Lazy<PopulateStrategy> = Lazy::new(|| {
    if cfg!(any(target_os = "linux", target_os = "android")) {
        PopulateStrategy::Kernel
    } else {
        // macOS and Windows have no MAP_POPULATE equivalent
        PopulateStrategy::TouchPages
    }
});

impl PopulateStrategy {
    /// Best strategy for this platform, decided once per process
    pub fn detect() -> Self {
        *DETECTED_POPULATE
    }

    fn options(self) -> MmapOptions {
        let mut options = MmapOptions::new();
        if self == PopulateStrategy::Kernel {
            options.populate();
        }
        options
    }
}

/// Fault in every page of `bytes` by reading one byte per `stride`.
/// A zero stride is treated as one.
fn touch_pages(bytes: &[u8], stride: usize) {
    let stride = stride.max(1);
    let ptr = bytes.as_ptr();
    let mut i = 0usize;
    while i < bytes.len() {
        // SAFETY: i < bytes.len()
        unsafe {
            let _ = ptr.add(i).read_volatile();
        }
        i += stride;
    }
}

// ============================================================================
// Mapped region
// ============================================================================

/// Kind of storage behind a `FieldMap`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backing {
    /// Private anonymous memory, resident until released
    Anonymous,
    /// Private read-only mapping of an unlinked file, evictable by the OS
    FileBacked,
}

enum Region {
    Anonymous(MmapMut),
    FileBacked { map: Mmap, origin: PathBuf },
}

/// Materialized field data.
///
/// Anonymous regions are mapped read-write for the fill and only handed out
/// read-only afterwards. Dropping the map unmaps it.
pub struct FieldMap {
    segment_id: SegmentId,
    field_id: FieldId,
    region: Region,
}

impl FieldMap {
    pub fn as_ptr(&self) -> *const u8 {
        self.as_slice().as_ptr()
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        match &self.region {
            Region::Anonymous(map) => &map[..],
            Region::FileBacked { map, .. } => &map[..],
        }
    }

    pub fn backing(&self) -> Backing {
        match self.region {
            Region::Anonymous(_) => Backing::Anonymous,
            Region::FileBacked { .. } => Backing::FileBacked,
        }
    }

    /// Path the file-backed data was written to. It no longer exists.
    pub fn origin(&self) -> Option<&Path> {
        match &self.region {
            Region::Anonymous(_) => None,
            Region::FileBacked { origin, .. } => Some(origin),
        }
    }

    pub fn segment_id(&self) -> SegmentId {
        self.segment_id
    }

    pub fn field_id(&self) -> FieldId {
        self.field_id
    }

    /// Unmap the region
    pub fn release(self) {
        drop(self);
    }
}

impl AsRef<[u8]> for FieldMap {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl std::fmt::Debug for FieldMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldMap")
            .field("segment_id", &self.segment_id)
            .field("field_id", &self.field_id)
            .field("backing", &self.backing())
            .field("len", &self.len())
            .finish()
    }
}

impl Drop for FieldMap {
    fn drop(&mut self) {
        debug!(
            segment_id = %self.segment_id,
            field_id = %self.field_id,
            bytes = self.len(),
            backing = ?self.backing(),
            "releasing field map"
        );
    }
}

// ============================================================================
// Mapping manager
// ============================================================================

/// Map field data, terminating on any failure.
///
/// Returns `None` for an empty field. Uses the platform's detected populate
/// strategy.
pub fn create_map(segment_id: SegmentId, field: &FieldMeta, info: &LoadFieldDataInfo<'_>) -> Option<FieldMap> {
    create_map_with(segment_id, field, info, &MapConfig::default())
}

/// `create_map` with explicit mapping options.
pub fn create_map_with(
    segment_id: SegmentId,
    field: &FieldMeta,
    info: &LoadFieldDataInfo<'_>,
    config: &MapConfig,
) -> Option<FieldMap> {
    match try_create_map(segment_id, field, info, config) {
        Ok(map) => map,
        Err(err) => {
            error!(%segment_id, field_id = %info.field_id, %err, "field mapping failed");
            panic!("{err}");
        }
    }
}

/// Map field data, reporting failures to the caller.
///
/// A partially built mapping is never returned; any transient file is
/// removed on failure.
pub fn try_create_map(
    segment_id: SegmentId,
    field: &FieldMeta,
    info: &LoadFieldDataInfo<'_>,
    config: &MapConfig,
) -> Result<Option<FieldMap>> {
    let map = match info.mmap_file_path(segment_id) {
        None => map_anonymous(segment_id, field, info, config)?,
        Some(path) => map_file_backed(segment_id, field, info, path, config)?,
    };
    if let Some(map) = &map {
        debug!(
            %segment_id,
            field_id = %info.field_id,
            data_type = %field.data_type,
            bytes = map.len(),
            backing = ?map.backing(),
            "field map created"
        );
    }
    Ok(map)
}

fn map_anonymous(
    segment_id: SegmentId,
    field: &FieldMeta,
    info: &LoadFieldDataInfo<'_>,
    config: &MapConfig,
) -> Result<Option<FieldMap>> {
    let size = get_data_size(field, info.row_count, info.field_data)?;
    if size == 0 {
        return Ok(None);
    }

    let mut map = config.populate.options().len(size).map_anon().map_err(MapError::AnonMap)?;
    fill_field(field.data_type, size, info.field_data, &mut map[..])?;

    Ok(Some(FieldMap {
        segment_id,
        field_id: info.field_id,
        region: Region::Anonymous(map),
    }))
}

fn map_file_backed(
    segment_id: SegmentId,
    field: &FieldMeta,
    info: &LoadFieldDataInfo<'_>,
    path: PathBuf,
    config: &MapConfig,
) -> Result<Option<FieldMap>> {
    // Estimated from the declared width; strings may write a different total.
    let size = field.size_of_rows(info.row_count)?;

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(path_err("failed to create mmap dir", dir))?;
    }

    let file = open_rw(&path).map_err(path_err("failed to create mmap file", &path))?;
    let mut transient = TransientFile::new(&path);
    let written = {
        let mut writer = BufWriter::new(&file);
        write_field_data(&mut writer, field.data_type, info.field_data, size)
            .and_then(|n| writer.flush().map(|_| n).map_err(MapError::Io))
            .map_err(|err| match err {
                MapError::Io(source) => MapError::PathIo { op: "failed to write data file", path: path.clone(), source },
                other => other,
            })?
    };
    if written != size && !field.data_type.is_variable_length() {
        return Err(MapError::ShortWrite { path: path.clone(), written, total: size });
    }

    file.sync_all().map_err(path_err("failed to fsync mmap data file", &path))?;

    // Empty field
    if written == 0 {
        transient.unlink()?;
        close_file(file).map_err(path_err("failed to close data file", &path))?;
        return Ok(None);
    }

    let mut options = config.populate.options();
    options.len(written);
    // SAFETY: the mapping is private and read-only, and the file is unlinked
    // below, so nothing else can modify the bytes behind it.
    let map = unsafe { options.map_copy_read_only(&file) }
        .map_err(path_err("failed to create map for data file", &path))?;

    if config.populate == PopulateStrategy::TouchPages {
        touch_pages(&map, config.touch_page_size);
    }

    transient.unlink()?;
    drop(transient);
    close_file(file).map_err(path_err("failed to close data file", &path))?;

    Ok(Some(FieldMap {
        segment_id,
        field_id: info.field_id,
        region: Region::FileBacked { map, origin: path },
    }))
}

// ============================================================================
// File helpers
// ============================================================================

fn path_err<'a>(op: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> MapError + 'a {
    move |source| MapError::PathIo { op, path: path.to_path_buf(), source }
}

fn open_rw(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

/// Close `file`, surfacing errors that `Drop` would swallow.
#[cfg(unix)]
fn close_file(file: File) -> io::Result<()> {
    use std::os::unix::io::IntoRawFd;

    let fd = file.into_raw_fd();
    // SAFETY: fd was released by `file` and is closed exactly once here.
    if unsafe { libc::close(fd) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn close_file(file: File) -> io::Result<()> {
    drop(file);
    Ok(())
}

/// Removes the transient data file on early return.
struct TransientFile<'a> {
    path: &'a Path,
    linked: bool,
}

impl<'a> TransientFile<'a> {
    fn new(path: &'a Path) -> Self {
        Self { path, linked: true }
    }

    fn unlink(&mut self) -> Result<()> {
        fs::remove_file(self.path).map_err(path_err("failed to unlink mmap data file", self.path))?;
        self.linked = false;
        Ok(())
    }
}

impl Drop for TransientFile<'_> {
    fn drop(&mut self) {
        if self.linked {
            let _ = fs::remove_file(self.path);
        }
    }
}

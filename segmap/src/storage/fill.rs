//! Column materializer
//!
//! One per-type dispatch feeds two sinks: a memory region sized up front, and
//! a sequential writer (the transient mmap file). The byte layout per type:
//!
//! ```text
//! bool                 1 byte per row, as stored
//! int8 / int16         narrowed from the widened int_data payload
//! int32/int64/f32/f64  raw native-endian copy
//! string / varchar     elements end to end, no separators or prefixes
//! float vector         raw f32 copy, rows * dim
//! binary vector        raw byte copy, rows * dim / 8
//! ```

use std::io::Write;

use crate::data::{DataType, FieldData};
use crate::{MapError, Result};

// ============================================================================
// Raw byte views
// ============================================================================

/// Element types whose in-memory bytes are exactly their native encoding.
trait Plain: Copy {}

impl Plain for bool {}
impl Plain for i8 {}
impl Plain for i16 {}
impl Plain for i32 {}
impl Plain for i64 {}
impl Plain for f32 {}
impl Plain for f64 {}

#[inline]
fn as_bytes<T: Plain>(values: &[T]) -> &[u8] {
    // SAFETY: Plain types have no padding, every byte is initialized, and u8
    // has alignment 1.
    unsafe { std::slice::from_raw_parts(values.as_ptr() as *const u8, std::mem::size_of_val(values)) }
}

// ============================================================================
// Sinks
// ============================================================================

/// Destination for materialized bytes
trait FieldSink {
    /// Copy the leading `size` bytes of a fixed-width payload
    fn put_fixed(&mut self, bytes: &[u8], size: usize) -> Result<usize>;

    /// Append one variable-length element
    fn put(&mut self, bytes: &[u8]) -> Result<usize>;
}

struct MemorySink<'a> {
    dst: &'a mut [u8],
    pos: usize,
}

impl FieldSink for MemorySink<'_> {
    fn put_fixed(&mut self, bytes: &[u8], size: usize) -> Result<usize> {
        if bytes.len() < size {
            return Err(MapError::ShortData { available: bytes.len(), required: size });
        }
        self.put(&bytes[..size])
    }

    fn put(&mut self, bytes: &[u8]) -> Result<usize> {
        let end = self.pos + bytes.len();
        if end > self.dst.len() {
            return Err(MapError::DestinationTooSmall { required: end, capacity: self.dst.len() });
        }
        self.dst[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(bytes.len())
    }
}

struct WriteSink<'a, W: Write> {
    writer: &'a mut W,
}

impl<W: Write> FieldSink for WriteSink<'_, W> {
    /// Writes at most `size` bytes; a shorter payload produces a short count
    /// for the caller to detect.
    fn put_fixed(&mut self, bytes: &[u8], size: usize) -> Result<usize> {
        let n = size.min(bytes.len());
        self.put(&bytes[..n])
    }

    fn put(&mut self, bytes: &[u8]) -> Result<usize> {
        self.writer.write_all(bytes)?;
        Ok(bytes.len())
    }
}

// ============================================================================
// Dispatch
// ============================================================================

fn materialize<S: FieldSink>(sink: &mut S, data_type: DataType, data: &FieldData, size: usize) -> Result<usize> {
    let mismatch = || MapError::TypeMismatch { expected: data_type, actual: data.kind() };

    match (data_type, data) {
        (DataType::Bool, FieldData::Bool(v)) => sink.put_fixed(as_bytes(v), size),
        (DataType::Int8, FieldData::Int(v)) => {
            let narrowed: Vec<i8> = v.iter().map(|&x| x as i8).collect();
            sink.put_fixed(as_bytes(&narrowed), size)
        }
        (DataType::Int16, FieldData::Int(v)) => {
            let narrowed: Vec<i16> = v.iter().map(|&x| x as i16).collect();
            sink.put_fixed(as_bytes(&narrowed), size)
        }
        (DataType::Int32, FieldData::Int(v)) => sink.put_fixed(as_bytes(v), size),
        (DataType::Int64, FieldData::Long(v)) => sink.put_fixed(as_bytes(v), size),
        (DataType::Float, FieldData::Float(v)) => sink.put_fixed(as_bytes(v), size),
        (DataType::Double, FieldData::Double(v)) => sink.put_fixed(as_bytes(v), size),
        (DataType::String | DataType::VarChar, FieldData::String(values)) => {
            let mut total = 0usize;
            for v in values {
                total += sink.put(v.as_bytes())?;
            }
            Ok(total)
        }
        (DataType::FloatVector, FieldData::FloatVector { data, .. }) => sink.put_fixed(as_bytes(data), size),
        (DataType::BinaryVector, FieldData::BinaryVector { data, .. }) => sink.put_fixed(data, size),
        (DataType::None | DataType::Json, _) => Err(MapError::UnsupportedType(data_type)),
        _ => Err(mismatch()),
    }
}

/// Materialize `data` into the first `size` bytes of `dst`.
pub fn fill_field<'a>(data_type: DataType, size: usize, data: &FieldData, dst: &'a mut [u8]) -> Result<&'a mut [u8]> {
    if dst.len() < size {
        return Err(MapError::DestinationTooSmall { required: size, capacity: dst.len() });
    }
    let mut sink = MemorySink { dst: &mut dst[..size], pos: 0 };
    materialize(&mut sink, data_type, data, size)?;
    Ok(dst)
}

/// Write `data` sequentially to `writer`, returning the number of bytes written.
///
/// Fixed-width payloads write at most `size` bytes. String payloads write
/// every element; `size` is only an estimate for them.
pub fn write_field_data<W: Write>(writer: &mut W, data_type: DataType, data: &FieldData, size: usize) -> Result<usize> {
    let mut sink = WriteSink { writer };
    materialize(&mut sink, data_type, data, size)
}

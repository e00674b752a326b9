//! Encoding.
//!
//! Encoding runs in two phases. First the size resolver sizes the whole tree, which lets the
//! output buffer be allocated once at its final length. Then a single pass writes the tree. Each
//! container reserves its 4-byte content-length field, writes its type table and payloads, and
//! patches the field with the number of bytes it actually wrote.

use std::io::Write;

use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, trace, warn};

use crate::depth_tracking::DepthTracker;
use crate::error::{Error, Result};
use crate::size::resolve;
use crate::value::{Array, Object, Value};
use crate::{MAX_DEPTH, MAX_LEN};

/// Encode a value into a freshly allocated, exactly sized buffer.
pub fn to_vec(value: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_into(&mut buf, value)?;
    Ok(buf)
}

/// Encode a value and hand the whole buffer to a writer in one go.
pub fn to_writer<W: Write>(mut writer: W, value: &Value) -> Result<()> {
    let buf = to_vec(value)?;
    writer.write_all(&buf).map_err(|e| {
        warn!(len = buf.len(), "failed writing encoded document: {}", e);
        Error::Io(e)
    })?;
    Ok(())
}

/// Encode a value onto the end of `buf`, reserving exactly the space it needs first.
///
/// Containers may nest at most [`MAX_DEPTH`] deep, the same limit the default decoder enforces.
/// On failure, `buf` is truncated back to its original length.
pub fn encode_into(buf: &mut Vec<u8>, value: &Value) -> Result<()> {
    let start = buf.len();
    let size = 1 + resolve(value);
    buf.try_reserve_exact(size).map_err(Error::alloc(size))?;
    trace!(size, marker = value.marker().name(), "encoding value");

    let mut enc = Encoder {
        buf,
        depth: DepthTracker::new(MAX_DEPTH),
    };
    enc.buf.push(value.marker().into());
    if let Err(e) = enc.write_payload(value) {
        enc.buf.truncate(start);
        return Err(e);
    }

    let written = enc.buf.len() - start;
    if written != size {
        // Only possible when a container was mutated after its size was resolved, or when a
        // decoded container carried a wrong content-length.
        debug!(written, resolved = size, "encoded length differs from resolved size");
    }
    Ok(())
}

struct Encoder<'b> {
    buf: &'b mut Vec<u8>,
    depth: DepthTracker,
}

impl<'b> Encoder<'b> {
    /// Write a value without its tag byte.
    fn write_payload(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::I8(v) => self.buf.push(*v as u8),
            Value::U8(v) => self.buf.push(*v),
            Value::I16(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            Value::U16(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            Value::I32(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            Value::U32(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            Value::I64(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            Value::U64(v) | Value::Date(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            Value::F32(v) => self.buf.extend_from_slice(&v.to_bits().to_le_bytes()),
            Value::F64(v) => self.buf.extend_from_slice(&v.to_bits().to_le_bytes()),
            Value::Bool(_) | Value::Null => (),
            Value::Str(v) => self.write_sized(v, "string length")?,
            Value::Bytes(v) => self.write_sized(v, "bytes length")?,
            Value::Array(v) => self.write_array(v)?,
            Value::Object(v) => self.write_object(v)?,
        }
        Ok(())
    }

    fn write_len(&mut self, len: usize, field: &'static str) -> Result<()> {
        let len = checked_len(len, field)?;
        self.buf.extend_from_slice(&len.to_le_bytes());
        Ok(())
    }

    fn write_sized(&mut self, data: &[u8], field: &'static str) -> Result<()> {
        self.write_len(data.len(), field)?;
        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// Write a container header with a placeholder content-length. Returns the offset of the
    /// placeholder.
    fn begin_container(&mut self, count: usize, field: &'static str) -> Result<usize> {
        self.write_len(count, field)?;
        let patch_at = self.buf.len();
        self.buf.extend_from_slice(&[0u8; 4]);
        Ok(patch_at)
    }

    /// Back-patch the content-length reserved at `patch_at` with everything written since.
    fn end_container(&mut self, patch_at: usize, field: &'static str) -> Result<()> {
        let content_start = patch_at + 4;
        let content_len = checked_len(self.buf.len() - content_start, field)?;
        LittleEndian::write_u32(&mut self.buf[patch_at..content_start], content_len);
        Ok(())
    }

    fn write_array(&mut self, array: &Array) -> Result<()> {
        self.depth.enter()?;
        let patch_at = self.begin_container(array.len(), "array count")?;
        self.buf.extend(array.iter().map(|elem| u8::from(elem.marker())));
        for elem in array.iter() {
            self.write_payload(elem)?;
        }
        self.depth.leave();
        self.end_container(patch_at, "array content-length")
    }

    fn write_object(&mut self, object: &Object) -> Result<()> {
        self.depth.enter()?;
        let patch_at = self.begin_container(object.len(), "object count")?;
        self.buf
            .extend(object.iter().map(|pair| u8::from(pair.value.marker())));
        for pair in object.iter() {
            self.write_sized(&pair.key, "object key length")?;
            self.write_payload(&pair.value)?;
        }
        self.depth.leave();
        self.end_container(patch_at, "object content-length")
    }
}

fn checked_len(len: usize, field: &'static str) -> Result<u32> {
    if len >= MAX_LEN {
        return Err(Error::Overflow { field, len });
    }
    // MAX_LEN is well under u32::MAX
    Ok(len as u32)
}

//! Decoding.
//!
//! Values can be decoded from an in-memory buffer through an explicit cursor, or from any
//! [`Read`] implementation. Both paths run the same decoder over the [`ByteSource`] trait, so they
//! accept and reject exactly the same inputs; the only difference is how running out of bytes is
//! reported (`LengthTooShort` for buffers, `Io` for readers).
//!
//! Every length and count field is checked against [`MAX_LEN`] before anything is allocated for
//! it. Decoded trees own all of their buffers. When a container fails partway through, the
//! children it already decoded are released before the error is returned.

use std::convert::TryFrom;
use std::io::Read;

use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, trace, warn};

use crate::depth_tracking::DepthTracker;
use crate::error::{Error, Result};
use crate::marker::Marker;
use crate::ownership::{alloc_bytes, alloc_storage, release_all, release_pairs, Buf};
use crate::size::HEADER_LEN;
use crate::value::{Array, Object, Pair, Value};
use crate::{MAX_DEPTH, MAX_LEN};

/// A source of bytes that either yields exactly what was asked for, or fails.
pub trait ByteSource {
    /// Fill `buf` completely. `step` names what is being read, for error reporting.
    fn read_into(&mut self, buf: &mut [u8], step: &'static str) -> Result<()>;

    /// Number of bytes consumed so far.
    fn position(&self) -> usize;

    /// Read exactly `len` bytes into a new owned buffer.
    fn read_vec(&mut self, len: usize, step: &'static str) -> Result<Vec<u8>> {
        let mut buf = alloc_bytes(len)?;
        self.read_into(&mut buf, step)?;
        Ok(buf)
    }

    fn read_u8(&mut self, step: &'static str) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_into(&mut buf, step)?;
        Ok(buf[0])
    }

    fn read_u16(&mut self, step: &'static str) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_into(&mut buf, step)?;
        Ok(LittleEndian::read_u16(&buf))
    }

    fn read_u32(&mut self, step: &'static str) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_into(&mut buf, step)?;
        Ok(LittleEndian::read_u32(&buf))
    }

    fn read_u64(&mut self, step: &'static str) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_into(&mut buf, step)?;
        Ok(LittleEndian::read_u64(&buf))
    }

    fn read_f32(&mut self, step: &'static str) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.read_into(&mut buf, step)?;
        Ok(LittleEndian::read_f32(&buf))
    }

    fn read_f64(&mut self, step: &'static str) -> Result<f64> {
        let mut buf = [0u8; 8];
        self.read_into(&mut buf, step)?;
        Ok(LittleEndian::read_f64(&buf))
    }
}

/// Bounds-checked reads out of an in-memory buffer.
#[derive(Clone, Debug)]
pub struct SliceSource<'b> {
    data: &'b [u8],
    pos: usize,
}

impl<'b> SliceSource<'b> {
    /// Start reading `data` at offset `pos`.
    pub fn new(data: &'b [u8], pos: usize) -> Self {
        Self {
            data,
            pos: pos.min(data.len()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize, step: &'static str) -> Result<&'b [u8]> {
        if len > self.remaining() {
            return Err(Error::LengthTooShort {
                step,
                actual: self.remaining(),
                expected: len,
            });
        }
        let data = self.data;
        let (bytes, _) = data[self.pos..].split_at(len);
        self.pos += len;
        Ok(bytes)
    }
}

impl<'b> ByteSource for SliceSource<'b> {
    fn read_into(&mut self, buf: &mut [u8], step: &'static str) -> Result<()> {
        buf.copy_from_slice(self.take(buf.len(), step)?);
        Ok(())
    }

    fn position(&self) -> usize {
        self.pos
    }

    // Check the length against what's left before allocating anything for it.
    fn read_vec(&mut self, len: usize, step: &'static str) -> Result<Vec<u8>> {
        let bytes = self.take(len, step)?;
        let mut buf = alloc_storage(len)?;
        buf.extend_from_slice(bytes);
        Ok(buf)
    }
}

/// Reads from a blocking reader. Short reads fail with [`Error::Io`].
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    pos: usize,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, pos: 0 }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn read_into(&mut self, buf: &mut [u8], step: &'static str) -> Result<()> {
        self.reader.read_exact(buf).map_err(|e| {
            debug!(step, len = buf.len(), pos = self.pos, "read failed: {}", e);
            Error::Io(e)
        })?;
        self.pos += buf.len();
        Ok(())
    }

    fn position(&self) -> usize {
        self.pos
    }
}

/// Decoder settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Most containers that may be nested inside each other. Defaults to [`MAX_DEPTH`].
    pub max_depth: usize,
    /// Check each container's declared content-length against the bytes it actually held.
    /// Off by default, in which case the declared length is trusted.
    pub verify_content_length: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            verify_content_length: false,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn verify_content_length(mut self, verify: bool) -> Self {
        self.verify_content_length = verify;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct Decoder {
    options: DecodeOptions,
}

impl Decoder {
    pub fn new(options: DecodeOptions) -> Self {
        Self { options }
    }

    /// Decode one value from `data`, starting at `*cursor`. On success the cursor is moved past
    /// the value; on failure it is left where it was.
    pub fn decode_slice(&self, data: &[u8], cursor: &mut usize) -> Result<Value<'static>> {
        let mut src = SliceSource::new(data, *cursor);
        let value = self.decode(&mut src)?;
        *cursor = src.position();
        Ok(value)
    }

    /// Decode one value from a reader, consuming exactly its bytes.
    pub fn decode_reader<R: Read>(&self, reader: R) -> Result<Value<'static>> {
        self.decode(&mut ReaderSource::new(reader))
    }

    /// Decode one value, tag byte first, from any byte source.
    pub fn decode<S: ByteSource>(&self, src: &mut S) -> Result<Value<'static>> {
        let mut depth = DepthTracker::new(self.options.max_depth);
        let tag = src.read_u8("decode tag")?;
        let marker = Marker::try_from(tag).map_err(|e| {
            debug!(tag, pos = src.position(), "invalid root tag");
            e
        })?;
        trace!(marker = marker.name(), "decoding value");
        self.decode_typed(src, marker, &mut depth)
    }

    /// Decode a value whose tag has already been read.
    fn decode_typed<S: ByteSource>(
        &self,
        src: &mut S,
        marker: Marker,
        depth: &mut DepthTracker,
    ) -> Result<Value<'static>> {
        Ok(match marker {
            Marker::I8 => Value::I8(src.read_u8("decode I8")? as i8),
            Marker::I16 => Value::I16(src.read_u16("decode I16")? as i16),
            Marker::I32 => Value::I32(src.read_u32("decode I32")? as i32),
            Marker::I64 => Value::I64(src.read_u64("decode I64")? as i64),
            Marker::U8 => Value::U8(src.read_u8("decode U8")?),
            Marker::U16 => Value::U16(src.read_u16("decode U16")?),
            Marker::U32 => Value::U32(src.read_u32("decode U32")?),
            Marker::U64 => Value::U64(src.read_u64("decode U64")?),
            Marker::F32 => Value::F32(src.read_f32("decode F32")?),
            Marker::F64 => Value::F64(src.read_f64("decode F64")?),
            Marker::True => Value::Bool(true),
            Marker::False => Value::Bool(false),
            Marker::Null => Value::Null,
            Marker::Date => Value::Date(src.read_u64("decode Date")?),
            Marker::String => {
                let len = read_len(src, "string length")?;
                Value::Str(Buf::Owned(src.read_vec(len, "get string content")?))
            }
            Marker::Bytes => {
                let len = read_len(src, "bytes length")?;
                Value::Bytes(Buf::Owned(src.read_vec(len, "get bytes content")?))
            }
            Marker::Array => self.decode_array(src, depth)?,
            Marker::Object => self.decode_object(src, depth)?,
        })
    }

    fn decode_array<S: ByteSource>(
        &self,
        src: &mut S,
        depth: &mut DepthTracker,
    ) -> Result<Value<'static>> {
        depth.enter()?;
        let count = read_len(src, "array count")?;
        let declared = read_len(src, "array content-length")?;
        let content_start = src.position();
        let table = src.read_vec(count, "array type table")?;
        trace!(count, declared, depth = depth.depth(), "decoding array");

        let mut elements = alloc_storage(count)?;
        for (index, &tag) in table.iter().enumerate() {
            let elem = Marker::try_from(tag).and_then(|marker| self.decode_typed(src, marker, depth));
            match elem {
                Ok(elem) => elements.push(elem),
                Err(e) => {
                    let released = release_all(elements);
                    debug!(index, count, released, "array element failed to decode: {}", e);
                    return Err(e);
                }
            }
        }
        depth.leave();

        if let Err(e) = self.check_content_length(declared, src.position() - content_start) {
            release_all(elements);
            return Err(e);
        }
        Ok(Value::Array(Array::with_size(
            Buf::Owned(elements),
            HEADER_LEN + declared,
        )))
    }

    fn decode_object<S: ByteSource>(
        &self,
        src: &mut S,
        depth: &mut DepthTracker,
    ) -> Result<Value<'static>> {
        depth.enter()?;
        let count = read_len(src, "object count")?;
        let declared = read_len(src, "object content-length")?;
        let content_start = src.position();
        let table = src.read_vec(count, "object type table")?;
        trace!(count, declared, depth = depth.depth(), "decoding object");

        let mut pairs = alloc_storage(count)?;
        for (index, &tag) in table.iter().enumerate() {
            match self.decode_pair(src, tag, depth) {
                Ok(pair) => pairs.push(pair),
                Err(e) => {
                    let released = release_pairs(pairs);
                    debug!(index, count, released, "object pair failed to decode: {}", e);
                    return Err(e);
                }
            }
        }
        depth.leave();

        if let Err(e) = self.check_content_length(declared, src.position() - content_start) {
            release_pairs(pairs);
            return Err(e);
        }
        Ok(Value::Object(Object::with_size(
            Buf::Owned(pairs),
            HEADER_LEN + declared,
        )))
    }

    fn decode_pair<S: ByteSource>(
        &self,
        src: &mut S,
        tag: u8,
        depth: &mut DepthTracker,
    ) -> Result<Pair<'static>> {
        let key_len = read_len(src, "object key length")?;
        let key = src.read_vec(key_len, "get object key")?;
        // A failed value drops the key along with it
        let value = Marker::try_from(tag).and_then(|marker| self.decode_typed(src, marker, depth))?;
        Ok(Pair {
            key: Buf::Owned(key),
            value,
        })
    }

    fn check_content_length(&self, declared: usize, actual: usize) -> Result<()> {
        if declared == actual {
            return Ok(());
        }
        if self.options.verify_content_length {
            warn!(declared, actual, "container content-length mismatch");
            return Err(Error::ContentLength {
                declared: declared as u32,
                actual,
            });
        }
        debug!(declared, actual, "trusting declared container content-length");
        Ok(())
    }
}

/// Read a 4-byte length or count field and hold it to the `MAX_LEN` ceiling.
fn read_len<S: ByteSource>(src: &mut S, field: &'static str) -> Result<usize> {
    let len = src.read_u32(field)? as usize;
    if len >= MAX_LEN {
        debug!(field, len, pos = src.position(), "length field over the limit");
        return Err(Error::Overflow { field, len });
    }
    Ok(len)
}

/// Decode one value from `data` at `*cursor` with the default options, advancing the cursor past
/// it on success.
pub fn from_slice(data: &[u8], cursor: &mut usize) -> Result<Value<'static>> {
    Decoder::default().decode_slice(data, cursor)
}

/// Decode one value from a reader with the default options.
pub fn from_reader<R: Read>(reader: R) -> Result<Value<'static>> {
    Decoder::default().decode_reader(reader)
}

//! Encoded-size resolution.
//!
//! Sizes never include the value's own tag byte. Strings and scalars are sized directly; arrays
//! and objects walk their children once and memoize the result in the container, so resolving
//! an already-sized tree costs nothing past the root.

use crate::value::{Array, Object, Value};

/// Marks a container whose size hasn't been resolved yet. No real size can reach it.
pub const UNRESOLVED: usize = usize::MAX;

/// Container header: 4-byte count followed by 4-byte content-length.
pub const HEADER_LEN: usize = 8;

/// Length prefix of strings, byte blobs, and object keys.
pub const LEN_PREFIX: usize = 4;

#[cfg(test)]
thread_local! {
    static WALKS: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

#[cfg(test)]
pub(crate) fn walks() -> usize {
    WALKS.with(|w| w.get())
}

/// Resolve the encoded size of a value, excluding its tag byte.
pub fn resolve(value: &Value) -> usize {
    match value {
        Value::Str(v) | Value::Bytes(v) => LEN_PREFIX + v.len(),
        Value::Array(v) => v.resolve_size(),
        Value::Object(v) => v.resolve_size(),
        other => other.marker().payload_width().unwrap_or(0),
    }
}

impl<'a> Value<'a> {
    /// Encoded size of this value, excluding its tag byte. See [`resolve`].
    pub fn resolve_size(&self) -> usize {
        resolve(self)
    }

    /// Total encoded length, tag byte included.
    pub fn encoded_len(&self) -> usize {
        1 + resolve(self)
    }
}

impl<'a> Array<'a> {
    /// Header, type table, and every element payload. Memoized after the first call.
    pub fn resolve_size(&self) -> usize {
        if let Some(size) = self.cached_size() {
            return size;
        }
        #[cfg(test)]
        WALKS.with(|w| w.set(w.get() + 1));
        let size = self
            .iter()
            .fold(HEADER_LEN, |acc, elem| acc + 1 + resolve(elem));
        self.size_cell().set(size);
        size
    }
}

impl<'a> Object<'a> {
    /// Header, type table, and every key and value payload. Memoized after the first call.
    pub fn resolve_size(&self) -> usize {
        if let Some(size) = self.cached_size() {
            return size;
        }
        #[cfg(test)]
        WALKS.with(|w| w.set(w.get() + 1));
        let size = self.iter().fold(HEADER_LEN, |acc, pair| {
            acc + LEN_PREFIX + pair.key.len() + 1 + resolve(&pair.value)
        });
        self.size_cell().set(size);
        size
    }
}

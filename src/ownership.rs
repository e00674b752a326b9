//! Buffer ownership.
//!
//! Every variable-length payload (string and byte buffers, array and object storage) is held in
//! a [`Buf`], which is either a view into memory the caller owns, or a heap allocation the tree
//! owns. Borrowed buffers are never freed by this crate. Owned buffers are freed exactly once,
//! when the node holding them is released or dropped.
//!
//! The elements of a borrowed container storage belong to whoever lent the storage, so releasing
//! a borrowed container leaves them alone; they are dropped along with the lender's storage.

use std::fmt;
use std::ops::Deref;

use tracing::trace;

use crate::error::{Error, Result};
use crate::value::{Pair, Value};

/// Which side is responsible for freeing a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// Caller or static storage. Never freed by the codec.
    Borrowed,
    /// Heap storage, freed when its node is released.
    Owned,
}

/// Borrowed-or-owned storage for a run of `T`.
pub enum Buf<'a, T> {
    Borrowed(&'a [T]),
    Owned(Vec<T>),
}

impl<'a, T> Buf<'a, T> {
    pub fn ownership(&self) -> Ownership {
        match self {
            Buf::Borrowed(_) => Ownership::Borrowed,
            Buf::Owned(_) => Ownership::Owned,
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Buf::Owned(_))
    }

    pub fn as_slice(&self) -> &[T] {
        match self {
            Buf::Borrowed(v) => v,
            Buf::Owned(v) => v.as_slice(),
        }
    }
}

impl<'a, T: Clone> Buf<'a, T> {
    /// Get mutable access to the storage, copying borrowed storage into an owned buffer first.
    pub fn to_mut(&mut self) -> &mut Vec<T> {
        if let Buf::Borrowed(v) = *self {
            *self = Buf::Owned(v.to_vec());
        }
        match self {
            Buf::Owned(v) => v,
            Buf::Borrowed(_) => unreachable!("borrowed storage was just copied"),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            Buf::Borrowed(v) => v.to_vec(),
            Buf::Owned(v) => v,
        }
    }
}

impl<'a, T> Deref for Buf<'a, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<'a, T> AsRef<[T]> for Buf<'a, T> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<'a, T: Clone> Clone for Buf<'a, T> {
    fn clone(&self) -> Self {
        match self {
            Buf::Borrowed(v) => Buf::Borrowed(v),
            Buf::Owned(v) => Buf::Owned(v.clone()),
        }
    }
}

impl<'a, 'b, T: PartialEq> PartialEq<Buf<'b, T>> for Buf<'a, T> {
    fn eq(&self, other: &Buf<'b, T>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<'a, T: fmt::Debug> fmt::Debug for Buf<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Buf::Borrowed(v) => f.debug_tuple("Borrowed").field(v).finish(),
            Buf::Owned(v) => f.debug_tuple("Owned").field(v).finish(),
        }
    }
}

impl<'a, T> Default for Buf<'a, T> {
    fn default() -> Self {
        Buf::Borrowed(&[])
    }
}

impl<'a, T> From<&'a [T]> for Buf<'a, T> {
    fn from(v: &'a [T]) -> Self {
        Buf::Borrowed(v)
    }
}

impl<'a, T> From<Vec<T>> for Buf<'a, T> {
    fn from(v: Vec<T>) -> Self {
        Buf::Owned(v)
    }
}

impl<'a> From<&'a str> for Buf<'a, u8> {
    fn from(v: &'a str) -> Self {
        Buf::Borrowed(v.as_bytes())
    }
}

impl<'a> From<String> for Buf<'a, u8> {
    fn from(v: String) -> Self {
        Buf::Owned(v.into_bytes())
    }
}

/// Allocate a zeroed byte buffer of exactly `len` bytes, failing instead of aborting when the
/// allocator refuses.
pub(crate) fn alloc_bytes(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(Error::alloc(len))?;
    buf.resize(len, 0);
    Ok(buf)
}

/// Allocate empty storage with room for exactly `count` items.
pub(crate) fn alloc_storage<T>(count: usize) -> Result<Vec<T>> {
    let mut storage = Vec::new();
    storage
        .try_reserve_exact(count)
        .map_err(Error::alloc(count.saturating_mul(std::mem::size_of::<T>())))?;
    Ok(storage)
}

/// Release a tree, returning how many owned buffers were freed.
///
/// Owned string and byte buffers are freed, owned container storage is freed after each of its
/// children has been released, and borrowed buffers are left untouched. Scalars free nothing.
///
/// Borrowed container storage is only a view of the lender's elements, so its children are not
/// released here either: any owned buffers among them are freed when the lender drops its storage,
/// and are not counted.
pub fn release(value: Value<'_>) -> usize {
    match value {
        Value::Str(buf) | Value::Bytes(buf) => release_buf(buf),
        Value::Array(array) => match array.into_elements() {
            Buf::Owned(elements) => release_all(elements) + 1,
            Buf::Borrowed(_) => 0,
        },
        Value::Object(object) => match object.into_pairs() {
            Buf::Owned(pairs) => release_pairs(pairs) + 1,
            Buf::Borrowed(_) => 0,
        },
        _ => 0,
    }
}

/// Release each element of a run of values, in order.
pub(crate) fn release_all(elements: Vec<Value<'_>>) -> usize {
    elements.into_iter().map(release).sum()
}

/// Release each key and value of a run of pairs, in order.
pub(crate) fn release_pairs(pairs: Vec<Pair<'_>>) -> usize {
    pairs
        .into_iter()
        .map(|pair| release_buf(pair.key) + release(pair.value))
        .sum()
}

fn release_buf(buf: Buf<'_, u8>) -> usize {
    match buf {
        Buf::Owned(v) => {
            trace!(len = v.len(), "freeing owned buffer");
            drop(v);
            1
        }
        Buf::Borrowed(_) => 0,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn copy_on_write() {
        let data = [1u8, 2, 3];
        let mut buf = Buf::Borrowed(&data[..]);
        assert_eq!(buf.ownership(), Ownership::Borrowed);
        buf.to_mut().push(4);
        assert_eq!(buf.ownership(), Ownership::Owned);
        assert_eq!(&buf[..], &[1, 2, 3, 4]);
        assert_eq!(data, [1, 2, 3]);
    }

    #[test]
    fn equality_ignores_ownership() {
        let data = b"abc";
        let borrowed: Buf<u8> = Buf::Borrowed(&data[..]);
        let owned: Buf<u8> = Buf::Owned(data.to_vec());
        assert_eq!(borrowed, owned);
    }

    #[test]
    fn alloc_exact() {
        let buf = alloc_bytes(17).unwrap();
        assert_eq!(buf.len(), 17);
        assert!(buf.iter().all(|b| *b == 0));
        let storage: Vec<u64> = alloc_storage(5).unwrap();
        assert!(storage.is_empty());
        assert!(storage.capacity() >= 5);
    }

    #[test]
    fn alloc_refused() {
        match alloc_bytes(usize::MAX) {
            Err(Error::AllocationFailure { requested }) => assert_eq!(requested, usize::MAX),
            other => panic!("expected allocation failure, got {:?}", other),
        }
    }

    #[test]
    fn release_counts_owned_only() {
        let items = [Value::str("borrowed"), Value::I32(4)];
        assert_eq!(release(Value::array(&items)), 0);

        let owned = Value::array_owned(vec![
            Value::string("owned"),
            Value::bytes(b"view"),
            Value::object_owned(vec![Pair::new(String::from("k"), Value::byte_buf(vec![1]))]),
        ]);
        // outer storage, "owned", object storage, key "k", byte buffer
        assert_eq!(release(owned), 5);
    }

    #[test]
    fn borrowed_storage_leaves_owned_children_to_lender() {
        let items = [Value::string("heap"), Value::byte_buf(vec![1, 2])];
        assert_eq!(release(Value::array(&items)), 0);
        assert_eq!(items[0].as_str(), Some("heap"));
        assert_eq!(items[0].ownership(), Some(Ownership::Owned));

        let pairs = [Pair::new(String::from("k"), Value::string("v"))];
        assert_eq!(release(Value::object(&pairs)), 0);
        assert_eq!(pairs[0].key_str(), Some("k"));

        // The lender's own storage releases them
        assert_eq!(release(Value::array_owned(items.to_vec())), 3);
    }
}

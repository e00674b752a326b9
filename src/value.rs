use std::cell::Cell;
use std::convert::TryFrom;
use std::fmt;
use std::ops::Index;
use std::time::{SystemTime, UNIX_EPOCH};

use educe::Educe;

use crate::marker::Marker;
use crate::ownership::{Buf, Ownership};
use crate::size::UNRESOLVED;

/// A single document value.
///
/// Strings, byte blobs, and container storage are held in [`Buf`]s, so a tree can mix views of
/// caller memory with owned heap buffers. Trees produced by the decoder are fully owned
/// (`Value<'static>`).
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value<'a> {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Bool(bool),
    /// Raw string bytes. Not required to be UTF-8.
    Str(Buf<'a, u8>),
    Bytes(Buf<'a, u8>),
    /// Milliseconds since the Unix epoch.
    Date(u64),
    Array(Array<'a>),
    Object(Object<'a>),
    #[default]
    Null,
}

/// An ordered sequence of values, plus the memoized encoded size of the whole array.
#[derive(Educe, Clone, Debug)]
#[educe(PartialEq)]
pub struct Array<'a> {
    elements: Buf<'a, Value<'a>>,
    #[educe(PartialEq(ignore))]
    size: Cell<usize>,
}

/// An ordered sequence of key-value pairs, plus the memoized encoded size of the whole object.
///
/// Order is whatever the pairs were built or decoded in. Duplicate keys are kept as-is.
#[derive(Educe, Clone, Debug)]
#[educe(PartialEq)]
pub struct Object<'a> {
    pairs: Buf<'a, Pair<'a>>,
    #[educe(PartialEq(ignore))]
    size: Cell<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pair<'a> {
    pub key: Buf<'a, u8>,
    pub value: Value<'a>,
}

impl<'a> Pair<'a> {
    pub fn new<K: Into<Buf<'a, u8>>, V: Into<Value<'a>>>(key: K, value: V) -> Self {
        Pair {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The key as a string, if it is valid UTF-8.
    pub fn key_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.key).ok()
    }

    pub fn into_owned(self) -> Pair<'static> {
        Pair {
            key: Buf::Owned(self.key.into_vec()),
            value: self.value.into_owned(),
        }
    }
}

impl<'a> Array<'a> {
    pub fn new(elements: Buf<'a, Value<'a>>) -> Self {
        Self::with_size(elements, UNRESOLVED)
    }

    pub(crate) fn with_size(elements: Buf<'a, Value<'a>>, size: usize) -> Self {
        Array {
            elements,
            size: Cell::new(size),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value<'a>> {
        self.elements.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value<'a>> {
        self.elements.iter()
    }

    pub fn as_slice(&self) -> &[Value<'a>] {
        &self.elements
    }

    /// Ownership of the array's own storage. Elements carry their own ownership.
    pub fn ownership(&self) -> Ownership {
        self.elements.ownership()
    }

    /// Mutable access to the elements. Borrowed storage is copied into owned storage first.
    ///
    /// This does *not* invalidate a size that was already resolved; call
    /// [`invalidate_size`][Array::invalidate_size] after changing anything that affects the
    /// encoding.
    pub fn elements_mut(&mut self) -> &mut Vec<Value<'a>> {
        self.elements.to_mut()
    }

    pub fn push<V: Into<Value<'a>>>(&mut self, value: V) {
        self.elements.to_mut().push(value.into())
    }

    /// The memoized encoded size, if it has been resolved.
    pub fn cached_size(&self) -> Option<usize> {
        match self.size.get() {
            UNRESOLVED => None,
            size => Some(size),
        }
    }

    /// Forget the memoized size, so the next resolve walks the elements again.
    pub fn invalidate_size(&self) {
        self.size.set(UNRESOLVED);
    }

    pub(crate) fn size_cell(&self) -> &Cell<usize> {
        &self.size
    }

    pub fn into_elements(self) -> Buf<'a, Value<'a>> {
        self.elements
    }

    pub fn into_owned(self) -> Array<'static> {
        let size = self.size.get();
        let elements = match self.elements {
            Buf::Borrowed(v) => v.iter().cloned().map(Value::into_owned).collect(),
            Buf::Owned(v) => v.into_iter().map(Value::into_owned).collect(),
        };
        Array::with_size(Buf::Owned(elements), size)
    }
}

impl<'a> Object<'a> {
    pub fn new(pairs: Buf<'a, Pair<'a>>) -> Self {
        Self::with_size(pairs, UNRESOLVED)
    }

    pub(crate) fn with_size(pairs: Buf<'a, Pair<'a>>, size: usize) -> Self {
        Object {
            pairs,
            size: Cell::new(size),
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Look up the first pair with a matching key.
    pub fn get(&self, key: &str) -> Option<&Value<'a>> {
        self.pairs
            .iter()
            .find(|pair| &pair.key[..] == key.as_bytes())
            .map(|pair| &pair.value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pair<'a>> {
        self.pairs.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.pairs.iter().map(|pair| &pair.key[..])
    }

    pub fn as_slice(&self) -> &[Pair<'a>] {
        &self.pairs
    }

    /// Ownership of the object's own storage. Keys and values carry their own ownership.
    pub fn ownership(&self) -> Ownership {
        self.pairs.ownership()
    }

    /// Mutable access to the pairs. Borrowed storage is copied into owned storage first.
    ///
    /// Like [`Array::elements_mut`], this leaves a resolved size in place.
    pub fn pairs_mut(&mut self) -> &mut Vec<Pair<'a>> {
        self.pairs.to_mut()
    }

    pub fn push<K: Into<Buf<'a, u8>>, V: Into<Value<'a>>>(&mut self, key: K, value: V) {
        self.pairs.to_mut().push(Pair::new(key, value))
    }

    pub fn cached_size(&self) -> Option<usize> {
        match self.size.get() {
            UNRESOLVED => None,
            size => Some(size),
        }
    }

    pub fn invalidate_size(&self) {
        self.size.set(UNRESOLVED);
    }

    pub(crate) fn size_cell(&self) -> &Cell<usize> {
        &self.size
    }

    pub fn into_pairs(self) -> Buf<'a, Pair<'a>> {
        self.pairs
    }

    pub fn into_owned(self) -> Object<'static> {
        let size = self.size.get();
        let pairs = match self.pairs {
            Buf::Borrowed(v) => v.iter().cloned().map(Pair::into_owned).collect(),
            Buf::Owned(v) => v.into_iter().map(Pair::into_owned).collect(),
        };
        Object::with_size(Buf::Owned(pairs), size)
    }
}

// Holds no size cache, so a reference to it promotes to 'static
const NULL: Value<'static> = Value::Null;

impl<'a> Index<usize> for Array<'a> {
    type Output = Value<'a>;

    fn index(&self, index: usize) -> &Self::Output {
        self.get(index).unwrap_or(&NULL)
    }
}

impl<'a, 'k> Index<&'k str> for Object<'a> {
    type Output = Value<'a>;

    fn index(&self, key: &'k str) -> &Self::Output {
        self.get(key).unwrap_or(&NULL)
    }
}

impl<'a> Index<usize> for Value<'a> {
    type Output = Value<'a>;

    fn index(&self, index: usize) -> &Self::Output {
        self.as_array().and_then(|v| v.get(index)).unwrap_or(&NULL)
    }
}

impl<'a, 'k> Index<&'k str> for Value<'a> {
    type Output = Value<'a>;

    fn index(&self, key: &'k str) -> &Self::Output {
        self.get(key).unwrap_or(&NULL)
    }
}

impl<'a> Value<'a> {
    /// A string view over caller memory.
    pub fn str(v: &'a str) -> Self {
        Value::Str(Buf::Borrowed(v.as_bytes()))
    }

    pub fn string<S: Into<String>>(v: S) -> Self {
        Value::Str(Buf::Owned(v.into().into_bytes()))
    }

    /// A byte blob view over caller memory.
    pub fn bytes(v: &'a [u8]) -> Self {
        Value::Bytes(Buf::Borrowed(v))
    }

    pub fn byte_buf(v: Vec<u8>) -> Self {
        Value::Bytes(Buf::Owned(v))
    }

    /// An array whose storage is borrowed from the caller.
    pub fn array(elements: &'a [Value<'a>]) -> Self {
        Value::Array(Array::new(Buf::Borrowed(elements)))
    }

    pub fn array_owned(elements: Vec<Value<'a>>) -> Self {
        Value::Array(Array::new(Buf::Owned(elements)))
    }

    /// An object whose storage is borrowed from the caller.
    pub fn object(pairs: &'a [Pair<'a>]) -> Self {
        Value::Object(Object::new(Buf::Borrowed(pairs)))
    }

    pub fn object_owned(pairs: Vec<Pair<'a>>) -> Self {
        Value::Object(Object::new(Buf::Owned(pairs)))
    }

    pub fn date(millis: u64) -> Self {
        Value::Date(millis)
    }

    /// A date from a system time. Times before the epoch clamp to 0.
    pub fn date_from(time: SystemTime) -> Self {
        let millis = time
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Value::Date(millis)
    }

    /// The type tag this value is written with.
    pub fn marker(&self) -> Marker {
        match self {
            Value::I8(_) => Marker::I8,
            Value::I16(_) => Marker::I16,
            Value::I32(_) => Marker::I32,
            Value::I64(_) => Marker::I64,
            Value::U8(_) => Marker::U8,
            Value::U16(_) => Marker::U16,
            Value::U32(_) => Marker::U32,
            Value::U64(_) => Marker::U64,
            Value::F32(_) => Marker::F32,
            Value::F64(_) => Marker::F64,
            Value::Bool(true) => Marker::True,
            Value::Bool(false) => Marker::False,
            Value::Str(_) => Marker::String,
            Value::Bytes(_) => Marker::Bytes,
            Value::Date(_) => Marker::Date,
            Value::Array(_) => Marker::Array,
            Value::Object(_) => Marker::Object,
            Value::Null => Marker::Null,
        }
    }

    /// Ownership of the value's buffer or container storage. `None` for scalars.
    pub fn ownership(&self) -> Option<Ownership> {
        match self {
            Value::Str(v) | Value::Bytes(v) => Some(v.ownership()),
            Value::Array(v) => Some(v.ownership()),
            Value::Object(v) => Some(v.ownership()),
            _ => None,
        }
    }

    /// Deep-copy every borrowed buffer, producing a tree that owns all of its storage.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::I8(v) => Value::I8(v),
            Value::I16(v) => Value::I16(v),
            Value::I32(v) => Value::I32(v),
            Value::I64(v) => Value::I64(v),
            Value::U8(v) => Value::U8(v),
            Value::U16(v) => Value::U16(v),
            Value::U32(v) => Value::U32(v),
            Value::U64(v) => Value::U64(v),
            Value::F32(v) => Value::F32(v),
            Value::F64(v) => Value::F64(v),
            Value::Bool(v) => Value::Bool(v),
            Value::Str(v) => Value::Str(Buf::Owned(v.into_vec())),
            Value::Bytes(v) => Value::Bytes(Buf::Owned(v.into_vec())),
            Value::Date(v) => Value::Date(v),
            Value::Array(v) => Value::Array(v.into_owned()),
            Value::Object(v) => Value::Object(v.into_owned()),
            Value::Null => Value::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(
            self,
            Value::I8(_)
                | Value::I16(_)
                | Value::I32(_)
                | Value::I64(_)
                | Value::U8(_)
                | Value::U16(_)
                | Value::U32(_)
                | Value::U64(_)
        )
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    pub fn is_bytes(&self) -> bool {
        matches!(self, Value::Bytes(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Bool(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    /// Any integer type that fits in an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I8(v) => Some(v.into()),
            Value::I16(v) => Some(v.into()),
            Value::I32(v) => Some(v.into()),
            Value::I64(v) => Some(v),
            Value::U8(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::U64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Any integer type that fits in a u64.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::U8(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::U64(v) => Some(v),
            Value::I8(v) => u64::try_from(v).ok(),
            Value::I16(v) => u64::try_from(v).ok(),
            Value::I32(v) => u64::try_from(v).ok(),
            Value::I64(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v.into()),
            Value::F64(v) => Some(v),
            _ => None,
        }
    }

    /// The string, if this is a string holding valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => std::str::from_utf8(v).ok(),
            _ => None,
        }
    }

    /// Raw bytes of a string or byte blob.
    pub fn as_slice(&self) -> Option<&[u8]> {
        match self {
            Value::Str(v) | Value::Bytes(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<u64> {
        if let Value::Date(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_array(&self) -> Option<&Array<'a>> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Array<'a>> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object<'a>> {
        match self {
            Value::Object(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object<'a>> {
        match self {
            Value::Object(v) => Some(v),
            _ => None,
        }
    }

    /// Look up a key, if this is an object.
    pub fn get(&self, key: &str) -> Option<&Value<'a>> {
        self.as_object().and_then(|obj| obj.get(key))
    }
}

macro_rules! impl_value_from {
    ($t: ty, $p: ident) => {
        impl<'a> From<$t> for Value<'a> {
            fn from(v: $t) -> Self {
                Value::$p(v)
            }
        }
    };
}

impl_value_from!(i8, I8);
impl_value_from!(i16, I16);
impl_value_from!(i32, I32);
impl_value_from!(i64, I64);
impl_value_from!(u8, U8);
impl_value_from!(u16, U16);
impl_value_from!(u32, U32);
impl_value_from!(u64, U64);
impl_value_from!(f32, F32);
impl_value_from!(f64, F64);
impl_value_from!(bool, Bool);

impl<'a> From<Array<'a>> for Value<'a> {
    fn from(v: Array<'a>) -> Self {
        Value::Array(v)
    }
}

impl<'a> From<Object<'a>> for Value<'a> {
    fn from(v: Object<'a>) -> Self {
        Value::Object(v)
    }
}

impl<'a> From<()> for Value<'a> {
    fn from((): ()) -> Self {
        Value::Null
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(v: &'a str) -> Self {
        Value::str(v)
    }
}

impl<'a> From<String> for Value<'a> {
    fn from(v: String) -> Self {
        Value::string(v)
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(v: &'a [u8]) -> Self {
        Value::bytes(v)
    }
}

impl<'a> From<Vec<u8>> for Value<'a> {
    fn from(v: Vec<u8>) -> Self {
        Value::byte_buf(v)
    }
}

impl<'a> From<Vec<Value<'a>>> for Value<'a> {
    fn from(v: Vec<Value<'a>>) -> Self {
        Value::array_owned(v)
    }
}

impl<'a> From<Vec<Pair<'a>>> for Value<'a> {
    fn from(v: Vec<Pair<'a>>) -> Self {
        Value::object_owned(v)
    }
}

impl<'a, V: Into<Value<'a>>> FromIterator<V> for Value<'a> {
    fn from_iter<T: IntoIterator<Item = V>>(iter: T) -> Self {
        Value::array_owned(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> serde::Serialize for Value<'a> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::{Serialize, SerializeMap, SerializeSeq};
        match self {
            Value::I8(v) => serializer.serialize_i8(*v),
            Value::I16(v) => serializer.serialize_i16(*v),
            Value::I32(v) => serializer.serialize_i32(*v),
            Value::I64(v) => serializer.serialize_i64(*v),
            Value::U8(v) => serializer.serialize_u8(*v),
            Value::U16(v) => serializer.serialize_u16(*v),
            Value::U32(v) => serializer.serialize_u32(*v),
            Value::U64(v) => serializer.serialize_u64(*v),
            Value::F32(v) => serializer.serialize_f32(*v),
            Value::F64(v) => serializer.serialize_f64(*v),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Str(v) => match std::str::from_utf8(v) {
                Ok(s) => serializer.serialize_str(s),
                Err(_) => serializer.serialize_bytes(v),
            },
            Value::Bytes(v) => serde_bytes::Bytes::new(v).serialize(serializer),
            Value::Date(v) => serializer.serialize_u64(*v),
            Value::Array(v) => {
                let mut seq = serializer.serialize_seq(Some(v.len()))?;
                for elem in v.iter() {
                    seq.serialize_element(elem)?;
                }
                seq.end()
            }
            Value::Object(v) => {
                let mut map = serializer.serialize_map(Some(v.len()))?;
                for pair in v.iter() {
                    map.serialize_entry(&String::from_utf8_lossy(&pair.key), &pair.value)?;
                }
                map.end()
            }
            Value::Null => serializer.serialize_unit(),
        }
    }
}

impl<'de> serde::Deserialize<'de> for Value<'static> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::*;

        struct ValueVisitor;
        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value<'static>;

            fn expecting(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
                fmt.write_str("any valid document value")
            }

            fn visit_bool<E: Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(Value::Bool(v))
            }

            fn visit_i8<E: Error>(self, v: i8) -> Result<Self::Value, E> {
                Ok(Value::I8(v))
            }

            fn visit_i16<E: Error>(self, v: i16) -> Result<Self::Value, E> {
                Ok(Value::I16(v))
            }

            fn visit_i32<E: Error>(self, v: i32) -> Result<Self::Value, E> {
                Ok(Value::I32(v))
            }

            fn visit_i64<E: Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(Value::I64(v))
            }

            fn visit_u8<E: Error>(self, v: u8) -> Result<Self::Value, E> {
                Ok(Value::U8(v))
            }

            fn visit_u16<E: Error>(self, v: u16) -> Result<Self::Value, E> {
                Ok(Value::U16(v))
            }

            fn visit_u32<E: Error>(self, v: u32) -> Result<Self::Value, E> {
                Ok(Value::U32(v))
            }

            fn visit_u64<E: Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Value::U64(v))
            }

            fn visit_f32<E: Error>(self, v: f32) -> Result<Self::Value, E> {
                Ok(Value::F32(v))
            }

            fn visit_f64<E: Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(Value::F64(v))
            }

            fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(Value::string(v))
            }

            fn visit_string<E: Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(Value::string(v))
            }

            fn visit_bytes<E: Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                Ok(Value::byte_buf(v.to_vec()))
            }

            fn visit_byte_buf<E: Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
                Ok(Value::byte_buf(v))
            }

            fn visit_unit<E: Error>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E: Error>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
                Value::deserialize(d)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                // Same cap serde uses for its own collections
                let mut seq = match access.size_hint() {
                    Some(size) => Vec::with_capacity(size.min(4096)),
                    None => Vec::new(),
                };
                while let Some(elem) = access.next_element()? {
                    seq.push(elem);
                }
                Ok(Value::array_owned(seq))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::new();
                while let Some((key, value)) = access.next_entry::<String, Value<'static>>()? {
                    pairs.push(Pair::new(key, value));
                }
                Ok(Value::object_owned(pairs))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn markers() {
        assert_eq!(Value::Bool(true).marker(), Marker::True);
        assert_eq!(Value::Bool(false).marker(), Marker::False);
        assert_eq!(Value::date(5).marker(), Marker::Date);
        assert_eq!(Value::str("a").marker(), Marker::String);
        assert_eq!(Value::bytes(&[0]).marker(), Marker::Bytes);
        assert_eq!(Value::default().marker(), Marker::Null);
    }

    #[test]
    fn literal_constructors_borrow() {
        let items = [Value::str("a"), Value::bytes(b"b")];
        let pairs = [Pair::new("k", Value::array(&items))];
        let doc = Value::object(&pairs);
        assert_eq!(doc.ownership(), Some(Ownership::Borrowed));
        assert_eq!(doc.get("k").unwrap().ownership(), Some(Ownership::Borrowed));
        assert_eq!(Value::I32(3).ownership(), None);
    }

    #[test]
    fn into_owned_copies_everything() {
        let items = [Value::str("a"), Value::bytes(b"b")];
        let owned = Value::array(&items).into_owned();
        let arr = owned.as_array().unwrap();
        assert_eq!(arr.ownership(), Ownership::Owned);
        assert!(arr.iter().all(|v| v.ownership() == Some(Ownership::Owned)));
        assert_eq!(owned, Value::array(&items));
    }

    #[test]
    fn equality_ignores_size_cache() {
        let a = Array::new(Buf::Owned(vec![Value::U8(1)]));
        let b = Array::with_size(Buf::Owned(vec![Value::U8(1)]), 10);
        assert_eq!(a, b);
    }

    #[test]
    fn object_lookup_takes_first_duplicate() {
        let doc = Value::object_owned(vec![
            Pair::new("dup", 1i32),
            Pair::new("other", true),
            Pair::new("dup", 2i32),
        ]);
        assert_eq!(doc.get("dup"), Some(&Value::I32(1)));
        assert_eq!(doc.get("missing"), None);
        let keys: Vec<&[u8]> = doc.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec![&b"dup"[..], b"other", b"dup"]);
    }

    #[test]
    fn index_misses_are_null() {
        let items = [Value::U8(1)];
        let pairs = [Pair::new("list", Value::array(&items))];
        let doc = Value::object(&pairs);
        assert_eq!(doc["list"][0], Value::U8(1));
        assert!(doc["list"][1].is_null());
        assert!(doc["missing"].is_null());
        assert!(doc["list"]["not an object"].is_null());
        assert!(doc[0].is_null());
        let obj = doc.as_object().unwrap();
        assert!(obj["missing"].is_null());
        assert!(obj["list"].as_array().unwrap()[7].is_null());
    }

    #[test]
    fn integer_widening() {
        assert_eq!(Value::I8(-3).as_i64(), Some(-3));
        assert_eq!(Value::U64(u64::MAX).as_i64(), None);
        assert_eq!(Value::I16(-1).as_u64(), None);
        assert_eq!(Value::U32(7).as_u64(), Some(7));
        assert_eq!(Value::F32(1.5).as_f64(), Some(1.5));
    }

    #[test]
    fn push_copies_borrowed_storage() {
        let items = [Value::U8(1)];
        let mut doc = Value::array(&items);
        let arr = doc.as_array_mut().unwrap();
        arr.push(2u8);
        assert_eq!(arr.ownership(), Ownership::Owned);
        assert_eq!(arr.len(), 2);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn serde_json_round_trip() {
        let json = r#"{"name":"Alice","tags":["a","b"],"n":null,"ok":true,"x":-4}"#;
        let value: Value<'static> = serde_json::from_str(json).unwrap();
        assert_eq!(value.get("name").and_then(Value::as_str), Some("Alice"));
        assert_eq!(value.get("x").and_then(Value::as_i64), Some(-4));
        assert!(value.get("n").unwrap().is_null());
        assert_eq!(serde_json::to_string(&value).unwrap(), json);
    }

    #[test]
    fn date_from_system_time() {
        let t = UNIX_EPOCH + std::time::Duration::from_millis(1234);
        assert_eq!(Value::date_from(t), Value::Date(1234));
        let before = UNIX_EPOCH - std::time::Duration::from_secs(1);
        assert_eq!(Value::date_from(before), Value::Date(0));
    }
}

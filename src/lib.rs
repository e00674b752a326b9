//! A compact, self-describing binary document format in the spirit of BSON.
//!
//! A document is a tree of [`Value`]s: fixed-width integers and floats, booleans, null, dates,
//! strings, byte blobs, and recursively nested arrays and objects. Every value on the wire starts
//! with a one-byte type tag ([`Marker`]), followed by its payload:
//!
//! - Fixed-width scalars are written little-endian. Booleans and null have no payload; their
//!   value lives in the tag.
//! - Strings and byte blobs are a 4-byte length followed by the raw bytes.
//! - Arrays and objects are a 4-byte element count, a 4-byte content-length, then a type table
//!   holding one tag per element, then the element payloads. Object payloads are each a
//!   length-prefixed key followed by the value payload.
//!
//! No length or count field may reach [`MAX_LEN`]. The decoder checks this before allocating
//! anything, which bounds what a hostile input can make it allocate.
//!
//! Trees can borrow from caller memory (see [`Buf`] and [`Ownership`]). Encoding never copies a
//! borrowed buffer, and decoding always produces a fully owned `Value<'static>`.
//!
//! ```
//! use bson_lite::{from_slice, to_vec, Pair, Value};
//!
//! let pairs = [
//!     Pair::new("name", "Alice"),
//!     Pair::new("age", 20i32),
//!     Pair::new("is_student", true),
//! ];
//! let doc = Value::object(&pairs);
//! let encoded = to_vec(&doc).unwrap();
//! assert_eq!(encoded.len(), 54);
//!
//! let mut cursor = 0;
//! let decoded = from_slice(&encoded, &mut cursor).unwrap();
//! assert_eq!(cursor, encoded.len());
//! assert_eq!(decoded, doc);
//! assert_eq!(decoded.to_string(), r#"{"name": "Alice", "age": 20, "is_student": true}"#);
//! ```

mod depth_tracking;
mod error;
mod marker;
mod ownership;
mod print;
mod size;
mod value;

pub mod decode;
pub mod encode;

pub use self::decode::{from_reader, from_slice, DecodeOptions, Decoder};
pub use self::encode::{encode_into, to_vec, to_writer};
pub use self::error::{Error, Result};
pub use self::marker::Marker;
pub use self::ownership::{release, Buf, Ownership};
pub use self::size::{resolve, HEADER_LEN, UNRESOLVED};
pub use self::value::{Array, Object, Pair, Value};

/// Ceiling on every length and count field. A field equal to or above this is rejected.
pub const MAX_LEN: usize = 1 << 24;

/// Default limit on how deeply containers may nest when decoding.
pub const MAX_DEPTH: usize = 100;

use std::convert::TryFrom;

use crate::error::Error;

/// Type tags, as they appear on the wire. Tag 0 is reserved and never valid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Marker {
    I8 = 1,
    I16 = 2,
    I32 = 3,
    I64 = 4,
    U8 = 5,
    U16 = 6,
    U32 = 7,
    U64 = 8,
    F32 = 9,
    F64 = 10,
    True = 11,
    False = 12,
    String = 13,
    Bytes = 14,
    Date = 15,
    Array = 16,
    Object = 17,
    Null = 18,
}

impl Marker {
    /// One past the highest valid tag.
    pub const MAX: u8 = 19;

    /// Construct a marker from a single byte.
    pub fn from_u8(n: u8) -> Option<Marker> {
        use self::Marker::*;
        Some(match n {
            1 => I8,
            2 => I16,
            3 => I32,
            4 => I64,
            5 => U8,
            6 => U16,
            7 => U32,
            8 => U64,
            9 => F32,
            10 => F64,
            11 => True,
            12 => False,
            13 => String,
            14 => Bytes,
            15 => Date,
            16 => Array,
            17 => Object,
            18 => Null,
            _ => return None,
        })
    }

    pub fn into_u8(self) -> u8 {
        self as u8
    }

    /// Payload width of a fixed-size type. `None` for strings, bytes, and containers, whose
    /// payload length depends on their content.
    pub fn payload_width(self) -> Option<usize> {
        use self::Marker::*;
        match self {
            True | False | Null => Some(0),
            I8 | U8 => Some(1),
            I16 | U16 => Some(2),
            I32 | U32 | F32 => Some(4),
            I64 | U64 | F64 | Date => Some(8),
            String | Bytes | Array | Object => None,
        }
    }

    pub fn name(self) -> &'static str {
        use self::Marker::*;
        match self {
            I8 => "I8",
            I16 => "I16",
            I32 => "I32",
            I64 => "I64",
            U8 => "U8",
            U16 => "U16",
            U32 => "U32",
            U64 => "U64",
            F32 => "F32",
            F64 => "F64",
            True => "True",
            False => "False",
            String => "String",
            Bytes => "Bytes",
            Date => "Date",
            Array => "Array",
            Object => "Object",
            Null => "Null",
        }
    }
}

impl TryFrom<u8> for Marker {
    type Error = Error;

    fn try_from(val: u8) -> Result<Marker, Error> {
        Marker::from_u8(val).ok_or(Error::InvalidType(val))
    }
}

impl From<Marker> for u8 {
    fn from(val: Marker) -> u8 {
        val.into_u8()
    }
}

//! Type tag registry for mixed cells
//!
//! This module defines:
//! - TypeTag: closed set of kinds a mixed cell can hold, with their stable codes

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of value held by a mixed cell
///
/// ## TypeTag Values
///
/// These values are part of the on-disk and wire format and MUST NOT change.
/// A retired code stays reserved forever; new kinds get new codes.
/// - Null = 0x00
/// - Bool = 0x01
/// - Int64 = 0x02
/// - Double = 0x03
/// - String = 0x04
/// - Binary = 0x05
/// - Date = 0x06
/// - Decimal128 = 0x07
/// - ObjectId = 0x08
/// - Uuid = 0x09
/// - EmbeddedReference = 0x0A (registered, never stored inline)
///
/// Ordering follows the codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[repr(u8)]
pub enum TypeTag {
    /// Absence of a value
    Null = 0x00,
    /// Boolean
    Bool = 0x01,
    /// 64-bit signed integer
    Int64 = 0x02,
    /// IEEE-754 binary64
    Double = 0x03,
    /// UTF-8 text
    String = 0x04,
    /// Raw bytes
    Binary = 0x05,
    /// Millisecond-precision instant
    Date = 0x06,
    /// IEEE 754-2008 decimal128
    Decimal128 = 0x07,
    /// 12-byte object identifier
    ObjectId = 0x08,
    /// 128-bit UUID
    Uuid = 0x09,
    /// Reference to an embedded record
    EmbeddedReference = 0x0A,
}

impl TypeTag {
    /// Every registered tag, in code order
    pub const ALL: [TypeTag; 11] = [
        TypeTag::Null,
        TypeTag::Bool,
        TypeTag::Int64,
        TypeTag::Double,
        TypeTag::String,
        TypeTag::Binary,
        TypeTag::Date,
        TypeTag::Decimal128,
        TypeTag::ObjectId,
        TypeTag::Uuid,
        TypeTag::EmbeddedReference,
    ];

    /// Stable numeric code
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Resolve a code read from storage or the wire
    ///
    /// Unknown codes are an error, never a silent Null.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0x00 => Ok(TypeTag::Null),
            0x01 => Ok(TypeTag::Bool),
            0x02 => Ok(TypeTag::Int64),
            0x03 => Ok(TypeTag::Double),
            0x04 => Ok(TypeTag::String),
            0x05 => Ok(TypeTag::Binary),
            0x06 => Ok(TypeTag::Date),
            0x07 => Ok(TypeTag::Decimal128),
            0x08 => Ok(TypeTag::ObjectId),
            0x09 => Ok(TypeTag::Uuid),
            0x0A => Ok(TypeTag::EmbeddedReference),
            other => Err(Error::UnknownTag(other)),
        }
    }

    /// Payload size in bytes, or `None` for length-prefixed kinds
    pub fn fixed_payload_len(&self) -> Option<usize> {
        match self {
            TypeTag::Null => Some(0),
            TypeTag::Bool => Some(1),
            TypeTag::Int64 | TypeTag::Double | TypeTag::Date => Some(8),
            TypeTag::ObjectId => Some(12),
            TypeTag::Uuid | TypeTag::Decimal128 => Some(16),
            TypeTag::String | TypeTag::Binary | TypeTag::EmbeddedReference => None,
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Null => "Null",
            TypeTag::Bool => "Bool",
            TypeTag::Int64 => "Int64",
            TypeTag::Double => "Double",
            TypeTag::String => "String",
            TypeTag::Binary => "Binary",
            TypeTag::Date => "Date",
            TypeTag::Decimal128 => "Decimal128",
            TypeTag::ObjectId => "ObjectId",
            TypeTag::Uuid => "UUID",
            TypeTag::EmbeddedReference => "EmbeddedReference",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<TypeTag> for u8 {
    fn from(tag: TypeTag) -> Self {
        tag.code()
    }
}

impl TryFrom<u8> for TypeTag {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        TypeTag::from_code(code)
    }
}

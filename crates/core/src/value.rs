//! The mixed value cell
//!
//! This module defines:
//! - Mixed: tagged value stored in a mixed-type property slot
//!
//! ## Type Rules
//!
//! - A cell holds exactly one of the kinds in `TypeTag` (minus the reserved
//!   embedded reference)
//! - No implicit type coercions: accessors for another kind fail with
//!   `TypeMismatch`
//! - `Int(1) != Double(1.0)`: the tag is part of a cell's identity
//! - `Binary` is not `String`
//! - Double uses IEEE-754 equality: `NaN != NaN`, `-0.0 == 0.0`
//! - Decimal128 compares by decimal value: `1.0 == 1.00`
//! - Cells are immutable; replacing a slot's value stores a new cell

use crate::error::{Error, Result};
use crate::primitives::{Date, Decimal128, ObjectId, DECIMAL128_LEN, OBJECT_ID_LEN};
use crate::types::TypeTag;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

/// Value held by a mixed property
///
/// ## Type Equality
///
/// Different kinds are NEVER equal, even if they contain the same "value":
/// - `Int(5) != Double(5.0)`
/// - `Binary(b"hello") != String("hello")`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum Mixed {
    /// Null value; also what an unset slot reads as
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point (IEEE-754)
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Binary(Vec<u8>),
    /// Millisecond-precision instant
    Date(Date),
    /// 128-bit decimal
    Decimal(Decimal128),
    /// 12-byte object identifier
    ObjectId(ObjectId),
    /// 128-bit UUID
    Uuid(Uuid),
}

impl PartialEq for Mixed {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Mixed::Null, Mixed::Null) => true,
            (Mixed::Bool(a), Mixed::Bool(b)) => a == b,
            (Mixed::Int(a), Mixed::Int(b)) => a == b,
            // IEEE-754: NaN != NaN, -0.0 == 0.0
            (Mixed::Double(a), Mixed::Double(b)) => a == b,
            (Mixed::String(a), Mixed::String(b)) => a == b,
            (Mixed::Binary(a), Mixed::Binary(b)) => a == b,
            (Mixed::Date(a), Mixed::Date(b)) => a == b,
            (Mixed::Decimal(a), Mixed::Decimal(b)) => a == b,
            (Mixed::ObjectId(a), Mixed::ObjectId(b)) => a == b,
            (Mixed::Uuid(a), Mixed::Uuid(b)) => a == b,
            // Different kinds are never equal
            _ => false,
        }
    }
}

macro_rules! accessor {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $tag:ident, $ret:ty, |$v:ident| $body:expr) => {
        $(#[$doc])*
        pub fn $name(&self) -> Result<$ret> {
            match self {
                Mixed::$variant($v) => Ok($body),
                other => Err(Error::TypeMismatch {
                    expected: TypeTag::$tag,
                    actual: other.tag(),
                }),
            }
        }
    };
}

impl Mixed {
    /// Kind of value held
    pub fn tag(&self) -> TypeTag {
        match self {
            Mixed::Null => TypeTag::Null,
            Mixed::Bool(_) => TypeTag::Bool,
            Mixed::Int(_) => TypeTag::Int64,
            Mixed::Double(_) => TypeTag::Double,
            Mixed::String(_) => TypeTag::String,
            Mixed::Binary(_) => TypeTag::Binary,
            Mixed::Date(_) => TypeTag::Date,
            Mixed::Decimal(_) => TypeTag::Decimal128,
            Mixed::ObjectId(_) => TypeTag::ObjectId,
            Mixed::Uuid(_) => TypeTag::Uuid,
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Mixed::Null)
    }

    accessor!(
        /// Get the boolean, or `TypeMismatch`
        as_bool, Bool, Bool, bool, |b| *b
    );
    accessor!(
        /// Get the integer, or `TypeMismatch`
        as_int, Int, Int64, i64, |i| *i
    );
    accessor!(
        /// Get the double, or `TypeMismatch`
        as_double, Double, Double, f64, |f| *f
    );
    accessor!(
        /// Get the string, or `TypeMismatch`
        as_str, String, String, &str, |s| s.as_str()
    );
    accessor!(
        /// Get the bytes, or `TypeMismatch`
        as_binary, Binary, Binary, &[u8], |b| b.as_slice()
    );
    accessor!(
        /// Get the date, or `TypeMismatch`
        as_date, Date, Date, Date, |d| *d
    );
    accessor!(
        /// Get the decimal, or `TypeMismatch`
        as_decimal, Decimal, Decimal128, Decimal128, |d| *d
    );
    accessor!(
        /// Get the object id, or `TypeMismatch`
        as_object_id, ObjectId, ObjectId, ObjectId, |o| *o
    );
    accessor!(
        /// Get the UUID, or `TypeMismatch`
        as_uuid, Uuid, Uuid, Uuid, |u| *u
    );

    /// Build a cell from a tag and its raw payload
    ///
    /// The payload is trusted to be well-formed for its kind; only size and
    /// encoding are checked here. String and Binary payloads are the raw
    /// bytes without a length prefix.
    pub fn from_payload(tag: TypeTag, payload: &[u8]) -> Result<Self> {
        if let Some(expected) = tag.fixed_payload_len() {
            if payload.len() != expected {
                return Err(Error::invalid_payload(
                    tag,
                    format!("expected {} bytes, got {}", expected, payload.len()),
                ));
            }
        }
        let cell = match tag {
            TypeTag::Null => Mixed::Null,
            TypeTag::Bool => match payload[0] {
                0 => Mixed::Bool(false),
                1 => Mixed::Bool(true),
                other => {
                    return Err(Error::invalid_payload(
                        tag,
                        format!("boolean byte must be 0 or 1, got {}", other),
                    ))
                }
            },
            TypeTag::Int64 => Mixed::Int(i64::from_le_bytes(fixed(payload))),
            TypeTag::Double => Mixed::Double(f64::from_le_bytes(fixed(payload))),
            TypeTag::Date => Mixed::Date(Date::from_millis(i64::from_le_bytes(fixed(payload)))),
            TypeTag::String => match std::str::from_utf8(payload) {
                Ok(s) => Mixed::String(s.to_string()),
                Err(e) => return Err(Error::invalid_payload(tag, e.to_string())),
            },
            TypeTag::Binary => Mixed::Binary(payload.to_vec()),
            TypeTag::Decimal128 => {
                Mixed::Decimal(Decimal128::from_bytes(fixed::<DECIMAL128_LEN>(payload)))
            }
            TypeTag::ObjectId => {
                Mixed::ObjectId(ObjectId::from_bytes(fixed::<OBJECT_ID_LEN>(payload)))
            }
            TypeTag::Uuid => Mixed::Uuid(Uuid::from_bytes(fixed(payload))),
            TypeTag::EmbeddedReference => {
                return Err(Error::invalid_payload(
                    tag,
                    "embedded references are not stored inline",
                ))
            }
        };
        Ok(cell)
    }

    /// Raw payload bytes for this cell's tag (no length prefix)
    pub fn payload(&self) -> Vec<u8> {
        match self {
            Mixed::Null => Vec::new(),
            Mixed::Bool(b) => vec![*b as u8],
            Mixed::Int(i) => i.to_le_bytes().to_vec(),
            Mixed::Double(f) => f.to_le_bytes().to_vec(),
            Mixed::String(s) => s.as_bytes().to_vec(),
            Mixed::Binary(b) => b.clone(),
            Mixed::Date(d) => d.as_millis().to_le_bytes().to_vec(),
            Mixed::Decimal(d) => d.to_bytes().to_vec(),
            Mixed::ObjectId(o) => o.bytes().to_vec(),
            Mixed::Uuid(u) => u.as_bytes().to_vec(),
        }
    }

    /// Replica-independent total order: tag code first, then payload bytes
    ///
    /// This is not a value order (`Double(2.0)` may sort before
    /// `Double(1.0)`); it only has to be the same everywhere.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.tag()
            .code()
            .cmp(&other.tag().code())
            .then_with(|| self.payload().cmp(&other.payload()))
    }

    /// Deterministic lossless text form
    pub fn to_display_string(&self) -> String {
        self.to_string()
    }
}

fn fixed<const N: usize>(payload: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&payload[..N]);
    out
}

impl fmt::Display for Mixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mixed::Null => f.write_str("null"),
            Mixed::Bool(b) => write!(f, "{}", b),
            Mixed::Int(i) => write!(f, "{}", i),
            Mixed::Double(d) if d.is_nan() => f.write_str("NaN"),
            Mixed::Double(d) if d.is_infinite() => {
                f.write_str(if *d > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Mixed::Double(d) => write!(f, "{}", d),
            Mixed::String(s) => f.write_str(s),
            Mixed::Binary(b) => f.write_str(&base64::engine::general_purpose::STANDARD.encode(b)),
            Mixed::Date(d) => write!(f, "{}", d),
            Mixed::Decimal(d) => write!(f, "{}", d),
            Mixed::ObjectId(o) => write!(f, "{}", o),
            Mixed::Uuid(u) => write!(f, "{}", u.hyphenated()),
        }
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<&str> for Mixed {
    fn from(s: &str) -> Self {
        Mixed::String(s.to_string())
    }
}

impl From<String> for Mixed {
    fn from(s: String) -> Self {
        Mixed::String(s)
    }
}

impl From<bool> for Mixed {
    fn from(b: bool) -> Self {
        Mixed::Bool(b)
    }
}

impl From<i64> for Mixed {
    fn from(i: i64) -> Self {
        Mixed::Int(i)
    }
}

impl From<i32> for Mixed {
    fn from(i: i32) -> Self {
        Mixed::Int(i as i64)
    }
}

impl From<f64> for Mixed {
    fn from(f: f64) -> Self {
        Mixed::Double(f)
    }
}

impl From<Vec<u8>> for Mixed {
    fn from(b: Vec<u8>) -> Self {
        Mixed::Binary(b)
    }
}

impl From<Date> for Mixed {
    fn from(d: Date) -> Self {
        Mixed::Date(d)
    }
}

impl From<Decimal128> for Mixed {
    fn from(d: Decimal128) -> Self {
        Mixed::Decimal(d)
    }
}

impl From<ObjectId> for Mixed {
    fn from(o: ObjectId) -> Self {
        Mixed::ObjectId(o)
    }
}

impl From<Uuid> for Mixed {
    fn from(u: Uuid) -> Self {
        Mixed::Uuid(u)
    }
}

impl From<()> for Mixed {
    fn from(_: ()) -> Self {
        Mixed::Null
    }
}

impl<T: Into<Mixed>> From<Option<T>> for Mixed {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Mixed::Null)
    }
}

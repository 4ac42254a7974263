//! Coercion of foreign input into mixed cells
//!
//! Host bindings hand us values from a dynamically typed world. Rather than
//! reflecting over them, they describe each value as a [`Foreign`] variant
//! and [`Coercer::coerce`] maps the closed set of accepted shapes to a
//! [`Mixed`] cell:
//!
//! | Input shape                                 | Result       |
//! |---------------------------------------------|--------------|
//! | `Undefined` / `Null`                        | `Null`       |
//! | `Bool`                                      | `Bool`       |
//! | integral `Number`/`Integer` within i64      | `Int`        |
//! | other `Number`/`Integer`                    | `Double`     |
//! | `Double`                                    | `Double`     |
//! | `Text`                                      | `String`     |
//! | `Bytes`                                     | `Binary`     |
//! | `Date`                                      | `Date`       |
//! | `DecimalLiteral` / `Decimal`                | `Decimal`    |
//! | `ObjectIdLiteral` / `ObjectId` / `NewObjectId` | `ObjectId` |
//! | `UuidLiteral` / `Uuid` / `NewUuid`          | `Uuid`       |
//! | `Array` / `Object`                          | rejected     |
//!
//! Anything outside that set fails with `UnsupportedType` naming the
//! rejected type. Accepting structured values would make the cell
//! unreadable for clients that only know the closed set.

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::primitives::{Date, Decimal128, ObjectId};
use crate::types::TypeTag;
use crate::value::Mixed;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// 2^63 as f64; doubles at or above it do not fit in i64
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// A value as described by a host binding
#[derive(Debug, Clone, PartialEq)]
pub enum Foreign {
    /// The host's "absent" value (e.g. `undefined`)
    Undefined,
    /// The host's null
    Null,
    /// Boolean
    Bool(bool),
    /// A host number (binary64)
    Number(f64),
    /// A host integer of arbitrary width
    Integer(i128),
    /// A value already typed as a double; never narrowed to `Int`
    Double(f64),
    /// Text
    Text(String),
    /// Byte sequence
    Bytes(Vec<u8>),
    /// Date/time value
    Date(Date),
    /// Decimal number written as text, e.g. `"6.022e23"`
    DecimalLiteral(String),
    /// Decimal value object
    Decimal(Decimal128),
    /// 24-hex-character object identifier literal
    ObjectIdLiteral(String),
    /// ObjectId value object
    ObjectId(ObjectId),
    /// Request for a freshly allocated ObjectId
    NewObjectId,
    /// UUID written as text
    UuidLiteral(String),
    /// UUID value object
    Uuid(Uuid),
    /// Request for a freshly generated UUID
    NewUuid,
    /// A list of values
    Array(Vec<Foreign>),
    /// Any other structured or opaque host object
    Object {
        /// The host's name for the object's type (e.g. `"Object"`, `"Map"`)
        type_name: String,
    },
}

impl Foreign {
    /// An opaque host object of the given type
    pub fn object(type_name: impl Into<String>) -> Self {
        Foreign::Object {
            type_name: type_name.into(),
        }
    }

    /// Descriptive type name, used in diagnostics
    pub fn type_name(&self) -> &str {
        match self {
            Foreign::Undefined => "undefined",
            Foreign::Null => "null",
            Foreign::Bool(_) => "boolean",
            Foreign::Number(_) | Foreign::Integer(_) => "number",
            Foreign::Double(_) => "Double",
            Foreign::Text(_) => "string",
            Foreign::Bytes(_) => "ArrayBuffer",
            Foreign::Date(_) => "Date",
            Foreign::DecimalLiteral(_) | Foreign::Decimal(_) => "Decimal128",
            Foreign::ObjectIdLiteral(_) | Foreign::ObjectId(_) | Foreign::NewObjectId => {
                "ObjectId"
            }
            Foreign::UuidLiteral(_) | Foreign::Uuid(_) | Foreign::NewUuid => "UUID",
            Foreign::Array(_) => "Array",
            Foreign::Object { type_name } => type_name,
        }
    }
}

impl From<Mixed> for Foreign {
    fn from(cell: Mixed) -> Self {
        match cell {
            Mixed::Null => Foreign::Null,
            Mixed::Bool(b) => Foreign::Bool(b),
            Mixed::Int(i) => Foreign::Integer(i as i128),
            Mixed::Double(f) => Foreign::Double(f),
            Mixed::String(s) => Foreign::Text(s),
            Mixed::Binary(b) => Foreign::Bytes(b),
            Mixed::Date(d) => Foreign::Date(d),
            Mixed::Decimal(d) => Foreign::Decimal(d),
            Mixed::ObjectId(o) => Foreign::ObjectId(o),
            Mixed::Uuid(u) => Foreign::Uuid(u),
        }
    }
}

impl From<bool> for Foreign {
    fn from(b: bool) -> Self {
        Foreign::Bool(b)
    }
}

impl From<f64> for Foreign {
    fn from(n: f64) -> Self {
        Foreign::Number(n)
    }
}

impl From<i64> for Foreign {
    fn from(n: i64) -> Self {
        Foreign::Integer(n as i128)
    }
}

impl From<i32> for Foreign {
    fn from(n: i32) -> Self {
        Foreign::Integer(n as i128)
    }
}

impl From<&str> for Foreign {
    fn from(s: &str) -> Self {
        Foreign::Text(s.to_string())
    }
}

impl From<String> for Foreign {
    fn from(s: String) -> Self {
        Foreign::Text(s)
    }
}

impl From<Vec<u8>> for Foreign {
    fn from(b: Vec<u8>) -> Self {
        Foreign::Bytes(b)
    }
}

impl From<Date> for Foreign {
    fn from(d: Date) -> Self {
        Foreign::Date(d)
    }
}

impl From<Decimal128> for Foreign {
    fn from(d: Decimal128) -> Self {
        Foreign::Decimal(d)
    }
}

impl From<ObjectId> for Foreign {
    fn from(o: ObjectId) -> Self {
        Foreign::ObjectId(o)
    }
}

impl From<Uuid> for Foreign {
    fn from(u: Uuid) -> Self {
        Foreign::Uuid(u)
    }
}

impl<T: Into<Foreign>> From<Option<T>> for Foreign {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Foreign::Null)
    }
}

/// Source of fresh identifiers
///
/// Only consulted for `NewObjectId` / `NewUuid`; supplied identifiers are
/// validated, never regenerated.
pub trait IdSource: Send + Sync {
    /// Allocate a new ObjectId
    fn allocate_object_id(&self) -> ObjectId;
    /// Generate a new UUID
    fn generate_uuid(&self) -> Uuid;
}

/// Clock- and RNG-backed identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIds;

impl IdSource for SystemIds {
    fn allocate_object_id(&self) -> ObjectId {
        ObjectId::new()
    }

    fn generate_uuid(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Validating conversion from foreign input to cells
#[derive(Clone)]
pub struct Coercer {
    limits: Limits,
    ids: Arc<dyn IdSource>,
}

impl Default for Coercer {
    fn default() -> Self {
        Coercer::new(Limits::default())
    }
}

impl std::fmt::Debug for Coercer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coercer")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl Coercer {
    /// Coercer with the given limits and system identifiers
    pub fn new(limits: Limits) -> Self {
        Coercer {
            limits,
            ids: Arc::new(SystemIds),
        }
    }

    /// Replace the identifier source
    pub fn with_id_source(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    /// Limits enforced by this coercer
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Map a foreign value to a cell, or reject it
    pub fn coerce(&self, value: Foreign) -> Result<Mixed> {
        let cell = match value {
            Foreign::Undefined | Foreign::Null => Mixed::Null,
            Foreign::Bool(b) => Mixed::Bool(b),
            Foreign::Number(n) => number_cell(n),
            Foreign::Double(f) => Mixed::Double(f),
            Foreign::Integer(i) => match i64::try_from(i) {
                Ok(i) => Mixed::Int(i),
                Err(_) => Mixed::Double(i as f64),
            },
            Foreign::Text(s) => {
                self.limits.validate_string(&s)?;
                Mixed::String(s)
            }
            Foreign::Bytes(b) => {
                self.limits.validate_binary(&b)?;
                Mixed::Binary(b)
            }
            Foreign::Date(d) => Mixed::Date(d),
            Foreign::DecimalLiteral(s) => match Decimal128::parse_str(&s) {
                Ok(d) => Mixed::Decimal(d),
                Err(_) => return Err(Error::invalid_literal(TypeTag::Decimal128, s)),
            },
            Foreign::Decimal(d) => Mixed::Decimal(d),
            Foreign::ObjectIdLiteral(s) => match ObjectId::parse_str(&s) {
                Ok(o) => Mixed::ObjectId(o),
                Err(_) => return Err(Error::invalid_literal(TypeTag::ObjectId, s)),
            },
            Foreign::ObjectId(o) => Mixed::ObjectId(o),
            Foreign::NewObjectId => Mixed::ObjectId(self.ids.allocate_object_id()),
            Foreign::UuidLiteral(s) => match Uuid::parse_str(&s) {
                Ok(u) => Mixed::Uuid(u),
                Err(_) => return Err(Error::invalid_literal(TypeTag::Uuid, s)),
            },
            Foreign::Uuid(u) => Mixed::Uuid(u),
            Foreign::NewUuid => Mixed::Uuid(self.ids.generate_uuid()),
            rejected @ (Foreign::Array(_) | Foreign::Object { .. }) => {
                debug!(target: "mixcell::coerce", type_name = rejected.type_name(), "Rejected foreign value");
                return Err(Error::unsupported(rejected.type_name()));
            }
        };
        Ok(cell)
    }
}

fn number_cell(n: f64) -> Mixed {
    if n.is_finite() && n.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&n) {
        Mixed::Int(n as i64)
    } else {
        Mixed::Double(n)
    }
}

/// Coerce with default limits and system identifiers
pub fn from_foreign(value: impl Into<Foreign>) -> Result<Mixed> {
    Coercer::default().coerce(value.into())
}

impl TryFrom<Foreign> for Mixed {
    type Error = Error;

    fn try_from(value: Foreign) -> Result<Self> {
        from_foreign(value)
    }
}

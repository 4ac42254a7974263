//! Extended JSON adapter
//!
//! A thin layer for hosts that hand us JSON instead of typed values. Plain
//! JSON maps onto `Foreign` directly; single-key wrapper objects select
//! the richer kinds:
//!
//! ```text
//! {"$oid": "507f1f77bcf86cd799439011"}   -> ObjectId
//! {"$uuid": "c4e0c8e4-..."}              -> UUID
//! {"$numberDecimal": "6.022e23"}         -> Decimal128
//! {"$numberDouble": "3.0"}               -> Double ("NaN", "Infinity", "-Infinity")
//! {"$date": 1614600000000}               -> Date (ms) or RFC 3339 string
//! {"$binary": "AAEC/w=="}                -> Binary (standard base64)
//! ```
//!
//! A bare JSON number is a host number, so `3.0` becomes `Int(3)`; doubles
//! are written with the `$numberDouble` wrapper to keep their tag.
//!
//! Any other object becomes an opaque `Object` and is rejected by coercion.
//! This is the only place where text is interpreted as something other
//! than a string; the core never guesses.

use crate::coerce::Foreign;
use crate::error::{Error, Result};
use crate::primitives::Date;
use crate::types::TypeTag;
use crate::value::Mixed;
use base64::Engine as _;
use serde_json::{json, Map, Value as JsonValue};

const OID: &str = "$oid";
const UUID: &str = "$uuid";
const DECIMAL: &str = "$numberDecimal";
const DOUBLE: &str = "$numberDouble";
const DATE: &str = "$date";
const BINARY: &str = "$binary";

impl Foreign {
    /// Describe a JSON value as foreign input
    ///
    /// Fails only for a wrapper whose payload has the wrong JSON type
    /// (e.g. `{"$date": true}`) or undecodable base64.
    pub fn from_json(value: JsonValue) -> Result<Foreign> {
        let foreign = match value {
            JsonValue::Null => Foreign::Null,
            JsonValue::Bool(b) => Foreign::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Foreign::Integer(i as i128),
                None => match n.as_u64() {
                    Some(u) => Foreign::Integer(u as i128),
                    None => Foreign::Number(n.as_f64().unwrap_or(f64::NAN)),
                },
            },
            JsonValue::String(s) => Foreign::Text(s),
            JsonValue::Array(items) => Foreign::Array(
                items
                    .into_iter()
                    .map(Foreign::from_json)
                    .collect::<Result<Vec<_>>>()?,
            ),
            JsonValue::Object(map) => from_wrapper(map)?,
        };
        Ok(foreign)
    }
}

fn from_wrapper(mut map: Map<String, JsonValue>) -> Result<Foreign> {
    if map.len() != 1 {
        return Ok(Foreign::object("Object"));
    }
    let key = match map.keys().next() {
        Some(k) => k.clone(),
        None => return Ok(Foreign::object("Object")),
    };
    let payload = map.remove(&key).unwrap_or(JsonValue::Null);

    let foreign = match (key.as_str(), payload) {
        (OID, JsonValue::String(s)) => Foreign::ObjectIdLiteral(s),
        (UUID, JsonValue::String(s)) => Foreign::UuidLiteral(s),
        (DECIMAL, JsonValue::String(s)) => Foreign::DecimalLiteral(s),
        (DOUBLE, JsonValue::String(s)) => match parse_double(&s) {
            Some(f) => Foreign::Double(f),
            None => return Err(Error::invalid_literal(TypeTag::Double, s)),
        },
        (DATE, JsonValue::Number(n)) => match n.as_i64() {
            Some(ms) => Foreign::Date(Date::from_millis(ms)),
            None => return Err(Error::invalid_literal(TypeTag::Date, n.to_string())),
        },
        (DATE, JsonValue::String(s)) => match Date::parse_rfc3339(&s) {
            Some(d) => Foreign::Date(d),
            None => return Err(Error::invalid_literal(TypeTag::Date, s)),
        },
        (BINARY, JsonValue::String(s)) => {
            match base64::engine::general_purpose::STANDARD.decode(s.as_bytes()) {
                Ok(bytes) => Foreign::Bytes(bytes),
                Err(_) => return Err(Error::invalid_literal(TypeTag::Binary, s)),
            }
        }
        (OID, other) => return Err(Error::invalid_literal(TypeTag::ObjectId, other.to_string())),
        (UUID, other) => return Err(Error::invalid_literal(TypeTag::Uuid, other.to_string())),
        (DECIMAL, other) => {
            return Err(Error::invalid_literal(TypeTag::Decimal128, other.to_string()))
        }
        (DOUBLE, other) => return Err(Error::invalid_literal(TypeTag::Double, other.to_string())),
        (DATE, other) => return Err(Error::invalid_literal(TypeTag::Date, other.to_string())),
        (BINARY, other) => return Err(Error::invalid_literal(TypeTag::Binary, other.to_string())),
        _ => Foreign::object("Object"),
    };
    Ok(foreign)
}

fn parse_double(s: &str) -> Option<f64> {
    match s {
        "NaN" => Some(f64::NAN),
        "Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ => s.parse().ok().filter(|f: &f64| f.is_finite()),
    }
}

fn double_repr(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f == f64::INFINITY {
        "Infinity".to_string()
    } else if f == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        // Debug keeps the fraction and sign of zero: "3.0", "-0.0"
        format!("{:?}", f)
    }
}

impl From<&Mixed> for JsonValue {
    /// Extended JSON form; exact for every kind
    fn from(cell: &Mixed) -> Self {
        match cell {
            Mixed::Null => JsonValue::Null,
            Mixed::Bool(b) => JsonValue::Bool(*b),
            Mixed::Int(i) => JsonValue::Number((*i).into()),
            Mixed::Double(f) => json!({ DOUBLE: double_repr(*f) }),
            Mixed::String(s) => JsonValue::String(s.clone()),
            Mixed::Binary(b) => {
                json!({ BINARY: base64::engine::general_purpose::STANDARD.encode(b) })
            }
            Mixed::Date(d) => json!({ DATE: d.as_millis() }),
            Mixed::Decimal(d) => json!({ DECIMAL: d.to_string() }),
            Mixed::ObjectId(o) => json!({ OID: o.to_hex() }),
            Mixed::Uuid(u) => json!({ UUID: u.hyphenated().to_string() }),
        }
    }
}

impl From<Mixed> for JsonValue {
    fn from(cell: Mixed) -> Self {
        JsonValue::from(&cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::from_foreign;
    use crate::primitives::{Decimal128, ObjectId};
    use uuid::Uuid;

    fn coerce_json(v: JsonValue) -> Result<Mixed> {
        from_foreign(Foreign::from_json(v)?)
    }

    #[test]
    fn test_plain_json_scalars() {
        assert_eq!(coerce_json(json!(null)).unwrap(), Mixed::Null);
        assert_eq!(coerce_json(json!(true)).unwrap(), Mixed::Bool(true));
        assert_eq!(coerce_json(json!(555)).unwrap(), Mixed::Int(555));
        assert_eq!(coerce_json(json!(3.0)).unwrap(), Mixed::Int(3));
        assert_eq!(coerce_json(json!(3.25)).unwrap(), Mixed::Double(3.25));
        assert_eq!(coerce_json(json!("x")).unwrap(), Mixed::String("x".into()));
    }

    #[test]
    fn test_u64_beyond_i64_becomes_double() {
        let cell = coerce_json(json!(u64::MAX)).unwrap();
        assert_eq!(cell.tag(), TypeTag::Double);
    }

    #[test]
    fn test_wrappers() {
        let oid = coerce_json(json!({"$oid": "507f1f77bcf86cd799439011"})).unwrap();
        assert_eq!(oid.tag(), TypeTag::ObjectId);

        let uuid = coerce_json(json!({"$uuid": "c4e0c8e4-5a6b-4d8e-9f1e-2b3c4d5e6f70"})).unwrap();
        assert_eq!(uuid.tag(), TypeTag::Uuid);

        let dec = coerce_json(json!({"$numberDecimal": "6.022e23"})).unwrap();
        assert_eq!(dec.to_string(), "6.022E+23");

        let date = coerce_json(json!({"$date": 1_614_600_000_000i64})).unwrap();
        assert_eq!(date.to_string(), "2021-03-01T12:00:00.000Z");

        let date = coerce_json(json!({"$date": "2021-03-01T12:00:00.000Z"})).unwrap();
        assert_eq!(date, Mixed::Date(Date::from_millis(1_614_600_000_000)));

        let bin = coerce_json(json!({"$binary": "AAEC/w=="})).unwrap();
        assert_eq!(bin, Mixed::Binary(vec![0, 1, 2, 255]));
    }

    #[test]
    fn test_malformed_wrapper_payloads() {
        assert!(Foreign::from_json(json!({"$oid": 12})).is_err());
        assert!(Foreign::from_json(json!({"$date": "soon"})).is_err());
        assert!(Foreign::from_json(json!({"$binary": "!!"})).is_err());
        assert!(coerce_json(json!({"$oid": "nothex"})).is_err());
    }

    #[test]
    fn test_plain_object_rejected() {
        let err = coerce_json(json!({})).unwrap_err();
        assert_eq!(err.to_string(), "Mixed conversion not possible for type: Object");
        let err = coerce_json(json!({"a": 1, "b": 2})).unwrap_err();
        assert_eq!(err, Error::unsupported("Object"));
        let err = coerce_json(json!({"$other": 1})).unwrap_err();
        assert_eq!(err, Error::unsupported("Object"));
    }

    #[test]
    fn test_array_rejected() {
        let err = coerce_json(json!([1, 2])).unwrap_err();
        assert_eq!(err, Error::unsupported("Array"));
    }

    #[test]
    fn test_cell_to_extended_json_and_back() {
        let cells = vec![
            Mixed::Null,
            Mixed::Bool(false),
            Mixed::Int(-7),
            Mixed::Double(0.5),
            Mixed::String("s".into()),
            Mixed::Binary(vec![9, 8, 7]),
            Mixed::Date(Date::from_millis(42)),
            Mixed::Decimal(Decimal128::parse_str("-1.25").unwrap()),
            Mixed::ObjectId(ObjectId::new()),
            Mixed::Uuid(Uuid::new_v4()),
        ];
        for cell in cells {
            let json = JsonValue::from(&cell);
            assert_eq!(coerce_json(json).unwrap(), cell);
        }
    }

    #[test]
    fn test_doubles_keep_their_tag_through_json() {
        for f in [3.0, 0.0, -0.0, 1e300, f64::INFINITY, f64::NEG_INFINITY] {
            let json = JsonValue::from(Mixed::Double(f));
            let back = coerce_json(json).unwrap();
            assert!(matches!(back, Mixed::Double(g) if g == f && g.is_sign_negative() == f.is_sign_negative()));
        }
        assert_eq!(JsonValue::from(Mixed::Double(3.0)), json!({"$numberDouble": "3.0"}));
        assert_eq!(JsonValue::from(Mixed::Double(-0.0)), json!({"$numberDouble": "-0.0"}));
        assert_eq!(
            JsonValue::from(Mixed::Double(f64::INFINITY)),
            json!({"$numberDouble": "Infinity"})
        );
    }

    #[test]
    fn test_nan_double_through_json() {
        let json = JsonValue::from(Mixed::Double(f64::NAN));
        assert_eq!(json, json!({"$numberDouble": "NaN"}));
        assert!(matches!(coerce_json(json).unwrap(), Mixed::Double(f) if f.is_nan()));
    }

    #[test]
    fn test_malformed_double_wrapper() {
        assert!(Foreign::from_json(json!({"$numberDouble": 3.0})).is_err());
        assert!(Foreign::from_json(json!({"$numberDouble": "three"})).is_err());
        assert!(Foreign::from_json(json!({"$numberDouble": "inf"})).is_err());
    }
}

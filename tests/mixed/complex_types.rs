//! Rich Kind Tests
//!
//! ObjectId, UUID, Decimal128 and Date cells keep kind and canonical text.

use crate::common::*;
use mixcell::{Date, Decimal128, Foreign, Mixed, ObjectId, TypeTag, Uuid};

#[test]
fn rich_kinds_keep_kind_and_display() {
    let store = single_store();
    let d128 = Decimal128::parse_str("6.022e23").unwrap();
    let oid = ObjectId::new();
    let uuid = Uuid::new_v4();
    let date = Date::now();

    store
        .write(|txn| {
            txn.create(
                "Mixed",
                [
                    ("a", Foreign::from(oid)),
                    ("b", uuid.into()),
                    ("c", d128.into()),
                    ("d", date.into()),
                ],
            )
        })
        .unwrap();

    let data = &store.objects("Mixed").unwrap()[0];

    assert_eq!(data.get("a").tag(), TypeTag::ObjectId);
    assert_eq!(data.get("a").to_string(), oid.to_string());
    assert_eq!(data.get("b").tag(), TypeTag::Uuid);
    assert_eq!(data.get("b").to_string(), uuid.hyphenated().to_string());
    assert_eq!(data.get("c").tag(), TypeTag::Decimal128);
    assert_eq!(data.get("c").to_string(), d128.to_string());
    assert_eq!(data.get("c").to_string(), "6.022E+23");
    assert_eq!(data.get("d").tag(), TypeTag::Date);
    assert_eq!(data.get("d").to_string(), date.to_string());
}

#[test]
fn typed_accessors_check_the_kind() {
    let oid = ObjectId::new();
    let cell = Mixed::ObjectId(oid);
    assert_eq!(cell.as_object_id().unwrap(), oid);
    assert!(cell.as_uuid().is_err());
    assert!(cell.as_str().is_err());
}

#[test]
fn object_id_text_is_24_lowercase_hex() {
    let text = ObjectId::new().to_string();
    assert_eq!(text.len(), 24);
    assert!(text.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn decimal_equality_is_by_value() {
    let a = Mixed::Decimal(Decimal128::parse_str("1.0").unwrap());
    let b = Mixed::Decimal(Decimal128::parse_str("1.00").unwrap());
    assert_eq!(a, b);
    assert_ne!(a, Mixed::Int(1));
}

#[test]
fn date_display_is_rfc3339_millis() {
    let cell = Mixed::Date(Date::from_millis(1_614_600_000_123));
    assert_eq!(cell.to_string(), "2021-03-01T12:00:00.123Z");
}

#[test]
fn new_identifier_requests_use_the_id_source() {
    let store = single_store();
    let obj = store
        .write(|txn| txn.create("Mixed", [("a", Foreign::NewObjectId), ("b", Foreign::NewUuid)]))
        .unwrap();
    assert_eq!(store.get(&obj, "a").unwrap().tag(), TypeTag::ObjectId);
    assert_eq!(store.get(&obj, "b").unwrap().tag(), TypeTag::Uuid);
}

//! Extended JSON Adapter Tests
//!
//! Hosts that speak JSON go through `Foreign::from_json`; wrapper objects
//! select the rich kinds and everything else maps as plain JSON.

use crate::common::*;
use mixcell::{Foreign, Mixed, TypeTag};
use serde_json::{json, Value as JsonValue};

fn create_from_json(store: &mixcell::Store, doc: JsonValue) -> mixcell::Result<mixcell::ObjectRef> {
    let JsonValue::Object(map) = doc else {
        panic!("test documents are objects");
    };
    store.write(|txn| {
        let mut values = Vec::new();
        for (k, v) in map {
            values.push((k, Foreign::from_json(v)?));
        }
        txn.create("Mixed", values)
    })
}

#[test]
fn json_document_creates_typed_slots() {
    let store = single_store();
    let obj = create_from_json(
        &store,
        json!({
            "a": {"$oid": "507f1f77bcf86cd799439011"},
            "b": {"$numberDecimal": "6.022e23"},
            "c": {"$date": "2021-03-01T12:00:00.000Z"},
            "d": 3.0
        }),
    )
    .unwrap();

    assert_eq!(store.get(&obj, "a").unwrap().tag(), TypeTag::ObjectId);
    assert_eq!(store.get(&obj, "a").unwrap().to_string(), "507f1f77bcf86cd799439011");
    assert_eq!(store.get(&obj, "b").unwrap().to_string(), "6.022E+23");
    assert_eq!(store.get(&obj, "c").unwrap().to_string(), "2021-03-01T12:00:00.000Z");
    assert_eq!(*store.get(&obj, "d").unwrap(), Mixed::Int(3));
}

#[test]
fn nested_json_object_is_rejected() {
    let store = single_store();
    let err = create_from_json(&store, json!({"a": {"nested": true}})).unwrap_err();
    assert_eq!(err.to_string(), "Mixed conversion not possible for type: Object");
}

#[test]
fn cells_render_back_to_extended_json() {
    let store = single_store();
    let obj = create_from_json(&store, json!({"a": {"$binary": "AAEC/w=="}})).unwrap();
    let cell = store.get(&obj, "a").unwrap();
    let json = JsonValue::from(&*cell);
    assert_eq!(json, json!({"$binary": "AAEC/w=="}));
}

#[test]
fn integral_double_survives_json_round_trip() {
    let store = single_store();
    let obj = store
        .write(|txn| txn.create("Mixed", [("a", Foreign::from(Mixed::Double(3.0)))]))
        .unwrap();
    let json = JsonValue::from(&*store.get(&obj, "a").unwrap());
    assert_eq!(json, json!({"$numberDouble": "3.0"}));

    let copy = create_from_json(&store, json!({ "a": json })).unwrap();
    assert_eq!(*store.get(&copy, "a").unwrap(), Mixed::Double(3.0));
}

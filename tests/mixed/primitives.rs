//! Primitive Storage Tests
//!
//! - Strings, integers and booleans keep their kinds
//! - Unset slots read as null
//! - Host numbers pick Int64 or Double by value; typed doubles stay Double

use crate::common::*;
use mixcell::{Foreign, Mixed, TypeTag};

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn primitives_read_back_with_their_kinds() {
    let store = single_store();
    store
        .write(|txn| {
            txn.create(
                "Mixed",
                [("a", Foreign::from("xxxxxx")), ("b", 555.into()), ("c", true.into())],
            )
        })
        .unwrap();

    let objects = store.objects("Mixed").unwrap();
    assert_eq!(objects.len(), 1);
    let data = &objects[0];

    assert_eq!(*data.get("a"), Mixed::from("xxxxxx"));
    assert_eq!(data.get("a").tag(), TypeTag::String);
    assert_eq!(*data.get("b"), Mixed::Int(555));
    assert_eq!(data.get("b").tag(), TypeTag::Int64);
    assert_eq!(*data.get("c"), Mixed::Bool(true));
    assert_eq!(data.get("c").tag(), TypeTag::Bool);
}

#[test]
fn unset_slot_is_null() {
    let store = single_store();
    let obj = store
        .write(|txn| txn.create("Mixed", [("a", Foreign::from(1))]))
        .unwrap();
    let d = store.get(&obj, "d").unwrap();
    assert!(d.is_null());
    assert_eq!(*d, Mixed::Null);
    assert_eq!(d.to_string(), "null");
}

// ============================================================================
// Numbers
// ============================================================================

#[test]
fn integral_numbers_become_int64() {
    let store = single_store();
    let obj = store
        .write(|txn| {
            txn.create(
                "Mixed",
                [("a", Foreign::from(3.0)), ("b", 2.5.into()), ("c", Foreign::Integer(1 << 70))],
            )
        })
        .unwrap();

    assert_eq!(*store.get(&obj, "a").unwrap(), Mixed::Int(3));
    assert_eq!(*store.get(&obj, "b").unwrap(), Mixed::Double(2.5));
    assert_eq!(store.get(&obj, "c").unwrap().tag(), TypeTag::Double);
}

#[test]
fn typed_doubles_are_stored_as_doubles() {
    let store = single_store();
    let obj = store
        .write(|txn| {
            txn.create(
                "Mixed",
                [("a", Foreign::from(Mixed::Double(5.0))), ("b", Mixed::Double(-0.0).into())],
            )
        })
        .unwrap();
    store.write(|txn| txn.set(&obj, "c", Mixed::Double(7.0))).unwrap();

    assert_eq!(*store.get(&obj, "a").unwrap(), Mixed::Double(5.0));
    assert_ne!(*store.get(&obj, "a").unwrap(), Mixed::Int(5));
    let b = store.get(&obj, "b").unwrap();
    assert!(matches!(*b, Mixed::Double(f) if f.is_sign_negative()));
    assert_eq!(store.get(&obj, "c").unwrap().tag(), TypeTag::Double);
}

#[test]
fn int_and_double_of_same_value_differ() {
    assert_ne!(Mixed::Int(5), Mixed::Double(5.0));
    assert_eq!(Mixed::Double(-0.0), Mixed::Double(0.0));
    assert_ne!(Mixed::Double(f64::NAN), Mixed::Double(f64::NAN));
}

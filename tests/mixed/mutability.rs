//! Slot Mutability Tests
//!
//! One slot replaced across kinds, one transaction at a time:
//! ObjectId -> UUID -> Decimal128 -> 12345678 -> null -> undefined.
//! After each commit tag and display match the latest assignment.

use crate::common::*;
use mixcell::{Decimal128, Foreign, Mixed, ObjectId, TypeTag, Uuid};
use parking_lot::Mutex;
use std::sync::Arc;

#[test]
fn slot_follows_every_assignment() {
    let store = single_store();
    let d128 = Decimal128::parse_str("6.022e23").unwrap();
    let oid = ObjectId::new();
    let uuid = Uuid::new_v4();

    let data = store
        .write(|txn| txn.create("Mixed", [("a", Foreign::from(oid))]))
        .unwrap();
    let a = store.get(&data, "a").unwrap();
    assert_eq!(a.tag(), TypeTag::ObjectId);
    assert_eq!(a.to_string(), oid.to_string());

    store.write(|txn| txn.set(&data, "a", uuid)).unwrap();
    let a = store.get(&data, "a").unwrap();
    assert_eq!(a.tag(), TypeTag::Uuid);
    assert_eq!(a.to_string(), uuid.to_string());

    store.write(|txn| txn.set(&data, "a", d128)).unwrap();
    let a = store.get(&data, "a").unwrap();
    assert_eq!(a.tag(), TypeTag::Decimal128);
    assert_eq!(a.to_string(), d128.to_string());

    store.write(|txn| txn.set(&data, "a", 12345678)).unwrap();
    assert_eq!(*store.get(&data, "a").unwrap(), Mixed::Int(12345678));

    store.write(|txn| txn.set(&data, "a", Foreign::Null)).unwrap();
    assert_eq!(*store.get(&data, "a").unwrap(), Mixed::Null);

    store.write(|txn| txn.set(&data, "a", Foreign::Undefined)).unwrap();
    assert_eq!(*store.get(&data, "a").unwrap(), Mixed::Null);
}

#[test]
fn null_assignment_is_a_real_transition() {
    let store = single_store();
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    store.observe(move |notice| {
        sink.lock()
            .extend(notice.changes.iter().map(|c| (c.old_tag, c.new_tag)));
    });

    let data = store
        .write(|txn| txn.create("Mixed", [("a", Foreign::from("x"))]))
        .unwrap();
    store.write(|txn| txn.set(&data, "a", Foreign::Null)).unwrap();
    // Writing null over null is still recorded
    store.write(|txn| txn.set(&data, "a", None::<i64>)).unwrap();

    assert_eq!(
        *changes.lock(),
        vec![
            (TypeTag::Null, TypeTag::String),
            (TypeTag::String, TypeTag::Null),
            (TypeTag::Null, TypeTag::Null),
        ]
    );
}

#[test]
fn readers_never_see_intermediate_state() {
    let store = single_store();
    let data = store
        .write(|txn| txn.create("Mixed", [("a", Foreign::from(1))]))
        .unwrap();
    let before = store.snapshot();

    store
        .write(|txn| {
            txn.set(&data, "a", "two")?;
            txn.set(&data, "a", 3.5)?;
            // Committed readers still see the old cell mid-transaction
            assert_eq!(*store.get(&data, "a")?, Mixed::Int(1));
            Ok(())
        })
        .unwrap();

    assert_eq!(*before.record(&data).unwrap().get("a"), Mixed::Int(1));
    assert_eq!(*store.get(&data, "a").unwrap(), Mixed::Double(3.5));
}

#[test]
fn repeated_replacement_yields_one_change_record() {
    let store = single_store();
    let data = store
        .write(|txn| txn.create("Mixed", [("a", Foreign::from(true))]))
        .unwrap();

    let records = store
        .write(|txn| {
            txn.set(&data, "a", "two")?;
            txn.set(&data, "a", 3)?;
            Ok(txn.mutations().records().to_vec())
        })
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].old_tag, TypeTag::Bool);
    assert_eq!(records[0].new_tag, TypeTag::Int64);
    assert_eq!(records[0].slot.property, "a");
}

//! Unsupported Input Tests
//!
//! Anything outside the closed set of kinds is rejected with an error
//! naming its type, and the enclosing write transaction is aborted.

use crate::common::*;
use mixcell::{from_foreign, EngineError, Error, Foreign, Mixed};

#[test]
fn plain_object_is_rejected_with_its_type_name() {
    let store = single_store();
    let err = store
        .write(|txn| txn.create("Mixed", [("a", Foreign::object("Object"))]))
        .unwrap_err();

    assert_eq!(err.to_string(), "Mixed conversion not possible for type: Object");
    assert_eq!(err, EngineError::Cell(Error::unsupported("Object")));
    assert_eq!(store.count("Mixed").unwrap(), 0);
}

#[test]
fn rejection_aborts_earlier_writes_in_the_transaction() {
    let store = single_store();
    let data = store
        .write(|txn| txn.create("Mixed", [("a", Foreign::from(1))]))
        .unwrap();

    let result = store.write(|txn| {
        txn.set(&data, "a", "changed")?;
        txn.set(&data, "b", Foreign::Array(vec![Foreign::from(1)]))
    });

    assert_eq!(result, Err(EngineError::Cell(Error::unsupported("Array"))));
    assert_eq!(*store.get(&data, "a").unwrap(), Mixed::Int(1));
    assert!(store.get(&data, "b").unwrap().is_null());
}

#[test]
fn rejection_names_host_types() {
    for name in ["Object", "Map", "Set", "Function"] {
        let err = from_foreign(Foreign::object(name)).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Mixed conversion not possible for type: {}", name)
        );
    }
}

#[test]
fn malformed_typed_literals_are_rejected() {
    assert!(matches!(
        from_foreign(Foreign::ObjectIdLiteral("not-hex".into())),
        Err(Error::InvalidLiteral { .. })
    ));
    assert!(matches!(
        from_foreign(Foreign::UuidLiteral("1234".into())),
        Err(Error::InvalidLiteral { .. })
    ));
    assert!(matches!(
        from_foreign(Foreign::DecimalLiteral("1.2.3".into())),
        Err(Error::InvalidLiteral { .. })
    ));
}

#[test]
fn text_is_never_reinterpreted() {
    // A 24-hex string stays a string; only typed literals become ObjectIds
    let cell = from_foreign("507f1f77bcf86cd799439011").unwrap();
    assert_eq!(cell, Mixed::from("507f1f77bcf86cd799439011"));
}

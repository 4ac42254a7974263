//! Sync Convergence Tests
//!
//! - Uploaded cells survive a round trip through the server with their kinds
//! - A fresh replica rebuilds the data set from the server
//! - Concurrent writes to one slot converge on every replica

use crate::common::*;
use mixcell::{
    Foreign, LogicalClock, LogicalVersion, MixcellConfig, Mixed, ObjectId, ObjectRef, Replica,
    SyncServer, TypeTag, Uuid,
};
use proptest::prelude::*;
use std::sync::Arc;

fn replica_starting_at(name: &str, version: u64) -> Replica {
    init_tracing();
    Replica::open_with_clock(
        MixcellConfig::for_replica(name),
        [mixed_object_schema()],
        Arc::new(LogicalClock::starting_at(LogicalVersion::new(version))),
    )
    .unwrap()
}

// ============================================================================
// Round trip through the server
// ============================================================================

#[test]
fn fresh_replica_downloads_typed_cells() {
    let server = SyncServer::new();
    let realm = replica("device");

    realm.store().write(|txn| txn.delete_all()).unwrap();
    realm
        .store()
        .write(|txn| {
            txn.create(
                "MixedObject",
                [("_id", Foreign::from(ObjectId::new())), ("key", "1".into()), ("value", 1.into())],
            )?;
            txn.create(
                "MixedObject",
                [("_id", Foreign::from(ObjectId::new())), ("key", "2".into()), ("value", "2".into())],
            )?;
            txn.create(
                "MixedObject",
                [("_id", Foreign::from(ObjectId::new())), ("key", "3".into()), ("value", 3.0.into())],
            )?;
            txn.create(
                "MixedObject",
                [("_id", Foreign::from(ObjectId::new())), ("key", "4".into()), ("value", Uuid::new_v4().into())],
            )?;
            Ok(())
        })
        .unwrap();

    assert_eq!(realm.upload_all_local_changes(&server).unwrap(), 12);
    assert_eq!(realm.store().count("MixedObject").unwrap(), 4);
    drop(realm);

    // Local data is gone; a new replica starts empty
    let realm2 = replica("device");
    assert_eq!(realm2.store().count("MixedObject").unwrap(), 0);
    realm2.download_all_server_changes(&server).unwrap();

    let objects = realm2.store().sorted_by("MixedObject", "key").unwrap();
    assert_eq!(objects.len(), 4);
    assert_eq!(objects[0].get("value").tag(), TypeTag::Int64);
    assert_eq!(objects[1].get("value").tag(), TypeTag::String);
    assert_eq!(objects[2].get("value").tag(), TypeTag::Int64);
    assert_eq!(objects[3].get("value").tag(), TypeTag::Uuid);
    assert_eq!(*objects[0].get("value"), Mixed::Int(1));
    assert_eq!(*objects[1].get("value"), Mixed::from("2"));
}

#[test]
fn doubles_stay_doubles_through_sync() {
    let server = SyncServer::new();
    let a = replica("A");
    a.store()
        .write(|txn| txn.create("MixedObject", [("_id", Foreign::from(1)), ("value", 2.5.into())]))
        .unwrap();
    a.upload_all_local_changes(&server).unwrap();

    let b = replica("B");
    b.download_all_server_changes(&server).unwrap();
    let obj = ObjectRef::new("MixedObject", &Mixed::Int(1));
    assert_eq!(*b.store().get(&obj, "value").unwrap(), Mixed::Double(2.5));
}

// ============================================================================
// Concurrent writes
// ============================================================================

#[test]
fn later_version_wins_on_both_replicas() {
    // R1 writes `a = 1` at v3; R2 concurrently writes `a = "two"` at v4
    let server = SyncServer::new();
    let r1 = replica_starting_at("R1", 1);
    let r2 = replica_starting_at("R2", 2);
    let obj = ObjectRef::new("MixedObject", &Mixed::Int(1));

    for r in [&r1, &r2] {
        r.store()
            .write(|txn| txn.create("MixedObject", [("_id", Foreign::from(1))]))
            .unwrap();
    }
    r1.store().write(|txn| txn.set(&obj, "value", 1)).unwrap();
    r2.store().write(|txn| txn.set(&obj, "value", "two")).unwrap();
    assert_eq!(r1.current_logical_version(), LogicalVersion::new(3));
    assert_eq!(r2.current_logical_version(), LogicalVersion::new(4));

    r1.upload_all_local_changes(&server).unwrap();
    r2.upload_all_local_changes(&server).unwrap();
    r1.download_all_server_changes(&server).unwrap();
    r2.download_all_server_changes(&server).unwrap();

    for r in [&r1, &r2] {
        let view = r.store().find("MixedObject", &Mixed::Int(1)).unwrap().unwrap();
        assert_eq!(*view.get("value"), Mixed::from("two"));
        assert_eq!(view.version_of("value"), LogicalVersion::new(4));
    }
}

#[test]
fn equal_versions_break_ties_the_same_way_everywhere() {
    let server = SyncServer::new();
    let r1 = replica("R1");
    let r2 = replica("R2");
    let obj = ObjectRef::new("MixedObject", &Mixed::Int(1));

    // Both stamp their only write with v1
    r1.store()
        .write(|txn| txn.create("MixedObject", [("_id", Foreign::from(1)), ("value", 100.into())]))
        .unwrap();
    r2.store()
        .write(|txn| txn.create("MixedObject", [("_id", Foreign::from(1)), ("value", "a".into())]))
        .unwrap();

    r1.upload_all_local_changes(&server).unwrap();
    r2.upload_all_local_changes(&server).unwrap();
    r1.download_all_server_changes(&server).unwrap();
    r2.download_all_server_changes(&server).unwrap();

    // String (tag 0x04) sorts above Int64 (tag 0x02)
    assert_eq!(*r1.store().get(&obj, "value").unwrap(), Mixed::from("a"));
    assert_eq!(*r2.store().get(&obj, "value").unwrap(), Mixed::from("a"));
}

#[test]
fn write_after_sync_beats_earlier_remote_write() {
    let server = SyncServer::new();
    let r1 = replica_starting_at("R1", 50);
    let r2 = replica("R2");
    let obj = ObjectRef::new("MixedObject", &Mixed::Int(1));

    r1.store()
        .write(|txn| txn.create("MixedObject", [("_id", Foreign::from(1)), ("value", 1.into())]))
        .unwrap();
    r1.upload_all_local_changes(&server).unwrap();
    r2.download_all_server_changes(&server).unwrap();

    // R2's clock has observed v51, so this write is stamped higher
    r2.store().write(|txn| txn.set(&obj, "value", "late")).unwrap();
    r2.upload_all_local_changes(&server).unwrap();
    r1.download_all_server_changes(&server).unwrap();

    assert_eq!(*r1.store().get(&obj, "value").unwrap(), Mixed::from("late"));
}

// ============================================================================
// Property: any interleaving converges
// ============================================================================

fn arb_value() -> impl Strategy<Value = Foreign> {
    prop_oneof![
        Just(Foreign::Null),
        any::<bool>().prop_map(Foreign::from),
        any::<i64>().prop_map(Foreign::from),
        (-1e6f64..1e6).prop_map(Foreign::from),
        "[a-z]{0,6}".prop_map(Foreign::from),
        any::<u128>().prop_map(|u| Foreign::from(Uuid::from_u128(u))),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn replicas_converge(writes in proptest::collection::vec((0usize..3, arb_value()), 1..12)) {
        let server = SyncServer::new();
        let replicas: Vec<Replica> = (0..3).map(|i| replica(&format!("R{}", i))).collect();
        let obj = ObjectRef::new("MixedObject", &Mixed::Int(1));
        for r in &replicas {
            r.store()
                .write(|txn| txn.create("MixedObject", [("_id", Foreign::from(1))]))
                .unwrap();
        }

        for (i, value) in writes {
            replicas[i].store().write(|txn| txn.set(&obj, "value", value)).unwrap();
        }

        for r in &replicas {
            r.upload_all_local_changes(&server).unwrap();
        }
        for r in &replicas {
            r.download_all_server_changes(&server).unwrap();
        }

        let first = replicas[0].store().find("MixedObject", &Mixed::Int(1)).unwrap().unwrap();
        for r in &replicas[1..] {
            let view = r.store().find("MixedObject", &Mixed::Int(1)).unwrap().unwrap();
            prop_assert_eq!(view.version_of("value"), first.version_of("value"));
            prop_assert_eq!(
                view.get("value").canonical_cmp(&first.get("value")),
                std::cmp::Ordering::Equal
            );
        }
    }
}

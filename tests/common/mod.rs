//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use mixcell::{MixcellConfig, ObjectSchema, Replica, Store};
use std::sync::Once;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Install a test-friendly subscriber once per test binary.
///
/// Filtered by `MIXCELL_LOG` (default `warn`); output goes through the test
/// harness so it only shows for failing tests.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let filter =
            EnvFilter::try_from_env("MIXCELL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// Schemas
// ============================================================================

/// Four free-form mixed slots, no primary key.
pub fn single_schema() -> ObjectSchema {
    ObjectSchema::new("Mixed", ["a", "b", "c", "d"])
}

/// Keyed object used by the sync suites.
pub fn mixed_object_schema() -> ObjectSchema {
    ObjectSchema::new("MixedObject", ["_id", "key", "value"]).with_primary_key("_id")
}

// ============================================================================
// Stores
// ============================================================================

/// Fresh in-memory store with the single schema.
pub fn single_store() -> Store {
    init_tracing();
    Store::open(MixcellConfig::for_replica("local"), [single_schema()])
        .expect("open store")
}

/// Fresh sync replica with the keyed schema.
pub fn replica(name: &str) -> Replica {
    init_tracing();
    Replica::open(MixcellConfig::for_replica(name), [mixed_object_schema()])
        .expect("open replica")
}

//! mixcell - typed mixed-value cells with last-writer-wins sync
//!
//! A property declared as "mixed" holds exactly one value of any supported
//! kind per slot. mixcell provides the cell type, validating coercion from
//! host values, change tracking per commit, and convergent sync between
//! replicas.
//!
//! # Quick Start
//!
//! ```ignore
//! use mixcell::{Foreign, Mixed, MixcellConfig, ObjectSchema, Store};
//!
//! let store = Store::open(
//!     MixcellConfig::for_replica("local"),
//!     [ObjectSchema::new("Mixed", ["a", "b"])],
//! )?;
//!
//! let obj = store.write(|txn| txn.create("Mixed", [("a", Foreign::from(1))]))?;
//! store.write(|txn| txn.set(&obj, "a", "now a string"))?;
//! assert_eq!(*store.get(&obj, "a")?, Mixed::from("now a string"));
//! ```
//!
//! # Architecture
//!
//! - `mixcell-core`: cells, type tags, encoding, coercion
//! - `mixcell-concurrency`: logical versions, Lamport clock, conflict resolution
//! - `mixcell-engine`: store, transactions, mutation log, replicas and sync

pub use mixcell_core::{
    encoding, json, Coercer, Date, Decimal128, Error, Foreign, IdSource, LimitError, Limits,
    Mixed, ObjectId, ParseDecimalError, ParseObjectIdError, SystemIds, TypeTag, Uuid,
};
pub use mixcell_core::from_foreign;

pub use mixcell_concurrency::{
    merge, ConflictResolver, LastWriterWins, LogicalClock, LogicalVersion, ReplicaId, Resolution,
    VersionSource, Versioned, VersionedCell,
};

pub use mixcell_engine::*;

//! Host object store and sync for mixcell
//!
//! This crate puts mixed cells to work:
//! - Store: schema-declared records of mixed slots, closure write transactions
//! - WriteTransaction: coerce-then-replace mutations with read-your-writes
//! - MutationLog / ChangeRecord: per-slot change tracking and commit notices
//! - MixcellConfig: `mixcell.toml` configuration
//! - Replica / SyncServer / Changeset: Lamport-stamped sync with LWW merge

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod database;
pub mod error;
pub mod mutation;
pub mod record;
pub mod schema;
pub mod sync;
pub mod transaction;

pub use database::config::{MixcellConfig, CONFIG_FILE_NAME};
pub use database::{ObjectView, ObserverId, Store};
pub use error::{EngineError, Result};
pub use mutation::{ChangeRecord, CommitNotice, MutationLog, Origin};
pub use record::{FieldSlot, ObjectRef, Record, RecordKey, SlotRef, Snapshot};
pub use schema::{ObjectSchema, SchemaSet};
pub use sync::{ChangeEntry, Changeset, IntegrationSummary, Replica, SyncServer};
pub use transaction::WriteTransaction;

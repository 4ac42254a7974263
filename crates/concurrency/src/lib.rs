//! Versioning and conflict resolution for mixcell
//!
//! - LogicalVersion / ReplicaId: ordering and identity of writes
//! - Versioned: a cell paired with the version that wrote it
//! - LogicalClock: Lamport clock implementing `VersionSource`
//! - ConflictResolver: last-writer-wins merge of concurrent slot writes

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod resolver;
pub mod version;
pub mod versioned;

pub use clock::{LogicalClock, VersionSource};
pub use resolver::{merge, ConflictResolver, LastWriterWins, Resolution};
pub use version::{LogicalVersion, ReplicaId};
pub use versioned::{Versioned, VersionedCell};

//! Lamport clock handing out logical versions
//!
//! One clock per replica. Local writes take `next_logical_version`; every
//! version seen from a peer goes through `observe`, which keeps the clock
//! at or above anything it has seen. A write made after integrating a
//! peer's changes therefore always outranks them.

use crate::version::{LogicalVersion, ReplicaId};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of logical versions consumed by the sync layer
pub trait VersionSource: Send + Sync {
    /// Highest version this source has issued or observed for `replica`
    fn current_logical_version(&self, replica: &ReplicaId) -> LogicalVersion;

    /// Allocate the next version for a write made by `replica`
    fn next_logical_version(&self, replica: &ReplicaId) -> LogicalVersion;

    /// Record a version seen from `replica`
    fn observe(&self, replica: &ReplicaId, version: LogicalVersion);
}

/// Lamport clock with per-replica high-water marks
///
/// The global counter orders writes; the per-replica map is bookkeeping
/// for `current_logical_version` and for diagnostics.
#[derive(Debug, Default)]
pub struct LogicalClock {
    counter: AtomicU64,
    seen: DashMap<ReplicaId, LogicalVersion>,
}

impl LogicalClock {
    /// Clock starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock resuming from a known version
    pub fn starting_at(version: LogicalVersion) -> Self {
        LogicalClock {
            counter: AtomicU64::new(version.as_u64()),
            seen: DashMap::new(),
        }
    }

    /// Highest version issued or observed from any replica
    pub fn now(&self) -> LogicalVersion {
        LogicalVersion::new(self.counter.load(Ordering::Acquire))
    }

    fn bump_seen(&self, replica: &ReplicaId, version: LogicalVersion) {
        let mut entry = self.seen.entry(replica.clone()).or_insert(LogicalVersion::ZERO);
        if version > *entry {
            *entry = version;
        }
    }
}

impl VersionSource for LogicalClock {
    fn current_logical_version(&self, replica: &ReplicaId) -> LogicalVersion {
        self.seen
            .get(replica)
            .map(|v| *v)
            .unwrap_or(LogicalVersion::ZERO)
    }

    fn next_logical_version(&self, replica: &ReplicaId) -> LogicalVersion {
        let raw = self
            .counter
            .fetch_add(1, Ordering::AcqRel)
            .saturating_add(1);
        let version = LogicalVersion::new(raw);
        self.bump_seen(replica, version);
        version
    }

    fn observe(&self, replica: &ReplicaId, version: LogicalVersion) {
        self.counter.fetch_max(version.as_u64(), Ordering::AcqRel);
        self.bump_seen(replica, version);
    }
}

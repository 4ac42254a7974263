//! Logical versions and replica identity
//!
//! Every committed slot write carries a `LogicalVersion`. Versions from
//! different replicas are comparable: they come from Lamport clocks, so a
//! write that causally follows another always has a higher version.
//! Concurrent writes may share a version; the resolver breaks those ties
//! without looking at which replica wrote them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonically comparable marker ordering writes across replicas
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LogicalVersion(u64);

impl LogicalVersion {
    /// Version of a slot nobody has written
    pub const ZERO: LogicalVersion = LogicalVersion(0);

    /// Wrap a raw counter value
    #[inline]
    pub const fn new(v: u64) -> Self {
        LogicalVersion(v)
    }

    /// Raw counter value
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Next version (saturating)
    pub const fn next(&self) -> Self {
        LogicalVersion(self.0.saturating_add(1))
    }

    /// Check if this version is zero
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for LogicalVersion {
    fn default() -> Self {
        LogicalVersion::ZERO
    }
}

impl From<u64> for LogicalVersion {
    fn from(v: u64) -> Self {
        LogicalVersion(v)
    }
}

impl fmt::Display for LogicalVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Identity of one replica (device) taking part in sync
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReplicaId(String);

impl ReplicaId {
    /// Replica id from a configured name
    pub fn new(name: impl Into<String>) -> Self {
        ReplicaId(name.into())
    }

    /// Fresh random replica id (UUID v4 text)
    pub fn random() -> Self {
        ReplicaId(uuid::Uuid::new_v4().to_string())
    }

    /// The id as text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReplicaId {
    fn from(s: &str) -> Self {
        ReplicaId::new(s)
    }
}

//! In-memory sync server
//!
//! Holds the merged `(cell, version)` pair of every slot any replica has
//! uploaded. Uploads are merged with the same resolver replicas use, so the
//! server converges to the state every replica reaches after downloading.

use super::changeset::{ChangeEntry, Changeset};
use crate::error::Result;
use crate::record::RecordKey;
use mixcell_concurrency::{ConflictResolver, LastWriterWins, ReplicaId, Resolution};
use mixcell_core::Limits;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

type SlotKey = (String, RecordKey, String);

/// Server-side merged slot state
pub struct SyncServer {
    id: ReplicaId,
    limits: Limits,
    resolver: Arc<dyn ConflictResolver>,
    slots: RwLock<BTreeMap<SlotKey, ChangeEntry>>,
}

impl Default for SyncServer {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncServer {
    /// Server with last-writer-wins merging and default limits
    pub fn new() -> Self {
        SyncServer {
            id: ReplicaId::new("server"),
            limits: Limits::default(),
            resolver: Arc::new(LastWriterWins),
            slots: RwLock::new(BTreeMap::new()),
        }
    }

    /// Use `limits` when decoding uploads
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Decode and merge an uploaded changeset; returns slots changed
    pub fn receive(&self, bytes: &[u8]) -> Result<usize> {
        let changeset = Changeset::decode(bytes, &self.limits)?;
        let origin = changeset.origin.clone();
        let received = changeset.len();
        let changed = self.merge(changeset);
        info!(
            target: "mixcell::sync",
            origin = %origin,
            received,
            changed,
            "Server merged upload"
        );
        Ok(changed)
    }

    /// Merge a decoded changeset; returns slots changed
    pub fn merge(&self, changeset: Changeset) -> usize {
        let mut slots = self.slots.write();
        let mut changed = 0;
        for entry in changeset.entries {
            let key = (
                entry.object_type.clone(),
                RecordKey::from_cell(&entry.key),
                entry.property.clone(),
            );
            match slots.get_mut(&key) {
                Some(current) => {
                    if self.resolver.resolve(&current.cell, &entry.cell) == Resolution::TakeRemote {
                        *current = entry;
                        changed += 1;
                    }
                }
                None => {
                    slots.insert(key, entry);
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Every merged slot as one changeset
    pub fn changeset(&self) -> Changeset {
        Changeset {
            origin: self.id.clone(),
            entries: self.slots.read().values().cloned().collect(),
        }
    }

    /// Encoded form of `changeset()`
    pub fn download(&self) -> Result<Vec<u8>> {
        self.changeset().encode()
    }

    /// Number of slots held
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// Whether nothing was uploaded yet
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

//! Mutation log and change records
//!
//! Each write transaction keeps a `MutationLog` of slot replacements. It is
//! coalesced per slot: replacing the same slot twice in one transaction
//! yields one record carrying the tag before the transaction and the final
//! cell. On commit the records are published to observers and, on sync
//! replicas, queued for upload. On abort the log is dropped with the rest
//! of the transaction.

use crate::record::{FieldSlot, ObjectRef, SlotRef};
use mixcell_concurrency::{LogicalVersion, ReplicaId};
use mixcell_core::{Mixed, TypeTag};
use std::collections::HashMap;
use std::sync::Arc;

/// Where a replacement came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// A write made through this store
    Local,
    /// A peer's write integrated by sync
    Remote,
}

/// One committed slot replacement
#[derive(Debug, Clone)]
pub struct ChangeRecord {
    /// Replaced slot
    pub slot: SlotRef,
    /// Tag held before the transaction
    pub old_tag: TypeTag,
    /// Tag held after it
    pub new_tag: TypeTag,
    /// The new cell
    pub cell: Arc<Mixed>,
    /// Version the new cell was written at
    pub version: LogicalVersion,
    /// Local write or integrated remote write
    pub origin: Origin,
}

impl ChangeRecord {
    /// Whether the replacement changed the slot's kind
    pub fn changed_tag(&self) -> bool {
        self.old_tag != self.new_tag
    }
}

/// Everything a single commit changed
#[derive(Debug, Clone)]
pub struct CommitNotice {
    /// Replica that ran the transaction
    pub replica: ReplicaId,
    /// Snapshot version after the commit
    pub version: LogicalVersion,
    /// Slot replacements in the order they were first made
    pub changes: Vec<ChangeRecord>,
    /// Objects deleted by the transaction
    pub deleted: Vec<ObjectRef>,
}

/// Pending replacements of one write transaction
#[derive(Debug, Default)]
pub struct MutationLog {
    records: Vec<ChangeRecord>,
    index: HashMap<SlotRef, usize>,
    deleted: Vec<ObjectRef>,
}

impl MutationLog {
    /// Empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `slot` went from `old` to `new`
    pub fn record(&mut self, slot: SlotRef, old: &FieldSlot, new: &FieldSlot, origin: Origin) {
        if let Some(&i) = self.index.get(&slot) {
            let entry = &mut self.records[i];
            entry.new_tag = new.cell().tag();
            entry.cell = Arc::clone(new.cell());
            entry.version = new.version();
            entry.origin = origin;
            return;
        }
        self.index.insert(slot.clone(), self.records.len());
        self.records.push(ChangeRecord {
            slot,
            old_tag: old.cell().tag(),
            new_tag: new.cell().tag(),
            cell: Arc::clone(new.cell()),
            version: new.version(),
            origin,
        });
    }

    /// Record a deletion; pending replacements on the object are dropped
    pub fn record_delete(&mut self, object: ObjectRef) {
        if self.records.iter().any(|r| r.slot.object == object) {
            self.records.retain(|r| r.slot.object != object);
            self.index = self
                .records
                .iter()
                .enumerate()
                .map(|(i, r)| (r.slot.clone(), i))
                .collect();
        }
        self.deleted.push(object);
    }

    /// Pending replacements
    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    /// Pending deletions
    pub fn deleted(&self) -> &[ObjectRef] {
        &self.deleted
    }

    /// Number of pending replacements
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the transaction changed nothing
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.deleted.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<ChangeRecord>, Vec<ObjectRef>) {
        (self.records, self.deleted)
    }
}

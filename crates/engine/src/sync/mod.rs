//! Replica sync
//!
//! A `Replica` is a store whose local commits are stamped by a Lamport
//! clock and queued for upload. Sync is a two-step exchange with a server:
//!
//! 1. `upload_all_local_changes`: drain the queue into a changeset and
//!    send it; the server merges it into its slot state.
//! 2. `download_all_server_changes`: fetch the server's merged state and
//!    integrate it, merging every slot through the conflict resolver.
//!
//! After both replicas have uploaded and downloaded, every slot holds the
//! same `(cell, version)` pair on both. Object deletion stays local.

pub mod changeset;
pub mod server;

pub use changeset::{ChangeEntry, Changeset};
pub use server::SyncServer;

use crate::database::config::MixcellConfig;
use crate::database::Store;
use crate::error::Result;
use crate::mutation::{ChangeRecord, Origin};
use crate::record::SlotRef;
use crate::schema::ObjectSchema;
use mixcell_concurrency::{
    ConflictResolver, LastWriterWins, LogicalClock, LogicalVersion, ReplicaId, Resolution,
    VersionSource, VersionedCell,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of integrating one changeset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegrationSummary {
    /// Slots replaced by the incoming pair
    pub applied: usize,
    /// Slots where the local pair won
    pub kept_local: usize,
    /// Slots already holding the incoming pair
    pub identical: usize,
}

/// A store taking part in sync
pub struct Replica {
    store: Store,
    resolver: Arc<dyn ConflictResolver>,
}

impl std::fmt::Debug for Replica {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Replica")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl Replica {
    /// Open a replica with its own Lamport clock
    pub fn open(config: MixcellConfig, schemas: impl IntoIterator<Item = ObjectSchema>) -> Result<Self> {
        Self::open_with_clock(config, schemas, Arc::new(LogicalClock::new()))
    }

    /// Open a replica drawing versions from `clock`
    pub fn open_with_clock(
        config: MixcellConfig,
        schemas: impl IntoIterator<Item = ObjectSchema>,
        clock: Arc<dyn VersionSource>,
    ) -> Result<Self> {
        Ok(Replica {
            store: Store::open_inner(config, schemas, clock, true)?,
            resolver: Arc::new(LastWriterWins),
        })
    }

    /// Merge with `resolver` instead of last-writer-wins
    pub fn with_resolver(mut self, resolver: Arc<dyn ConflictResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// The underlying store, for reads and local writes
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// This replica's id
    pub fn id(&self) -> &ReplicaId {
        self.store.replica_id()
    }

    /// Highest version this replica has stamped
    pub fn current_logical_version(&self) -> LogicalVersion {
        self.store.clock().current_logical_version(self.id())
    }

    /// Drain queued local writes into a changeset
    ///
    /// The caller owns delivery: entries are no longer queued afterwards.
    pub fn upload(&self) -> Result<Changeset> {
        let records = self.store.take_outbox();
        match self.build_changeset(&records) {
            Ok(changeset) => Ok(changeset),
            Err(e) => {
                self.store.requeue_outbox(records);
                Err(e)
            }
        }
    }

    /// Merge a peer's changeset into the local store
    pub fn integrate(&self, changeset: &Changeset) -> Result<IntegrationSummary> {
        let clock = self.store.clock();
        for entry in &changeset.entries {
            clock.observe(&changeset.origin, entry.cell.version);
        }

        let resolver = Arc::clone(&self.resolver);
        let summary = self.store.run_write(Origin::Remote, |txn| {
            let mut summary = IntegrationSummary::default();
            for entry in &changeset.entries {
                let resolution = txn.apply_remote(
                    &entry.object_type,
                    &entry.key,
                    &entry.property,
                    &entry.cell,
                    resolver.as_ref(),
                )?;
                match resolution {
                    Resolution::TakeRemote => summary.applied += 1,
                    Resolution::KeepLocal => summary.kept_local += 1,
                    Resolution::Identical => summary.identical += 1,
                }
            }
            Ok(summary)
        })?;

        info!(
            target: "mixcell::sync",
            replica = %self.id(),
            origin = %changeset.origin,
            applied = summary.applied,
            kept_local = summary.kept_local,
            identical = summary.identical,
            "Integrated changeset"
        );
        Ok(summary)
    }

    /// Send every queued local write to `server`; returns entries sent
    pub fn upload_all_local_changes(&self, server: &SyncServer) -> Result<usize> {
        let records = self.store.take_outbox();
        let sent = self
            .build_changeset(&records)
            .and_then(|cs| Ok((cs.len(), cs.encode()?)))
            .and_then(|(len, bytes)| server.receive(&bytes).map(|_| len));
        match sent {
            Ok(len) => {
                info!(target: "mixcell::sync", replica = %self.id(), entries = len, "Uploaded local changes");
                Ok(len)
            }
            Err(e) => {
                self.store.requeue_outbox(records);
                Err(e)
            }
        }
    }

    /// Fetch and integrate the server's merged state
    pub fn download_all_server_changes(&self, server: &SyncServer) -> Result<IntegrationSummary> {
        let bytes = server.download()?;
        let changeset = Changeset::decode(&bytes, &self.store.config().limits)?;
        self.integrate(&changeset)
    }

    fn build_changeset(&self, records: &[ChangeRecord]) -> Result<Changeset> {
        let snapshot = self.store.snapshot();
        let mut latest: BTreeMap<&SlotRef, &ChangeRecord> = BTreeMap::new();
        for record in records {
            latest.insert(&record.slot, record);
        }

        let mut changeset = Changeset::new(self.id().clone());
        for (slot, record) in latest {
            let Some(object) = snapshot.record(&slot.object) else {
                debug!(target: "mixcell::sync", slot = %slot, "Skipping write to deleted object");
                continue;
            };
            changeset.entries.push(ChangeEntry {
                object_type: slot.object.object_type.clone(),
                key: Arc::clone(object.key()),
                property: slot.property.clone(),
                cell: VersionedCell::new(Arc::clone(&record.cell), record.version),
            });
        }
        Ok(changeset)
    }
}

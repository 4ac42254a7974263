//! Host object store
//!
//! The store holds records of schema-declared types whose properties are
//! mixed slots. Writes happen only inside `Store::write`, one writer at a
//! time; reads go against the last committed snapshot and need no
//! transaction.
//!
//! # Commit protocol
//!
//! 1. Take the writer lock and copy the committed snapshot.
//! 2. Run the caller's closure against the copy.
//! 3. On `Ok`, publish the copy as the new committed snapshot and queue its
//!    notice, both under the writer lock.
//! 4. On `Err`, drop the copy. Nothing the closure did is visible.
//!
//! Observers run outside the writer lock. Notices are queued in commit
//! order and one thread at a time drains the queue, so observers see
//! commits in version order even when writers race. A notice may be
//! delivered by another writer's thread after its own `write` returned.

pub mod config;

use crate::error::{EngineError, Result};
use crate::mutation::{ChangeRecord, CommitNotice, Origin};
use crate::record::{sort_order, ObjectRef, Record, Snapshot};
use crate::schema::{ObjectSchema, SchemaSet};
use crate::transaction::WriteTransaction;
use config::{MixcellConfig, CONFIG_FILE_NAME};
use mixcell_concurrency::{LogicalClock, LogicalVersion, ReplicaId, VersionSource};
use mixcell_core::{Coercer, IdSource, Mixed};
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

type Observer = Arc<dyn Fn(&CommitNotice) + Send + Sync>;

/// Handle returned by `Store::observe`, used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

pub(crate) struct StoreInner {
    pub(crate) config: MixcellConfig,
    pub(crate) schemas: SchemaSet,
    pub(crate) coercer: Coercer,
    pub(crate) replica: ReplicaId,
    pub(crate) clock: Arc<dyn VersionSource>,
    committed: RwLock<Arc<Snapshot>>,
    writer: Mutex<()>,
    outbox: Option<Mutex<Vec<ChangeRecord>>>,
    observers: RwLock<Vec<(ObserverId, Observer)>>,
    next_observer: AtomicU64,
    notices: Mutex<VecDeque<CommitNotice>>,
    dispatch: Mutex<()>,
}

/// Object store with mixed-slot records
///
/// Cheap to clone; clones share the same data.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("replica", &self.inner.replica)
            .field("version", &self.snapshot().version())
            .finish_non_exhaustive()
    }
}

/// Committed view of one object
#[derive(Debug, Clone)]
pub struct ObjectView {
    object: ObjectRef,
    record: Record,
}

impl ObjectView {
    /// Handle for use in write transactions
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// Key cell (primary key value or generated id)
    pub fn key(&self) -> &Arc<Mixed> {
        self.record.key()
    }

    /// Cell in `property` (`Null` when never written)
    pub fn get(&self, property: &str) -> Arc<Mixed> {
        self.record.get(property)
    }

    /// Version of the write that produced `property`'s cell
    pub fn version_of(&self, property: &str) -> LogicalVersion {
        self.record.slot(property).version()
    }
}

impl Store {
    /// Open an in-memory store
    pub fn open(config: MixcellConfig, schemas: impl IntoIterator<Item = ObjectSchema>) -> Result<Self> {
        let clock: Arc<dyn VersionSource> = Arc::new(LogicalClock::new());
        Self::open_inner(config, schemas, clock, false)
    }

    /// Open a store configured by `mixcell.toml` in `dir`
    ///
    /// The directory is created if needed, and a default config file is
    /// written on first open.
    pub fn open_dir<P: AsRef<Path>>(dir: P, schemas: impl IntoIterator<Item = ObjectSchema>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| {
            EngineError::Config(format!("Failed to create '{}': {}", dir.display(), e))
        })?;
        let config_path = dir.join(CONFIG_FILE_NAME);
        MixcellConfig::write_default_if_missing(&config_path)?;
        let config = MixcellConfig::from_file(&config_path)?;
        Self::open(config, schemas)
    }

    pub(crate) fn open_inner(
        config: MixcellConfig,
        schemas: impl IntoIterator<Item = ObjectSchema>,
        clock: Arc<dyn VersionSource>,
        track_outbox: bool,
    ) -> Result<Self> {
        config.validate()?;
        let schemas = SchemaSet::new(schemas)?;
        let replica = config.resolve_replica_id();
        let coercer = Coercer::new(config.limits);

        info!(
            target: "mixcell::store",
            replica = %replica,
            types = schemas.type_names().count(),
            sync = track_outbox,
            "Opened store"
        );

        Ok(Store {
            inner: Arc::new(StoreInner {
                config,
                schemas,
                coercer,
                replica,
                clock,
                committed: RwLock::new(Arc::new(Snapshot::default())),
                writer: Mutex::new(()),
                outbox: track_outbox.then(|| Mutex::new(Vec::new())),
                observers: RwLock::new(Vec::new()),
                next_observer: AtomicU64::new(1),
                notices: Mutex::new(VecDeque::new()),
                dispatch: Mutex::new(()),
            }),
        })
    }

    /// Replace the id source used for generated keys and `NewObjectId` /
    /// `NewUuid` values. Only valid before the store is shared.
    pub fn with_id_source(mut self, ids: Arc<dyn IdSource>) -> Result<Self> {
        match Arc::get_mut(&mut self.inner) {
            Some(inner) => {
                inner.coercer = inner.coercer.clone().with_id_source(ids);
                Ok(self)
            }
            None => Err(EngineError::Config(
                "id source must be set before the store is shared".into(),
            )),
        }
    }

    /// Run `f` in a write transaction
    ///
    /// Commits when `f` returns `Ok`, aborts when it returns `Err`. Writes
    /// are serialized; calling `write` from inside `f` deadlocks. An
    /// observer may write; its notice is delivered after the current one.
    pub fn write<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut WriteTransaction<'_>) -> Result<T>,
    {
        self.run_write(Origin::Local, f)
    }

    pub(crate) fn run_write<F, T>(&self, origin: Origin, f: F) -> Result<T>
    where
        F: FnOnce(&mut WriteTransaction<'_>) -> Result<T>,
    {
        let value = {
            let _writer = self.inner.writer.lock();
            let base = self.snapshot();
            let mut txn = WriteTransaction::new(&self.inner, &base, origin);
            match f(&mut txn) {
                Ok(value) => {
                    if let Some(notice) = self.publish(txn, base.version()) {
                        if self.inner.config.emit_change_records {
                            self.inner.notices.lock().push_back(notice);
                        }
                    }
                    value
                }
                Err(e) => {
                    warn!(
                        target: "mixcell::store",
                        replica = %self.inner.replica,
                        pending = txn.mutations().len(),
                        error = %e,
                        "Write transaction aborted"
                    );
                    return Err(e);
                }
            }
        };

        self.dispatch_notices();
        Ok(value)
    }

    fn publish(&self, txn: WriteTransaction<'_>, base_version: LogicalVersion) -> Option<CommitNotice> {
        let (mut working, log, local_version) = txn.finish();
        // A local version is taken by every create, even one with no values
        if log.is_empty() && local_version.is_none() {
            return None;
        }
        let (changes, deleted) = log.into_parts();

        let version = changes
            .iter()
            .map(|c| c.version)
            .chain(local_version)
            .fold(base_version, LogicalVersion::max);
        working.version = version;
        *self.inner.committed.write() = Arc::new(working);

        info!(
            target: "mixcell::store",
            replica = %self.inner.replica,
            version = version.as_u64(),
            changes = changes.len(),
            deleted = deleted.len(),
            "Committed write transaction"
        );

        if let Some(outbox) = &self.inner.outbox {
            outbox
                .lock()
                .extend(changes.iter().filter(|c| c.origin == Origin::Local).cloned());
        }

        Some(CommitNotice {
            replica: self.inner.replica.clone(),
            version,
            changes,
            deleted,
        })
    }

    /// Deliver queued notices unless another thread is already doing so
    fn dispatch_notices(&self) {
        loop {
            let Some(dispatching) = self.inner.dispatch.try_lock() else {
                return;
            };
            loop {
                let next = self.inner.notices.lock().pop_front();
                match next {
                    Some(notice) => self.notify(&notice),
                    None => break,
                }
            }
            drop(dispatching);
            // A notice queued while we held the dispatch lock has no other taker
            if self.inner.notices.lock().is_empty() {
                return;
            }
        }
    }

    fn notify(&self, notice: &CommitNotice) {
        let observers: Vec<Observer> = self
            .inner
            .observers
            .read()
            .iter()
            .map(|(_, o)| Arc::clone(o))
            .collect();
        for observer in observers {
            observer(notice);
        }
    }

    /// Register a callback run after every commit
    pub fn observe<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&CommitNotice) + Send + Sync + 'static,
    {
        let id = ObserverId(self.inner.next_observer.fetch_add(1, Ordering::Relaxed));
        self.inner.observers.write().push((id, Arc::new(callback)));
        id
    }

    /// Unregister a callback; returns whether it was registered
    pub fn unobserve(&self, id: ObserverId) -> bool {
        let mut observers = self.inner.observers.write();
        let before = observers.len();
        observers.retain(|(oid, _)| *oid != id);
        observers.len() != before
    }

    /// Current committed snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.inner.committed.read())
    }

    /// Committed objects of `object_type` in key order
    pub fn objects(&self, object_type: &str) -> Result<Vec<ObjectView>> {
        self.inner.schemas.get(object_type)?;
        let snapshot = self.snapshot();
        Ok(snapshot
            .records(object_type)
            .map(|(key, record)| ObjectView {
                object: ObjectRef {
                    object_type: object_type.to_string(),
                    key: key.clone(),
                },
                record: record.clone(),
            })
            .collect())
    }

    /// Committed objects of `object_type` ordered by `property`
    pub fn sorted_by(&self, object_type: &str, property: &str) -> Result<Vec<ObjectView>> {
        self.inner.schemas.get(object_type)?.require_property(property)?;
        let mut objects = self.objects(object_type)?;
        objects.sort_by(|a, b| sort_order(&a.get(property), &b.get(property)));
        Ok(objects)
    }

    /// Committed object by key
    pub fn find(&self, object_type: &str, key: &Mixed) -> Result<Option<ObjectView>> {
        self.inner.schemas.get(object_type)?;
        let object = ObjectRef::new(object_type, key);
        Ok(self.snapshot().record(&object).map(|record| ObjectView {
            record: record.clone(),
            object,
        }))
    }

    /// Committed cell in one slot
    pub fn get(&self, object: &ObjectRef, property: &str) -> Result<Arc<Mixed>> {
        self.inner
            .schemas
            .get(&object.object_type)?
            .require_property(property)?;
        self.snapshot()
            .record(object)
            .map(|r| r.get(property))
            .ok_or_else(|| object.not_found())
    }

    /// Number of committed objects of `object_type`
    pub fn count(&self, object_type: &str) -> Result<usize> {
        self.inner.schemas.get(object_type)?;
        Ok(self.snapshot().len(object_type))
    }

    /// Replica id stamped on this store's writes
    pub fn replica_id(&self) -> &ReplicaId {
        &self.inner.replica
    }

    /// Configuration the store was opened with
    pub fn config(&self) -> &MixcellConfig {
        &self.inner.config
    }

    pub(crate) fn clock(&self) -> &Arc<dyn VersionSource> {
        &self.inner.clock
    }

    pub(crate) fn take_outbox(&self) -> Vec<ChangeRecord> {
        match &self.inner.outbox {
            Some(outbox) => std::mem::take(&mut *outbox.lock()),
            None => Vec::new(),
        }
    }

    pub(crate) fn requeue_outbox(&self, mut records: Vec<ChangeRecord>) {
        if let Some(outbox) = &self.inner.outbox {
            let mut queued = outbox.lock();
            records.append(&mut queued);
            *queued = records;
        }
    }
}

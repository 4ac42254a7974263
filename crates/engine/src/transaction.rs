//! Write transactions
//!
//! A `WriteTransaction` works on a private copy of the committed snapshot.
//! Every replacement goes through coercion first; a rejected value fails
//! the call, and the error propagates out of the write closure, which
//! aborts the whole transaction. Readers outside the transaction keep
//! seeing the last committed snapshot until the store publishes this one.
//!
//! ```text
//! store.write(|txn| {
//!     let obj = txn.create("MixedObject", [("_id", Foreign::NewObjectId), ("value", 1.into())])?;
//!     txn.set(&obj, "value", "two")?;
//!     Ok(obj)
//! })?;
//! ```

use crate::database::StoreInner;
use crate::error::{EngineError, Result};
use crate::mutation::{MutationLog, Origin};
use crate::record::{FieldSlot, ObjectRef, Record, RecordKey, SlotRef, Snapshot};
use crate::schema::ObjectSchema;
use mixcell_concurrency::{ConflictResolver, LogicalVersion, Resolution, VersionedCell};
use mixcell_core::{Foreign, Mixed};
use std::sync::Arc;
use tracing::debug;

/// Pending changes against one base snapshot
pub struct WriteTransaction<'a> {
    store: &'a StoreInner,
    working: Snapshot,
    log: MutationLog,
    origin: Origin,
    version: Option<LogicalVersion>,
}

impl<'a> WriteTransaction<'a> {
    pub(crate) fn new(store: &'a StoreInner, base: &Snapshot, origin: Origin) -> Self {
        WriteTransaction {
            store,
            working: base.clone(),
            log: MutationLog::new(),
            origin,
            version: None,
        }
    }

    /// Create an object of `object_type` from `(property, value)` pairs
    ///
    /// Properties not listed read as `Null`. Types with a primary key need
    /// it among the values; other types get a generated ObjectId key.
    pub fn create<I, K>(&mut self, object_type: &str, values: I) -> Result<ObjectRef>
    where
        I: IntoIterator<Item = (K, Foreign)>,
        K: AsRef<str>,
    {
        let schema = self.store.schemas.get(object_type)?;

        let mut cells = Vec::new();
        for (property, value) in values {
            let property = property.as_ref();
            schema.require_property(property)?;
            let cell = self.store.coercer.coerce(value)?;
            cells.push((property.to_string(), Arc::new(cell)));
        }

        let key = match &schema.primary_key {
            Some(pk) => match cells.iter().find(|(p, _)| p == pk) {
                Some((_, cell)) => Arc::clone(cell),
                None => {
                    return Err(EngineError::MissingPrimaryKey {
                        object_type: object_type.to_string(),
                        property: pk.clone(),
                    })
                }
            },
            None => Arc::new(self.store.coercer.coerce(Foreign::NewObjectId)?),
        };

        let object = ObjectRef {
            object_type: object_type.to_string(),
            key: RecordKey::from_cell(&key),
        };
        if self.working.record(&object).is_some() {
            return Err(EngineError::DuplicatePrimaryKey {
                object_type: object_type.to_string(),
                key: object.key.to_string(),
            });
        }

        self.insert_record(&object, key);
        let version = self.local_version();
        for (property, cell) in cells {
            self.put_slot(&object, &property, FieldSlot::new(cell, version))?;
        }

        debug!(target: "mixcell::store", object = %object, "Created object");
        Ok(object)
    }

    /// Replace the cell in `property` of `object`
    ///
    /// The value is coerced first; on rejection the slot is untouched and
    /// the error aborts the transaction once it leaves the closure.
    pub fn set(&mut self, object: &ObjectRef, property: &str, value: impl Into<Foreign>) -> Result<()> {
        let schema = self.schema_for(object)?;
        schema.require_property(property)?;
        if schema.is_primary_key(property) {
            return Err(EngineError::PrimaryKeyImmutable {
                object_type: object.object_type.clone(),
                property: property.to_string(),
            });
        }
        if self.working.record(object).is_none() {
            return Err(object.not_found());
        }

        let cell = self.store.coercer.coerce(value.into())?;
        let version = self.local_version();
        self.put_slot(object, property, FieldSlot::new(Arc::new(cell), version))
    }

    /// Replace the cell in `slot`
    pub fn replace(&mut self, slot: &SlotRef, value: impl Into<Foreign>) -> Result<()> {
        self.set(&slot.object, &slot.property, value)
    }

    /// Delete `object`
    pub fn delete(&mut self, object: &ObjectRef) -> Result<()> {
        let removed = self
            .working
            .tables
            .get_mut(&object.object_type)
            .and_then(|t| Arc::make_mut(t).remove(&object.key));
        match removed {
            Some(_) => {
                self.log.record_delete(object.clone());
                debug!(target: "mixcell::store", object = %object, "Deleted object");
                Ok(())
            }
            None => Err(object.not_found()),
        }
    }

    /// Delete every object of every type
    pub fn delete_all(&mut self) -> Result<()> {
        let objects: Vec<ObjectRef> = self
            .working
            .tables
            .iter()
            .flat_map(|(ty, table)| {
                table.keys().map(move |key| ObjectRef {
                    object_type: ty.clone(),
                    key: key.clone(),
                })
            })
            .collect();
        for object in &objects {
            self.delete(object)?;
        }
        Ok(())
    }

    /// Read a slot, seeing this transaction's own writes
    pub fn get(&self, object: &ObjectRef, property: &str) -> Result<Arc<Mixed>> {
        self.schema_for(object)?.require_property(property)?;
        self.working
            .record(object)
            .map(|r| r.get(property))
            .ok_or_else(|| object.not_found())
    }

    /// Live objects of `object_type`, including ones created here
    pub fn objects(&self, object_type: &str) -> Result<Vec<ObjectRef>> {
        self.store.schemas.get(object_type)?;
        Ok(self
            .working
            .records(object_type)
            .map(|(key, _)| ObjectRef {
                object_type: object_type.to_string(),
                key: key.clone(),
            })
            .collect())
    }

    /// Pending replacements so far
    pub fn mutations(&self) -> &MutationLog {
        &self.log
    }

    /// Merge a peer's pair into a slot, creating the object if needed
    pub(crate) fn apply_remote(
        &mut self,
        object_type: &str,
        key: &Arc<Mixed>,
        property: &str,
        incoming: &VersionedCell,
        resolver: &dyn ConflictResolver,
    ) -> Result<Resolution> {
        self.store.schemas.get(object_type)?.require_property(property)?;
        let object = ObjectRef::new(object_type, key);
        if self.working.record(&object).is_none() {
            self.insert_record(&object, Arc::clone(key));
            debug!(target: "mixcell::sync", object = %object, "Created object from peer");
        }

        let local = match self.working.record(&object) {
            Some(record) => record.slot(property),
            None => return Err(object.not_found()),
        };
        let resolution = resolver.resolve(local.versioned(), incoming);
        if resolution.changes_local() {
            self.put_slot(&object, property, FieldSlot::from(incoming.clone()))?;
        }
        Ok(resolution)
    }

    pub(crate) fn finish(self) -> (Snapshot, MutationLog, Option<LogicalVersion>) {
        (self.working, self.log, self.version)
    }

    fn schema_for(&self, object: &ObjectRef) -> Result<&'a ObjectSchema> {
        self.store.schemas.get(&object.object_type)
    }

    fn local_version(&mut self) -> LogicalVersion {
        match self.version {
            Some(v) => v,
            None => {
                let v = self.store.clock.next_logical_version(&self.store.replica);
                self.version = Some(v);
                v
            }
        }
    }

    fn insert_record(&mut self, object: &ObjectRef, key: Arc<Mixed>) {
        let table = self
            .working
            .tables
            .entry(object.object_type.clone())
            .or_default();
        Arc::make_mut(table).insert(object.key.clone(), Record::new(key));
    }

    fn put_slot(&mut self, object: &ObjectRef, property: &str, new: FieldSlot) -> Result<()> {
        let record = self
            .working
            .tables
            .get_mut(&object.object_type)
            .and_then(|t| Arc::make_mut(t).get_mut(&object.key))
            .ok_or_else(|| object.not_found())?;
        let old = record.put(property, new.clone());

        debug!(
            target: "mixcell::store",
            object = %object,
            property,
            old_tag = %old.cell().tag(),
            new_tag = %new.cell().tag(),
            version = new.version().as_u64(),
            "Replaced slot"
        );
        let slot = SlotRef {
            object: object.clone(),
            property: property.to_string(),
        };
        self.log.record(slot, &old, &new, self.origin);
        Ok(())
    }
}

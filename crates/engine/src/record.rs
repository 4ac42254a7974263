//! Records, field slots and committed snapshots
//!
//! A record owns one slot per declared property. A slot holds exactly one
//! shared immutable cell plus the logical version of the write that put it
//! there; replacing a slot swaps the pair as a whole. Slots that were never
//! written read as `Null` at version zero.
//!
//! Snapshots are plain values. The store publishes a new one per commit,
//! so a reader holding an `Arc<Snapshot>` never sees a partial write.

use crate::error::{EngineError, Result};
use mixcell_concurrency::{LogicalVersion, VersionedCell};
use mixcell_core::{Error as CellError, Mixed, TypeTag};
use once_cell::sync::Lazy;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

static NULL_CELL: Lazy<Arc<Mixed>> = Lazy::new(|| Arc::new(Mixed::Null));

/// Identity of a record within its type: tag code followed by payload bytes
///
/// Keys order like `Mixed::canonical_cmp` and hash even for cells that
/// have neither order nor hash of their own (doubles). Key identity is
/// byte identity, so `Double(0.0)` and `Double(-0.0)` are distinct keys
/// although the cells compare equal.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey(Vec<u8>);

impl RecordKey {
    /// Key for a primary key (or generated id) cell
    pub fn from_cell(cell: &Mixed) -> Self {
        let mut bytes = vec![cell.tag().code()];
        bytes.extend(cell.payload());
        RecordKey(bytes)
    }

    /// Decode the key back into its cell
    pub fn to_cell(&self) -> Result<Mixed> {
        let (code, payload) = self
            .0
            .split_first()
            .ok_or_else(|| CellError::invalid_payload(TypeTag::Null, "empty record key"))?;
        Ok(Mixed::from_payload(TypeTag::from_code(*code)?, payload)?)
    }

    /// Key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordKey({})", self)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_cell() {
            Ok(cell) => write!(f, "{}", cell),
            Err(_) => write!(f, "<{} undecodable bytes>", self.0.len()),
        }
    }
}

/// Handle naming one object: its type and key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectRef {
    /// Object type name
    pub object_type: String,
    /// Record key within the type
    pub key: RecordKey,
}

impl ObjectRef {
    /// Handle for `object_type` keyed by `key`
    pub fn new(object_type: impl Into<String>, key: &Mixed) -> Self {
        ObjectRef {
            object_type: object_type.into(),
            key: RecordKey::from_cell(key),
        }
    }

    pub(crate) fn not_found(&self) -> EngineError {
        EngineError::NoSuchObject {
            object_type: self.object_type.clone(),
            key: self.key.to_string(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.object_type, self.key)
    }
}

/// One property slot on one object
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotRef {
    /// Owning object
    pub object: ObjectRef,
    /// Property name
    pub property: String,
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.object, self.property)
    }
}

/// Current content of a slot
#[derive(Debug, Clone)]
pub struct FieldSlot(VersionedCell);

impl FieldSlot {
    /// Slot holding `cell` written at `version`
    pub fn new(cell: Arc<Mixed>, version: LogicalVersion) -> Self {
        FieldSlot(VersionedCell::new(cell, version))
    }

    /// Slot that was never written
    pub fn unset() -> Self {
        FieldSlot::new(Arc::clone(&NULL_CELL), LogicalVersion::ZERO)
    }

    /// The cell
    pub fn cell(&self) -> &Arc<Mixed> {
        &self.0.value
    }

    /// Version of the write that produced the cell
    pub fn version(&self) -> LogicalVersion {
        self.0.version
    }

    /// Cell and version as a pair for merging
    pub fn versioned(&self) -> &VersionedCell {
        &self.0
    }
}

impl From<VersionedCell> for FieldSlot {
    fn from(v: VersionedCell) -> Self {
        FieldSlot(v)
    }
}

/// A live object: its key cell and written slots
#[derive(Debug, Clone)]
pub struct Record {
    key: Arc<Mixed>,
    slots: BTreeMap<String, FieldSlot>,
}

impl Record {
    pub(crate) fn new(key: Arc<Mixed>) -> Self {
        Record {
            key,
            slots: BTreeMap::new(),
        }
    }

    /// The key cell (primary key value or generated id)
    pub fn key(&self) -> &Arc<Mixed> {
        &self.key
    }

    /// Slot for `property`; unset slots read as `Null` at version zero
    pub fn slot(&self, property: &str) -> FieldSlot {
        self.slots
            .get(property)
            .cloned()
            .unwrap_or_else(FieldSlot::unset)
    }

    /// Cell in `property`
    pub fn get(&self, property: &str) -> Arc<Mixed> {
        match self.slots.get(property) {
            Some(slot) => Arc::clone(slot.cell()),
            None => Arc::clone(&NULL_CELL),
        }
    }

    /// Written slots in property-name order
    pub fn slots(&self) -> impl Iterator<Item = (&str, &FieldSlot)> {
        self.slots.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn put(&mut self, property: &str, slot: FieldSlot) -> FieldSlot {
        self.slots
            .insert(property.to_string(), slot)
            .unwrap_or_else(FieldSlot::unset)
    }
}

/// All records of one type
pub(crate) type Table = BTreeMap<RecordKey, Record>;

/// Immutable view of every committed record
///
/// Tables are shared between snapshots and copied on first write.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub(crate) tables: BTreeMap<String, Arc<Table>>,
    pub(crate) version: LogicalVersion,
}

impl Snapshot {
    /// Version of the last commit included in this snapshot
    pub fn version(&self) -> LogicalVersion {
        self.version
    }

    /// Record for `object`, if it exists
    pub fn record(&self, object: &ObjectRef) -> Option<&Record> {
        self.tables
            .get(&object.object_type)
            .and_then(|t| t.get(&object.key))
    }

    /// Records of `object_type` in key order
    pub fn records(&self, object_type: &str) -> impl Iterator<Item = (&RecordKey, &Record)> {
        self.tables
            .get(object_type)
            .into_iter()
            .flat_map(|t| t.iter())
    }

    /// Number of live records of `object_type`
    pub fn len(&self, object_type: &str) -> usize {
        self.tables.get(object_type).map_or(0, |t| t.len())
    }

    /// Whether no type holds any record
    pub fn is_empty(&self) -> bool {
        self.tables.values().all(|t| t.is_empty())
    }
}

/// Sort order for `sorted_by`: natural order within numeric, date and
/// text kinds, canonical order otherwise
pub(crate) fn sort_order(a: &Mixed, b: &Mixed) -> Ordering {
    match (a, b) {
        (Mixed::Int(x), Mixed::Int(y)) => x.cmp(y),
        (Mixed::Double(x), Mixed::Double(y)) => x.total_cmp(y),
        (Mixed::String(x), Mixed::String(y)) => x.cmp(y),
        (Mixed::Date(x), Mixed::Date(y)) => x.cmp(y),
        (Mixed::Bool(x), Mixed::Bool(y)) => x.cmp(y),
        _ => a.canonical_cmp(b),
    }
}

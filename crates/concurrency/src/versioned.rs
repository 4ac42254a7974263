//! A cell paired with the version that wrote it
//!
//! This is the unit the resolver works on. The cell sits behind an `Arc`:
//! cells are immutable, so every reader, replica and changeset can share
//! one allocation.

use crate::version::LogicalVersion;
use mixcell_core::Mixed;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

/// A value with its version information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    /// The actual value
    pub value: T,

    /// Version of the write that produced it
    pub version: LogicalVersion,
}

impl<T> Versioned<T> {
    /// Pair a value with its version
    pub fn new(value: T, version: LogicalVersion) -> Self {
        Versioned { value, version }
    }

    /// Map the inner value to a new type
    pub fn map<U, F>(self, f: F) -> Versioned<U>
    where
        F: FnOnce(T) -> U,
    {
        Versioned {
            value: f(self.value),
            version: self.version,
        }
    }

    /// Get a reference to the inner value
    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Get the version
    #[inline]
    pub fn version(&self) -> LogicalVersion {
        self.version
    }

    /// Consume and return the inner value
    #[inline]
    pub fn into_value(self) -> T {
        self.value
    }
}

/// A shared immutable cell with its version
pub type VersionedCell = Versioned<Arc<Mixed>>;

impl VersionedCell {
    /// Wrap an owned cell
    pub fn from_cell(cell: Mixed, version: LogicalVersion) -> Self {
        Versioned::new(Arc::new(cell), version)
    }

    /// Same version and byte-identical cell
    ///
    /// Stricter than `==` on the cell: two NaN doubles with the same bits
    /// are identical here, and `1.0`/`1.00` decimals are not.
    pub fn is_identical(&self, other: &Self) -> bool {
        self.version == other.version && self.value.canonical_cmp(&other.value) == Ordering::Equal
    }
}

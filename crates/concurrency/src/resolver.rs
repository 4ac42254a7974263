//! Merge rule for concurrent writes to one field slot
//!
//! Each replica holds `(cell, version)` per slot. The resolver picks one of
//! two candidates; it never combines them. It is a pure function: version
//! bookkeeping lives in the clock and the sync layer.
//!
//! # Last writer wins
//!
//! - Higher version wins the whole cell.
//! - Same version: the cell that sorts greater under
//!   [`Mixed::canonical_cmp`] (tag code, then payload bytes) wins.
//! - Same version and byte-identical cells: nothing to do.
//!
//! The winner does not depend on argument order, so both replicas end up
//! with the same pair whichever side runs the merge.

use crate::versioned::VersionedCell;
use mixcell_core::Mixed;
use std::cmp::Ordering;
use tracing::trace;

/// Which candidate a merge kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The local pair stays
    KeepLocal,
    /// The remote pair replaces the local one
    TakeRemote,
    /// Both sides already hold the same pair
    Identical,
}

impl Resolution {
    /// Whether applying this resolution changes the local slot
    pub fn changes_local(&self) -> bool {
        matches!(self, Resolution::TakeRemote)
    }
}

/// Merge strategy for a single slot
pub trait ConflictResolver: Send + Sync {
    /// Decide between the local and the remote pair
    fn resolve(&self, local: &VersionedCell, remote: &VersionedCell) -> Resolution;

    /// Merged pair for the slot
    fn merge(&self, local: &VersionedCell, remote: &VersionedCell) -> VersionedCell {
        match self.resolve(local, remote) {
            Resolution::TakeRemote => remote.clone(),
            Resolution::KeepLocal | Resolution::Identical => local.clone(),
        }
    }
}

/// Last-writer-wins by logical version with a content tie-break
#[derive(Debug, Clone, Copy, Default)]
pub struct LastWriterWins;

impl LastWriterWins {
    /// Total order over `(version, cell)` pairs used by `resolve`
    pub fn order(a: &VersionedCell, b: &VersionedCell) -> Ordering {
        a.version
            .cmp(&b.version)
            .then_with(|| a.value.canonical_cmp(&b.value))
    }
}

impl ConflictResolver for LastWriterWins {
    fn resolve(&self, local: &VersionedCell, remote: &VersionedCell) -> Resolution {
        let resolution = match Self::order(local, remote) {
            Ordering::Less => Resolution::TakeRemote,
            Ordering::Greater => Resolution::KeepLocal,
            Ordering::Equal => Resolution::Identical,
        };
        trace!(
            target: "mixcell::sync",
            local_version = local.version.as_u64(),
            remote_version = remote.version.as_u64(),
            local_tag = %local.value.tag(),
            remote_tag = %remote.value.tag(),
            ?resolution,
            "Resolved slot"
        );
        resolution
    }
}

/// Merge with the default resolver
pub fn merge(local: &VersionedCell, remote: &VersionedCell) -> VersionedCell {
    LastWriterWins.merge(local, remote)
}

/// Convenience for callers holding a bare cell
pub fn merge_cells(local: (Mixed, u64), remote: (Mixed, u64)) -> VersionedCell {
    merge(
        &VersionedCell::from_cell(local.0, local.1.into()),
        &VersionedCell::from_cell(remote.0, remote.1.into()),
    )
}

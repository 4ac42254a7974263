//! Mixed Cell Integration Tests
//!
//! End-to-end behavior of mixed slots through the public store API:
//! storing primitives and rich kinds, replacing a slot across kinds,
//! rejecting unsupported input, and converging replicas through sync.

#[path = "../common/mod.rs"]
mod common;

mod complex_types;
mod extended_json;
mod mutability;
mod primitives;
mod sync_convergence;
mod wrong_type;

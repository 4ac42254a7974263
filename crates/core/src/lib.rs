//! Core types for mixcell
//!
//! This crate defines the mixed value cell and everything it needs on its own:
//! - TypeTag: closed registry of storable kinds with stable codes
//! - Mixed: the tagged, immutable value cell
//! - ObjectId, Decimal128, Date: scalar kinds beyond the Rust builtins
//! - encoding: `[tag][payload]` persisted/wire format
//! - coerce: validating conversion from host (`Foreign`) values
//! - json: extended JSON adapter over `Foreign`
//! - Limits: payload size limits
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coerce;
pub mod encoding;
pub mod error;
pub mod json;
pub mod limits;
pub mod primitives;
pub mod types;
pub mod value;

pub use coerce::{from_foreign, Coercer, Foreign, IdSource, SystemIds};
pub use error::{Error, Result};
pub use limits::{LimitError, Limits};
pub use primitives::{Date, Decimal128, ObjectId, ParseDecimalError, ParseObjectIdError};
pub use types::TypeTag;
pub use uuid::Uuid;
pub use value::Mixed;

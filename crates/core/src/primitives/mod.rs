//! Scalar types a mixed cell can hold beyond the Rust builtins
//!
//! UUIDs come straight from the `uuid` crate; the rest live here.

pub mod date;
pub mod decimal;
pub mod object_id;

pub use date::Date;
pub use decimal::{Decimal128, ParseDecimalError, DECIMAL128_LEN};
pub use object_id::{ObjectId, ParseObjectIdError, OBJECT_ID_LEN};

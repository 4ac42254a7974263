//! Error types for mixed value cells
//!
//! Every failure in this crate is local and synchronous. Nothing here is
//! retried: coercion and mutation errors abort the caller's write
//! transaction, decode errors abort the read.
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::limits::LimitError;
use crate::types::TypeTag;
use thiserror::Error;

/// Result type alias for mixcell core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for mixed value cells
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Foreign input is outside the closed set of accepted shapes.
    ///
    /// Not retryable: the caller has to change the input.
    #[error("Mixed conversion not possible for type: {type_name}")]
    UnsupportedType {
        /// Descriptive name of the rejected input's type
        type_name: String,
    },

    /// Payload bytes do not match what the tag requires
    #[error("Invalid payload for {tag}: {reason}")]
    InvalidPayload {
        /// Tag the payload was decoded under
        tag: TypeTag,
        /// What was wrong with it
        reason: String,
    },

    /// Tag code written by a newer (or corrupt) peer
    #[error("Unknown type tag 0x{0:02x}; a newer version is needed to read this value")]
    UnknownTag(u8),

    /// A tag-specific accessor was used against a cell holding another tag
    #[error("Type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        /// Tag the accessor reads
        expected: TypeTag,
        /// Tag the cell actually holds
        actual: TypeTag,
    },

    /// A typed literal (ObjectId hex, UUID, decimal string) is malformed
    #[error("Invalid {kind} literal '{literal}'")]
    InvalidLiteral {
        /// Kind the literal was supposed to denote
        kind: TypeTag,
        /// The offending text
        literal: String,
    },

    /// Payload exceeds configured size limits
    #[error(transparent)]
    LimitExceeded(#[from] LimitError),
}

impl Error {
    /// Build an `UnsupportedType` error for the given type name
    pub fn unsupported(type_name: impl Into<String>) -> Self {
        Error::UnsupportedType {
            type_name: type_name.into(),
        }
    }

    /// Build an `InvalidPayload` error
    pub fn invalid_payload(tag: TypeTag, reason: impl Into<String>) -> Self {
        Error::InvalidPayload {
            tag,
            reason: reason.into(),
        }
    }

    /// Build an `InvalidLiteral` error
    pub fn invalid_literal(kind: TypeTag, literal: impl Into<String>) -> Self {
        Error::InvalidLiteral {
            kind,
            literal: literal.into(),
        }
    }

    /// Whether this error came from corrupt or unreadable stored bytes
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Error::InvalidPayload { .. } | Error::UnknownTag(_))
    }
}

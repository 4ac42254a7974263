//! Error types for the host object store and sync layer

use mixcell_core::Error as CellError;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised by the store, its transactions and the sync layer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Coercion, validation or decode failure on a cell
    #[error(transparent)]
    Cell(#[from] CellError),

    /// Object type not declared in the schema
    #[error("No such object type: {0}")]
    NoSuchType(String),

    /// Property not declared on the object type
    #[error("No such property '{property}' on type {object_type}")]
    NoSuchProperty {
        /// Object type name
        object_type: String,
        /// Requested property
        property: String,
    },

    /// Object was deleted or never existed
    #[error("No such object in type {object_type}: {key}")]
    NoSuchObject {
        /// Object type name
        object_type: String,
        /// Display form of the object's key
        key: String,
    },

    /// `create` did not supply the primary key
    #[error("Missing primary key '{property}' for type {object_type}")]
    MissingPrimaryKey {
        /// Object type name
        object_type: String,
        /// Primary key property
        property: String,
    },

    /// An object with this primary key already exists
    #[error("Duplicate primary key in type {object_type}: {key}")]
    DuplicatePrimaryKey {
        /// Object type name
        object_type: String,
        /// Display form of the key
        key: String,
    },

    /// Primary key slots are fixed once the object exists
    #[error("Primary key '{property}' of type {object_type} cannot be changed")]
    PrimaryKeyImmutable {
        /// Object type name
        object_type: String,
        /// Primary key property
        property: String,
    },

    /// Schema definition is inconsistent
    #[error("Invalid schema for {object_type}: {reason}")]
    InvalidSchema {
        /// Object type name
        object_type: String,
        /// What is wrong with it
        reason: String,
    },

    /// The write closure failed; nothing was committed
    #[error("Transaction aborted: {0}")]
    TransactionAborted(String),

    /// Changeset bytes could not be read
    #[error("Malformed changeset: {0}")]
    MalformedChangeset(String),

    /// Configuration file could not be read, parsed or written
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Build a `NoSuchProperty` error
    pub fn no_such_property(object_type: impl Into<String>, property: impl Into<String>) -> Self {
        EngineError::NoSuchProperty {
            object_type: object_type.into(),
            property: property.into(),
        }
    }

    /// Build a `MalformedChangeset` error
    pub fn malformed(reason: impl Into<String>) -> Self {
        EngineError::MalformedChangeset(reason.into())
    }

    /// The underlying cell error, if any
    pub fn as_cell_error(&self) -> Option<&CellError> {
        match self {
            EngineError::Cell(e) => Some(e),
            _ => None,
        }
    }
}

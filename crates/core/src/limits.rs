//! Size limits for mixed payloads
//!
//! Enforced by coercion and by the cell decoder. Violations result in
//! `LimitError::ValueTooLarge`.
//!
//! ## Contract
//!
//! The defaults match what every client in the fleet accepts; raising them
//! on one replica produces cells other replicas refuse to read.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024; // 16MB

/// Size limits for variable-length payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum string length in bytes (default: 16MB)
    #[serde(default = "default_max_payload")]
    pub max_string_bytes: usize,

    /// Maximum binary length in bytes (default: 16MB)
    #[serde(default = "default_max_payload")]
    pub max_binary_bytes: usize,
}

fn default_max_payload() -> usize {
    DEFAULT_MAX_PAYLOAD
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_string_bytes: DEFAULT_MAX_PAYLOAD,
            max_binary_bytes: DEFAULT_MAX_PAYLOAD,
        }
    }
}

impl Limits {
    /// Create limits with small values for testing
    pub fn with_small_limits() -> Self {
        Limits {
            max_string_bytes: 64,
            max_binary_bytes: 64,
        }
    }

    /// Validate a string payload length
    pub fn validate_string(&self, s: &str) -> Result<(), LimitError> {
        if s.len() > self.max_string_bytes {
            return Err(LimitError::ValueTooLarge {
                reason: "string_too_long".to_string(),
                actual: s.len(),
                max: self.max_string_bytes,
            });
        }
        Ok(())
    }

    /// Validate a binary payload length
    pub fn validate_binary(&self, b: &[u8]) -> Result<(), LimitError> {
        if b.len() > self.max_binary_bytes {
            return Err(LimitError::ValueTooLarge {
                reason: "binary_too_long".to_string(),
                actual: b.len(),
                max: self.max_binary_bytes,
            });
        }
        Ok(())
    }
}

/// Limit validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitError {
    /// Value exceeds size limits
    #[error("Value too large ({reason}): {actual} exceeds maximum {max}")]
    ValueTooLarge {
        /// Reason code for the violation
        reason: String,
        /// Actual size
        actual: usize,
        /// Maximum allowed size
        max: usize,
    },
}

impl LimitError {
    /// Reason code for diagnostics
    pub fn reason_code(&self) -> &str {
        match self {
            LimitError::ValueTooLarge { reason, .. } => reason,
        }
    }
}

//! 12-byte object identifiers
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────┬──────────────────────────┬─────────────────┐
//! │ Seconds (4, BE)      │ Process random (5)       │ Counter (3, BE) │
//! └──────────────────────┴──────────────────────────┴─────────────────┘
//! ```
//!
//! The textual form is always 24 lowercase hex characters.

use once_cell::sync::Lazy;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Raw byte length
pub const OBJECT_ID_LEN: usize = 12;

const COUNTER_MASK: u32 = 0x00ff_ffff;

static PROCESS_UNIQUE: Lazy<[u8; 5]> = Lazy::new(rand::random);

static COUNTER: Lazy<AtomicU32> =
    Lazy::new(|| AtomicU32::new(rand::thread_rng().gen::<u32>() & COUNTER_MASK));

/// 96-bit object identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

/// Error parsing an ObjectId from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected 24 hex characters, got '{0}'")]
pub struct ParseObjectIdError(pub String);

impl ObjectId {
    /// Generate a fresh identifier from the clock, process id bytes and counter
    pub fn new() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as u32;
        let count = COUNTER.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;
        Self::from_parts(secs, *PROCESS_UNIQUE, count)
    }

    /// Assemble an identifier from its three fields
    ///
    /// Only the low 24 bits of `counter` are kept.
    pub fn from_parts(timestamp_secs: u32, process: [u8; 5], counter: u32) -> Self {
        let mut bytes = [0u8; OBJECT_ID_LEN];
        bytes[0..4].copy_from_slice(&timestamp_secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&process);
        bytes[9..12].copy_from_slice(&(counter & COUNTER_MASK).to_be_bytes()[1..4]);
        ObjectId(bytes)
    }

    /// Wrap raw bytes
    pub const fn from_bytes(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        ObjectId(bytes)
    }

    /// Raw bytes
    pub fn bytes(&self) -> [u8; OBJECT_ID_LEN] {
        self.0
    }

    /// Parse 24 hex characters (either case)
    pub fn parse_str(s: &str) -> Result<Self, ParseObjectIdError> {
        let raw = s.as_bytes();
        if raw.len() != OBJECT_ID_LEN * 2 {
            return Err(ParseObjectIdError(s.to_string()));
        }
        let mut bytes = [0u8; OBJECT_ID_LEN];
        for (i, pair) in raw.chunks_exact(2).enumerate() {
            let hi = hex_value(pair[0]).ok_or_else(|| ParseObjectIdError(s.to_string()))?;
            let lo = hex_value(pair[1]).ok_or_else(|| ParseObjectIdError(s.to_string()))?;
            bytes[i] = (hi << 4) | lo;
        }
        Ok(ObjectId(bytes))
    }

    /// Creation time in seconds since the Unix epoch
    pub fn timestamp_secs(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// 24-character lowercase hex form
    pub fn to_hex(&self) -> String {
        const DIGITS: &[u8; 16] = b"0123456789abcdef";
        let mut out = String::with_capacity(OBJECT_ID_LEN * 2);
        for b in self.0 {
            out.push(DIGITS[(b >> 4) as usize] as char);
            out.push(DIGITS[(b & 0x0f) as usize] as char);
        }
        out
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = ParseObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ObjectId::parse_str(&s).map_err(serde::de::Error::custom)
    }
}

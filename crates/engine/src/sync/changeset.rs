//! Changesets: slot writes exchanged between replicas and the server
//!
//! # Wire format
//!
//! ```text
//! "MXCS" | format u8 | origin str | count u32 | entry*
//! entry:  type str | key cell | property str | version u64 | cell
//! str:    len u16 | UTF-8 bytes
//! ```
//!
//! Integers are little-endian. Cells use the `[tag][payload]` codec, so an
//! unknown tag in a changeset fails with `UnknownTag` rather than being
//! dropped.

use crate::error::{EngineError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use mixcell_concurrency::{LogicalVersion, ReplicaId, VersionedCell};
use mixcell_core::{encoding, Limits, Mixed};
use std::cmp::Ordering;
use std::io::{Cursor, Read};
use std::sync::Arc;

const MAGIC: &[u8; 4] = b"MXCS";
const FORMAT_VERSION: u8 = 1;

/// One slot write
#[derive(Debug, Clone)]
pub struct ChangeEntry {
    /// Object type name
    pub object_type: String,
    /// Key cell of the object
    pub key: Arc<Mixed>,
    /// Property name
    pub property: String,
    /// New cell and the version it was written at
    pub cell: VersionedCell,
}

impl ChangeEntry {
    /// Whether both entries address the same slot
    pub fn same_slot(&self, other: &ChangeEntry) -> bool {
        self.object_type == other.object_type
            && self.property == other.property
            && self.key.canonical_cmp(&other.key) == Ordering::Equal
    }
}

/// Batch of slot writes from one origin
#[derive(Debug, Clone)]
pub struct Changeset {
    /// Replica (or server) that produced the batch
    pub origin: ReplicaId,
    /// Slot writes
    pub entries: Vec<ChangeEntry>,
}

impl Changeset {
    /// Empty changeset from `origin`
    pub fn new(origin: ReplicaId) -> Self {
        Changeset {
            origin,
            entries: Vec::new(),
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the changeset carries no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest version carried by any entry
    pub fn max_version(&self) -> LogicalVersion {
        self.entries
            .iter()
            .map(|e| e.cell.version)
            .max()
            .unwrap_or(LogicalVersion::ZERO)
    }

    /// Serialize to the wire format
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(16 + self.entries.len() * 32);
        buf.extend_from_slice(MAGIC);
        buf.push(FORMAT_VERSION);
        write_str(&mut buf, self.origin.as_str())?;
        let count = u32::try_from(self.entries.len())
            .map_err(|_| EngineError::malformed("too many entries"))?;
        buf.write_u32::<LittleEndian>(count).map_err(io_err)?;

        for entry in &self.entries {
            write_str(&mut buf, &entry.object_type)?;
            encoding::encode_into(&entry.key, &mut buf)?;
            write_str(&mut buf, &entry.property)?;
            buf.write_u64::<LittleEndian>(entry.cell.version.as_u64())
                .map_err(io_err)?;
            encoding::encode_into(&entry.cell.value, &mut buf)?;
        }
        Ok(buf)
    }

    /// Parse the wire format, enforcing payload limits on every cell
    pub fn decode(bytes: &[u8], limits: &Limits) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);

        let mut magic = [0u8; 4];
        cursor
            .read_exact(&mut magic)
            .map_err(|_| EngineError::malformed("truncated header"))?;
        if &magic != MAGIC {
            return Err(EngineError::malformed("bad magic"));
        }
        let format = cursor
            .read_u8()
            .map_err(|_| EngineError::malformed("truncated header"))?;
        if format != FORMAT_VERSION {
            return Err(EngineError::malformed(format!(
                "unsupported format version {}",
                format
            )));
        }

        let origin = ReplicaId::new(read_str(&mut cursor)?);
        let count = cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| EngineError::malformed("truncated entry count"))?;

        let mut entries = Vec::new();
        for _ in 0..count {
            let object_type = read_str(&mut cursor)?;
            let key = encoding::read_cell(&mut cursor, limits)?;
            let property = read_str(&mut cursor)?;
            let version = cursor
                .read_u64::<LittleEndian>()
                .map_err(|_| EngineError::malformed("truncated version"))?;
            let cell = encoding::read_cell(&mut cursor, limits)?;
            entries.push(ChangeEntry {
                object_type,
                key: Arc::new(key),
                property,
                cell: VersionedCell::from_cell(cell, LogicalVersion::new(version)),
            });
        }

        if cursor.position() as usize != bytes.len() {
            return Err(EngineError::malformed(format!(
                "{} trailing bytes",
                bytes.len() - cursor.position() as usize
            )));
        }
        Ok(Changeset { origin, entries })
    }
}

fn io_err(e: std::io::Error) -> EngineError {
    EngineError::malformed(e.to_string())
}

fn write_str(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    let len = u16::try_from(s.len())
        .map_err(|_| EngineError::malformed(format!("name too long: {} bytes", s.len())))?;
    buf.write_u16::<LittleEndian>(len).map_err(io_err)?;
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

fn read_str(cursor: &mut Cursor<&[u8]>) -> Result<String> {
    let len = cursor
        .read_u16::<LittleEndian>()
        .map_err(|_| EngineError::malformed("truncated name length"))? as usize;
    let mut bytes = vec![0u8; len];
    cursor
        .read_exact(&mut bytes)
        .map_err(|_| EngineError::malformed("truncated name"))?;
    String::from_utf8(bytes).map_err(|e| EngineError::malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixcell_core::{Decimal128, Error as CellError, ObjectId, Uuid};

    fn entry(key: Mixed, property: &str, cell: Mixed, version: u64) -> ChangeEntry {
        ChangeEntry {
            object_type: "MixedObject".into(),
            key: Arc::new(key),
            property: property.into(),
            cell: VersionedCell::from_cell(cell, LogicalVersion::new(version)),
        }
    }

    fn sample() -> Changeset {
        let oid = Mixed::ObjectId(ObjectId::new());
        Changeset {
            origin: ReplicaId::new("R1"),
            entries: vec![
                entry(oid.clone(), "key", Mixed::from("1"), 3),
                entry(oid.clone(), "value", Mixed::Double(3.0), 3),
                entry(oid, "other", Mixed::Uuid(Uuid::new_v4()), 4),
                entry(
                    Mixed::Int(9),
                    "value",
                    Mixed::Decimal(Decimal128::parse_str("6.022e23").unwrap()),
                    5,
                ),
            ],
        }
    }

    #[test]
    fn test_decode_inverts_encode() {
        let cs = sample();
        let bytes = cs.encode().unwrap();
        let back = Changeset::decode(&bytes, &Limits::default()).unwrap();

        assert_eq!(back.origin, cs.origin);
        assert_eq!(back.len(), cs.len());
        for (a, b) in cs.entries.iter().zip(&back.entries) {
            assert!(a.same_slot(b));
            assert!(a.cell.is_identical(&b.cell));
        }
        // Double stays Double on the wire; no re-coercion to Int64
        assert_eq!(*back.entries[1].cell.value, Mixed::Double(3.0));
        assert_eq!(back.max_version(), LogicalVersion::new(5));
    }

    #[test]
    fn test_empty_changeset() {
        let cs = Changeset::new(ReplicaId::new("server"));
        let back = Changeset::decode(&cs.encode().unwrap(), &Limits::default()).unwrap();
        assert!(back.is_empty());
        assert_eq!(back.max_version(), LogicalVersion::ZERO);
    }

    #[test]
    fn test_bad_header() {
        assert!(matches!(
            Changeset::decode(b"NOPE", &Limits::default()),
            Err(EngineError::MalformedChangeset(_))
        ));
        let mut bytes = sample().encode().unwrap();
        bytes[4] = 9;
        assert!(matches!(
            Changeset::decode(&bytes, &Limits::default()),
            Err(EngineError::MalformedChangeset(_))
        ));
    }

    #[test]
    fn test_truncation_detected() {
        let bytes = sample().encode().unwrap();
        for cut in [5, 12, bytes.len() / 2, bytes.len() - 1] {
            assert!(Changeset::decode(&bytes[..cut], &Limits::default()).is_err());
        }
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = sample().encode().unwrap();
        bytes.push(0);
        assert!(matches!(
            Changeset::decode(&bytes, &Limits::default()),
            Err(EngineError::MalformedChangeset(_))
        ));
    }

    #[test]
    fn test_unknown_tag_surfaces() {
        let cs = Changeset {
            origin: ReplicaId::new("R"),
            entries: vec![entry(Mixed::Int(1), "p", Mixed::Bool(true), 1)],
        };
        let mut bytes = cs.encode().unwrap();
        // Last two bytes are the cell: tag then bool payload
        let tag_at = bytes.len() - 2;
        bytes[tag_at] = 0x7f;
        let err = Changeset::decode(&bytes, &Limits::default()).unwrap_err();
        assert_eq!(err, EngineError::Cell(CellError::UnknownTag(0x7f)));
    }

    #[test]
    fn test_limits_enforced_on_decode() {
        let cs = Changeset {
            origin: ReplicaId::new("R"),
            entries: vec![entry(Mixed::Int(1), "p", Mixed::from("x".repeat(100)), 1)],
        };
        let bytes = cs.encode().unwrap();
        assert!(Changeset::decode(&bytes, &Limits::with_small_limits()).is_err());
    }
}

//! Cell encoding and decoding
//!
//! This is the persisted and wire representation of a mixed cell.
//!
//! ## Cell Format
//!
//! ```text
//! [tag: u8][payload]
//! ```
//!
//! - **tag**: stable `TypeTag` code
//! - **payload**: size implied by the tag. Bool=1, Int64/Double/Date=8,
//!   ObjectId=12, UUID/Decimal128=16, Null=0. String and Binary are
//!   `[len: u32 LE][bytes]`.
//!
//! Multi-byte integers and floats are little-endian.
//!
//! Encoding fails with `LimitExceeded` for a String or Binary payload
//! whose length does not fit the u32 prefix.
//!
//! Unknown tags surface as `UnknownTag`; they are never skipped or
//! defaulted to Null, because nothing tells us how long their payload is.

use crate::error::{Error, Result};
use crate::limits::{LimitError, Limits};
use crate::types::TypeTag;
use crate::value::Mixed;
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

/// Encode a cell to bytes
///
/// # Example
///
/// ```
/// use mixcell_core::{encoding, Mixed};
///
/// let bytes = encoding::encode(&Mixed::Int(555)).unwrap();
/// assert_eq!(bytes[0], 0x02);
/// assert_eq!(bytes.len(), 9);
/// ```
pub fn encode(cell: &Mixed) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(encoded_len(cell));
    encode_into(cell, &mut buf)?;
    Ok(buf)
}

/// Append the encoding of a cell to `buf`
///
/// On error `buf` is left unchanged.
pub fn encode_into(cell: &Mixed, buf: &mut Vec<u8>) -> Result<()> {
    let tag = cell.tag();
    let payload = cell.payload();
    let prefix = match tag.fixed_payload_len() {
        Some(_) => None,
        None => Some(length_prefix(payload.len())?),
    };
    buf.push(tag.code());
    if let Some(prefix) = prefix {
        buf.extend_from_slice(&prefix);
    }
    buf.extend_from_slice(&payload);
    Ok(())
}

fn length_prefix(len: usize) -> Result<[u8; 4]> {
    let len = u32::try_from(len).map_err(|_| LimitError::ValueTooLarge {
        reason: "length_prefix_overflow".to_string(),
        actual: len,
        max: u32::MAX as usize,
    })?;
    let mut prefix = [0u8; 4];
    LittleEndian::write_u32(&mut prefix, len);
    Ok(prefix)
}

/// Number of bytes `encode` produces for this cell
pub fn encoded_len(cell: &Mixed) -> usize {
    match cell {
        Mixed::String(s) => 1 + 4 + s.len(),
        Mixed::Binary(b) => 1 + 4 + b.len(),
        other => 1 + other.tag().fixed_payload_len().unwrap_or(0),
    }
}

/// Decode exactly one cell; trailing bytes are an error
pub fn decode(bytes: &[u8]) -> Result<Mixed> {
    decode_with_limits(bytes, &Limits::default())
}

/// Decode exactly one cell, enforcing payload size limits
pub fn decode_with_limits(bytes: &[u8], limits: &Limits) -> Result<Mixed> {
    let mut cursor = Cursor::new(bytes);
    let cell = read_cell(&mut cursor, limits)?;
    let consumed = cursor.position() as usize;
    if consumed != bytes.len() {
        return Err(Error::invalid_payload(
            cell.tag(),
            format!("{} trailing bytes after cell", bytes.len() - consumed),
        ));
    }
    Ok(cell)
}

/// Decode one cell from the front of `bytes`, returning it and the bytes consumed
pub fn decode_prefix(bytes: &[u8]) -> Result<(Mixed, usize)> {
    let mut cursor = Cursor::new(bytes);
    let cell = read_cell(&mut cursor, &Limits::default())?;
    Ok((cell, cursor.position() as usize))
}

/// Read one cell from a cursor
pub fn read_cell(cursor: &mut Cursor<&[u8]>, limits: &Limits) -> Result<Mixed> {
    let code = cursor
        .read_u8()
        .map_err(|_| Error::invalid_payload(TypeTag::Null, "missing tag byte"))?;
    let tag = TypeTag::from_code(code)?;

    let len = match tag.fixed_payload_len() {
        Some(n) => n,
        None => {
            let len = cursor
                .read_u32::<LittleEndian>()
                .map_err(|_| Error::invalid_payload(tag, "truncated length prefix"))?
                as usize;
            let max = match tag {
                TypeTag::String => limits.max_string_bytes,
                _ => limits.max_binary_bytes,
            };
            if len > max {
                return Err(Error::invalid_payload(
                    tag,
                    format!("length {} exceeds maximum {}", len, max),
                ));
            }
            len
        }
    };

    let remaining = cursor.get_ref().len() - cursor.position() as usize;
    if remaining < len {
        return Err(Error::invalid_payload(
            tag,
            format!("truncated payload: need {} bytes, have {}", len, remaining),
        ));
    }
    let mut payload = vec![0u8; len];
    cursor
        .read_exact(&mut payload)
        .map_err(|e| Error::invalid_payload(tag, e.to_string()))?;
    Mixed::from_payload(tag, &payload)
}

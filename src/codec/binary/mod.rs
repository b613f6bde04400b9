//! Compact binary format.
//!
//! This module defines the binary format used for serializing and
//! deserializing world state. The format is designed for compactness and
//! deterministic layout; the text format is the debugging surface.
//!
//! # Format Structure
//!
//! ```text
//! [Header]
//! - Magic bytes: "LBSR" (4 bytes)
//! - Format version: u32 (4 bytes)
//! - Save version: u32 (4 bytes)
//!
//! [Metadata]  (present when the codec writes metadata)
//! - Timestamp: i64 (8 bytes)
//! - Game name length: u32 + UTF-8 bytes (may be empty)
//!
//! [Body]
//! - Distinct entity count: u32 (informational)
//! - Component type count: u32
//! - For each component type, in declared order:
//!   - Type name length: u32 + UTF-8 bytes
//!   - Instance count: u32
//!   - For each instance:
//!     - Entity id: u32
//!     - Shape-encoded payload (data types only)
//! ```
//!
//! All integers are little-endian. Payload encodings per shape are
//! documented on the writer.
//!
//! # Version History
//!
//! - Version 1: Initial format specification

mod reader;
mod writer;

pub(crate) use reader::read_model;
pub(crate) use writer::write_model;

use std::io::{Read, Write};

use crate::error::{Result, SaveError};

/// Magic bytes identifying a binary save: "LBSR"
pub const MAGIC_BYTES: [u8; 4] = *b"LBSR";

/// Format revision this build reads and writes
pub const FORMAT_VERSION: u32 = 1;

/// Binary format header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Format revision of the container itself
    pub format_version: u32,

    /// Caller-defined save version, the same number the text format
    /// records in `meta.version`
    pub save_version: u32,
}

impl Header {
    /// Encoded size of the header
    pub const SIZE: usize = 4 + 4 + 4; // magic + format version + save version

    /// Create a header for the current format revision
    pub fn new(save_version: u32) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            save_version,
        }
    }

    /// Serializes the header
    pub fn write(&self, writer: &mut dyn Write) -> Result<()> {
        writer.write_all(&MAGIC_BYTES)?;
        writer.write_all(&self.format_version.to_le_bytes())?;
        writer.write_all(&self.save_version.to_le_bytes())?;
        Ok(())
    }

    /// Parses and checks a header
    ///
    /// # Errors
    ///
    /// Fails with [`SaveError::InvalidMagic`] when the blob does not start
    /// with `LBSR`, and [`SaveError::UnsupportedFormatVersion`] when the
    /// format revision is newer than this build understands.
    pub fn read(reader: &mut dyn Read) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader
            .read_exact(&mut magic)
            .map_err(|_| SaveError::invalid_format("save shorter than the header"))?;
        if magic != MAGIC_BYTES {
            return Err(SaveError::InvalidMagic { found: magic });
        }

        let mut version_bytes = [0u8; 4];
        reader
            .read_exact(&mut version_bytes)
            .map_err(|_| SaveError::invalid_format("save shorter than the header"))?;
        let format_version = u32::from_le_bytes(version_bytes);
        if format_version > FORMAT_VERSION {
            return Err(SaveError::UnsupportedFormatVersion(format_version));
        }

        let mut save_version_bytes = [0u8; 4];
        reader
            .read_exact(&mut save_version_bytes)
            .map_err(|_| SaveError::invalid_format("save shorter than the header"))?;
        let save_version = u32::from_le_bytes(save_version_bytes);

        Ok(Self {
            format_version,
            save_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_round_trips() {
        let header = Header::new(7);

        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();
        assert_eq!(bytes.len(), Header::SIZE);

        let mut cursor = Cursor::new(bytes);
        assert_eq!(Header::read(&mut cursor).unwrap(), header);
    }

    #[test]
    fn test_header_rejects_foreign_magic() {
        let mut bytes = b"WSAV".to_vec();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());

        let mut cursor = Cursor::new(bytes);
        assert!(matches!(
            Header::read(&mut cursor),
            Err(SaveError::InvalidMagic { found }) if &found == b"WSAV"
        ));
    }

    #[test]
    fn test_header_rejects_newer_format() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&MAGIC_BYTES);
        buffer.extend_from_slice(&2u32.to_le_bytes());
        buffer.extend_from_slice(&1u32.to_le_bytes());

        let mut cursor = Cursor::new(buffer);
        let result = Header::read(&mut cursor);

        assert!(matches!(
            result,
            Err(SaveError::UnsupportedFormatVersion(2))
        ));
    }

    #[test]
    fn test_header_truncated() {
        let mut cursor = Cursor::new(vec![b'L', b'B']);
        assert!(matches!(
            Header::read(&mut cursor),
            Err(SaveError::InvalidSaveFormat(_))
        ));
    }
}

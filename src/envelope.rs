//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Compression envelope and save slot layout.
//!
//! The envelope frames a save blob with a fixed 9-byte header so loaders
//! can tell compressed payloads from raw ones before touching the body:
//!
//! ```text
//! magic[4]  "LBSR" raw / "LBSC" compressed
//! algo[1]   compression algorithm id
//! size[4]   uncompressed payload size, little-endian
//! ```
//!
//! Only algorithm 0 (none) is defined; the decode path returns the payload
//! verbatim. The header exists so compressed saves can be introduced later
//! without changing file layouts.
//!
//! [`SlotConfig`] is the path layout for save directories: numbered manual
//! slots plus a rotating ring of auto-save slots.

use std::fs;
use std::path::{Path, PathBuf};

use crate::codec::Limits;
use crate::error::{Result, SaveError};

/// Envelope magic for a raw (uncompressed) payload.
pub const RAW_MAGIC: [u8; 4] = *b"LBSR";

/// Envelope magic for a compressed payload.
pub const COMPRESSED_MAGIC: [u8; 4] = *b"LBSC";

/// Size of the envelope header in bytes.
pub const ENVELOPE_HEADER_SIZE: usize = 9;

/// Compression algorithm id: no compression.
pub const ALGORITHM_NONE: u8 = 0;

/// Whether `bytes` start with an envelope magic.
pub fn has_header(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && (bytes[..4] == RAW_MAGIC || bytes[..4] == COMPRESSED_MAGIC)
}

/// Frames a payload in a raw envelope.
pub fn wrap(payload: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(ENVELOPE_HEADER_SIZE + payload.len());
    framed.extend_from_slice(&RAW_MAGIC);
    framed.push(ALGORITHM_NONE);
    framed.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    framed.extend_from_slice(payload);
    framed
}

/// Unframes an envelope, returning the payload.
///
/// # Errors
///
/// Fails with [`SaveError::InvalidMagic`] when the magic is unknown, and
/// with [`SaveError::InvalidSaveFormat`] on an unknown algorithm id, a
/// truncated header, or a payload whose length disagrees with the header.
pub fn unwrap(bytes: &[u8]) -> Result<&[u8]> {
    if bytes.len() < ENVELOPE_HEADER_SIZE {
        return Err(SaveError::invalid_format("envelope shorter than its header"));
    }
    let mut magic = [0u8; 4];
    magic.copy_from_slice(&bytes[..4]);
    if magic != RAW_MAGIC && magic != COMPRESSED_MAGIC {
        return Err(SaveError::InvalidMagic { found: magic });
    }

    let algorithm = bytes[4];
    if algorithm != ALGORITHM_NONE {
        return Err(SaveError::invalid_format(format!(
            "unknown compression algorithm id {}",
            algorithm
        )));
    }

    let size = u32::from_le_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]) as usize;
    let payload = &bytes[ENVELOPE_HEADER_SIZE..];
    if payload.len() != size {
        return Err(SaveError::invalid_format(format!(
            "envelope declares {} payload bytes but carries {}",
            size,
            payload.len()
        )));
    }

    // Algorithm 0 stores the payload verbatim.
    Ok(payload)
}

/// Path layout for a save directory.
///
/// Manual slots live at `<dir>/<slot_prefix><NN>.<ext>` and auto-save
/// slots at `<dir>/<auto_prefix><NN>.<ext>`, with `NN` the zero-padded
/// two-digit slot index. Auto-saves rotate modulo the configured slot
/// count.
///
/// # Examples
///
/// ```
/// use worldsave::SlotConfig;
///
/// let slots = SlotConfig::new("saves");
/// assert_eq!(slots.slot_path(3).to_str().unwrap(), "saves/slot_03.sav");
/// assert_eq!(slots.auto_path(0).to_str().unwrap(), "saves/auto_00.sav");
/// assert_eq!(slots.next_auto_index(2), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotConfig {
    dir: PathBuf,
    slot_prefix: String,
    auto_prefix: String,
    extension: String,
    auto_slot_count: u32,
}

impl SlotConfig {
    /// Creates a layout under `dir` with defaults: `slot_` / `auto_`
    /// prefixes, `sav` extension, three auto slots.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            slot_prefix: "slot_".to_string(),
            auto_prefix: "auto_".to_string(),
            extension: "sav".to_string(),
            auto_slot_count: 3,
        }
    }

    /// Sets the manual slot file prefix.
    pub fn with_slot_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.slot_prefix = prefix.into();
        self
    }

    /// Sets the auto-save slot file prefix.
    pub fn with_auto_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.auto_prefix = prefix.into();
        self
    }

    /// Sets the file extension (without the dot).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Sets the number of rotating auto-save slots.
    pub fn with_auto_slot_count(mut self, count: u32) -> Self {
        self.auto_slot_count = count.max(1);
        self
    }

    /// The save directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of rotating auto-save slots.
    pub fn auto_slot_count(&self) -> u32 {
        self.auto_slot_count
    }

    /// Path of a manual slot.
    pub fn slot_path(&self, index: u32) -> PathBuf {
        self.dir.join(format!(
            "{}{:02}.{}",
            self.slot_prefix, index, self.extension
        ))
    }

    /// Path of an auto-save slot.
    pub fn auto_path(&self, index: u32) -> PathBuf {
        self.dir.join(format!(
            "{}{:02}.{}",
            self.auto_prefix, index, self.extension
        ))
    }

    /// The auto-save slot to write after `current`, rotating modulo the
    /// slot count.
    pub fn next_auto_index(&self, current: u32) -> u32 {
        (current + 1) % self.auto_slot_count
    }
}

/// Writes a save blob to a file, creating the parent directory if needed.
///
/// # Errors
///
/// Surfaces I/O errors annotated with the file path.
pub fn write_save_file(path: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| SaveError::from(e).with_path(path))?;
    }
    fs::write(path, bytes).map_err(|e| SaveError::from(e).with_path(path))
}

/// Reads a save file, enforcing the configured read cap.
///
/// # Errors
///
/// Fails with [`SaveError::FileTooLarge`] past the cap; I/O errors are
/// annotated with the file path.
pub fn read_save_file(path: impl AsRef<Path>, limits: &Limits) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let len = fs::metadata(path)
        .map_err(|e| SaveError::from(e).with_path(path))?
        .len();
    if len > limits.max_file_len {
        return Err(SaveError::FileTooLarge {
            len,
            max: limits.max_file_len,
        });
    }
    fs::read(path).map_err(|e| SaveError::from(e).with_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_unwrap_roundtrip() {
        let payload = b"not actually compressed";
        let framed = wrap(payload);

        assert_eq!(framed.len(), ENVELOPE_HEADER_SIZE + payload.len());
        assert!(has_header(&framed));
        assert_eq!(unwrap(&framed).unwrap(), payload);
    }

    #[test]
    fn test_has_header_sniffs_both_magics() {
        assert!(has_header(b"LBSR....."));
        assert!(has_header(b"LBSC....."));
        assert!(!has_header(b"PNG\x0d"));
        assert!(!has_header(b"LB"));
    }

    #[test]
    fn test_unwrap_rejects_unknown_magic() {
        let mut framed = wrap(b"payload");
        framed[..4].copy_from_slice(b"XXXX");
        assert!(matches!(
            unwrap(&framed),
            Err(SaveError::InvalidMagic { .. })
        ));
    }

    #[test]
    fn test_unwrap_rejects_unknown_algorithm() {
        let mut framed = wrap(b"payload");
        framed[4] = 9;
        assert!(matches!(
            unwrap(&framed),
            Err(SaveError::InvalidSaveFormat(_))
        ));
    }

    #[test]
    fn test_unwrap_rejects_size_disagreement() {
        let mut framed = wrap(b"payload");
        framed.truncate(framed.len() - 2);
        assert!(matches!(
            unwrap(&framed),
            Err(SaveError::InvalidSaveFormat(_))
        ));
    }

    #[test]
    fn test_slot_paths_are_zero_padded() {
        let slots = SlotConfig::new("saves")
            .with_slot_prefix("save_")
            .with_extension("dat");
        assert_eq!(slots.slot_path(0).to_str().unwrap(), "saves/save_00.dat");
        assert_eq!(slots.slot_path(12).to_str().unwrap(), "saves/save_12.dat");
    }

    #[test]
    fn test_auto_rotation_wraps() {
        let slots = SlotConfig::new("saves").with_auto_slot_count(4);
        assert_eq!(slots.next_auto_index(0), 1);
        assert_eq!(slots.next_auto_index(3), 0);
    }

    #[test]
    fn test_file_roundtrip_with_cap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slot_00.sav");

        let framed = wrap(b"save data");
        write_save_file(&path, &framed).unwrap();

        let read = read_save_file(&path, &Limits::default()).unwrap();
        assert_eq!(read, framed);

        let tiny = Limits {
            max_file_len: 4,
            ..Limits::default()
        };
        assert!(matches!(
            read_save_file(&path, &tiny),
            Err(SaveError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn test_missing_file_error_names_the_path() {
        let result = read_save_file("saves/absent_99.sav", &Limits::default());
        match result {
            Err(SaveError::Io(err)) => assert!(err.to_string().contains("absent_99.sav")),
            other => panic!("expected Io error, got {:?}", other.err()),
        }
    }
}

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

//! Error types for the save system.
//!
//! This module provides the error surface for every save, load, migration
//! and validation operation, with detailed error messages and context
//! information to aid in debugging.
//!
//! Errors fall into three classes:
//!
//! - **Input errors**: a malformed or mismatched save blob. Surfaced to the
//!   caller; the output of the failing call is untouched.
//! - **Schema errors**: a component type or codec configuration that can
//!   never work. Raised when the codec is constructed, never at runtime.
//! - **Resource limits**: a blob exceeding a configured bound, surfaced as
//!   distinct errors so operators can raise limits explicitly.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type for save system operations.
pub type Result<T> = std::result::Result<T, SaveError>;

/// Errors that can occur during save, load, migration or validation.
///
/// Variants carry the concrete values involved (versions, lengths, type
/// names) so messages stay actionable, and [`SaveError::suggestion`]
/// offers a next step for the common ones.
#[derive(Debug)]
pub enum SaveError {
    /// Underlying file I/O failure, annotated with the path when one is
    /// known.
    Io(io::Error),

    /// The save blob was written by a newer library or game version.
    ///
    /// Loading would require knowledge this build does not have.
    SaveFromNewerVersion {
        /// Version found in the save blob.
        found: u32,
        /// Highest version this build accepts.
        max: u32,
    },

    /// The save blob predates the oldest loadable version.
    ///
    /// Register migrations covering the gap, or raise the floor explicitly.
    SaveTooOld {
        /// Version found in the save blob.
        found: u32,
        /// Lowest version this build accepts.
        min: u32,
    },

    /// The blob is not structurally a save.
    ///
    /// This indicates the data is not recognized or has been corrupted.
    InvalidSaveFormat(String),

    /// A component type name in the blob is not part of the codec's set.
    UnregisteredComponent(String),

    /// An entity reference field held a value that cannot name an entity.
    InvalidEntityReference(String),

    /// A value in the blob does not match the declared shape.
    TypeMismatch {
        /// What the shape called for.
        expected: String,
        /// What the blob actually held.
        found: String,
    },

    /// A fixed-size array held the wrong number of elements.
    ArrayLengthMismatch {
        /// Declared length.
        expected: usize,
        /// Length found in the blob.
        found: usize,
    },

    /// A struct field is absent and the shape declares no default for it.
    MissingField {
        /// Component type being decoded.
        component: String,
        /// Name of the absent field.
        field: String,
    },

    /// An enum value names no declared variant.
    InvalidEnumValue(String),

    /// A tagged-union discriminator names no declared variant.
    InvalidUnionTag(String),

    /// The recorded checksum disagrees with the components section,
    /// meaning the section was altered after the checksum was written.
    ChecksumMismatch {
        /// Checksum recorded in the blob.
        expected: u32,
        /// Checksum of the blob as read.
        actual: u32,
    },

    /// A string exceeds the configured length cap.
    StringTooLong {
        /// Length found in the blob.
        len: usize,
        /// Configured cap.
        max: usize,
    },

    /// A dynamic array exceeds the configured element cap.
    ArrayTooLong {
        /// Length found in the blob.
        len: usize,
        /// Configured cap.
        max: usize,
    },

    /// The first bytes of a binary blob are not a known magic.
    InvalidMagic {
        /// The four bytes actually found.
        found: [u8; 4],
    },

    /// The binary blob uses a format revision newer than this build.
    UnsupportedFormatVersion(u32),

    /// A selected component type has no key in the save.
    ///
    /// Opt into `skip_missing` on the codec to ignore absent types instead.
    ComponentNotInSave(String),

    /// No registered migration step leads from the blob's version onward.
    NoMigrationPath {
        /// Version the chain stalled at.
        from: u32,
        /// Version the caller asked for.
        target: u32,
    },

    /// The save metadata carries no version number.
    MissingVersion,

    /// A registered type cannot be serialized through the generic path.
    ///
    /// Raised when the codec is constructed, so it cannot reach production.
    NotSerializable {
        /// Name of the offending type.
        type_name: String,
        /// Why the shape was rejected.
        reason: String,
    },

    /// The codec or component set was configured inconsistently.
    ///
    /// Raised at construction time, never from a save or load call.
    Schema(String),

    /// A save file exceeds the configured read cap.
    FileTooLarge {
        /// Size of the file on disk.
        len: u64,
        /// Configured cap.
        max: u64,
    },
}

impl SaveError {
    /// Builds an [`SaveError::InvalidSaveFormat`] from a message.
    ///
    /// # Example
    ///
    /// ```
    /// use worldsave::SaveError;
    ///
    /// let error = SaveError::invalid_format("root is not an object");
    /// ```
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidSaveFormat(msg.into())
    }

    /// Create a type mismatch error.
    ///
    /// # Example
    ///
    /// ```
    /// use worldsave::SaveError;
    ///
    /// let error = SaveError::type_mismatch("bool", "number 3");
    /// ```
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a schema error with a message.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create a missing field error.
    pub fn missing_field(component: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            component: component.into(),
            field: field.into(),
        }
    }

    /// Annotates an I/O error with the file path it came from.
    ///
    /// Non-I/O errors pass through unchanged.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use worldsave::SaveError;
    /// use std::fs::File;
    /// use std::path::Path;
    ///
    /// let path = Path::new("slot_00.sav");
    /// let result = File::open(path)
    ///     .map_err(|e| SaveError::from(e).with_path(path));
    /// ```
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Self::Io(err) => {
                let path: PathBuf = path.into();
                Self::Io(io::Error::new(
                    err.kind(),
                    format!("{} (file: {})", err, path.display()),
                ))
            }
            other => other,
        }
    }

    /// A short hint toward resolving this error, when one exists.
    ///
    /// `None` means the error has no generic next step and the message
    /// itself is all there is to say.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::SaveFromNewerVersion { .. } => {
                Some("Update the game to a build that understands this save version")
            }
            Self::SaveTooOld { .. } => Some(
                "Register migration steps covering the version gap, or lower the minimum loadable version",
            ),
            Self::UnregisteredComponent(_) => {
                Some("Add the component type to the codec's component set before loading")
            }
            Self::ComponentNotInSave(_) => {
                Some("Enable skip_missing on the codec to ignore types the save does not carry")
            }
            Self::ChecksumMismatch { .. } => {
                Some("The save may be corrupted. Try loading from a backup slot")
            }
            Self::InvalidSaveFormat(_) | Self::InvalidMagic { .. } => {
                Some("Ensure the file is a save produced by this library and has not been truncated")
            }
            Self::StringTooLong { .. } | Self::ArrayTooLong { .. } | Self::FileTooLarge { .. } => {
                Some("Raise the corresponding limit on the codec options if the data is legitimate")
            }
            Self::NoMigrationPath { .. } => {
                Some("Register a migration step for every version between the save and the target")
            }
            _ => None,
        }
    }

    /// Whether the save data itself looks damaged, as opposed to merely
    /// mismatched with the registered schema.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::ChecksumMismatch { .. } | Self::InvalidSaveFormat(_) | Self::InvalidMagic { .. }
        )
    }

    /// Check if this error was caused by codec or component configuration.
    ///
    /// Schema errors are raised at construction time; seeing one means the
    /// calling code, not the save data, needs fixing.
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Self::Schema(_) | Self::NotSerializable { .. })
    }

    /// Check if this error is a resource limit rather than bad data.
    pub fn is_limit(&self) -> bool {
        matches!(
            self,
            Self::StringTooLong { .. } | Self::ArrayTooLong { .. } | Self::FileTooLarge { .. }
        )
    }
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {}", err)?,
            Self::SaveFromNewerVersion { found, max } => write!(
                f,
                "Save version {} is newer than the maximum supported version {}",
                found, max
            )?,
            Self::SaveTooOld { found, min } => write!(
                f,
                "Save version {} predates the minimum loadable version {}",
                found, min
            )?,
            Self::InvalidSaveFormat(msg) => write!(f, "Invalid save format: {}", msg)?,
            Self::UnregisteredComponent(name) => {
                write!(f, "Component type '{}' is not registered", name)?
            }
            Self::InvalidEntityReference(msg) => {
                write!(f, "Invalid entity reference: {}", msg)?
            }
            Self::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {}, found {}", expected, found)?
            }
            Self::ArrayLengthMismatch { expected, found } => write!(
                f,
                "Array length mismatch: expected {} elements, found {}",
                expected, found
            )?,
            Self::MissingField { component, field } => write!(
                f,
                "Missing field '{}' in component '{}' and no default is declared",
                field, component
            )?,
            Self::InvalidEnumValue(msg) => write!(f, "Invalid enum value: {}", msg)?,
            Self::InvalidUnionTag(msg) => write!(f, "Invalid union tag: {}", msg)?,
            Self::ChecksumMismatch { expected, actual } => write!(
                f,
                "Checksum mismatch: expected 0x{:08x}, got 0x{:08x}",
                expected, actual
            )?,
            Self::StringTooLong { len, max } => {
                write!(f, "String of {} bytes exceeds the {} byte cap", len, max)?
            }
            Self::ArrayTooLong { len, max } => {
                write!(f, "Array of {} elements exceeds the {} element cap", len, max)?
            }
            Self::InvalidMagic { found } => {
                write!(f, "Invalid magic bytes: {:?}", found)?
            }
            Self::UnsupportedFormatVersion(version) => {
                write!(f, "Unsupported binary format version: {}", version)?
            }
            Self::ComponentNotInSave(name) => {
                write!(f, "Component type '{}' is not present in the save", name)?
            }
            Self::NoMigrationPath { from, target } => write!(
                f,
                "No migration path from version {} toward version {}",
                from, target
            )?,
            Self::MissingVersion => write!(f, "Save metadata carries no version number")?,
            Self::NotSerializable { type_name, reason } => write!(
                f,
                "Component type '{}' is not serializable: {}",
                type_name, reason
            )?,
            Self::Schema(msg) => write!(f, "Schema error: {}", msg)?,
            Self::FileTooLarge { len, max } => write!(
                f,
                "Save file of {} bytes exceeds the {} byte read cap",
                len, max
            )?,
        }
        if let Some(suggestion) = self.suggestion() {
            write!(f, "\nSuggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for SaveError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for SaveError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidSaveFormat(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let error = SaveError::SaveFromNewerVersion { found: 99, max: 1 };
        let text = error.to_string();
        assert!(text.contains("99"));
        assert!(text.contains("1"));
    }

    #[test]
    fn test_suggestion_for_version_errors() {
        assert!(
            SaveError::SaveFromNewerVersion { found: 2, max: 1 }
                .suggestion()
                .is_some()
        );
        assert!(
            SaveError::SaveTooOld { found: 1, min: 3 }
                .suggestion()
                .is_some()
        );
    }

    #[test]
    fn test_corruption_classification() {
        assert!(
            SaveError::ChecksumMismatch {
                expected: 1,
                actual: 2
            }
            .is_corruption()
        );
        assert!(SaveError::invalid_format("truncated").is_corruption());
        assert!(!SaveError::MissingVersion.is_corruption());
    }

    #[test]
    fn test_schema_classification() {
        assert!(SaveError::schema("subset contains unknown type").is_schema_error());
        assert!(
            SaveError::NotSerializable {
                type_name: "Cursor".into(),
                reason: "raw pointer field".into(),
            }
            .is_schema_error()
        );
        assert!(!SaveError::MissingVersion.is_schema_error());
    }

    #[test]
    fn test_limit_classification() {
        assert!(
            SaveError::StringTooLong {
                len: 20_000_000,
                max: 10_485_760
            }
            .is_limit()
        );
        assert!(
            SaveError::FileTooLarge {
                len: 200_000_000,
                max: 104_857_600
            }
            .is_limit()
        );
        assert!(!SaveError::MissingVersion.is_limit());
    }

    #[test]
    fn test_with_path_annotates_io_errors() {
        let error = SaveError::from(io::Error::new(io::ErrorKind::NotFound, "no such file"));
        let text = error.with_path("saves/slot_03.sav").to_string();
        assert!(text.contains("slot_03.sav"));
    }

    #[test]
    fn test_with_path_leaves_other_errors_alone() {
        let error = SaveError::MissingVersion.with_path("saves/slot_03.sav");
        assert!(matches!(error, SaveError::MissingVersion));
    }
}

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

//! Structural validation and integrity checking of text save blobs.
//!
//! [`validate`] answers "can this blob be loaded at all" without touching
//! a registry: structure, version window, and an optional CRC-32 check.
//! The checksum covers a *canonical* re-emission of the `components`
//! subtree: whitespace-free, object keys sorted lexicographically. That
//! makes verification independent of emission order and text formatting,
//! and identical across platforms.

use crate::error::{Result, SaveError};

/// Verdict of a validation run.
///
/// Validation is a question, not a failure: every verdict is a normal
/// return value so slot browsers can show "corrupted" next to "too new"
/// without unwinding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The blob is structurally sound and loadable.
    Valid,
    /// The blob carries no `meta` object.
    MissingMetadata,
    /// The blob is not shaped like a save.
    InvalidStructure(String),
    /// The blob's version exceeds what the caller accepts.
    VersionMismatch {
        /// Version found in the blob.
        found: u32,
        /// Highest accepted version.
        max: u32,
    },
    /// The recorded checksum does not match the components section.
    ChecksumMismatch {
        /// Checksum recorded in the blob.
        expected: u32,
        /// Checksum of the blob as read.
        actual: u32,
    },
}

impl Validation {
    /// Whether the verdict is [`Validation::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// CRC-32 (IEEE) of a byte slice.
///
/// Stable across runs and platforms; this is the checksum recorded in
/// `meta.checksum`.
pub fn crc32(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}

/// Validates a text blob against `max_accepted_version`.
///
/// Checks, in order: the blob parses; the root is an object; `meta` is
/// present; `meta.version` is an integer no greater than the accepted
/// maximum; the optional `meta.checksum` matches the CRC-32 of the
/// canonical `components` re-emission; `components` is present and an
/// object.
pub fn validate(blob: &str, max_accepted_version: u32) -> Validation {
    let root: serde_json::Value = match serde_json::from_str(blob) {
        Ok(root) => root,
        Err(err) => return Validation::InvalidStructure(format!("malformed text: {}", err)),
    };
    let Some(root) = root.as_object() else {
        return Validation::InvalidStructure("root is not an object".to_string());
    };

    let Some(meta) = root.get("meta") else {
        return Validation::MissingMetadata;
    };
    let Some(meta) = meta.as_object() else {
        return Validation::InvalidStructure("'meta' is not an object".to_string());
    };

    let Some(version) = meta.get("version").and_then(serde_json::Value::as_u64) else {
        return Validation::InvalidStructure("'meta.version' is not an integer".to_string());
    };
    let version = version as u32;
    if version > max_accepted_version {
        return Validation::VersionMismatch {
            found: version,
            max: max_accepted_version,
        };
    }

    if let Some(expected) = meta.get("checksum").and_then(serde_json::Value::as_u64) {
        let Some(components) = root.get("components") else {
            return Validation::InvalidStructure("missing 'components' object".to_string());
        };
        let actual = crc32(&canonical_bytes(components));
        if expected as u32 != actual {
            return Validation::ChecksumMismatch {
                expected: expected as u32,
                actual,
            };
        }
    }

    if !root.get("components").is_some_and(serde_json::Value::is_object) {
        return Validation::InvalidStructure("missing 'components' object".to_string());
    }

    Validation::Valid
}

/// Re-emits a blob with `meta.checksum` populated.
///
/// The checksum is computed with the same canonical rule [`validate`]
/// verifies against, so the pair is deterministic regardless of the
/// whitespace mode the blob was written in. A pretty blob stays pretty,
/// a compact blob stays compact. A blob without metadata gains a metadata
/// object holding only the checksum.
///
/// # Errors
///
/// Fails on malformed blobs or a non-object root.
pub fn add_checksum(blob: &str) -> Result<String> {
    let mut root: serde_json::Value = serde_json::from_str(blob)?;
    let pretty = blob.contains('\n');

    let checksum = {
        let components = root
            .get("components")
            .ok_or_else(|| SaveError::invalid_format("missing 'components' object"))?;
        crc32(&canonical_bytes(components))
    };

    let root_object = root
        .as_object_mut()
        .ok_or_else(|| SaveError::invalid_format("root is not an object"))?;
    let meta = root_object
        .entry("meta")
        .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
    let meta = meta
        .as_object_mut()
        .ok_or_else(|| SaveError::invalid_format("'meta' is not an object"))?;
    meta.insert("checksum".to_string(), serde_json::Value::from(checksum));

    Ok(if pretty {
        serde_json::to_string_pretty(&root)?
    } else {
        serde_json::to_string(&root)?
    })
}

/// Canonical byte encoding of a JSON subtree: whitespace-free with object
/// keys sorted lexicographically.
pub(crate) fn canonical_bytes(value: &serde_json::Value) -> Vec<u8> {
    let mut out = Vec::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &serde_json::Value, out: &mut Vec<u8>) {
    match value {
        serde_json::Value::Null => out.extend_from_slice(b"null"),
        serde_json::Value::Bool(true) => out.extend_from_slice(b"true"),
        serde_json::Value::Bool(false) => out.extend_from_slice(b"false"),
        serde_json::Value::Number(number) => out.extend_from_slice(number.to_string().as_bytes()),
        serde_json::Value::String(text) => {
            // serde_json never fails to serialize a plain string.
            let escaped = serde_json::to_string(text).expect("string serialization");
            out.extend_from_slice(escaped.as_bytes());
        }
        serde_json::Value::Array(elements) => {
            out.push(b'[');
            for (index, element) in elements.iter().enumerate() {
                if index > 0 {
                    out.push(b',');
                }
                write_canonical(element, out);
            }
            out.push(b']');
        }
        serde_json::Value::Object(object) => {
            let mut keys: Vec<&String> = object.keys().collect();
            keys.sort();
            out.push(b'{');
            for (index, key) in keys.into_iter().enumerate() {
                if index > 0 {
                    out.push(b',');
                }
                let escaped = serde_json::to_string(key).expect("string serialization");
                out.extend_from_slice(escaped.as_bytes());
                out.push(b':');
                write_canonical(&object[key], out);
            }
            out.push(b'}');
        }
    }
}

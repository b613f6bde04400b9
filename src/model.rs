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

//! The logical save model.
//!
//! Both wire formats encode the same thing: a metadata block and, per
//! component type, a sequence of per-entity records. [`SaveModel`] is that
//! thing, in memory. The registry codec produces a model and hands it to a
//! format writer; a format reader produces a model and the registry codec
//! consumes it. Keeping one model between the formats is what guarantees a
//! binary save and its text equivalent populate identical registries.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::schema::Value;

/// Metadata block of a save.
///
/// Field order here is the emission order of the `meta` object in the text
/// format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveMeta {
    /// Caller-defined save version, gated on load and consumed by
    /// migrations.
    pub version: u32,
    /// Version of this library that wrote the save.
    pub lib_version: String,
    /// Unix timestamp (seconds) of the moment the save was written.
    pub timestamp: i64,
    /// Optional game name, for slot browsers and diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_name: Option<String>,
    /// Optional CRC-32 of the canonical components section.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<u32>,
}

impl SaveMeta {
    /// Creates metadata stamped with the current time and this library's
    /// version.
    pub fn new(version: u32, game_name: Option<String>) -> Self {
        Self {
            version,
            lib_version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().timestamp(),
            game_name,
            checksum: None,
        }
    }
}

/// One per-entity record of a component type.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A tag type records only the entity that carries it.
    Tag(u32),
    /// A data type records the entity and the component value.
    Data {
        /// Saved entity id.
        entity: u32,
        /// Component value in the shape-conformant value model.
        value: Value,
    },
}

impl Record {
    /// The saved entity id of this record.
    pub fn entity_id(&self) -> u32 {
        match self {
            Self::Tag(id) => *id,
            Self::Data { entity, .. } => *entity,
        }
    }
}

/// A parsed save: metadata plus per-type record sequences in observed
/// order.
#[derive(Debug, Clone, Default)]
pub struct SaveModel {
    /// Metadata block, when the save carries one.
    pub meta: Option<SaveMeta>,
    /// Component type name → records, in emission order.
    pub components: Vec<(String, Vec<Record>)>,
}

impl SaveModel {
    /// Looks up the records of one component type.
    pub fn records(&self, name: &str) -> Option<&[Record]> {
        self.components
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, records)| records.as_slice())
    }

    /// Whether the save carries a key for `name`, regardless of record
    /// count.
    pub fn contains(&self, name: &str) -> bool {
        self.components.iter().any(|(key, _)| key == name)
    }

    /// Number of distinct entities across all records.
    pub fn distinct_entity_count(&self) -> u32 {
        let mut seen = HashSet::new();
        for (_, records) in &self.components {
            for record in records {
                seen.insert(record.entity_id());
            }
        }
        seen.len() as u32
    }
}

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

//! The registry codec: save and load whole registries.
//!
//! [`SaveCodec`] walks an ordered [`ComponentSet`] against a registry and
//! drives the two wire formats. A serialize call runs to completion and
//! returns the blob; nothing is emitted on failure. A load runs two
//! passes: pass one walks every record and allocates a fresh registry
//! entity per distinct saved id, building the remap table; pass two
//! decodes payloads, rewrites entity references through the table, and
//! attaches components.
//!
//! # Atomicity
//!
//! Calls are transactional at the call level: a failed serialize emits
//! nothing, and a failed load leaves the blob untouched. Entities already
//! created by pass one of a failed load are *not* rolled back; callers
//! that need strict atomicity load into a throwaway registry and swap it
//! in on success.
//!
//! # Selective codecs
//!
//! [`SaveCodec::selective`] builds a codec over a subset of an
//! all-components set, checked at construction. A selective codec ignores
//! component types in the blob that it does not know; the full codec
//! treats them as [`SaveError::UnregisteredComponent`]. Types the codec
//! knows but the blob lacks fail with
//! [`SaveError::ComponentNotInSave`] unless `skip_missing` is set. A key
//! that is present with zero records counts as present.

pub mod binary;
pub mod text;

use crate::entity::EntityMap;
use crate::error::{Result, SaveError};
use crate::log::{LogConfig, LogLevel};
use crate::model::{Record, SaveMeta, SaveModel};
use crate::registry::Registry;
use crate::schema::rewrite_entity_refs;
use crate::set::ComponentSet;

/// Default cap on decoded string length: 10 MiB.
pub const MAX_STRING_LEN: usize = 10 * 1024 * 1024;

/// Default cap on decoded dynamic array length: 10 million elements.
pub const MAX_ARRAY_LEN: usize = 10_000_000;

/// Default cap on save file reads: 100 MiB.
pub const MAX_FILE_LEN: u64 = 100 * 1024 * 1024;

/// Resource bounds enforced while encoding and decoding.
///
/// Surfaced as distinct errors so operators can raise limits explicitly
/// rather than discovering truncation after the fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Longest permitted string, in bytes.
    pub max_string_len: usize,
    /// Longest permitted dynamic array, in elements.
    pub max_array_len: usize,
    /// Largest save file the file helpers will read, in bytes.
    pub max_file_len: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_string_len: MAX_STRING_LEN,
            max_array_len: MAX_ARRAY_LEN,
            max_file_len: MAX_FILE_LEN,
        }
    }
}

/// Configuration for a [`SaveCodec`].
///
/// # Examples
///
/// ```
/// use worldsave::CodecOptions;
///
/// let options = CodecOptions::new()
///     .with_pretty(true)
///     .with_save_version(3)
///     .with_version_window(2, 3)
///     .with_game_name("Skyvault");
/// ```
#[derive(Debug, Clone)]
pub struct CodecOptions {
    pretty: bool,
    write_metadata: bool,
    game_name: Option<String>,
    save_version: u32,
    min_version: u32,
    max_version: u32,
    skip_missing: bool,
    limits: Limits,
}

impl CodecOptions {
    /// Creates options with defaults: compact text, metadata on, save
    /// version 1, version window `[1, 1]`, strict missing-component
    /// handling, default limits.
    pub fn new() -> Self {
        Self {
            pretty: false,
            write_metadata: true,
            game_name: None,
            save_version: 1,
            min_version: 1,
            max_version: 1,
            skip_missing: false,
            limits: Limits::default(),
        }
    }

    /// Sets whether text output is pretty-printed.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Sets whether saves carry a metadata block.
    ///
    /// The binary metadata block has no on-wire presence flag; writer and
    /// reader must use the same setting.
    pub fn with_metadata(mut self, write_metadata: bool) -> Self {
        self.write_metadata = write_metadata;
        self
    }

    /// Sets the game name recorded in metadata.
    pub fn with_game_name(mut self, game_name: impl Into<String>) -> Self {
        self.game_name = Some(game_name.into());
        self
    }

    /// Sets the version stamped on new saves.
    pub fn with_save_version(mut self, version: u32) -> Self {
        self.save_version = version;
        self
    }

    /// Sets the loadable version window, inclusive on both ends.
    pub fn with_version_window(mut self, min: u32, max: u32) -> Self {
        self.min_version = min;
        self.max_version = max;
        self
    }

    /// Sets whether component types absent from a save are skipped
    /// silently instead of failing the load.
    pub fn with_skip_missing(mut self, skip_missing: bool) -> Self {
        self.skip_missing = skip_missing;
        self
    }

    /// Replaces the resource limits.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Whether text output is pretty-printed.
    pub fn is_pretty(&self) -> bool {
        self.pretty
    }

    /// The configured limits.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of a completed load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Entities freshly allocated by the remap pass.
    pub entities_created: usize,
    /// Components attached, tags included.
    pub components_inserted: usize,
    /// Version the save declared, if it carried metadata.
    pub save_version: Option<u32>,
}

/// Serializer and deserializer over one component set.
///
/// # Examples
///
/// ```ignore
/// let set = ComponentSet::builder()
///     .data::<Position>()
///     .data::<Health>()
///     .tag::<Player>("Player")
///     .build()?;
/// let codec = SaveCodec::new(set)?;
///
/// let blob = codec.to_text(&registry)?;
/// let mut restored = Registry::new();
/// let report = codec.from_text(&blob, &mut restored)?;
/// ```
pub struct SaveCodec {
    set: ComponentSet,
    lenient_types: bool,
    options: CodecOptions,
    log: LogConfig,
}

impl SaveCodec {
    /// Creates a codec over the full component set.
    ///
    /// # Errors
    ///
    /// Fails if any registered shape is not serializable.
    pub fn new(set: ComponentSet) -> Result<Self> {
        set.validate_serializable()?;
        Ok(Self {
            set,
            lenient_types: false,
            options: CodecOptions::new(),
            log: LogConfig::default(),
        })
    }

    /// Creates a codec over a subset of an all-components set.
    ///
    /// The resulting codec emits and parses only the subset, and ignores
    /// other component types it encounters in text blobs.
    ///
    /// # Errors
    ///
    /// Fails if `subset` names a type outside `all`, or if any shape in
    /// the subset is not serializable.
    pub fn selective(all: &ComponentSet, subset: ComponentSet) -> Result<Self> {
        if !subset.subset_of(all) {
            let stray = subset
                .names()
                .into_iter()
                .find(|name| !all.contains(name))
                .unwrap_or_default();
            return Err(SaveError::schema(format!(
                "selected component '{}' is not in the full set",
                stray
            )));
        }
        let mut codec = Self::new(subset)?;
        codec.lenient_types = true;
        Ok(codec)
    }

    /// Replaces the codec options.
    pub fn with_options(mut self, options: CodecOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the logging configuration.
    pub fn with_log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// The component set this codec walks.
    pub fn set(&self) -> &ComponentSet {
        &self.set
    }

    /// The active options.
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Serializes a registry to text.
    ///
    /// # Errors
    ///
    /// Fails if any component value does not conform to its registered
    /// shape or exceeds the configured limits. Nothing is emitted on
    /// failure.
    pub fn to_text(&self, registry: &Registry) -> Result<String> {
        let model = self.build_model(registry)?;
        let blob = text::write_model(&model, &self.set, &self.options.limits, self.options.pretty)?;
        self.log.emit(
            LogLevel::Info,
            &format!(
                "serialized {} component types to {} text bytes",
                model.components.len(),
                blob.len()
            ),
        );
        Ok(blob)
    }

    /// Serializes a registry to binary.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`SaveCodec::to_text`].
    pub fn to_binary(&self, registry: &Registry) -> Result<Vec<u8>> {
        let model = self.build_model(registry)?;
        let blob = binary::write_model(
            &model,
            &self.set,
            &self.options.limits,
            self.options.save_version,
        )?;
        self.log.emit(
            LogLevel::Info,
            &format!(
                "serialized {} component types to {} binary bytes",
                model.components.len(),
                blob.len()
            ),
        );
        Ok(blob)
    }

    /// Loads a text save into a registry.
    ///
    /// # Errors
    ///
    /// Fails on malformed blobs, version-window violations, unregistered
    /// types (full codecs only), or missing types without `skip_missing`.
    /// See the module docs for what a failed load leaves behind.
    pub fn from_text(&self, blob: &str, registry: &mut Registry) -> Result<LoadReport> {
        self.ensure_parseable()?;
        let parsed = text::read_model(blob, &self.set, &self.options.limits)?;
        if !self.lenient_types
            && let Some(unknown) = parsed.unknown.first()
        {
            return Err(SaveError::UnregisteredComponent(unknown.clone()));
        }
        self.populate(parsed.model, registry)
    }

    /// Loads a binary save into a registry.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`SaveCodec::from_text`], plus magic and
    /// format-revision checks. Binary payloads are not self-delimiting,
    /// so even selective codecs reject unknown types here.
    pub fn from_binary(&self, bytes: &[u8], registry: &mut Registry) -> Result<LoadReport> {
        self.ensure_parseable()?;
        let model = binary::read_model(
            bytes,
            &self.set,
            &self.options.limits,
            self.options.write_metadata,
        )?;
        self.populate(model, registry)
    }

    /// Collects the registry into the logical save model.
    fn build_model(&self, registry: &Registry) -> Result<SaveModel> {
        let meta = self
            .options
            .write_metadata
            .then(|| SaveMeta::new(self.options.save_version, self.options.game_name.clone()));

        let mut components = Vec::with_capacity(self.set.len());
        for spec in self.set.iter() {
            let entities = spec.collect(registry);
            self.log.emit(
                LogLevel::Debug,
                &format!("collecting '{}': {} instances", spec.name(), entities.len()),
            );
            let mut records = Vec::with_capacity(entities.len());
            for entity in entities {
                if spec.is_tag() {
                    records.push(Record::Tag(entity.id()));
                } else {
                    records.push(Record::Data {
                        entity: entity.id(),
                        value: spec.extract(registry, entity)?,
                    });
                }
            }
            components.push((spec.name().to_string(), records));
        }

        Ok(SaveModel { meta, components })
    }

    /// Two-pass load of a parsed model into a registry.
    fn populate(&self, model: SaveModel, registry: &mut Registry) -> Result<LoadReport> {
        let save_version = self.check_version_window(model.meta.as_ref())?;
        self.check_missing_components(&model)?;

        // Pass one: allocate a fresh entity per distinct saved id.
        let mut map = EntityMap::new();
        for (_, records) in &model.components {
            for record in records {
                let saved_id = record.entity_id();
                if !map.contains(saved_id) {
                    map.insert(saved_id, registry.create());
                }
            }
        }
        self.log.emit(
            LogLevel::Debug,
            &format!("remap pass allocated {} entities", map.len()),
        );

        // Pass two: decode, rewrite references, attach.
        let mut components_inserted = 0;
        for (name, records) in model.components {
            let spec = self
                .set
                .get(&name)
                .ok_or_else(|| SaveError::UnregisteredComponent(name.clone()))?;
            for record in records {
                let entity = map
                    .get(record.entity_id())
                    .unwrap_or_else(|| unreachable!("pass one mapped every record id"));
                match record {
                    Record::Tag(_) => spec.attach_tag(registry, entity)?,
                    Record::Data { mut value, .. } => {
                        if let Some(shape) = spec.shape() {
                            rewrite_entity_refs(shape, &mut value, &map);
                        }
                        spec.insert(registry, entity, &value)?;
                    }
                }
                components_inserted += 1;
            }
        }

        self.log.emit(
            LogLevel::Info,
            &format!(
                "loaded {} entities, {} components",
                map.len(),
                components_inserted
            ),
        );
        Ok(LoadReport {
            entities_created: map.len(),
            components_inserted,
            save_version,
        })
    }

    /// Gates the save version against the configured window.
    fn check_version_window(&self, meta: Option<&SaveMeta>) -> Result<Option<u32>> {
        let Some(meta) = meta else {
            self.log
                .emit(LogLevel::Debug, "save carries no metadata; version gate skipped");
            return Ok(None);
        };
        if meta.version > self.options.max_version {
            return Err(SaveError::SaveFromNewerVersion {
                found: meta.version,
                max: self.options.max_version,
            });
        }
        if meta.version < self.options.min_version {
            return Err(SaveError::SaveTooOld {
                found: meta.version,
                min: self.options.min_version,
            });
        }
        Ok(Some(meta.version))
    }

    /// Applies the skip-missing gate: every requested type must have a key
    /// in the save. Key presence counts, not record count.
    fn check_missing_components(&self, model: &SaveModel) -> Result<()> {
        for spec in self.set.iter() {
            if !model.contains(spec.name()) {
                if self.options.skip_missing {
                    self.log.emit(
                        LogLevel::Debug,
                        &format!("component '{}' not in save; skipped", spec.name()),
                    );
                } else {
                    return Err(SaveError::ComponentNotInSave(spec.name().to_string()));
                }
            }
        }
        Ok(())
    }

    /// Emit-only types may serialize but never deserialize; refuse before
    /// touching the blob.
    fn ensure_parseable(&self) -> Result<()> {
        for spec in self.set.iter() {
            if !spec.parseable() {
                return Err(SaveError::schema(format!(
                    "component '{}' provides emit only and cannot be loaded generically",
                    spec.name()
                )));
            }
        }
        Ok(())
    }
}

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

//! Version migrations over text save blobs.
//!
//! A migration step transforms a save from one version to the next without
//! involving the component types at all: the blob is parsed into a mutable
//! generic tree ([`SaveTree`]), edited in place, and re-emitted. That is
//! what lets a current build open saves written before a component was
//! renamed or a field grew a new meaning.
//!
//! The [`Migrator`] owns the registered steps and drives the chain: it
//! reads the blob's version, repeatedly applies the step registered for
//! that version, and stops when the target is reached.
//!
//! # Examples
//!
//! ```ignore
//! let mut migrator = Migrator::new();
//! migrator.register(1, 2, |tree| tree.rename_component("HP", "Health"));
//! migrator.register(2, 3, |tree| {
//!     tree.add_field_default("Health", "max", serde_json::json!(100))
//! });
//!
//! let outcome = migrator.migrate(&old_blob, 3)?;
//! assert_eq!(outcome.migrations_run, 2);
//! ```

use crate::error::{Result, SaveError};
use crate::log::{LogConfig, LogLevel};

/// A parsed save blob, mutable in place.
///
/// The tree wraps the parsed JSON document and exposes the edit
/// operations migrations are written in terms of. Edits that reference a
/// component or field that is absent are no-ops, so one step works across
/// saves that predate the component as well.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveTree {
    root: serde_json::Value,
}

impl SaveTree {
    /// Parses a text blob into a tree.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON, a non-object root, or a missing
    /// `components` object.
    pub fn parse(blob: &str) -> Result<Self> {
        let root: serde_json::Value = serde_json::from_str(blob)?;
        if !root.is_object() {
            return Err(SaveError::invalid_format("root is not an object"));
        }
        if !root.get("components").is_some_and(serde_json::Value::is_object) {
            return Err(SaveError::invalid_format("missing 'components' object"));
        }
        Ok(Self { root })
    }

    /// Re-emits the tree as a compact text blob.
    pub fn to_blob(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.root)?)
    }

    /// The version recorded in metadata.
    ///
    /// # Errors
    ///
    /// Fails with [`SaveError::MissingVersion`] when the blob has no
    /// integer `meta.version`.
    pub fn version(&self) -> Result<u32> {
        self.root
            .get("meta")
            .and_then(|meta| meta.get("version"))
            .and_then(serde_json::Value::as_u64)
            .map(|version| version as u32)
            .ok_or(SaveError::MissingVersion)
    }

    /// Overwrites the version in metadata, creating the metadata object if
    /// the blob lacks one.
    pub fn set_version(&mut self, version: u32) {
        let root = self.root.as_object_mut().expect("root checked at parse");
        let meta = root
            .entry("meta")
            .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
        if let Some(meta) = meta.as_object_mut() {
            meta.insert("version".to_string(), serde_json::Value::from(version));
        }
    }

    /// Renames a key under `components`, preserving its records.
    pub fn rename_component(&mut self, old: &str, new: &str) {
        let components = self.components_mut();
        if let Some(records) = components.shift_remove(old) {
            components.insert(new.to_string(), records);
        }
    }

    /// Drops a key under `components` along with its records.
    pub fn remove_component(&mut self, name: &str) {
        self.components_mut().shift_remove(name);
    }

    /// Renames a field inside every record's `data` object of one
    /// component.
    pub fn rename_field(&mut self, component: &str, old_field: &str, new_field: &str) {
        self.for_each_data(component, |data| {
            if let Some(value) = data.shift_remove(old_field) {
                data.insert(new_field.to_string(), value);
            }
        });
    }

    /// Inserts a field into every record's `data` object where it is
    /// absent. Present fields are left alone.
    pub fn add_field_default(&mut self, component: &str, field: &str, value: serde_json::Value) {
        self.for_each_data(component, |data| {
            if !data.contains_key(field) {
                data.insert(field.to_string(), value.clone());
            }
        });
    }

    /// Applies `transform` to every present integer value of one field.
    ///
    /// Records where the field is absent or not an integer are left alone.
    pub fn transform_int_field(
        &mut self,
        component: &str,
        field: &str,
        transform: impl Fn(i64) -> i64,
    ) {
        self.for_each_data(component, |data| {
            if let Some(value) = data.get_mut(field)
                && let Some(number) = value.as_i64()
            {
                *value = serde_json::Value::from(transform(number));
            }
        });
    }

    /// A view of the parsed document, for checks the edit operations do
    /// not cover.
    pub fn as_json(&self) -> &serde_json::Value {
        &self.root
    }

    fn components_mut(&mut self) -> &mut serde_json::Map<String, serde_json::Value> {
        self.root
            .get_mut("components")
            .and_then(serde_json::Value::as_object_mut)
            .expect("components checked at parse")
    }

    fn for_each_data(
        &mut self,
        component: &str,
        mut edit: impl FnMut(&mut serde_json::Map<String, serde_json::Value>),
    ) {
        let Some(records) = self
            .components_mut()
            .get_mut(component)
            .and_then(serde_json::Value::as_array_mut)
        else {
            return;
        };
        for record in records {
            if let Some(data) = record
                .get_mut("data")
                .and_then(serde_json::Value::as_object_mut)
            {
                edit(data);
            }
        }
    }
}

/// A registered version-to-version transform.
struct MigrationStep {
    from_version: u32,
    to_version: u32,
    transform: Box<dyn Fn(&mut SaveTree) -> Result<()> + Send + Sync>,
}

/// Outcome of a migration chain run.
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    /// The migrated blob, compact text.
    pub blob: String,
    /// Number of steps applied.
    pub migrations_run: u32,
    /// One human-readable line per applied step.
    pub log: Vec<String>,
}

/// Registers migration steps and drives version chains.
pub struct Migrator {
    steps: Vec<MigrationStep>,
    log: LogConfig,
}

impl Migrator {
    /// Creates a migrator with no steps.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            log: LogConfig::default(),
        }
    }

    /// Replaces the logging configuration.
    pub fn with_log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Registers a step transforming saves from `from_version` to
    /// `to_version`.
    ///
    /// Only one step is honored per `from_version`; registering a second
    /// logs a warning and the first keeps winning.
    pub fn register(
        &mut self,
        from_version: u32,
        to_version: u32,
        transform: impl Fn(&mut SaveTree) -> Result<()> + Send + Sync + 'static,
    ) {
        if self.steps.iter().any(|step| step.from_version == from_version) {
            self.log.emit(
                LogLevel::Warn,
                &format!(
                    "duplicate migration step from version {}; first registration wins",
                    from_version
                ),
            );
        }
        self.steps.push(MigrationStep {
            from_version,
            to_version,
            transform: Box::new(transform),
        });
    }

    /// Number of registered steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no steps are registered.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Migrates a text blob to `target_version`.
    ///
    /// Reads the blob's version and repeatedly applies the step registered
    /// for it, updating `meta.version` after each step, until the target
    /// is reached. A blob already at or past the target passes through
    /// with zero steps.
    ///
    /// # Errors
    ///
    /// Fails with [`SaveError::NoMigrationPath`] when no step matches the
    /// current version and the target has not been reached, with
    /// [`SaveError::MissingVersion`] when the blob has no version, and
    /// with whatever error a step itself returns.
    pub fn migrate(&self, blob: &str, target_version: u32) -> Result<MigrationOutcome> {
        let mut tree = SaveTree::parse(blob)?;
        let mut current_version = tree.version()?;
        let mut migrations_run = 0u32;
        let mut log = Vec::new();

        while current_version < target_version {
            let step = self
                .steps
                .iter()
                .find(|step| step.from_version == current_version)
                .ok_or(SaveError::NoMigrationPath {
                    from: current_version,
                    target: target_version,
                })?;

            (step.transform)(&mut tree)?;
            tree.set_version(step.to_version);

            let line = format!(
                "migrated save from version {} to version {}",
                step.from_version, step.to_version
            );
            self.log.emit(LogLevel::Info, &line);
            log.push(line);

            current_version = step.to_version;
            migrations_run += 1;
        }

        Ok(MigrationOutcome {
            blob: tree.to_blob()?,
            migrations_run,
            log,
        })
    }
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new()
    }
}

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

//! Entity identifiers and the per-load remap table.
//!
//! An [`Entity`] is a 32-bit opaque identifier assigned by the registry.
//! Entity identifiers are only meaningful inside the registry that issued
//! them; a save blob therefore records *saved* ids, and every load builds an
//! [`EntityMap`] translating saved ids to freshly allocated entities. The
//! map is the only place where the old id namespace meets the new one, and
//! it lives exactly as long as one load call.

use std::collections::HashMap;
use std::fmt;

/// An opaque 32-bit entity identifier.
///
/// Equality is the only operation callers should rely on. The numeric value
/// is registry-internal and changes across save/load cycles.
///
/// # Examples
///
/// ```
/// use worldsave::{Entity, Registry};
///
/// let mut registry = Registry::new();
/// let a = registry.create();
/// let b = registry.create();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(u32);

impl Entity {
    /// Wraps a raw identifier value.
    ///
    /// This exists for the codec and the registry; game code should obtain
    /// entities from [`Registry::create`](crate::Registry::create).
    #[inline]
    pub const fn from_raw(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    #[inline]
    pub const fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity {}", self.0)
    }
}

/// Translation table from saved entity ids to freshly allocated entities.
///
/// Built during the first pass of a load, consumed during the second pass
/// to rewrite entity reference fields in place. A saved id that is absent
/// from the table is treated as an external reference and left unchanged,
/// so dangling references stay visible instead of silently corrupting.
#[derive(Debug, Default)]
pub struct EntityMap {
    mapping: HashMap<u32, Entity>,
}

impl EntityMap {
    /// Creates an empty remap table.
    pub fn new() -> Self {
        Self {
            mapping: HashMap::new(),
        }
    }

    /// Records `saved_id → entity`, returning `false` if the id was
    /// already mapped.
    pub fn insert(&mut self, saved_id: u32, entity: Entity) -> bool {
        self.mapping.insert(saved_id, entity).is_none()
    }

    /// Looks up the fresh entity for a saved id.
    pub fn get(&self, saved_id: u32) -> Option<Entity> {
        self.mapping.get(&saved_id).copied()
    }

    /// Whether a saved id has been mapped.
    pub fn contains(&self, saved_id: u32) -> bool {
        self.mapping.contains_key(&saved_id)
    }

    /// Rewrites a saved reference value through the table.
    ///
    /// Mapped ids become the fresh entity's id; unmapped ids pass through
    /// unchanged.
    pub fn remap(&self, saved_id: u32) -> u32 {
        match self.get(saved_id) {
            Some(entity) => entity.id(),
            None => saved_id,
        }
    }

    /// Number of mapped ids.
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

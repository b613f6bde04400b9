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

//! Minimal ECS registry consumed by the codec.
//!
//! The save system only needs four registry operations: create an entity,
//! attach a component, query a component, and iterate entities by component
//! type. This module provides a small registry implementing exactly that
//! surface so the codec has something concrete to serialize from and
//! deserialize into. Games with their own ECS keep their registry as the
//! source of truth and mirror state through this one at save boundaries,
//! or adapt the codec to their storage directly.
//!
//! Iteration order is insertion order per component type, which keeps
//! emitted blobs deterministic.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;

use indexmap::IndexMap;

use crate::entity::Entity;

/// Marker trait for component types.
///
/// Components must be `'static + Send + Sync`. Use
/// `#[derive(Component)]` from `worldsave_derive` to implement this.
///
/// # Examples
///
/// ```
/// use worldsave::Component;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Position {
///     x: f32,
///     y: f32,
/// }
/// impl Component for Position {}
/// ```
pub trait Component: 'static + Send + Sync {}

/// A registry mapping entities to components grouped by component type.
///
/// # Examples
///
/// ```
/// use worldsave::{Component, Registry};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Health {
///     current: u8,
///     max: u8,
/// }
/// impl Component for Health {}
///
/// let mut registry = Registry::new();
/// let entity = registry.create();
/// registry.add(entity, Health { current: 80, max: 100 });
///
/// assert!(registry.has::<Health>(entity));
/// assert_eq!(registry.get::<Health>(entity).unwrap().current, 80);
/// ```
#[derive(Default)]
pub struct Registry {
    next_id: u32,
    alive: Vec<Entity>,
    stores: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("entities", &self.alive.len())
            .field("component_types", &self.stores.len())
            .finish()
    }
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh entity.
    ///
    /// Identifiers are never reused within one registry.
    pub fn create(&mut self) -> Entity {
        let entity = Entity::from_raw(self.next_id);
        self.next_id += 1;
        self.alive.push(entity);
        entity
    }

    /// Attaches a component to an entity, replacing any existing component
    /// of the same type.
    ///
    /// Returns `true` if the entity did not carry the component before.
    pub fn add<T: Component>(&mut self, entity: Entity, component: T) -> bool {
        let store = self
            .stores
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(IndexMap::<Entity, T>::new()));
        let store = store
            .downcast_mut::<IndexMap<Entity, T>>()
            .unwrap_or_else(|| unreachable!("store keyed by TypeId of {}", type_name::<T>()));
        store.insert(entity, component).is_none()
    }

    /// Returns a reference to an entity's component, if it carries one.
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.store::<T>()?.get(&entity)
    }

    /// Whether an entity carries a component of type `T`.
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.store::<T>().is_some_and(|store| store.contains_key(&entity))
    }

    /// Iterates entities carrying a component of type `T`, in the order the
    /// components were attached.
    pub fn view<T: Component>(&self) -> impl Iterator<Item = Entity> + '_ {
        self.store::<T>()
            .into_iter()
            .flat_map(|store| store.keys().copied())
    }

    /// Number of entities carrying a component of type `T`.
    pub fn count<T: Component>(&self) -> usize {
        self.store::<T>().map_or(0, IndexMap::len)
    }

    /// Whether an entity has been created by this registry.
    pub fn contains(&self, entity: Entity) -> bool {
        self.alive.contains(&entity)
    }

    /// Iterates every entity created by this registry, in creation order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive.iter().copied()
    }

    /// Number of entities created by this registry.
    pub fn len(&self) -> usize {
        self.alive.len()
    }

    /// Whether the registry holds no entities.
    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }

    fn store<T: Component>(&self) -> Option<&IndexMap<Entity, T>> {
        self.stores
            .get(&TypeId::of::<T>())
            .and_then(|store| store.downcast_ref::<IndexMap<Entity, T>>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }
    impl Component for Position {}

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Frozen;
    impl Component for Frozen {}

    #[test]
    fn test_create_assigns_distinct_ids() {
        let mut registry = Registry::new();
        let a = registry.create();
        let b = registry.create();
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(a));
    }

    #[test]
    fn test_add_get_has() {
        let mut registry = Registry::new();
        let entity = registry.create();

        assert!(registry.add(entity, Position { x: 1.0, y: 2.0 }));
        assert!(registry.has::<Position>(entity));
        assert!(!registry.has::<Frozen>(entity));
        assert_eq!(
            registry.get::<Position>(entity),
            Some(&Position { x: 1.0, y: 2.0 })
        );

        // Replacing reports false and overwrites.
        assert!(!registry.add(entity, Position { x: 3.0, y: 4.0 }));
        assert_eq!(registry.get::<Position>(entity).unwrap().x, 3.0);
    }

    #[test]
    fn test_view_preserves_attach_order() {
        let mut registry = Registry::new();
        let a = registry.create();
        let b = registry.create();
        let c = registry.create();

        registry.add(c, Position { x: 0.0, y: 0.0 });
        registry.add(a, Position { x: 0.0, y: 0.0 });
        registry.add(b, Frozen);

        let order: Vec<Entity> = registry.view::<Position>().collect();
        assert_eq!(order, vec![c, a]);
        assert_eq!(registry.count::<Position>(), 2);
        assert_eq!(registry.count::<Frozen>(), 1);
    }

    #[test]
    fn test_view_of_absent_type_is_empty() {
        let registry = Registry::new();
        assert_eq!(registry.view::<Position>().count(), 0);
        assert_eq!(registry.count::<Position>(), 0);
    }
}

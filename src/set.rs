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

//! Ordered component type sets and their transforms.
//!
//! A [`ComponentSet`] is the ordered list of component descriptors a codec
//! is built over. Order matters: it is the on-wire emission order for the
//! binary format and the observation order for the text format. All set
//! transforms are pure and resolved before a codec is instantiated.
//!
//! Transient components are handled here, not in the codec: build the full
//! set once, then [`exclude`](ComponentSet::exclude) the transient names to
//! get the persisted set.

use crate::component::{ComponentSpec, Saveable};
use crate::error::{Result, SaveError};
use crate::registry::Component;
use crate::schema::validate_serializable;

/// An ordered, duplicate-free list of component descriptors.
///
/// # Examples
///
/// ```ignore
/// let all = ComponentSet::builder()
///     .data::<Position>()
///     .data::<Health>()
///     .data::<Velocity>()
///     .tag::<Player>("Player")
///     .build()?;
///
/// // Velocity is runtime-only; never persist it.
/// let persisted = all.exclude(&["Velocity"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ComponentSet {
    specs: Vec<ComponentSpec>,
}

/// A module of component types that knows its own set.
///
/// This is how a whole gameplay module contributes its types at once: the
/// module declares its public components in one place and codecs pull them
/// in with [`ComponentSet::from_module`].
///
/// # Examples
///
/// ```ignore
/// struct CombatModule;
///
/// impl ComponentModule for CombatModule {
///     fn component_set() -> ComponentSet {
///         ComponentSet::builder()
///             .data::<Health>()
///             .data::<Weapon>()
///             .build()
///             .expect("combat set")
///     }
/// }
///
/// let set = ComponentSet::merge(&[
///     &ComponentSet::from_module::<CombatModule>(),
///     &ComponentSet::from_module::<MovementModule>(),
/// ])?;
/// ```
pub trait ComponentModule {
    /// The set of component types this module persists.
    fn component_set() -> ComponentSet;
}

impl ComponentSet {
    /// Starts building a set.
    pub fn builder() -> ComponentSetBuilder {
        ComponentSetBuilder { specs: Vec::new() }
    }

    /// Builds a set from pre-constructed descriptors.
    ///
    /// # Errors
    ///
    /// Fails if two descriptors share a name.
    pub fn from_specs(specs: Vec<ComponentSpec>) -> Result<Self> {
        for (index, spec) in specs.iter().enumerate() {
            if specs[..index].iter().any(|s| s.name() == spec.name()) {
                return Err(SaveError::schema(format!(
                    "duplicate component type '{}' in set",
                    spec.name()
                )));
            }
        }
        Ok(Self { specs })
    }

    /// The set a module declares for itself.
    pub fn from_module<M: ComponentModule>() -> Self {
        M::component_set()
    }

    /// Set difference preserving order: every descriptor whose name is not
    /// in `remove`.
    pub fn exclude(&self, remove: &[&str]) -> Self {
        Self {
            specs: self
                .specs
                .iter()
                .filter(|spec| !remove.contains(&spec.name()))
                .cloned()
                .collect(),
        }
    }

    /// Concatenates sets preserving order.
    ///
    /// # Errors
    ///
    /// Fails if the same name appears in more than one set.
    pub fn merge(sets: &[&ComponentSet]) -> Result<Self> {
        let specs = sets
            .iter()
            .flat_map(|set| set.specs.iter().cloned())
            .collect();
        Self::from_specs(specs)
    }

    /// Whether a descriptor with `name` is in the set.
    pub fn contains(&self, name: &str) -> bool {
        self.specs.iter().any(|spec| spec.name() == name)
    }

    /// Looks a descriptor up by name.
    pub fn get(&self, name: &str) -> Option<&ComponentSpec> {
        self.specs.iter().find(|spec| spec.name() == name)
    }

    /// Number of descriptors in the set.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Iterates descriptors in declared order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentSpec> {
        self.specs.iter()
    }

    /// Declared names, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.specs.iter().map(ComponentSpec::name).collect()
    }

    /// Whether every name in this set also appears in `other`.
    pub fn subset_of(&self, other: &ComponentSet) -> bool {
        self.specs.iter().all(|spec| other.contains(spec.name()))
    }

    /// Checks that every data shape in the set can be persisted.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::NotSerializable`] naming the first offending
    /// type and the unsupported leaf inside it.
    pub fn validate_serializable(&self) -> Result<()> {
        for spec in &self.specs {
            if let Some(shape) = spec.shape() {
                validate_serializable(shape).map_err(|reason| SaveError::NotSerializable {
                    type_name: spec.name().to_string(),
                    reason,
                })?;
            }
        }
        Ok(())
    }
}

/// Builder collecting descriptors into a [`ComponentSet`].
#[derive(Debug, Default)]
pub struct ComponentSetBuilder {
    specs: Vec<ComponentSpec>,
}

impl ComponentSetBuilder {
    /// Adds a data component type.
    pub fn data<T: Saveable>(mut self) -> Self {
        self.specs.push(ComponentSpec::data::<T>());
        self
    }

    /// Adds a tag component type under `name`.
    pub fn tag<T: Component + Default>(mut self, name: &'static str) -> Self {
        self.specs.push(ComponentSpec::tag::<T>(name));
        self
    }

    /// Adds a pre-constructed descriptor.
    pub fn spec(mut self, spec: ComponentSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Finishes the set.
    ///
    /// # Errors
    ///
    /// Fails if two descriptors share a name.
    pub fn build(self) -> Result<ComponentSet> {
        ComponentSet::from_specs(self.specs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldShape, Shape, Value};

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }
    impl Component for Position {}

    impl Saveable for Position {
        const NAME: &'static str = "Position";

        fn shape() -> Shape {
            Shape::record(vec![
                FieldShape::new("x", Shape::f32()),
                FieldShape::new("y", Shape::f32()),
            ])
        }

        fn to_value(&self) -> Value {
            Value::record(vec![("x", Value::from(self.x)), ("y", Value::from(self.y))])
        }

        fn from_value(value: &Value) -> Result<Self> {
            Ok(Self {
                x: value.field("x")?.as_f32()?,
                y: value.field("y")?.as_f32()?,
            })
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Velocity {
        x: f32,
        y: f32,
    }
    impl Component for Velocity {}

    impl Saveable for Velocity {
        const NAME: &'static str = "Velocity";

        fn shape() -> Shape {
            Shape::record(vec![
                FieldShape::new("x", Shape::f32()),
                FieldShape::new("y", Shape::f32()),
            ])
        }

        fn to_value(&self) -> Value {
            Value::record(vec![("x", Value::from(self.x)), ("y", Value::from(self.y))])
        }

        fn from_value(value: &Value) -> Result<Self> {
            Ok(Self {
                x: value.field("x")?.as_f32()?,
                y: value.field("y")?.as_f32()?,
            })
        }
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Player;
    impl Component for Player {}

    struct MovementModule;

    impl ComponentModule for MovementModule {
        fn component_set() -> ComponentSet {
            ComponentSet::builder()
                .data::<Position>()
                .data::<Velocity>()
                .build()
                .expect("movement set")
        }
    }

    #[test]
    fn test_builder_preserves_declared_order() {
        let set = ComponentSet::builder()
            .data::<Position>()
            .tag::<Player>("Player")
            .data::<Velocity>()
            .build()
            .unwrap();

        assert_eq!(set.names(), vec!["Position", "Player", "Velocity"]);
        assert_eq!(set.len(), 3);
        assert!(set.contains("Player"));
        assert!(!set.contains("Health"));
    }

    #[test]
    fn test_duplicate_names_rejected_at_build() {
        let result = ComponentSet::builder()
            .data::<Position>()
            .data::<Position>()
            .build();
        assert!(matches!(result, Err(SaveError::Schema(_))));
    }

    #[test]
    fn test_exclude_is_order_preserving_difference() {
        let set = ComponentSet::builder()
            .data::<Position>()
            .data::<Velocity>()
            .tag::<Player>("Player")
            .build()
            .unwrap();

        let persisted = set.exclude(&["Velocity"]);
        assert_eq!(persisted.names(), vec!["Position", "Player"]);
        assert!(persisted.subset_of(&set));
        assert!(!set.subset_of(&persisted));
    }

    #[test]
    fn test_merge_concatenates_and_rejects_overlap() {
        let movement = ComponentSet::from_module::<MovementModule>();
        let tags = ComponentSet::builder()
            .tag::<Player>("Player")
            .build()
            .unwrap();

        let merged = ComponentSet::merge(&[&movement, &tags]).unwrap();
        assert_eq!(merged.names(), vec!["Position", "Velocity", "Player"]);

        let overlap = ComponentSet::merge(&[&movement, &movement]);
        assert!(matches!(overlap, Err(SaveError::Schema(_))));
    }

    #[test]
    fn test_validate_serializable_names_the_offender() {
        #[derive(Debug, Clone)]
        struct Cursor;
        impl Component for Cursor {}

        impl Saveable for Cursor {
            const NAME: &'static str = "Cursor";

            fn shape() -> Shape {
                Shape::record(vec![FieldShape::new(
                    "handle",
                    Shape::Unsupported("raw pointer"),
                )])
            }

            fn to_value(&self) -> Value {
                Value::record(vec![])
            }

            fn from_value(_: &Value) -> Result<Self> {
                Ok(Self)
            }
        }

        let set = ComponentSet::builder()
            .data::<Position>()
            .data::<Cursor>()
            .build()
            .unwrap();

        match set.validate_serializable() {
            Err(SaveError::NotSerializable { type_name, reason }) => {
                assert_eq!(type_name, "Cursor");
                assert!(reason.contains("raw pointer"));
            }
            other => panic!("expected NotSerializable, got {:?}", other.err()),
        }
    }
}

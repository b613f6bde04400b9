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

//! Component type descriptors.
//!
//! A [`ComponentSpec`] is the runtime descriptor the codec walks for each
//! registered type: a stable name, the type's shape, and a vtable of
//! monomorphic functions bridging the type-erased codec to the concrete
//! component type in the registry. Data components implement [`Saveable`];
//! tag components only need [`Component`] + [`Default`] and contribute
//! nothing but their presence.
//!
//! # Custom encode/decode
//!
//! `to_value`/`from_value` are the override hooks: a type whose natural
//! layout cannot be derived (say, an internally-pooled collection) declares
//! whatever wire shape it wants and converts itself in code. A type that
//! can only be written, never reconstructed, sets [`Saveable::PARSEABLE`]
//! to `false`; codecs that would need to parse it refuse to be constructed.

use crate::entity::Entity;
use crate::error::{Result, SaveError};
use crate::registry::{Component, Registry};
use crate::schema::{Shape, Value};

/// A component type that can pass through the save system.
///
/// # Examples
///
/// ```
/// use worldsave::{Component, FieldShape, Saveable, SaveError, Shape, Value};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Health {
///     current: u8,
///     max: u8,
/// }
/// impl Component for Health {}
///
/// impl Saveable for Health {
///     const NAME: &'static str = "Health";
///
///     fn shape() -> Shape {
///         Shape::record(vec![
///             FieldShape::new("current", Shape::u8()),
///             FieldShape::new("max", Shape::u8()),
///         ])
///     }
///
///     fn to_value(&self) -> Value {
///         Value::record(vec![
///             ("current", Value::from(self.current)),
///             ("max", Value::from(self.max)),
///         ])
///     }
///
///     fn from_value(value: &Value) -> Result<Self, SaveError> {
///         Ok(Self {
///             current: value.field("current")?.as_u8()?,
///             max: value.field("max")?.as_u8()?,
///         })
///     }
/// }
/// ```
pub trait Saveable: Component + Sized {
    /// Stable type name; the key this type uses inside save blobs.
    const NAME: &'static str;

    /// Whether the generic decode path may construct this type.
    ///
    /// Set to `false` for emit-only types. A codec that would have to parse
    /// such a type fails at construction rather than at load time.
    const PARSEABLE: bool = true;

    /// The shape tree describing this type's wire layout.
    fn shape() -> Shape;

    /// Converts this component into the value model.
    fn to_value(&self) -> Value;

    /// Reconstructs a component from the value model.
    ///
    /// # Errors
    ///
    /// Fails when the value does not conform to [`Saveable::shape`]; the
    /// generic readers guarantee conformance, so implementations normally
    /// just destructure.
    fn from_value(value: &Value) -> Result<Self>;
}

/// Whether a descriptor describes a tag or a data component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecKind {
    /// Zero-sized; existence on an entity is the only information.
    Tag,
    /// Carries a value of the registered shape.
    Data,
}

/// Vtable bridging the type-erased codec to one concrete component type.
#[derive(Clone, Copy)]
struct SpecVtable {
    collect: fn(&Registry) -> Vec<Entity>,
    has: fn(&Registry, Entity) -> bool,
    extract: Option<fn(&Registry, Entity) -> Result<Value>>,
    insert: Option<fn(&mut Registry, Entity, &Value) -> Result<()>>,
    attach_tag: Option<fn(&mut Registry, Entity)>,
}

/// Runtime descriptor for one registered component type.
///
/// Descriptors are built from typed constructors and collected into a
/// [`ComponentSet`](crate::ComponentSet); the codec never sees the concrete
/// types again.
#[derive(Clone)]
pub struct ComponentSpec {
    name: &'static str,
    kind: SpecKind,
    shape: Option<Shape>,
    parseable: bool,
    vtable: SpecVtable,
}

impl ComponentSpec {
    /// Descriptor for a data component type.
    pub fn data<T: Saveable>() -> Self {
        Self {
            name: T::NAME,
            kind: SpecKind::Data,
            shape: Some(T::shape()),
            parseable: T::PARSEABLE,
            vtable: SpecVtable {
                collect: collect_entities::<T>,
                has: has_component::<T>,
                extract: Some(extract_value::<T>),
                insert: Some(insert_value::<T>),
                attach_tag: None,
            },
        }
    }

    /// Descriptor for a tag component type.
    ///
    /// `name` is the key the tag uses inside save blobs.
    pub fn tag<T: Component + Default>(name: &'static str) -> Self {
        Self {
            name,
            kind: SpecKind::Tag,
            shape: None,
            parseable: true,
            vtable: SpecVtable {
                collect: collect_entities::<T>,
                has: has_component::<T>,
                extract: None,
                insert: None,
                attach_tag: Some(attach_tag::<T>),
            },
        }
    }

    /// The blob key for this type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Tag or data.
    pub fn kind(&self) -> SpecKind {
        self.kind
    }

    /// Whether this is a tag descriptor.
    pub fn is_tag(&self) -> bool {
        self.kind == SpecKind::Tag
    }

    /// The registered shape; `None` for tags.
    pub fn shape(&self) -> Option<&Shape> {
        self.shape.as_ref()
    }

    /// Whether the generic decode path may construct this type.
    pub fn parseable(&self) -> bool {
        self.parseable
    }

    /// Entities carrying this component, in attach order.
    pub fn collect(&self, registry: &Registry) -> Vec<Entity> {
        (self.vtable.collect)(registry)
    }

    /// Whether `entity` carries this component.
    pub fn has(&self, registry: &Registry, entity: Entity) -> bool {
        (self.vtable.has)(registry, entity)
    }

    /// Converts an entity's component into the value model.
    ///
    /// # Errors
    ///
    /// Fails if the entity does not carry the component, or on a tag
    /// descriptor, which has no value to extract.
    pub fn extract(&self, registry: &Registry, entity: Entity) -> Result<Value> {
        match self.vtable.extract {
            Some(extract) => extract(registry, entity),
            None => Err(SaveError::schema(format!(
                "tag component '{}' has no data to extract",
                self.name
            ))),
        }
    }

    /// Reconstructs a component from a value and attaches it to `entity`.
    ///
    /// # Errors
    ///
    /// Fails if the value does not conform to the registered shape, or on
    /// an emit-only descriptor.
    pub fn insert(&self, registry: &mut Registry, entity: Entity, value: &Value) -> Result<()> {
        match self.vtable.insert {
            Some(insert) => insert(registry, entity, value),
            None => Err(SaveError::schema(format!(
                "component '{}' cannot be constructed from save data",
                self.name
            ))),
        }
    }

    /// Attaches a tag component to `entity`.
    ///
    /// # Errors
    ///
    /// Fails on a data descriptor.
    pub fn attach_tag(&self, registry: &mut Registry, entity: Entity) -> Result<()> {
        match self.vtable.attach_tag {
            Some(attach) => {
                attach(registry, entity);
                Ok(())
            }
            None => Err(SaveError::schema(format!(
                "component '{}' is not a tag",
                self.name
            ))),
        }
    }
}

impl std::fmt::Debug for ComponentSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parseable", &self.parseable)
            .finish()
    }
}

fn collect_entities<T: Component>(registry: &Registry) -> Vec<Entity> {
    registry.view::<T>().collect()
}

fn has_component<T: Component>(registry: &Registry, entity: Entity) -> bool {
    registry.has::<T>(entity)
}

fn extract_value<T: Saveable>(registry: &Registry, entity: Entity) -> Result<Value> {
    registry
        .get::<T>(entity)
        .map(Saveable::to_value)
        .ok_or_else(|| {
            SaveError::schema(format!("{} does not carry component '{}'", entity, T::NAME))
        })
}

fn insert_value<T: Saveable>(registry: &mut Registry, entity: Entity, value: &Value) -> Result<()> {
    let component = T::from_value(value)?;
    registry.add(entity, component);
    Ok(())
}

fn attach_tag<T: Component + Default>(registry: &mut Registry, entity: Entity) {
    registry.add(entity, T::default());
}

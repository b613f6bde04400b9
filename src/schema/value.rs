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

//! The format-agnostic value model.
//!
//! A [`Value`] is the in-memory form every component passes through on its
//! way to or from a save blob. Component types convert themselves to and
//! from values; the text and binary codecs only ever translate between
//! values and bytes, walking the component's [`Shape`] alongside. Keeping
//! one value model between two wire formats is what makes the formats
//! interchangeable.

use crate::entity::{Entity, EntityMap};
use crate::error::{Result, SaveError};
use crate::schema::shape::Shape;

/// A dynamically-typed value mirroring the shape grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// Signed integer of any declared width.
    Int(i64),
    /// Unsigned integer of any declared width.
    UInt(u64),
    /// 32-bit float.
    F32(f32),
    /// 64-bit float.
    F64(f64),
    /// UTF-8 string.
    Str(String),
    /// Named fields in declaration order.
    Struct(Vec<(&'static str, Value)>),
    /// Elements of a fixed or dynamic array.
    Array(Vec<Value>),
    /// Present or absent value.
    Optional(Option<Box<Value>>),
    /// Enum discriminant.
    Enum(i64),
    /// Tagged union case index plus payload, if the case carries one.
    Variant {
        /// Case index into the declared [`VariantShape`](crate::schema::VariantShape).
        tag: u16,
        /// Case payload, `None` for void cases.
        payload: Option<Box<Value>>,
    },
    /// Entity reference, stored as the raw id.
    Entity(u32),
}

impl Value {
    /// Wraps a present optional.
    pub fn some(value: Value) -> Self {
        Self::Optional(Some(Box::new(value)))
    }

    /// The absent optional.
    pub const fn none() -> Self {
        Self::Optional(None)
    }

    /// An entity reference value.
    pub fn entity(entity: Entity) -> Self {
        Self::Entity(entity.id())
    }

    /// An optional entity reference value.
    pub fn opt_entity(entity: Option<Entity>) -> Self {
        Self::Optional(entity.map(|e| Box::new(Self::entity(e))))
    }

    /// A struct value from `(field, value)` pairs.
    pub fn record(fields: Vec<(&'static str, Value)>) -> Self {
        Self::Struct(fields)
    }

    /// Short name of the value kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "signed integer",
            Self::UInt(_) => "unsigned integer",
            Self::F32(_) | Self::F64(_) => "float",
            Self::Str(_) => "string",
            Self::Struct(_) => "struct",
            Self::Array(_) => "array",
            Self::Optional(_) => "optional",
            Self::Enum(_) => "enum",
            Self::Variant { .. } => "union",
            Self::Entity(_) => "entity reference",
        }
    }

    /// Looks up a struct field by name.
    ///
    /// # Errors
    ///
    /// Fails if this value is not a struct or the field is absent.
    pub fn field(&self, name: &str) -> Result<&Value> {
        match self {
            Self::Struct(fields) => fields
                .iter()
                .find(|(field, _)| *field == name)
                .map(|(_, value)| value)
                .ok_or_else(|| SaveError::missing_field("struct value", name)),
            other => Err(SaveError::type_mismatch("struct", other.kind_name())),
        }
    }

    /// Reads this value as a bool.
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Self::Bool(value) => Ok(*value),
            other => Err(SaveError::type_mismatch("bool", other.kind_name())),
        }
    }

    /// Reads this value as a signed integer, casting unsigned storage.
    pub fn as_i64(&self) -> Result<i64> {
        match self {
            Self::Int(value) => Ok(*value),
            Self::UInt(value) => Ok(*value as i64),
            other => Err(SaveError::type_mismatch("integer", other.kind_name())),
        }
    }

    /// Reads this value as an unsigned integer, casting signed storage.
    pub fn as_u64(&self) -> Result<u64> {
        match self {
            Self::UInt(value) => Ok(*value),
            Self::Int(value) => Ok(*value as u64),
            other => Err(SaveError::type_mismatch("integer", other.kind_name())),
        }
    }

    /// Reads this value as a `u8` by narrowing cast.
    pub fn as_u8(&self) -> Result<u8> {
        Ok(self.as_u64()? as u8)
    }

    /// Reads this value as a `u16` by narrowing cast.
    pub fn as_u16(&self) -> Result<u16> {
        Ok(self.as_u64()? as u16)
    }

    /// Reads this value as a `u32` by narrowing cast.
    pub fn as_u32(&self) -> Result<u32> {
        Ok(self.as_u64()? as u32)
    }

    /// Reads this value as an `i8` by narrowing cast.
    pub fn as_i8(&self) -> Result<i8> {
        Ok(self.as_i64()? as i8)
    }

    /// Reads this value as an `i16` by narrowing cast.
    pub fn as_i16(&self) -> Result<i16> {
        Ok(self.as_i64()? as i16)
    }

    /// Reads this value as an `i32` by narrowing cast.
    pub fn as_i32(&self) -> Result<i32> {
        Ok(self.as_i64()? as i32)
    }

    /// Reads this value as an `f32`.
    pub fn as_f32(&self) -> Result<f32> {
        match self {
            Self::F32(value) => Ok(*value),
            Self::F64(value) => Ok(*value as f32),
            other => Err(SaveError::type_mismatch("float", other.kind_name())),
        }
    }

    /// Reads this value as an `f64`.
    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Self::F64(value) => Ok(*value),
            Self::F32(value) => Ok(f64::from(*value)),
            other => Err(SaveError::type_mismatch("float", other.kind_name())),
        }
    }

    /// Reads this value as a string slice.
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Self::Str(value) => Ok(value),
            other => Err(SaveError::type_mismatch("string", other.kind_name())),
        }
    }

    /// Reads this value as array elements.
    pub fn as_array(&self) -> Result<&[Value]> {
        match self {
            Self::Array(values) => Ok(values),
            other => Err(SaveError::type_mismatch("array", other.kind_name())),
        }
    }

    /// Reads this value as an optional.
    pub fn as_optional(&self) -> Result<Option<&Value>> {
        match self {
            Self::Optional(value) => Ok(value.as_deref()),
            other => Err(SaveError::type_mismatch("optional", other.kind_name())),
        }
    }

    /// Reads this value as an entity reference.
    pub fn as_entity(&self) -> Result<Entity> {
        match self {
            Self::Entity(id) => Ok(Entity::from_raw(*id)),
            other => Err(SaveError::type_mismatch(
                "entity reference",
                other.kind_name(),
            )),
        }
    }

    /// Reads this value as an optional entity reference.
    pub fn as_opt_entity(&self) -> Result<Option<Entity>> {
        match self.as_optional()? {
            Some(inner) => Ok(Some(inner.as_entity()?)),
            None => Ok(None),
        }
    }

    /// Reads this value as an enum discriminant.
    pub fn as_enum(&self) -> Result<i64> {
        match self {
            Self::Enum(value) => Ok(*value),
            other => Err(SaveError::type_mismatch("enum", other.kind_name())),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i8> for Value {
    fn from(value: i8) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Self::UInt(u64::from(value))
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Self::UInt(u64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::UInt(u64::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::F32(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::F64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Rewrites every entity reference inside `value` through the remap table.
///
/// Walks the shape and the value together, reaching references nested in
/// structs, fixed and dynamic arrays, optionals and union payloads. Mapped
/// ids are replaced with the fresh entity's id; unmapped ids are left
/// unchanged so external references stay visible to the caller.
///
/// Shape nodes that cannot contain references are skipped without
/// descending, so the walk is cheap for plain data components.
pub fn rewrite_entity_refs(shape: &Shape, value: &mut Value, map: &EntityMap) {
    if !shape.contains_entity_refs() {
        return;
    }
    match (shape, value) {
        (Shape::EntityRef, Value::Entity(id)) => {
            *id = map.remap(*id);
        }
        (Shape::OptionalEntityRef, Value::Optional(Some(inner))) => {
            if let Value::Entity(id) = inner.as_mut() {
                *id = map.remap(*id);
            }
        }
        (Shape::Struct(fields), Value::Struct(values)) => {
            for field in fields {
                if let Some((_, field_value)) =
                    values.iter_mut().find(|(name, _)| *name == field.name)
                {
                    rewrite_entity_refs(&field.shape, field_value, map);
                }
            }
        }
        (Shape::FixedArray { inner, .. }, Value::Array(elements))
        | (Shape::DynArray(inner), Value::Array(elements)) => {
            for element in elements {
                rewrite_entity_refs(inner, element, map);
            }
        }
        (Shape::Optional(inner), Value::Optional(Some(present))) => {
            rewrite_entity_refs(inner, present, map);
        }
        (Shape::Variant(variant), Value::Variant { tag, payload }) => {
            if let (Some(case), Some(payload)) = (variant.case_by_tag(*tag), payload.as_mut())
                && let Some(case_shape) = &case.shape
            {
                rewrite_entity_refs(case_shape, payload, map);
            }
        }
        _ => {}
    }
}

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

//! Shape trees describing serializable component types.
//!
//! A [`Shape`] is a recursive description of a type, used to drive both
//! encoders and decoders. A component type registers one shape; the codec
//! then walks shape and value together, so the two formats cannot drift
//! apart. Shapes are plain runtime data and can be inspected, which is what
//! allows entity references to be found and rewritten wherever they are
//! nested.
//!
//! # Shape grammar
//!
//! ```text
//! Shape ::= Bool | Int(signed, width) | Float(width) | Str
//!        |  Struct(fields: name × Shape × default?)
//!        |  FixedArray(len, Shape) | DynArray(Shape)
//!        |  Optional(Shape)
//!        |  Enum(tag_width, named variants)
//!        |  Variant(cases: name × Shape?)
//!        |  EntityRef | OptionalEntityRef
//! ```
//!
//! Field order within a struct is stable across encode and decode. Enums
//! encode as variant names in the text format and as integers of the
//! declared tag width in the binary format. Tagged unions encode their
//! discriminator as a string in text and as a `u16` case index in binary.

use crate::schema::value::Value;

/// Width of an integer leaf, rounded to its natural storage slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    /// 8-bit slot.
    W8,
    /// 16-bit slot.
    W16,
    /// 32-bit slot.
    W32,
    /// 64-bit slot.
    W64,
}

impl IntWidth {
    /// Number of bytes this width occupies in the binary format.
    pub const fn bytes(self) -> usize {
        match self {
            Self::W8 => 1,
            Self::W16 => 2,
            Self::W32 => 4,
            Self::W64 => 8,
        }
    }

    /// Number of bits in the slot.
    pub const fn bits(self) -> u32 {
        (self.bytes() as u32) * 8
    }
}

/// Width of a floating point leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    /// IEEE-754 binary32.
    W32,
    /// IEEE-754 binary64.
    W64,
}

/// Signedness and width of an integer leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntShape {
    /// Whether the integer is two's-complement signed.
    pub signed: bool,
    /// Storage width.
    pub width: IntWidth,
}

/// One named field of a struct shape.
///
/// A field may declare a default value; the text reader falls back to it
/// when the field is absent from a record, which is how new fields stay
/// loadable from older saves.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldShape {
    /// Field name as it appears in the text format.
    pub name: &'static str,
    /// Shape of the field's value.
    pub shape: Shape,
    /// Declared default, used when the text reader finds the field absent.
    pub default: Option<Value>,
}

impl FieldShape {
    /// Declares a field with no default.
    pub fn new(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            shape,
            default: None,
        }
    }

    /// Declares a field that falls back to `default` when absent.
    pub fn with_default(name: &'static str, shape: Shape, default: Value) -> Self {
        Self {
            name,
            shape,
            default: Some(default),
        }
    }
}

/// One named variant of an enum shape with its declared discriminant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumVariant {
    /// Variant name, used by the text format.
    pub name: &'static str,
    /// Discriminant value, used by the binary format.
    pub value: i64,
}

/// Description of a plain enum: a tag integer with named values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumShape {
    /// Width of the tag integer in the binary format.
    pub tag: IntShape,
    /// Declared variants.
    pub variants: Vec<EnumVariant>,
}

impl EnumShape {
    /// Builds an enum shape from `(name, discriminant)` pairs.
    pub fn new(tag: IntShape, variants: &[(&'static str, i64)]) -> Self {
        Self {
            tag,
            variants: variants
                .iter()
                .map(|&(name, value)| EnumVariant { name, value })
                .collect(),
        }
    }

    /// Looks a variant up by its text-format name.
    pub fn variant_by_name(&self, name: &str) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Looks a variant up by its binary-format discriminant.
    pub fn variant_by_value(&self, value: i64) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.value == value)
    }
}

/// One case of a tagged union, with an optional payload shape.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantCase {
    /// Case name; the text-format discriminator.
    pub name: &'static str,
    /// Payload shape, or `None` for a void case.
    pub shape: Option<Shape>,
}

impl VariantCase {
    /// Declares a case carrying a payload.
    pub fn new(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            shape: Some(shape),
        }
    }

    /// Declares a void case.
    pub fn void(name: &'static str) -> Self {
        Self { name, shape: None }
    }
}

/// Description of a tagged union.
///
/// The case index doubles as the binary discriminator (`u16`), so case
/// order is part of the on-wire contract.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantShape {
    /// Declared cases, in on-wire order.
    pub cases: Vec<VariantCase>,
}

impl VariantShape {
    /// Builds a tagged union shape from its cases.
    pub fn new(cases: Vec<VariantCase>) -> Self {
        Self { cases }
    }

    /// Looks a case up by name, returning its index too.
    pub fn case_by_name(&self, name: &str) -> Option<(u16, &VariantCase)> {
        self.cases
            .iter()
            .enumerate()
            .find(|(_, c)| c.name == name)
            .map(|(i, c)| (i as u16, c))
    }

    /// Looks a case up by binary tag index.
    pub fn case_by_tag(&self, tag: u16) -> Option<&VariantCase> {
        self.cases.get(tag as usize)
    }
}

/// Recursive description of a serializable type.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// `true` / `false`.
    Bool,
    /// Integer of a declared signedness and width.
    Int(IntShape),
    /// IEEE-754 float of a declared width.
    Float(FloatWidth),
    /// UTF-8 string.
    Str,
    /// Ordered named fields.
    Struct(Vec<FieldShape>),
    /// Exactly `len` elements of one shape, no length prefix on the wire.
    FixedArray {
        /// Declared element count.
        len: usize,
        /// Element shape.
        inner: Box<Shape>,
    },
    /// Length-prefixed sequence of one shape.
    DynArray(Box<Shape>),
    /// A value that may be absent.
    Optional(Box<Shape>),
    /// Tag integer with named values.
    Enum(EnumShape),
    /// Tagged union.
    Variant(VariantShape),
    /// Reference to another entity, rewritten by the load remap pass.
    EntityRef,
    /// Reference to another entity that may be absent.
    OptionalEntityRef,
    /// A leaf that cannot be persisted, such as a raw pointer or function
    /// reference. Rejected when the codec is constructed.
    Unsupported(&'static str),
}

impl Shape {
    /// `u8` leaf.
    pub const fn u8() -> Self {
        Self::Int(IntShape {
            signed: false,
            width: IntWidth::W8,
        })
    }

    /// `u16` leaf.
    pub const fn u16() -> Self {
        Self::Int(IntShape {
            signed: false,
            width: IntWidth::W16,
        })
    }

    /// `u32` leaf.
    pub const fn u32() -> Self {
        Self::Int(IntShape {
            signed: false,
            width: IntWidth::W32,
        })
    }

    /// `u64` leaf.
    pub const fn u64() -> Self {
        Self::Int(IntShape {
            signed: false,
            width: IntWidth::W64,
        })
    }

    /// `i8` leaf.
    pub const fn i8() -> Self {
        Self::Int(IntShape {
            signed: true,
            width: IntWidth::W8,
        })
    }

    /// `i16` leaf.
    pub const fn i16() -> Self {
        Self::Int(IntShape {
            signed: true,
            width: IntWidth::W16,
        })
    }

    /// `i32` leaf.
    pub const fn i32() -> Self {
        Self::Int(IntShape {
            signed: true,
            width: IntWidth::W32,
        })
    }

    /// `i64` leaf.
    pub const fn i64() -> Self {
        Self::Int(IntShape {
            signed: true,
            width: IntWidth::W64,
        })
    }

    /// `f32` leaf.
    pub const fn f32() -> Self {
        Self::Float(FloatWidth::W32)
    }

    /// `f64` leaf.
    pub const fn f64() -> Self {
        Self::Float(FloatWidth::W64)
    }

    /// Struct shape from its fields.
    pub fn record(fields: Vec<FieldShape>) -> Self {
        Self::Struct(fields)
    }

    /// Fixed-size array shape.
    pub fn fixed_array(len: usize, inner: Shape) -> Self {
        Self::FixedArray {
            len,
            inner: Box::new(inner),
        }
    }

    /// Dynamic array shape.
    pub fn dyn_array(inner: Shape) -> Self {
        Self::DynArray(Box::new(inner))
    }

    /// Optional shape.
    pub fn optional(inner: Shape) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Whether any leaf of this shape is an entity reference.
    ///
    /// Used to skip the remap walk entirely for shapes that cannot contain
    /// references.
    pub fn contains_entity_refs(&self) -> bool {
        match self {
            Self::EntityRef | Self::OptionalEntityRef => true,
            Self::Struct(fields) => fields.iter().any(|f| f.shape.contains_entity_refs()),
            Self::FixedArray { inner, .. } | Self::DynArray(inner) | Self::Optional(inner) => {
                inner.contains_entity_refs()
            }
            Self::Variant(variant) => variant
                .cases
                .iter()
                .any(|c| c.shape.as_ref().is_some_and(Shape::contains_entity_refs)),
            _ => false,
        }
    }

    /// Short name of the shape node, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int(shape) if shape.signed => "signed integer",
            Self::Int(_) => "unsigned integer",
            Self::Float(_) => "float",
            Self::Str => "string",
            Self::Struct(_) => "struct",
            Self::FixedArray { .. } => "fixed array",
            Self::DynArray(_) => "array",
            Self::Optional(_) => "optional",
            Self::Enum(_) => "enum",
            Self::Variant(_) => "union",
            Self::EntityRef => "entity reference",
            Self::OptionalEntityRef => "optional entity reference",
            Self::Unsupported(_) => "unsupported",
        }
    }
}

/// Checks that a shape contains nothing the codec cannot persist.
///
/// Recurses through structs, arrays, optionals and union payloads; an
/// [`Shape::Unsupported`] leaf anywhere fails with the leaf's diagnostic.
/// Called when a codec is constructed so that an unserializable type can
/// never produce a runtime surprise.
///
/// # Errors
///
/// Returns the diagnostic of the first unsupported leaf, prefixed with the
/// path to it.
pub fn validate_serializable(shape: &Shape) -> std::result::Result<(), String> {
    fn walk(shape: &Shape, path: &str) -> std::result::Result<(), String> {
        match shape {
            Shape::Unsupported(reason) => Err(format!("{}: {}", path, reason)),
            Shape::Struct(fields) => {
                for field in fields {
                    walk(&field.shape, &format!("{}.{}", path, field.name))?;
                }
                Ok(())
            }
            Shape::FixedArray { inner, .. } | Shape::DynArray(inner) | Shape::Optional(inner) => {
                walk(inner, &format!("{}[]", path))
            }
            Shape::Variant(variant) => {
                for case in &variant.cases {
                    if let Some(payload) = &case.shape {
                        walk(payload, &format!("{}::{}", path, case.name))?;
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
    walk(shape, "value")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_width_bytes() {
        assert_eq!(IntWidth::W8.bytes(), 1);
        assert_eq!(IntWidth::W16.bytes(), 2);
        assert_eq!(IntWidth::W32.bytes(), 4);
        assert_eq!(IntWidth::W64.bytes(), 8);
        assert_eq!(IntWidth::W64.bits(), 64);
    }

    #[test]
    fn test_enum_lookups() {
        let shape = EnumShape::new(
            IntShape {
                signed: false,
                width: IntWidth::W8,
            },
            &[("Idle", 0), ("Walking", 1), ("Attacking", 5)],
        );

        assert_eq!(shape.variant_by_name("Walking").unwrap().value, 1);
        assert_eq!(shape.variant_by_value(5).unwrap().name, "Attacking");
        assert!(shape.variant_by_name("Sleeping").is_none());
        assert!(shape.variant_by_value(2).is_none());
    }

    #[test]
    fn test_variant_lookups() {
        let shape = VariantShape::new(vec![
            VariantCase::void("None"),
            VariantCase::new("Melee", Shape::u8()),
            VariantCase::new("Ranged", Shape::u16()),
        ]);

        let (tag, case) = shape.case_by_name("Ranged").unwrap();
        assert_eq!(tag, 2);
        assert_eq!(case.shape, Some(Shape::u16()));
        assert!(shape.case_by_tag(0).unwrap().shape.is_none());
        assert!(shape.case_by_tag(3).is_none());
    }

    #[test]
    fn test_contains_entity_refs_reaches_nested_leaves() {
        let flat = Shape::record(vec![
            FieldShape::new("x", Shape::f32()),
            FieldShape::new("y", Shape::f32()),
        ]);
        assert!(!flat.contains_entity_refs());

        let nested = Shape::record(vec![FieldShape::new(
            "slots",
            Shape::fixed_array(
                4,
                Shape::record(vec![FieldShape::new(
                    "owner",
                    Shape::optional(Shape::EntityRef),
                )]),
            ),
        )]);
        assert!(nested.contains_entity_refs());
    }

    #[test]
    fn test_validate_rejects_unsupported_leaves() {
        let good = Shape::record(vec![FieldShape::new(
            "tags",
            Shape::dyn_array(Shape::Str),
        )]);
        assert!(validate_serializable(&good).is_ok());

        let bad = Shape::record(vec![FieldShape::new(
            "callback",
            Shape::Unsupported("function reference"),
        )]);
        let reason = validate_serializable(&bad).unwrap_err();
        assert!(reason.contains("callback"));
        assert!(reason.contains("function reference"));
    }

    #[test]
    fn test_validate_recurses_union_payloads() {
        let shape = Shape::Variant(VariantShape::new(vec![
            VariantCase::void("Empty"),
            VariantCase::new("Handle", Shape::Unsupported("raw pointer")),
        ]));
        assert!(validate_serializable(&shape).is_err());
    }
}

//! Shape trees and the format-agnostic value model.
//!
//! The schema layer is what makes the codec generic: a component type
//! registers a [`Shape`] describing its layout, converts itself to and from
//! the [`Value`] model, and the two wire formats are driven entirely by
//! walking shape and value together. See [`shape`] for the shape grammar
//! and [`value`] for the value model and the entity-reference rewrite walk.

pub mod shape;
pub mod value;

pub use shape::{
    EnumShape, EnumVariant, FieldShape, FloatWidth, IntShape, IntWidth, Shape, VariantCase,
    VariantShape, validate_serializable,
};
pub use value::{Value, rewrite_entity_refs};

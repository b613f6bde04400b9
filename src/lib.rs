//! worldsave - Schema-driven save/load engine for ECS worlds
//!
//! A persistence library for Entity-Component-System game state: a generic,
//! schema-driven codec that turns the contents of a registry into
//! self-describing save blobs and back, preserving cross-entity references
//! and surviving version changes.
//!
//! # Features
//!
//! - **Dual formats**: a human-readable text format and a compact binary
//!   format sharing one logical model
//! - **Shape-driven codec**: components register a shape tree once; both
//!   formats are derived from it
//! - **Entity remapping**: saved entity ids are translated to fresh
//!   registry entities on load, with references rewritten in place
//! - **Version migrations**: rename components and fields, add defaults,
//!   transform values, chained version to version
//! - **Validation**: structural checks, version gates and CRC-32
//!   integrity checking without touching a registry
//!
//! # Quick Start
//!
//! ```
//! use worldsave::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Position {
//!     x: f32,
//!     y: f32,
//! }
//! impl Component for Position {}
//!
//! impl Saveable for Position {
//!     const NAME: &'static str = "Position";
//!
//!     fn shape() -> Shape {
//!         Shape::record(vec![
//!             FieldShape::new("x", Shape::f32()),
//!             FieldShape::new("y", Shape::f32()),
//!         ])
//!     }
//!
//!     fn to_value(&self) -> Value {
//!         Value::record(vec![("x", Value::from(self.x)), ("y", Value::from(self.y))])
//!     }
//!
//!     fn from_value(value: &Value) -> Result<Self, SaveError> {
//!         Ok(Self {
//!             x: value.field("x")?.as_f32()?,
//!             y: value.field("y")?.as_f32()?,
//!         })
//!     }
//! }
//!
//! # fn main() -> Result<(), SaveError> {
//! let mut registry = Registry::new();
//! let entity = registry.create();
//! registry.add(entity, Position { x: 100.0, y: 200.0 });
//!
//! let set = ComponentSet::builder().data::<Position>().build()?;
//! let codec = SaveCodec::new(set)?;
//!
//! let blob = codec.to_text(&registry)?;
//! let mut restored = Registry::new();
//! codec.from_text(&blob, &mut restored)?;
//! assert_eq!(restored.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`schema`]: shape trees and the format-agnostic value model
//! - [`component`]: the [`Saveable`] trait and runtime type descriptors
//! - [`set`]: ordered component sets and their transforms
//! - [`codec`]: the registry codec over the text and binary formats
//! - [`migrate`]: version migrations over a mutable save tree
//! - [`validate`]: structural and integrity validation
//! - [`envelope`]: compression framing and save slot layout

pub mod codec;
pub mod component;
pub mod entity;
pub mod envelope;
pub mod error;
pub mod log;
pub mod migrate;
pub mod model;
pub mod registry;
pub mod schema;
pub mod set;
pub mod validate;

// Flat re-exports of the main API surface
pub use codec::{CodecOptions, Limits, LoadReport, SaveCodec};
pub use component::{ComponentSpec, Saveable, SpecKind};
pub use entity::{Entity, EntityMap};
pub use envelope::SlotConfig;
pub use error::{Result, SaveError};
pub use self::log::{LogConfig, LogLevel};
pub use migrate::{MigrationOutcome, Migrator, SaveTree};
pub use model::{Record, SaveMeta, SaveModel};
pub use registry::{Component, Registry};
pub use worldsave_derive::Component;
pub use schema::{
    EnumShape, EnumVariant, FieldShape, FloatWidth, IntShape, IntWidth, Shape, Value, VariantCase,
    VariantShape,
};
pub use set::{ComponentModule, ComponentSet, ComponentSetBuilder};
pub use validate::{Validation, add_checksum, crc32, validate};

/// Convenience re-exports for the common save/load workflow.
pub mod prelude {
    pub use crate::codec::{CodecOptions, LoadReport, SaveCodec};
    pub use crate::component::{ComponentSpec, Saveable};
    pub use crate::entity::Entity;
    pub use crate::error::SaveError;
    pub use crate::registry::{Component, Registry};
    pub use worldsave_derive::Component;
    pub use crate::schema::{FieldShape, Shape, Value};
    pub use crate::set::{ComponentModule, ComponentSet};
}

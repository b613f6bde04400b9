//! Human-readable text format.
//!
//! The text format is RFC-8259 output shaped as:
//!
//! ```text
//! {
//!   "meta": { "version": 1, "lib_version": "0.1.0", "timestamp": 1722470400 },
//!   "components": {
//!     "Position": [ { "entt": 0, "data": { "x": 100.0, "y": 200.0 } } ],
//!     "Player": [ 0 ]
//!   }
//! }
//! ```
//!
//! Tag types record bare entity ids; data types record `entt`/`data`
//! objects. Useful for debugging, manual editing and diffing; use the
//! binary format for shipping builds.

mod reader;
mod writer;

pub(crate) use reader::{ParsedText, parse_value, read_model};
pub(crate) use writer::{emit_value, write_model};

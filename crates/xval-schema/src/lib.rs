//! # xval-schema — Composable Schemas for Labeled Arrays
//!
//! Declarative schemas for labeled N-dimensional arrays and datasets,
//! built on the types of `xval-core`.
//!
//! ## Validation
//!
//! Leaf schemas (`dtype`, `dims`, `name`, `chunks`, `array_type`,
//! `attrs`) check one property and return a bare
//! [`SchemaError`](xval_core::SchemaError). Composite schemas
//! ([`ArraySchema`], [`DatasetSchema`], and the keyed collections
//! [`AttrsSchema`] / [`CoordsSchema`]) walk the tree with a
//! [`ValidationContext`](xval_core::ValidationContext), attributing each
//! mismatch to its path:
//!
//! ```text
//! DatasetSchema
//! ├── data_vars.{name} ── ArraySchema ── dtype, name, dims, shape,
//! │                                      coords.{name}, chunks,
//! │                                      attrs.{key}, array_type
//! ├── coords.{name} ───── ArraySchema
//! └── attrs.{key} ─────── AttrSchema
//! ```
//!
//! Eager validation returns the first mismatch as an error; lazy
//! validation returns a [`ValidationReport`](xval_core::ValidationReport)
//! listing every mismatch.
//!
//! ## Plain Data (`schema`, `descriptor`, `document`)
//!
//! Every kind implements [`Schema`]: a round trip through
//! `serde_json::Value` and a JSON Schema (Draft 2020-12) descriptor used to
//! check schema documents before they are deserialized. [`document`] loads
//! such documents from JSON or YAML files.
//!
//! ## Inference
//!
//! [`ArraySchema::infer`] and [`DatasetSchema::infer`] describe an existing
//! object as a schema that the object passes.
//!
//! ## Crate Policy
//!
//! - Depends only on `xval-core` internally.
//! - Schemas are immutable once built and are `Send + Sync`.
//! - Validation never mutates the candidate.
//! - Malformed schema input is a `ConstructionError` at build time, never a
//!   validation-time failure.

pub mod array;
pub mod array_type;
pub mod attrs;
pub mod checks;
pub mod chunks;
pub mod coords;
pub mod dataset;
pub mod descriptor;
pub mod dims;
pub mod document;
pub mod dtype;
pub mod keys;
pub mod name;
pub mod schema;

pub use array::ArraySchema;
pub use array_type::ArrayTypeSchema;
pub use attrs::{AttrSchema, AttrType, AttrsSchema};
pub use checks::{ArrayCheck, Check, DatasetCheck};
pub use chunks::{ChunksSchema, ExpectedChunks};
pub use coords::CoordsSchema;
pub use dataset::DatasetSchema;
pub use dims::{DimsSchema, ShapeSchema};
pub use document::{load_any_schema, load_document, load_schema, schema_from_str, DocumentFormat};
pub use dtype::DTypeSchema;
pub use keys::KeyPolicy;
pub use name::NameSchema;
pub use schema::{AnySchema, Schema, SchemaKind};

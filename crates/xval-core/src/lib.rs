//! # xval-core — Foundational Types for xval
//!
//! The leaf crate of the workspace. Defines everything schemas need that is
//! not itself a schema:
//!
//! - **Errors** (`error.rs`): `SchemaError` for data mismatches,
//!   `ValidationError` for composite validation calls, `ConstructionError`
//!   for malformed schema input, `ModelError` for the in-memory model.
//!
//! - **Context** (`context.rs`): `ValidationContext` tracks the path through
//!   the schema tree and routes mismatches according to `ValidationMode`;
//!   `ValidationReport` is the aggregate lazy result.
//!
//! - **Dtypes** (`dtype.rs`): concrete dtypes, abstract categories, and the
//!   subtype relation between them.
//!
//! - **Accessor contract** (`array.rs`): the read-only `ArrayLike` /
//!   `DatasetLike` views schemas validate against.
//!
//! - **Model** (`model.rs`): metadata-only `DataArray` / `Dataset`
//!   implementing the accessor contract.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `xval-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Validation is read-only: nothing here mutates a candidate.

pub mod array;
pub mod context;
pub mod dtype;
pub mod error;
pub mod model;

// Re-export primary types for ergonomic imports.
pub use array::{ArrayLike, ArrayType, Attrs, ChunkLayout, DataObject, DatasetLike};
pub use context::{ValidationContext, ValidationMode, ValidationReport, Violation, ROOT_PATH};
pub use dtype::{DType, DTypeCategory, DTypeSpec, TimeUnit};
pub use error::{
    CandidateTypeError, CheckError, ConstructionError, KeySet, ModelError, SchemaError,
    ValidationError,
};
pub use model::{DataArray, Dataset};

//! # Array Accessor Contract
//!
//! The read-only view of labeled arrays and datasets that schemas validate
//! against. Schemas never see concrete array storage; any type that can
//! answer these accessors can be validated.
//!
//! [`DataObject`] is the entry point: schemas take `&dyn DataObject` and
//! down-cast it with [`DataObject::as_array`] / [`DataObject::as_dataset`],
//! so passing a dataset to an array schema is a reportable
//! [`CandidateTypeError`](crate::error::CandidateTypeError) rather than a
//! type-level impossibility at dynamic boundaries.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dtype::DType;
use crate::error::ConstructionError;

/// Attribute mapping of an array or dataset.
pub type Attrs = BTreeMap<String, Value>;

/// Per-dimension chunk sizes, one entry per dimension.
pub type ChunkLayout = Vec<Vec<usize>>;

/// Kind of storage backing an array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayType {
    /// Contiguous in-memory storage.
    #[default]
    Dense,
    /// Storage partitioned into chunks and materialized on demand.
    Chunked,
    /// Sparse coordinate storage.
    Sparse,
}

impl ArrayType {
    /// Returns all storage kinds.
    pub fn all() -> &'static [ArrayType] {
        &[Self::Dense, Self::Chunked, Self::Sparse]
    }

    /// The name used in schema documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dense => "dense",
            Self::Chunked => "chunked",
            Self::Sparse => "sparse",
        }
    }
}

impl fmt::Display for ArrayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArrayType {
    type Err = ConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| ConstructionError::UnknownArrayType(s.to_string()))
    }
}

/// Any object a schema may be asked to validate.
pub trait DataObject {
    /// Human-readable kind, used in candidate type errors.
    fn kind(&self) -> &'static str;

    /// This object as an array, if it is one.
    fn as_array(&self) -> Option<&dyn ArrayLike> {
        None
    }

    /// This object as a dataset, if it is one.
    fn as_dataset(&self) -> Option<&dyn DatasetLike> {
        None
    }
}

/// Read-only accessors of a single labeled array.
pub trait ArrayLike {
    /// Element type.
    fn dtype(&self) -> DType;

    /// Extent of each dimension.
    fn shape(&self) -> &[usize];

    /// Dimension names, one per axis.
    fn dims(&self) -> &[String];

    /// Array name, if any.
    fn name(&self) -> Option<&str>;

    /// Attribute mapping.
    fn attrs(&self) -> &Attrs;

    /// Coordinate arrays by name.
    fn coords(&self) -> BTreeMap<&str, &dyn ArrayLike>;

    /// Chunk sizes per dimension, `None` if the array is not chunked.
    fn chunks(&self) -> Option<&[Vec<usize>]>;

    /// Kind of the backing storage.
    fn array_type(&self) -> ArrayType;
}

/// Read-only accessors of a dataset.
pub trait DatasetLike {
    /// Data variables by name.
    fn data_vars(&self) -> BTreeMap<&str, &dyn ArrayLike>;

    /// Coordinate arrays by name.
    fn coords(&self) -> BTreeMap<&str, &dyn ArrayLike>;

    /// Attribute mapping.
    fn attrs(&self) -> &Attrs;
}

//! # Error Types
//!
//! Defines the error types used throughout xval. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Taxonomy
//!
//! - [`SchemaError`]: the candidate does not match the schema. This is the
//!   expected outcome of validation and always names the field with its
//!   expected and actual values.
//! - [`ValidationError`]: what a composite `validate` call returns. Wraps a
//!   path-attributed [`SchemaError`] (eager mode), a [`CandidateTypeError`],
//!   or a failing extra check.
//! - [`ConstructionError`]: malformed schema input, raised while building or
//!   deserializing a schema, never while validating.
//! - [`ModelError`]: inconsistent input to the in-memory array model.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

/// Error type returned by user-supplied extra checks.
pub type CheckError = Box<dyn std::error::Error + Send + Sync>;

/// A set of mapping keys, rendered as `{"a", "b"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySet(pub BTreeSet<String>);

impl KeySet {
    /// Returns true if the set holds `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }
}

impl fmt::Display for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl<S: Into<String>> FromIterator<S> for KeySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// A structural mismatch between a candidate and a schema.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// The dtype is not a subtype of the expected dtype.
    #[error("dtype {actual} != {expected}")]
    DType {
        /// Actual dtype.
        actual: String,
        /// Expected dtype or category.
        expected: String,
    },

    /// The number of dimensions differs.
    #[error("length of dims does not match: {actual} != {expected}")]
    DimsLength {
        /// Actual number of dimensions.
        actual: usize,
        /// Expected number of dimensions.
        expected: usize,
    },

    /// A dimension name differs.
    #[error("dim mismatch in axis {axis}: {actual} != {expected}")]
    DimMismatch {
        /// Axis index.
        axis: usize,
        /// Actual dimension name.
        actual: String,
        /// Expected dimension name.
        expected: String,
    },

    /// The number of entries in the shape differs.
    #[error("number of dimensions in shape ({actual}) != expected ({expected})")]
    ShapeLength {
        /// Actual number of dimensions.
        actual: usize,
        /// Expected number of dimensions.
        expected: usize,
    },

    /// A dimension extent differs.
    #[error("shape mismatch in axis {axis}: {actual} != {expected}")]
    ShapeMismatch {
        /// Axis index.
        axis: usize,
        /// Actual extent.
        actual: usize,
        /// Expected extent.
        expected: usize,
    },

    /// The array name differs.
    #[error("name {actual} != {expected}")]
    Name {
        /// Actual name, `None` when unnamed.
        actual: String,
        /// Expected name, `None` when the array must be unnamed.
        expected: String,
    },

    /// The array was expected to be chunked.
    #[error("expected array to be chunked but it is not")]
    NotChunked,

    /// The array was expected to be unchunked.
    #[error("expected unchunked array but it is chunked")]
    UnexpectedChunks,

    /// A chunk constraint names a dimension the array does not have.
    #[error("{dim} chunks cannot be checked: dimension not in array dims")]
    ChunkDimMissing {
        /// Dimension named by the schema.
        dim: String,
    },

    /// Chunk sizes along a dimension differ.
    #[error("{dim} chunks did not match: {actual} != {expected}")]
    ChunkMismatch {
        /// Dimension name.
        dim: String,
        /// Actual chunk sizes.
        actual: String,
        /// Expected chunk size or sizes.
        expected: String,
    },

    /// The backing storage type differs.
    #[error("array_type {actual} != {expected}")]
    ArrayType {
        /// Actual storage type.
        actual: String,
        /// Expected storage type.
        expected: String,
    },

    /// An attribute value has the wrong type.
    #[error("attrs {actual} is not of type {expected}")]
    AttrType {
        /// Actual attribute value.
        actual: String,
        /// Expected attribute type.
        expected: String,
    },

    /// An attribute value differs.
    #[error("attr value {actual} != {expected}")]
    AttrValue {
        /// Actual attribute value.
        actual: String,
        /// Expected attribute value.
        expected: String,
    },

    /// Configured keys are missing from a keyed collection.
    #[error("{collection} has missing keys: {keys}")]
    MissingKeys {
        /// Collection name (`attrs`, `coords`, `data_vars`).
        collection: String,
        /// Keys configured but absent.
        keys: KeySet,
    },

    /// A keyed collection holds keys the schema does not configure.
    #[error("{collection} has extra keys: {keys}")]
    ExtraKeys {
        /// Collection name (`attrs`, `coords`, `data_vars`).
        collection: String,
        /// Keys present but not configured.
        keys: KeySet,
    },
}

/// The object passed to `validate` is not the kind of object the schema
/// validates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("input must be a {expected}, got {actual}")]
pub struct CandidateTypeError {
    /// Kind of object the schema validates.
    pub expected: &'static str,
    /// Kind of object that was passed.
    pub actual: &'static str,
}

/// Error returned by a composite `validate` call.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A schema mismatch, attributed to the path where it was raised.
    #[error("{path}: {source}")]
    Schema {
        /// Dotted path through the schema tree.
        path: String,
        /// The mismatch.
        #[source]
        source: SchemaError,
    },

    /// The candidate is the wrong kind of object.
    #[error(transparent)]
    Candidate(#[from] CandidateTypeError),

    /// A user-supplied extra check failed.
    #[error("check '{name}' failed at {path}: {source}")]
    Check {
        /// Name the check was registered under.
        name: String,
        /// Dotted path of the schema that ran the check.
        path: String,
        /// Error returned by the check.
        #[source]
        source: CheckError,
    },
}

impl ValidationError {
    /// The schema mismatch, if this is a schema error.
    pub fn schema_error(&self) -> Option<&SchemaError> {
        match self {
            Self::Schema { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Malformed schema-construction input.
#[derive(Error, Debug)]
pub enum ConstructionError {
    /// A dtype string could not be parsed.
    #[error("unknown dtype: {0:?}")]
    UnknownDType(String),

    /// An array type name is not recognized.
    #[error("unknown array_type: {0:?}")]
    UnknownArrayType(String),

    /// An attribute type name is not recognized.
    #[error("unknown attr type: {0:?}")]
    UnknownAttrType(String),

    /// A chunk size is neither a non-negative size nor `-1`.
    #[error("invalid chunk size for dimension {dim:?}: {value}")]
    InvalidChunkSize {
        /// Dimension the size was given for.
        dim: String,
        /// Offending value.
        value: String,
    },

    /// A field holds a value of the wrong JSON type.
    #[error("{schema}: field '{field}' expected {expected}, got {actual}")]
    InvalidField {
        /// Schema kind being deserialized.
        schema: &'static str,
        /// Field name.
        field: String,
        /// Expected JSON type description.
        expected: &'static str,
        /// Offending value.
        actual: String,
    },

    /// A required field is absent.
    #[error("{schema}: missing '{field}' field")]
    MissingField {
        /// Schema kind being deserialized.
        schema: &'static str,
        /// Field name.
        field: &'static str,
    },

    /// A schema document does not conform to its descriptor.
    #[error("{schema} document is malformed:\n{violations}")]
    MalformedDocument {
        /// Schema kind the document describes.
        schema: &'static str,
        /// One line per descriptor violation.
        violations: String,
    },

    /// The descriptor for a schema kind could not be compiled.
    #[error("descriptor for {schema} failed to compile: {reason}")]
    Descriptor {
        /// Schema kind.
        schema: &'static str,
        /// Compiler message.
        reason: String,
    },

    /// A schema document could not be read or parsed.
    #[error("document load error for '{path}': {reason}")]
    DocumentLoad {
        /// Path or label of the document.
        path: String,
        /// Reason the document could not be loaded.
        reason: String,
    },
}

/// Inconsistent input to the in-memory array model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Dimension names and extents have different lengths.
    #[error("array has {dims} dims but shape has {shape} entries")]
    DimsShape {
        /// Number of dimension names.
        dims: usize,
        /// Number of extents.
        shape: usize,
    },

    /// The chunk layout does not have one entry per dimension.
    #[error("chunk layout has {chunks} entries but array has {ndim} dims")]
    ChunkRank {
        /// Entries in the chunk layout.
        chunks: usize,
        /// Number of dimensions.
        ndim: usize,
    },

    /// Chunks along a dimension do not cover its extent.
    #[error("chunks along {dim} sum to {sum}, expected {extent}")]
    ChunkExtent {
        /// Dimension name.
        dim: String,
        /// Sum of chunk sizes.
        sum: usize,
        /// Dimension extent.
        extent: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_set_display_is_sorted() {
        let keys: KeySet = ["b", "a"].into_iter().collect();
        assert_eq!(keys.to_string(), r#"{"a", "b"}"#);
        assert!(keys.contains("a"));
    }

    #[test]
    fn test_missing_keys_message() {
        let err = SchemaError::MissingKeys {
            collection: "attrs".into(),
            keys: ["units"].into_iter().collect(),
        };
        assert_eq!(err.to_string(), r#"attrs has missing keys: {"units"}"#);
    }

    #[test]
    fn test_validation_error_carries_path() {
        let err = ValidationError::Schema {
            path: "data_vars.foo.dtype".into(),
            source: SchemaError::DType {
                actual: "<f4".into(),
                expected: "<i4".into(),
            },
        };
        assert_eq!(err.to_string(), "data_vars.foo.dtype: dtype <f4 != <i4");
        assert!(err.schema_error().is_some());
    }

    #[test]
    fn test_candidate_error_is_not_schema_error() {
        let err = ValidationError::from(CandidateTypeError {
            expected: "DataArray",
            actual: "Dataset",
        });
        assert!(err.schema_error().is_none());
        assert_eq!(err.to_string(), "input must be a DataArray, got Dataset");
    }
}

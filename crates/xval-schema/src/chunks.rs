//! # Chunks Schema
//!
//! Checks an array's chunk layout. Two modes:
//!
//! - **Boolean**: `true` requires the array to be chunked, `false` requires
//!   it not to be. Chunk sizes are not inspected.
//! - **Per dimension**: the array must be chunked, and each configured
//!   dimension is checked against an [`ExpectedChunks`]:
//!
//! ```text
//! Size(n)       every chunk but the last == n, last <= n
//! Whole  (-1)   as Size(extent of the dimension)
//! Explicit(v)   chunk sizes == v, in order
//! None          anything
//! ```
//!
//! A uniform size tolerates a single undersized trailing chunk, the usual
//! result of splitting an extent that is not a multiple of the chunk size.
//! Unconfigured dimensions are unconstrained.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use xval_core::{ConstructionError, SchemaError};

use crate::schema::{expect_size, invalid, Schema, SchemaKind};

/// Plain-data code for "one chunk spanning the whole dimension".
pub const WHOLE_DIMENSION: i64 = -1;

/// Expected chunking along one dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedChunks {
    /// Uniform chunks of this size, last one possibly smaller.
    Size(usize),
    /// One chunk covering the dimension extent.
    Whole,
    /// Exactly these chunk sizes.
    Explicit(Vec<usize>),
}

impl ExpectedChunks {
    fn serialize(&self) -> Value {
        match self {
            Self::Size(n) => Value::from(*n),
            Self::Whole => Value::from(WHOLE_DIMENSION),
            Self::Explicit(sizes) => sizes.iter().copied().map(Value::from).collect(),
        }
    }

    fn deserialize(dim: &str, value: &Value) -> Result<Self, ConstructionError> {
        match value {
            Value::Number(n) => match (n.as_u64(), n.as_i64()) {
                (Some(size), _) => usize::try_from(size).map(Self::Size).map_err(|_| {
                    ConstructionError::InvalidChunkSize {
                        dim: dim.to_string(),
                        value: n.to_string(),
                    }
                }),
                (None, Some(WHOLE_DIMENSION)) => Ok(Self::Whole),
                _ => Err(ConstructionError::InvalidChunkSize {
                    dim: dim.to_string(),
                    value: n.to_string(),
                }),
            },
            Value::Array(sizes) => sizes
                .iter()
                .enumerate()
                .map(|(i, s)| expect_size(SchemaKind::Chunks, format!("{dim}[{i}]").as_str(), s))
                .collect::<Result<_, _>>()
                .map(Self::Explicit),
            other => Err(invalid(
                SchemaKind::Chunks,
                dim,
                "a chunk size, -1, or a list of sizes",
                other,
            )),
        }
    }
}

impl From<usize> for ExpectedChunks {
    fn from(size: usize) -> Self {
        Self::Size(size)
    }
}

impl From<Vec<usize>> for ExpectedChunks {
    fn from(sizes: Vec<usize>) -> Self {
        Self::Explicit(sizes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ChunksSpec {
    Chunked(bool),
    PerDim(BTreeMap<String, Option<ExpectedChunks>>),
}

/// Expected chunk layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunksSchema {
    spec: ChunksSpec,
}

impl ChunksSchema {
    /// Only check whether the array is chunked at all.
    pub fn chunked(expected: bool) -> Self {
        Self {
            spec: ChunksSpec::Chunked(expected),
        }
    }

    /// Check the listed dimensions. `None` accepts any chunking of that
    /// dimension but still requires the array to be chunked.
    pub fn per_dim<I, S>(dims: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<ExpectedChunks>)>,
        S: Into<String>,
    {
        Self {
            spec: ChunksSpec::PerDim(dims.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// The expected chunking of `dim`, if configured in per-dimension mode.
    pub fn expected(&self, dim: &str) -> Option<&ExpectedChunks> {
        match &self.spec {
            ChunksSpec::Chunked(_) => None,
            ChunksSpec::PerDim(dims) => dims.get(dim).and_then(Option::as_ref),
        }
    }

    /// Check `chunks` (one entry per dimension of `dims` / `shape`).
    pub fn validate(
        &self,
        chunks: Option<&[Vec<usize>]>,
        dims: &[String],
        shape: &[usize],
    ) -> Result<(), SchemaError> {
        let is_chunked = chunks.is_some_and(|c| !c.is_empty());
        match &self.spec {
            ChunksSpec::Chunked(true) if !is_chunked => Err(SchemaError::NotChunked),
            ChunksSpec::Chunked(false) if is_chunked => Err(SchemaError::UnexpectedChunks),
            ChunksSpec::Chunked(_) => Ok(()),
            ChunksSpec::PerDim(expected) => {
                let chunks = match chunks {
                    Some(c) if !c.is_empty() => c,
                    _ => return Err(SchemaError::NotChunked),
                };
                for (dim, expected) in expected {
                    let Some(expected) = expected else { continue };
                    let axis = dims
                        .iter()
                        .position(|d| d == dim)
                        .filter(|axis| *axis < chunks.len())
                        .ok_or_else(|| SchemaError::ChunkDimMissing { dim: dim.clone() })?;
                    let actual = &chunks[axis];
                    let extent = shape.get(axis).copied().unwrap_or_else(|| actual.iter().sum());
                    check_dim(dim, actual, expected, extent)?;
                }
                Ok(())
            }
        }
    }
}

/// Check the chunk sizes along one dimension.
fn check_dim(
    dim: &str,
    actual: &[usize],
    expected: &ExpectedChunks,
    extent: usize,
) -> Result<(), SchemaError> {
    let mismatch = |expected: String| SchemaError::ChunkMismatch {
        dim: dim.to_string(),
        actual: format!("{actual:?}"),
        expected,
    };
    let size = match expected {
        ExpectedChunks::Explicit(sizes) => {
            return if actual == sizes.as_slice() {
                Ok(())
            } else {
                Err(mismatch(format!("{sizes:?}")))
            };
        }
        ExpectedChunks::Size(n) => *n,
        ExpectedChunks::Whole => extent,
    };
    match actual.split_last() {
        Some((last, init)) if init.iter().any(|c| *c != size) || *last > size => {
            Err(mismatch(size.to_string()))
        }
        _ => Ok(()),
    }
}

impl Schema for ChunksSchema {
    const KIND: SchemaKind = SchemaKind::Chunks;

    fn serialize(&self) -> Value {
        match &self.spec {
            ChunksSpec::Chunked(b) => Value::Bool(*b),
            ChunksSpec::PerDim(dims) => {
                let obj: Map<String, Value> = dims
                    .iter()
                    .map(|(k, v)| (k.clone(), v.as_ref().map_or(Value::Null, |e| e.serialize())))
                    .collect();
                Value::Object(obj)
            }
        }
    }

    fn deserialize(value: &Value) -> Result<Self, ConstructionError> {
        match value {
            Value::Bool(b) => Ok(Self::chunked(*b)),
            Value::Object(obj) => {
                let dims = obj
                    .iter()
                    .map(|(dim, v)| match v {
                        Value::Null => Ok((dim.clone(), None)),
                        other => ExpectedChunks::deserialize(dim, other).map(|e| (dim.clone(), Some(e))),
                    })
                    .collect::<Result<_, _>>()?;
                Ok(Self {
                    spec: ChunksSpec::PerDim(dims),
                })
            }
            other => Err(invalid(Self::KIND, "chunks", "a boolean or an object", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dims(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_bool_mode() {
        let x = dims(&["x"]);
        let chunked = [vec![2, 2]];
        ChunksSchema::chunked(true).validate(Some(&chunked), &x, &[4]).unwrap();
        ChunksSchema::chunked(false).validate(None, &x, &[4]).unwrap();
        assert_eq!(
            ChunksSchema::chunked(true).validate(None, &x, &[4]).unwrap_err(),
            SchemaError::NotChunked
        );
        assert_eq!(
            ChunksSchema::chunked(false).validate(Some(&chunked), &x, &[4]).unwrap_err(),
            SchemaError::UnexpectedChunks
        );
    }

    #[test]
    fn test_empty_layout_counts_as_unchunked() {
        ChunksSchema::chunked(false).validate(Some(&[]), &[], &[]).unwrap();
        assert!(ChunksSchema::chunked(true).validate(Some(&[]), &[], &[]).is_err());
    }

    #[test]
    fn test_whole_dimension_shorthand() {
        let schema = ChunksSchema::per_dim([("x", Some(ExpectedChunks::Whole))]);
        let x = dims(&["x"]);
        schema.validate(Some(&[vec![4]]), &x, &[4]).unwrap();
        let err = schema.validate(Some(&[vec![2, 2]]), &x, &[4]).unwrap_err();
        assert_eq!(err.to_string(), "x chunks did not match: [2, 2] != 4");
    }

    #[test]
    fn test_uniform_size_tolerates_short_last_chunk() {
        let schema = ChunksSchema::per_dim([("x", Some(ExpectedChunks::Size(3)))]);
        let x = dims(&["x"]);
        schema.validate(Some(&[vec![3, 3, 1]]), &x, &[7]).unwrap();
        schema.validate(Some(&[vec![3]]), &x, &[3]).unwrap();
        assert!(schema.validate(Some(&[vec![3, 4]]), &x, &[7]).is_err());
        assert!(schema.validate(Some(&[vec![2, 3, 2]]), &x, &[7]).is_err());
    }

    #[test]
    fn test_explicit_sizes_are_order_sensitive() {
        let schema = ChunksSchema::per_dim([("x", Some(ExpectedChunks::Explicit(vec![3, 1])))]);
        let x = dims(&["x"]);
        schema.validate(Some(&[vec![3, 1]]), &x, &[4]).unwrap();
        let err = schema.validate(Some(&[vec![1, 3]]), &x, &[4]).unwrap_err();
        assert_eq!(err.to_string(), "x chunks did not match: [1, 3] != [3, 1]");
    }

    #[test]
    fn test_per_dim_requires_chunking_even_for_wildcards() {
        let schema = ChunksSchema::per_dim([("x", None)]);
        let x = dims(&["x"]);
        assert_eq!(schema.validate(None, &x, &[4]).unwrap_err(), SchemaError::NotChunked);
        schema.validate(Some(&[vec![1, 3]]), &x, &[4]).unwrap();
    }

    #[test]
    fn test_unconfigured_dims_unconstrained() {
        let schema = ChunksSchema::per_dim([("x", Some(ExpectedChunks::Size(2)))]);
        let xy = dims(&["x", "y"]);
        schema
            .validate(Some(&[vec![2, 2], vec![1, 5, 3]]), &xy, &[4, 9])
            .unwrap();
    }

    #[test]
    fn test_configured_dim_missing_from_array() {
        let schema = ChunksSchema::per_dim([("t", Some(ExpectedChunks::Size(2)))]);
        let err = schema.validate(Some(&[vec![4]]), &dims(&["x"]), &[4]).unwrap_err();
        assert_eq!(err, SchemaError::ChunkDimMissing { dim: "t".into() });
    }

    #[test]
    fn test_plain_data_round_trip() {
        let doc = json!({"x": -1, "y": [2, 2], "z": 5, "w": null});
        let schema = ChunksSchema::deserialize(&doc).unwrap();
        assert_eq!(schema.expected("x"), Some(&ExpectedChunks::Whole));
        assert_eq!(schema.expected("w"), None);
        assert_eq!(schema.serialize(), doc);
        assert_eq!(ChunksSchema::deserialize(&json!(false)).unwrap().serialize(), json!(false));
    }

    #[test]
    fn test_invalid_chunk_sizes() {
        let err = ChunksSchema::deserialize(&json!({"x": -2})).unwrap_err();
        assert!(matches!(err, ConstructionError::InvalidChunkSize { .. }));
        assert!(ChunksSchema::deserialize(&json!({"x": 1.5})).is_err());
        assert!(ChunksSchema::deserialize(&json!({"x": "auto"})).is_err());
        assert!(ChunksSchema::deserialize(&json!([1, 2])).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Split `extent` into chunks of `size`, the last one possibly short.
    fn split(extent: usize, size: usize) -> Vec<usize> {
        let mut chunks = vec![size; extent / size];
        if extent % size != 0 {
            chunks.push(extent % size);
        }
        chunks
    }

    proptest! {
        /// Regular splitting of any extent satisfies the uniform size.
        #[test]
        fn regular_split_matches_size(extent in 1usize..500, size in 1usize..64) {
            let dims = vec!["x".to_string()];
            let chunks = vec![split(extent, size)];
            let schema = ChunksSchema::per_dim([("x", Some(ExpectedChunks::Size(size)))]);
            prop_assert!(schema.validate(Some(&chunks), &dims, &[extent]).is_ok());
        }

        /// Explicit sizes accept exactly the layout they name.
        #[test]
        fn explicit_matches_itself(sizes in prop::collection::vec(1usize..10, 1..8)) {
            let dims = vec!["x".to_string()];
            let extent = sizes.iter().sum::<usize>();
            let schema = ChunksSchema::per_dim([("x", Some(ExpectedChunks::Explicit(sizes.clone())))]);
            prop_assert!(schema.validate(Some(&[sizes]), &dims, &[extent]).is_ok());
        }

        /// Round trip through the plain-data form.
        #[test]
        fn plain_data_round_trip(
            entries in prop::collection::btree_map(
                "[a-z]{1,4}",
                prop::option::of(prop_oneof![
                    Just(ExpectedChunks::Whole),
                    (0usize..100).prop_map(ExpectedChunks::Size),
                    prop::collection::vec(0usize..100, 0..4).prop_map(ExpectedChunks::Explicit),
                ]),
                0..4,
            )
        ) {
            let schema = ChunksSchema::per_dim(entries);
            let again = ChunksSchema::deserialize(&schema.serialize()).unwrap();
            prop_assert_eq!(again, schema);
        }
    }
}

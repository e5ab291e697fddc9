//! # Dims and Shape Schemas
//!
//! Positional checks over dimension names and extents. `None` at a
//! position accepts anything there; the number of positions must always
//! match.

use serde_json::Value;
use xval_core::{ConstructionError, SchemaError};

use crate::schema::{expect_array, expect_size, expect_str, Schema, SchemaKind};

/// Expected dimension names, `None` as a per-axis wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimsSchema {
    dims: Vec<Option<String>>,
}

impl DimsSchema {
    /// Expect these names, with `None` accepting any name at that axis.
    pub fn new<I, S>(dims: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            dims: dims.into_iter().map(|d| d.map(Into::into)).collect(),
        }
    }

    /// Expect exactly these names.
    pub fn exact<I, S>(dims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(dims.into_iter().map(Some))
    }

    /// The expected names.
    pub fn dims(&self) -> &[Option<String>] {
        &self.dims
    }

    /// Check length first, then each non-wildcard axis in order.
    pub fn validate<S: AsRef<str>>(&self, actual: &[S]) -> Result<(), SchemaError> {
        if actual.len() != self.dims.len() {
            return Err(SchemaError::DimsLength {
                actual: actual.len(),
                expected: self.dims.len(),
            });
        }
        for (axis, (actual, expected)) in actual.iter().zip(&self.dims).enumerate() {
            if let Some(expected) = expected {
                if actual.as_ref() != expected {
                    return Err(SchemaError::DimMismatch {
                        axis,
                        actual: actual.as_ref().to_string(),
                        expected: expected.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Schema for DimsSchema {
    const KIND: SchemaKind = SchemaKind::Dims;

    fn serialize(&self) -> Value {
        self.dims
            .iter()
            .map(|d| d.clone().map_or(Value::Null, Value::String))
            .collect()
    }

    fn deserialize(value: &Value) -> Result<Self, ConstructionError> {
        let dims = expect_array(Self::KIND, "dims", value)?
            .iter()
            .enumerate()
            .map(|(i, d)| match d {
                Value::Null => Ok(None),
                other => expect_str(Self::KIND, format!("dims[{i}]").as_str(), other)
                    .map(|s| Some(s.to_string())),
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { dims })
    }
}

/// Expected dimension extents, `None` as a per-axis wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeSchema {
    shape: Vec<Option<usize>>,
}

impl ShapeSchema {
    /// Expect these extents, with `None` accepting any extent at that axis.
    pub fn new(shape: impl IntoIterator<Item = Option<usize>>) -> Self {
        Self {
            shape: shape.into_iter().collect(),
        }
    }

    /// Expect exactly these extents.
    pub fn exact(shape: impl IntoIterator<Item = usize>) -> Self {
        Self::new(shape.into_iter().map(Some))
    }

    /// The expected extents.
    pub fn shape(&self) -> &[Option<usize>] {
        &self.shape
    }

    /// Check the number of dimensions, then each non-wildcard axis.
    pub fn validate(&self, actual: &[usize]) -> Result<(), SchemaError> {
        if actual.len() != self.shape.len() {
            return Err(SchemaError::ShapeLength {
                actual: actual.len(),
                expected: self.shape.len(),
            });
        }
        for (axis, (actual, expected)) in actual.iter().zip(&self.shape).enumerate() {
            if let Some(expected) = expected {
                if actual != expected {
                    return Err(SchemaError::ShapeMismatch {
                        axis,
                        actual: *actual,
                        expected: *expected,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Schema for ShapeSchema {
    const KIND: SchemaKind = SchemaKind::Shape;

    fn serialize(&self) -> Value {
        self.shape
            .iter()
            .map(|n| n.map_or(Value::Null, Value::from))
            .collect()
    }

    fn deserialize(value: &Value) -> Result<Self, ConstructionError> {
        let shape = expect_array(Self::KIND, "shape", value)?
            .iter()
            .enumerate()
            .map(|(i, n)| match n {
                Value::Null => Ok(None),
                other => expect_size(Self::KIND, format!("shape[{i}]").as_str(), other).map(Some),
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { shape })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dims_exact_match() {
        DimsSchema::exact(["x", "y"]).validate(&["x", "y"]).unwrap();
    }

    #[test]
    fn test_dims_wildcard_axis() {
        let schema = DimsSchema::new([Some("x"), None]);
        schema.validate(&["x", "anything"]).unwrap();
        let err = schema.validate(&["y", "anything"]).unwrap_err();
        assert_eq!(err.to_string(), "dim mismatch in axis 0: y != x");
    }

    #[test]
    fn test_dims_length_checked_before_names() {
        let err = DimsSchema::exact(["x"]).validate(&["y", "z"]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::DimsLength {
                actual: 2,
                expected: 1
            }
        );
        assert!(err.to_string().contains("length of dims does not match"));
    }

    #[test]
    fn test_dims_first_mismatch_wins() {
        let err = DimsSchema::exact(["x", "y"]).validate(&["a", "b"]).unwrap_err();
        assert!(matches!(err, SchemaError::DimMismatch { axis: 0, .. }));
    }

    #[test]
    fn test_shape_wildcard_and_mismatch() {
        let schema = ShapeSchema::new([Some(2), None]);
        schema.validate(&[2, 100]).unwrap();
        let err = schema.validate(&[3, 4]).unwrap_err();
        assert_eq!(err.to_string(), "shape mismatch in axis 0: 3 != 2");
        let err = schema.validate(&[2]).unwrap_err();
        assert!(matches!(err, SchemaError::ShapeLength { actual: 1, expected: 2 }));
    }

    #[test]
    fn test_serialize_uses_null_for_wildcards() {
        assert_eq!(DimsSchema::new([Some("x"), None]).serialize(), json!(["x", null]));
        assert_eq!(ShapeSchema::new([Some(2), None]).serialize(), json!([2, null]));
    }

    #[test]
    fn test_deserialize_rejects_bad_items() {
        let err = DimsSchema::deserialize(&json!(["x", 1])).unwrap_err();
        assert!(err.to_string().contains("dims[1]"), "got: {err}");
        let err = ShapeSchema::deserialize(&json!([-1])).unwrap_err();
        assert!(err.to_string().contains("shape[0]"), "got: {err}");
        assert!(ShapeSchema::deserialize(&json!("2,3")).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// All-wildcard dims accept any dims of the same length.
        #[test]
        fn wildcard_dims_accept_any_names(names in prop::collection::vec("[a-z]{1,6}", 0..6)) {
            let schema = DimsSchema::new(vec![None::<String>; names.len()]);
            prop_assert!(schema.validate(&names).is_ok());
        }

        /// All-wildcard shapes accept any shape of the same length.
        #[test]
        fn wildcard_shape_accepts_any_extents(shape in prop::collection::vec(0usize..10_000, 0..6)) {
            let schema = ShapeSchema::new(vec![None; shape.len()]);
            prop_assert!(schema.validate(&shape).is_ok());
        }

        /// Wildcards never rescue a length mismatch.
        #[test]
        fn wildcard_shape_rejects_other_lengths(
            shape in prop::collection::vec(0usize..100, 0..6),
            n in 0usize..6,
        ) {
            prop_assume!(n != shape.len());
            let schema = ShapeSchema::new(vec![None; n]);
            prop_assert!(schema.validate(&shape).is_err());
        }

        /// Round trip through the plain-data form.
        #[test]
        fn dims_round_trip(dims in prop::collection::vec(prop::option::of("[a-z]{1,6}"), 0..6)) {
            let schema = DimsSchema::new(dims);
            let again = DimsSchema::deserialize(&schema.serialize()).unwrap();
            prop_assert_eq!(again.serialize(), schema.serialize());
        }
    }
}

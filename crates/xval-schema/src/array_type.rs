//! # Array Type Schema
//!
//! Checks the kind of storage backing an array.

use serde_json::Value;
use xval_core::{ArrayType, ConstructionError, SchemaError};

use crate::schema::{expect_str, Schema, SchemaKind};

/// Expected backing storage kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayTypeSchema {
    expected: ArrayType,
}

impl ArrayTypeSchema {
    /// Require `expected`.
    pub fn new(expected: ArrayType) -> Self {
        Self { expected }
    }

    /// The expected storage kind.
    pub fn expected(&self) -> ArrayType {
        self.expected
    }

    /// Succeeds only on an exact match.
    pub fn validate(&self, actual: ArrayType) -> Result<(), SchemaError> {
        if actual == self.expected {
            Ok(())
        } else {
            Err(SchemaError::ArrayType {
                actual: actual.to_string(),
                expected: self.expected.to_string(),
            })
        }
    }
}

impl From<ArrayType> for ArrayTypeSchema {
    fn from(expected: ArrayType) -> Self {
        Self::new(expected)
    }
}

impl Schema for ArrayTypeSchema {
    const KIND: SchemaKind = SchemaKind::ArrayType;

    fn serialize(&self) -> Value {
        Value::String(self.expected.as_str().to_string())
    }

    fn deserialize(value: &Value) -> Result<Self, ConstructionError> {
        expect_str(Self::KIND, "array_type", value)?
            .parse()
            .map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_matching_type_passes() {
        ArrayTypeSchema::new(ArrayType::Dense)
            .validate(ArrayType::Dense)
            .unwrap();
    }

    #[test]
    fn test_mismatch_message() {
        let err = ArrayTypeSchema::new(ArrayType::Dense)
            .validate(ArrayType::Chunked)
            .unwrap_err();
        assert_eq!(err.to_string(), "array_type chunked != dense");
    }

    #[test]
    fn test_unknown_name_is_construction_error() {
        let err = ArrayTypeSchema::deserialize(&json!("gpu")).unwrap_err();
        assert!(matches!(err, ConstructionError::UnknownArrayType(ref s) if s == "gpu"));
    }
}

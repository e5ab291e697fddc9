//! # DType Schema
//!
//! Checks an array's element type against a concrete dtype or an abstract
//! category via the subtype relation of [`xval_core::dtype`].

use std::str::FromStr;

use serde_json::Value;
use xval_core::{ConstructionError, DType, DTypeSpec, SchemaError};

use crate::schema::{expect_str, Schema, SchemaKind};

/// Expected element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DTypeSchema {
    expected: DTypeSpec,
}

impl DTypeSchema {
    /// Expect `expected` or any of its subtypes.
    pub fn new(expected: impl Into<DTypeSpec>) -> Self {
        Self {
            expected: expected.into(),
        }
    }

    /// The expected dtype or category.
    pub fn expected(&self) -> DTypeSpec {
        self.expected
    }

    /// Passes iff `actual` is a subtype of the expected dtype.
    pub fn validate(&self, actual: DType) -> Result<(), SchemaError> {
        if actual.is_subtype_of(&self.expected) {
            Ok(())
        } else {
            Err(SchemaError::DType {
                actual: actual.to_string(),
                expected: self.expected.to_string(),
            })
        }
    }
}

impl FromStr for DTypeSchema {
    type Err = ConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<DTypeSpec>().map(Self::new)
    }
}

impl Schema for DTypeSchema {
    const KIND: SchemaKind = SchemaKind::DType;

    fn serialize(&self) -> Value {
        Value::String(self.expected.to_string())
    }

    fn deserialize(value: &Value) -> Result<Self, ConstructionError> {
        expect_str(Self::KIND, "dtype", value)?.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xval_core::DTypeCategory;

    #[test]
    fn test_matching_dtype_passes() {
        let schema: DTypeSchema = "i4".parse().unwrap();
        schema.validate(DType::Int32).unwrap();
    }

    #[test]
    fn test_mismatch_message_names_both_dtypes() {
        let schema: DTypeSchema = "i4".parse().unwrap();
        let err = schema.validate(DType::Float32).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("i4"), "got: {msg}");
        assert!(msg.contains("f4"), "got: {msg}");
        assert_eq!(msg, "dtype <f4 != <i4");
    }

    #[test]
    fn test_category_accepts_members() {
        let schema = DTypeSchema::new(DTypeCategory::Floating);
        for dtype in [DType::Float16, DType::Float32, DType::Float64] {
            schema.validate(dtype).unwrap();
        }
        let err = schema.validate(DType::Int64).unwrap_err();
        assert_eq!(err.to_string(), "dtype <i8 != floating");
    }

    #[test]
    fn test_parse_category_and_concrete() {
        let category: DTypeSchema = "signedinteger".parse().unwrap();
        assert_eq!(category.expected(), DTypeSpec::Category(DTypeCategory::SignedInteger));
        let concrete: DTypeSchema = "float64".parse().unwrap();
        assert_eq!(concrete.expected(), DTypeSpec::Concrete(DType::Float64));
        assert!("quaternion".parse::<DTypeSchema>().is_err());
    }

    #[test]
    fn test_serialize_forms() {
        assert_eq!(DTypeSchema::new(DType::Int32).serialize(), "<i4");
        assert_eq!(DTypeSchema::new(DTypeCategory::Integer).serialize(), "integer");
    }

    #[test]
    fn test_deserialize_rejects_non_string_and_unknown() {
        assert!(DTypeSchema::deserialize(&serde_json::json!(4)).is_err());
        let err = DTypeSchema::deserialize(&serde_json::json!("real")).unwrap_err();
        assert!(matches!(err, ConstructionError::UnknownDType(_)));
    }
}

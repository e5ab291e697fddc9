//! # Name Schema

use serde_json::Value;
use xval_core::{ConstructionError, SchemaError};

use crate::schema::{invalid, Schema, SchemaKind};

/// Expected array name. Exact match only; an expected `None` requires the
/// array to be unnamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSchema {
    name: Option<String>,
}

impl NameSchema {
    /// Expect the array to be named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// Expect the array to have no name.
    pub fn unnamed() -> Self {
        Self { name: None }
    }

    /// The expected name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// `None` matches only an unnamed array.
    pub fn validate(&self, actual: Option<&str>) -> Result<(), SchemaError> {
        if actual == self.name.as_deref() {
            Ok(())
        } else {
            Err(SchemaError::Name {
                actual: actual.unwrap_or("None").to_string(),
                expected: self.name.as_deref().unwrap_or("None").to_string(),
            })
        }
    }
}

impl Schema for NameSchema {
    const KIND: SchemaKind = SchemaKind::Name;

    fn serialize(&self) -> Value {
        self.name.clone().map_or(Value::Null, Value::String)
    }

    fn deserialize(value: &Value) -> Result<Self, ConstructionError> {
        match value {
            Value::Null => Ok(Self::unnamed()),
            Value::String(s) => Ok(Self::new(s.as_str())),
            other => Err(invalid(Self::KIND, "name", "a string or null", other)),
        }
    }
}

//! # Coords Schema
//!
//! Checks the coordinate arrays of an array or dataset. Each configured
//! coordinate is validated by its own [`ArraySchema`] under a path segment
//! named after the coordinate.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use xval_core::{ArrayLike, ConstructionError, ValidationContext, ValidationError};

use crate::array::ArraySchema;
use crate::keys::KeyPolicy;
use crate::schema::{expect_object, Schema, SchemaKind};

/// Constraint on a coordinate mapping.
#[derive(Debug, Clone, Default)]
pub struct CoordsSchema {
    coords: BTreeMap<String, ArraySchema>,
    policy: KeyPolicy,
}

impl CoordsSchema {
    /// Configure `coords` under the default key policy.
    pub fn new<I, S>(coords: I) -> Self
    where
        I: IntoIterator<Item = (S, ArraySchema)>,
        S: Into<String>,
    {
        Self {
            coords: coords.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            policy: KeyPolicy::default(),
        }
    }

    /// Replace the key policy.
    pub fn with_policy(mut self, policy: KeyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Per-coordinate array schemas.
    pub fn coords(&self) -> &BTreeMap<String, ArraySchema> {
        &self.coords
    }

    /// The key policy applied to coordinate names.
    pub fn policy(&self) -> KeyPolicy {
        self.policy
    }

    /// Validate a coordinate mapping: key policy, then each configured
    /// coordinate that is present.
    pub fn validate_in(
        &self,
        coords: &BTreeMap<&str, &dyn ArrayLike>,
        ctx: &ValidationContext,
    ) -> Result<(), ValidationError> {
        self.policy.check_keys(
            "coords",
            self.coords.keys().map(String::as_str),
            coords.keys().copied(),
            ctx,
        )?;
        for (key, schema) in &self.coords {
            if let Some(coord) = coords.get(key.as_str()) {
                tracing::trace!(coord = %key, "validating coordinate");
                schema.validate_in(*coord, &ctx.push(key.as_str()))?;
            }
        }
        Ok(())
    }
}

impl Schema for CoordsSchema {
    const KIND: SchemaKind = SchemaKind::Coords;

    fn serialize(&self) -> Value {
        let coords: Map<String, Value> = self
            .coords
            .iter()
            .map(|(k, v)| (k.clone(), v.serialize()))
            .collect();
        let mut obj = Map::new();
        obj.insert("coords".into(), Value::Object(coords));
        self.policy.serialize_into(&mut obj);
        Value::Object(obj)
    }

    fn deserialize(value: &Value) -> Result<Self, ConstructionError> {
        let obj = expect_object(Self::KIND, "coords", value)?;
        let coords = match obj.get("coords") {
            None => BTreeMap::new(),
            Some(entries) => expect_object(Self::KIND, "coords", entries)?
                .iter()
                .map(|(k, v)| ArraySchema::deserialize(v).map(|s| (k.clone(), s)))
                .collect::<Result<_, _>>()?,
        };
        Ok(Self {
            coords,
            policy: KeyPolicy::deserialize_from(Self::KIND, obj)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use xval_core::{DType, DataArray};

    fn x_coord(dtype: DType) -> DataArray {
        DataArray::vector(dtype, "x", 3)
    }

    #[test]
    fn test_coord_mismatch_path() {
        let schema = CoordsSchema::deserialize(&json!({"coords": {"x": {"dtype": "<f8"}}})).unwrap();
        let coord = x_coord(DType::Int64);
        let coords: BTreeMap<&str, &dyn ArrayLike> = [("x", &coord as &dyn ArrayLike)].into();
        let ctx = ValidationContext::lazy();
        schema.validate_in(&coords, &ctx.push("coords")).unwrap();
        assert_eq!(ctx.report().paths().collect::<Vec<_>>(), vec!["coords.x.dtype"]);
    }

    #[test]
    fn test_missing_coord_reported_at_collection() {
        let schema = CoordsSchema::new([("x", ArraySchema::new()), ("y", ArraySchema::new())]);
        let coord = x_coord(DType::Float64);
        let coords: BTreeMap<&str, &dyn ArrayLike> = [("x", &coord as &dyn ArrayLike)].into();
        let err = schema
            .validate_in(&coords, &ValidationContext::eager().push("coords"))
            .unwrap_err();
        assert_eq!(err.to_string(), r#"coords: coords has missing keys: {"y"}"#);
    }

    #[test]
    fn test_coords_field_defaults_to_empty() {
        let schema = CoordsSchema::deserialize(&json!({"allow_extra_keys": false})).unwrap();
        assert!(schema.coords().is_empty());
        let coord = x_coord(DType::Float64);
        let coords: BTreeMap<&str, &dyn ArrayLike> = [("x", &coord as &dyn ArrayLike)].into();
        assert!(schema
            .validate_in(&coords, &ValidationContext::eager())
            .is_err());
        assert_eq!(
            schema.serialize(),
            json!({"coords": {}, "require_all_keys": true, "allow_extra_keys": false})
        );
    }
}

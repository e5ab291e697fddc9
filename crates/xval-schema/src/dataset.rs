//! # Dataset Schema
//!
//! The top-level schema: constraints on a dataset's data variables,
//! coordinates and attributes.
//!
//! ## Check Order
//!
//! 1. `data_vars` key policy, reported at `data_vars`.
//! 2. Each configured variable present in the dataset, under
//!    `data_vars.{name}`. A variable configured as `None` only has to
//!    satisfy the key policy.
//! 3. Coordinates under `coords`.
//! 4. Attributes under `attrs`.
//! 5. Extra checks, in the order they were added.
//!
//! When `data_vars` is not configured at all, variables are not inspected.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use xval_core::{
    CandidateTypeError, ConstructionError, DataObject, DatasetLike, ValidationContext,
    ValidationError, ValidationMode, ValidationReport,
};

use crate::array::{describe_array, describe_attrs, describe_coords, ArraySchema};
use crate::attrs::AttrsSchema;
use crate::checks::DatasetCheck;
use crate::coords::CoordsSchema;
use crate::keys::KeyPolicy;
use crate::schema::{expect_object, Schema, SchemaKind};

/// Kind name reported when a non-dataset is passed to a dataset schema.
const CANDIDATE_KIND: &str = "Dataset";

/// Structural constraints on a dataset.
#[derive(Debug, Clone, Default)]
pub struct DatasetSchema {
    data_vars: Option<BTreeMap<String, Option<ArraySchema>>>,
    policy: KeyPolicy,
    coords: Option<CoordsSchema>,
    attrs: Option<AttrsSchema>,
    checks: Vec<DatasetCheck>,
}

impl DatasetSchema {
    /// An unconstrained dataset schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the data variables. `None` accepts any array under that
    /// name.
    pub fn with_data_vars<I, S>(mut self, data_vars: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<ArraySchema>)>,
        S: Into<String>,
    {
        self.data_vars = Some(data_vars.into_iter().map(|(k, v)| (k.into(), v)).collect());
        self
    }

    /// Add one data variable to the configured set.
    pub fn with_data_var(mut self, name: impl Into<String>, schema: Option<ArraySchema>) -> Self {
        self.data_vars
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), schema);
        self
    }

    /// Key policy applied to the data variables.
    pub fn with_policy(mut self, policy: KeyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Constrain the dataset coordinates.
    pub fn with_coords(mut self, coords: CoordsSchema) -> Self {
        self.coords = Some(coords);
        self
    }

    /// Constrain the dataset attributes.
    pub fn with_attrs(mut self, attrs: AttrsSchema) -> Self {
        self.attrs = Some(attrs);
        self
    }

    /// Append an extra check. Checks run in the order they were added.
    pub fn with_check(mut self, check: DatasetCheck) -> Self {
        self.checks.push(check);
        self
    }

    /// Configured data variables, if any.
    pub fn data_vars(&self) -> Option<&BTreeMap<String, Option<ArraySchema>>> {
        self.data_vars.as_ref()
    }

    /// Key policy for the data variables.
    pub fn policy(&self) -> KeyPolicy {
        self.policy
    }

    /// The coords constraint, if configured.
    pub fn coords(&self) -> Option<&CoordsSchema> {
        self.coords.as_ref()
    }

    /// The attrs constraint, if configured.
    pub fn attrs(&self) -> Option<&AttrsSchema> {
        self.attrs.as_ref()
    }

    /// Extra checks in run order.
    pub fn checks(&self) -> &[DatasetCheck] {
        &self.checks
    }

    // ── Validation ──────────────────────────────────────────────────

    /// Validate `candidate`, stopping at the first mismatch. Returns an
    /// empty report on success.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Candidate`] if `candidate` is not a
    /// dataset, [`ValidationError::Schema`] on the first mismatch, and
    /// [`ValidationError::Check`] if an extra check fails.
    pub fn validate(&self, candidate: &dyn DataObject) -> Result<ValidationReport, ValidationError> {
        self.validate_mode(candidate, ValidationMode::Eager)
    }

    /// Validate `candidate`, collecting every mismatch into the report.
    ///
    /// # Errors
    ///
    /// Only candidate type errors and extra check failures are returned as
    /// errors.
    pub fn validate_lazy(
        &self,
        candidate: &dyn DataObject,
    ) -> Result<ValidationReport, ValidationError> {
        self.validate_mode(candidate, ValidationMode::Lazy)
    }

    /// Validate `candidate` in a fresh root context of the given mode.
    pub fn validate_mode(
        &self,
        candidate: &dyn DataObject,
        mode: ValidationMode,
    ) -> Result<ValidationReport, ValidationError> {
        tracing::debug!(kind = %Self::KIND, %mode, "validating dataset");
        let ctx = ValidationContext::new(mode);
        self.validate_with(candidate, &ctx)?;
        let report = ctx.report();
        if !report.is_valid() {
            tracing::debug!(violations = report.len(), "dataset failed validation");
        }
        Ok(report)
    }

    /// Validate `candidate` within an existing context.
    pub fn validate_with(
        &self,
        candidate: &dyn DataObject,
        ctx: &ValidationContext,
    ) -> Result<(), ValidationError> {
        let dataset = candidate.as_dataset().ok_or(CandidateTypeError {
            expected: CANDIDATE_KIND,
            actual: candidate.kind(),
        })?;
        self.validate_in(dataset, ctx)
    }

    /// Validate a dataset within an existing context.
    pub fn validate_in(
        &self,
        dataset: &dyn DatasetLike,
        ctx: &ValidationContext,
    ) -> Result<(), ValidationError> {
        if let Some(expected) = &self.data_vars {
            let actual = dataset.data_vars();
            self.policy.check_keys(
                "data_vars",
                expected.keys().map(String::as_str),
                actual.keys().copied(),
                &ctx.push("data_vars"),
            )?;
            for (key, schema) in expected {
                let (Some(schema), Some(var)) = (schema, actual.get(key.as_str())) else {
                    continue;
                };
                tracing::trace!(var = %key, "validating data variable");
                schema.validate_in(*var, &ctx.push(format!("data_vars.{key}")))?;
            }
        }
        if let Some(coords) = &self.coords {
            coords.validate_in(&dataset.coords(), &ctx.push("coords"))?;
        }
        if let Some(attrs) = &self.attrs {
            attrs.validate_in(dataset.attrs(), &ctx.push("attrs"))?;
        }
        for check in &self.checks {
            check.run(dataset, ctx)?;
        }
        Ok(())
    }

    // ── Inference ───────────────────────────────────────────────────

    /// Build a schema describing `dataset`: every data variable as with
    /// [`ArraySchema::infer`], its coordinates and attribute types.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError`] if the description cannot be
    /// deserialized.
    pub fn infer(dataset: &dyn DatasetLike) -> Result<Self, ConstructionError> {
        let data_vars: Map<String, Value> = dataset
            .data_vars()
            .into_iter()
            .map(|(k, v)| (k.to_string(), describe_array(v)))
            .collect();
        let mut obj = Map::new();
        obj.insert("data_vars".into(), Value::Object(data_vars));
        let coords = dataset.coords();
        if !coords.is_empty() {
            obj.insert("coords".into(), describe_coords(&coords));
        }
        obj.insert("attrs".into(), describe_attrs(dataset.attrs()));
        Self::deserialize(&Value::Object(obj))
    }
}

impl Schema for DatasetSchema {
    const KIND: SchemaKind = SchemaKind::Dataset;

    fn serialize(&self) -> Value {
        let mut obj = Map::new();
        if let Some(data_vars) = &self.data_vars {
            let vars: Map<String, Value> = data_vars
                .iter()
                .map(|(k, v)| (k.clone(), v.as_ref().map_or(Value::Null, ArraySchema::serialize)))
                .collect();
            obj.insert("data_vars".into(), Value::Object(vars));
        }
        self.policy.serialize_into(&mut obj);
        if let Some(coords) = &self.coords {
            obj.insert("coords".into(), coords.serialize());
        }
        if let Some(attrs) = &self.attrs {
            obj.insert("attrs".into(), attrs.serialize());
        }
        Value::Object(obj)
    }

    fn deserialize(value: &Value) -> Result<Self, ConstructionError> {
        let obj = expect_object(Self::KIND, "dataset", value)?;
        let data_vars = match obj.get("data_vars") {
            None => None,
            Some(vars) => Some(
                expect_object(Self::KIND, "data_vars", vars)?
                    .iter()
                    .map(|(k, v)| match v {
                        Value::Null => Ok((k.clone(), None)),
                        other => ArraySchema::deserialize(other).map(|s| (k.clone(), Some(s))),
                    })
                    .collect::<Result<_, ConstructionError>>()?,
            ),
        };
        Ok(Self {
            data_vars,
            policy: KeyPolicy::deserialize_from(Self::KIND, obj)?,
            coords: obj.get("coords").map(CoordsSchema::deserialize).transpose()?,
            attrs: obj.get("attrs").map(AttrsSchema::deserialize).transpose()?,
            checks: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use xval_core::{DType, DataArray, Dataset, SchemaError};

    fn dataset() -> Dataset {
        Dataset::new()
            .with_var("foo", DataArray::vector(DType::Int32, "x", 4))
            .with_var("bar", DataArray::vector(DType::Float64, "x", 4))
            .with_coord("x", DataArray::vector(DType::Int64, "x", 4))
            .with_attr("title", "test")
    }

    #[test]
    fn test_empty_schema_accepts_any_dataset() {
        DatasetSchema::new().validate(&dataset()).unwrap();
    }

    #[test]
    fn test_missing_var_reported_at_data_vars() {
        let schema = DatasetSchema::new()
            .with_data_var("foo", Some(ArraySchema::new().with_dtype(DType::Int32)))
            .with_data_var("baz", None);
        let mut ds = dataset();
        ds.drop_var("foo");
        let err = schema.validate(&ds).unwrap_err();
        match err {
            ValidationError::Schema { path, source } => {
                assert_eq!(path, "data_vars");
                assert!(source.to_string().contains("missing keys"), "got: {source}");
            }
            other => panic!("Expected Schema error, got: {other}"),
        }
    }

    #[test]
    fn test_var_errors_nest_under_var_name() {
        let schema = DatasetSchema::new().with_data_vars([
            ("foo", Some(ArraySchema::new().with_dtype(DType::Float32))),
            ("bar", Some(ArraySchema::new().with_dtype(DType::Int8))),
        ]);
        let report = schema.validate_lazy(&dataset()).unwrap();
        assert_eq!(
            report.paths().collect::<Vec<_>>(),
            vec!["data_vars.bar.dtype", "data_vars.foo.dtype"]
        );
    }

    #[test]
    fn test_none_var_only_checks_presence() {
        let schema = DatasetSchema::new()
            .with_data_var("foo", None)
            .with_policy(KeyPolicy::new(true, false));
        let report = schema.validate_lazy(&dataset()).unwrap();
        assert_eq!(report.len(), 1);
        assert!(matches!(
            report.violations()[0].error,
            SchemaError::ExtraKeys { .. }
        ));
    }

    #[test]
    fn test_lazy_visits_every_phase() {
        let schema = DatasetSchema::deserialize(&json!({
            "data_vars": {"foo": {"dtype": "<f4"}, "missing": null},
            "coords": {"coords": {"x": {"dtype": "<f8"}}},
            "attrs": {"attrs": {"title": {"value": "other"}}}
        }))
        .unwrap();
        let report = schema.validate_lazy(&dataset()).unwrap();
        assert_eq!(
            report.paths().collect::<Vec<_>>(),
            vec!["data_vars", "data_vars.foo.dtype", "coords.x.dtype", "attrs.title"]
        );
        assert_eq!(report.to_string().lines().count(), 4);
    }

    #[test]
    fn test_array_candidate_rejected() {
        let err = DatasetSchema::new()
            .validate(&DataArray::vector(DType::Int32, "x", 1))
            .unwrap_err();
        assert_eq!(err.to_string(), "input must be a Dataset, got DataArray");
    }

    #[test]
    fn test_dataset_check_sees_whole_dataset() {
        let schema = DatasetSchema::new().with_check(DatasetCheck::new("has_title", |ds| {
            if ds.attrs().contains_key("title") {
                Ok(())
            } else {
                Err("no title".into())
            }
        }));
        schema.validate(&dataset()).unwrap();
        let err = schema.validate(&Dataset::new()).unwrap_err();
        assert_eq!(err.to_string(), "check 'has_title' failed at <root>: no title");
    }

    #[test]
    fn test_infer_round_trips_and_validates_source() {
        let ds = dataset();
        let schema = DatasetSchema::infer(&ds).unwrap();
        let vars = schema.data_vars().unwrap();
        assert_eq!(vars.keys().collect::<Vec<_>>(), vec!["bar", "foo"]);
        assert!(schema.validate(&ds).unwrap().is_valid());
        let again = DatasetSchema::deserialize(&schema.serialize()).unwrap();
        assert_eq!(again.serialize(), schema.serialize());
    }

    #[test]
    fn test_serialize_omits_unconfigured_parts() {
        assert_eq!(
            DatasetSchema::new().serialize(),
            json!({"require_all_keys": true, "allow_extra_keys": true})
        );
        let schema = DatasetSchema::new().with_data_var("foo", None);
        assert_eq!(schema.serialize()["data_vars"], json!({"foo": null}));
    }
}

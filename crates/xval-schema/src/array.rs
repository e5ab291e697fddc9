//! # Array Schema
//!
//! Composes the leaf schemas into a validator for a single labeled array.
//! Every field is optional; an empty schema accepts any array.
//!
//! ## Check Order
//!
//! ```text
//! dtype → name → dims → shape → coords → chunks → attrs → array_type → checks
//! ```
//!
//! Each field reports under a path segment with its own name (`dtype`,
//! `coords.x.dims`, `attrs.units`, ...). In eager mode the first mismatch
//! in this order wins; in lazy mode every field runs. Extra checks run
//! last and their errors always abort.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use xval_core::{
    ArrayLike, ArrayType, CandidateTypeError, ConstructionError, DTypeSpec, DataObject,
    ValidationContext, ValidationError, ValidationMode, ValidationReport,
};

use crate::array_type::ArrayTypeSchema;
use crate::attrs::{AttrType, AttrsSchema};
use crate::checks::ArrayCheck;
use crate::chunks::ChunksSchema;
use crate::coords::CoordsSchema;
use crate::dims::{DimsSchema, ShapeSchema};
use crate::dtype::DTypeSchema;
use crate::name::NameSchema;
use crate::schema::{expect_object, Schema, SchemaKind};

/// Kind name reported when a non-array is passed to an array schema.
const CANDIDATE_KIND: &str = "DataArray";

/// Structural constraints on a labeled array.
#[derive(Debug, Clone, Default)]
pub struct ArraySchema {
    dtype: Option<DTypeSchema>,
    shape: Option<ShapeSchema>,
    dims: Option<DimsSchema>,
    name: Option<NameSchema>,
    coords: Option<CoordsSchema>,
    chunks: Option<ChunksSchema>,
    attrs: Option<AttrsSchema>,
    array_type: Option<ArrayTypeSchema>,
    checks: Vec<ArrayCheck>,
}

impl ArraySchema {
    /// An unconstrained array schema.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Builders ────────────────────────────────────────────────────

    /// Constrain the dtype to a concrete type or a category.
    pub fn with_dtype(mut self, dtype: impl Into<DTypeSpec>) -> Self {
        self.dtype = Some(DTypeSchema::new(dtype));
        self
    }

    /// Constrain the dimension names.
    pub fn with_dims(mut self, dims: DimsSchema) -> Self {
        self.dims = Some(dims);
        self
    }

    /// Constrain the extents.
    pub fn with_shape(mut self, shape: ShapeSchema) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Constrain the array name.
    pub fn with_name(mut self, name: NameSchema) -> Self {
        self.name = Some(name);
        self
    }

    /// Constrain the chunk layout.
    pub fn with_chunks(mut self, chunks: ChunksSchema) -> Self {
        self.chunks = Some(chunks);
        self
    }

    /// Constrain the attributes.
    pub fn with_attrs(mut self, attrs: AttrsSchema) -> Self {
        self.attrs = Some(attrs);
        self
    }

    /// Require a storage kind.
    pub fn with_array_type(mut self, array_type: ArrayType) -> Self {
        self.array_type = Some(ArrayTypeSchema::new(array_type));
        self
    }

    /// Constrain the coordinate arrays.
    pub fn with_coords(mut self, coords: CoordsSchema) -> Self {
        self.coords = Some(coords);
        self
    }

    /// Append an extra check. Checks run in the order they were added.
    pub fn with_check(mut self, check: ArrayCheck) -> Self {
        self.checks.push(check);
        self
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// The dtype constraint, if configured.
    pub fn dtype(&self) -> Option<&DTypeSchema> {
        self.dtype.as_ref()
    }

    /// The dims constraint, if configured.
    pub fn dims(&self) -> Option<&DimsSchema> {
        self.dims.as_ref()
    }

    /// The shape constraint, if configured.
    pub fn shape(&self) -> Option<&ShapeSchema> {
        self.shape.as_ref()
    }

    /// The name constraint, if configured.
    pub fn name(&self) -> Option<&NameSchema> {
        self.name.as_ref()
    }

    /// The chunks constraint, if configured.
    pub fn chunks(&self) -> Option<&ChunksSchema> {
        self.chunks.as_ref()
    }

    /// The attrs constraint, if configured.
    pub fn attrs(&self) -> Option<&AttrsSchema> {
        self.attrs.as_ref()
    }

    /// The storage kind constraint, if configured.
    pub fn array_type(&self) -> Option<&ArrayTypeSchema> {
        self.array_type.as_ref()
    }

    /// The coords constraint, if configured.
    pub fn coords(&self) -> Option<&CoordsSchema> {
        self.coords.as_ref()
    }

    /// Extra checks in run order.
    pub fn checks(&self) -> &[ArrayCheck] {
        &self.checks
    }

    // ── Validation ──────────────────────────────────────────────────

    /// Validate `candidate`, stopping at the first mismatch.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Candidate`] if `candidate` is not an
    /// array, [`ValidationError::Schema`] on the first mismatch, and
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
        tracing::debug!(kind = %Self::KIND, %mode, "validating array");
        let ctx = ValidationContext::new(mode);
        self.validate_with(candidate, &ctx)?;
        let report = ctx.report();
        if !report.is_valid() {
            tracing::debug!(violations = report.len(), "array failed validation");
        }
        Ok(report)
    }

    /// Validate `candidate` within an existing context.
    pub fn validate_with(
        &self,
        candidate: &dyn DataObject,
        ctx: &ValidationContext,
    ) -> Result<(), ValidationError> {
        let array = candidate.as_array().ok_or(CandidateTypeError {
            expected: CANDIDATE_KIND,
            actual: candidate.kind(),
        })?;
        self.validate_in(array, ctx)
    }

    /// Validate an array within an existing context.
    pub fn validate_in(
        &self,
        array: &dyn ArrayLike,
        ctx: &ValidationContext,
    ) -> Result<(), ValidationError> {
        if let Some(dtype) = &self.dtype {
            ctx.push("dtype").check(dtype.validate(array.dtype()))?;
        }
        if let Some(name) = &self.name {
            ctx.push("name").check(name.validate(array.name()))?;
        }
        if let Some(dims) = &self.dims {
            ctx.push("dims").check(dims.validate(array.dims()))?;
        }
        if let Some(shape) = &self.shape {
            ctx.push("shape").check(shape.validate(array.shape()))?;
        }
        if let Some(coords) = &self.coords {
            coords.validate_in(&array.coords(), &ctx.push("coords"))?;
        }
        if let Some(chunks) = &self.chunks {
            ctx.push("chunks")
                .check(chunks.validate(array.chunks(), array.dims(), array.shape()))?;
        }
        if let Some(attrs) = &self.attrs {
            attrs.validate_in(array.attrs(), &ctx.push("attrs"))?;
        }
        if let Some(array_type) = &self.array_type {
            ctx.push("array_type")
                .check(array_type.validate(array.array_type()))?;
        }
        for check in &self.checks {
            check.run(array, ctx)?;
        }
        Ok(())
    }

    // ── Inference ───────────────────────────────────────────────────

    /// Build a schema describing `array`: its dtype, dims, shape, name if
    /// any, attribute types and coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError`] if the description cannot be
    /// deserialized.
    pub fn infer(array: &dyn ArrayLike) -> Result<Self, ConstructionError> {
        Self::deserialize(&describe_array(array))
    }
}

/// Plain-data description of `array`, in the array schema format.
pub(crate) fn describe_array(array: &dyn ArrayLike) -> Value {
    let mut obj = Map::new();
    obj.insert("dtype".into(), Value::String(array.dtype().typestr()));
    obj.insert(
        "dims".into(),
        array.dims().iter().cloned().map(Value::String).collect(),
    );
    obj.insert(
        "shape".into(),
        array.shape().iter().copied().map(Value::from).collect(),
    );
    if let Some(name) = array.name() {
        obj.insert("name".into(), Value::String(name.to_string()));
    }
    obj.insert("attrs".into(), describe_attrs(array.attrs()));
    let coords = array.coords();
    if !coords.is_empty() {
        obj.insert("coords".into(), describe_coords(&coords));
    }
    Value::Object(obj)
}

/// Type-only attribute constraints for every attribute in `attrs`.
pub(crate) fn describe_attrs(attrs: &xval_core::Attrs) -> Value {
    let entries: Map<String, Value> = attrs
        .iter()
        .map(|(k, v)| {
            let attr_type = AttrType::of(v).map_or(Value::Null, |t| Value::String(t.to_string()));
            let mut attr = Map::new();
            attr.insert("type".into(), attr_type);
            (k.clone(), Value::Object(attr))
        })
        .collect();
    let mut obj = Map::new();
    obj.insert("attrs".into(), Value::Object(entries));
    Value::Object(obj)
}

pub(crate) fn describe_coords(coords: &BTreeMap<&str, &dyn ArrayLike>) -> Value {
    let entries: Map<String, Value> = coords
        .iter()
        .map(|(k, v)| (k.to_string(), describe_array(*v)))
        .collect();
    let mut obj = Map::new();
    obj.insert("coords".into(), Value::Object(entries));
    Value::Object(obj)
}

impl Schema for ArraySchema {
    const KIND: SchemaKind = SchemaKind::Array;

    fn serialize(&self) -> Value {
        let mut obj = Map::new();
        if let Some(dtype) = &self.dtype {
            obj.insert("dtype".into(), dtype.serialize());
        }
        if let Some(shape) = &self.shape {
            obj.insert("shape".into(), shape.serialize());
        }
        if let Some(dims) = &self.dims {
            obj.insert("dims".into(), dims.serialize());
        }
        if let Some(name) = &self.name {
            obj.insert("name".into(), name.serialize());
        }
        if let Some(coords) = &self.coords {
            obj.insert("coords".into(), coords.serialize());
        }
        if let Some(chunks) = &self.chunks {
            obj.insert("chunks".into(), chunks.serialize());
        }
        if let Some(attrs) = &self.attrs {
            obj.insert("attrs".into(), attrs.serialize());
        }
        if let Some(array_type) = &self.array_type {
            obj.insert("array_type".into(), array_type.serialize());
        }
        Value::Object(obj)
    }

    fn deserialize(value: &Value) -> Result<Self, ConstructionError> {
        let obj = expect_object(Self::KIND, "array", value)?;
        Ok(Self {
            dtype: field(obj, "dtype")?,
            shape: field(obj, "shape")?,
            dims: field(obj, "dims")?,
            name: field(obj, "name")?,
            coords: field(obj, "coords")?,
            chunks: field(obj, "chunks")?,
            attrs: field(obj, "attrs")?,
            array_type: field(obj, "array_type")?,
            checks: Vec::new(),
        })
    }
}

/// Deserialize `obj[key]` if present.
fn field<S: Schema>(obj: &Map<String, Value>, key: &str) -> Result<Option<S>, ConstructionError> {
    obj.get(key).map(S::deserialize).transpose()
}

//! # Plain-Data Contract
//!
//! Every schema kind converts to and from a JSON-compatible value and has a
//! JSON Schema descriptor for its plain-data form. [`Schema`] is that shared
//! capability; [`AnySchema`] is the closed union of all kinds for callers
//! that pick the kind at runtime.
//!
//! Deserialization normalizes raw input (strings, sequences, maps) into the
//! inner schema types once. A deserialized schema is immutable.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use xval_core::ConstructionError;

use crate::array::ArraySchema;
use crate::array_type::ArrayTypeSchema;
use crate::attrs::{AttrSchema, AttrsSchema};
use crate::chunks::ChunksSchema;
use crate::coords::CoordsSchema;
use crate::dataset::DatasetSchema;
use crate::descriptor;
use crate::dims::{DimsSchema, ShapeSchema};
use crate::dtype::DTypeSchema;
use crate::name::NameSchema;

/// Every schema kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    DType,
    Dims,
    Shape,
    Name,
    Chunks,
    ArrayType,
    Attr,
    Attrs,
    Coords,
    Array,
    Dataset,
}

impl SchemaKind {
    /// Returns all kinds, leaves first.
    pub fn all() -> &'static [SchemaKind] {
        &[
            Self::DType,
            Self::Dims,
            Self::Shape,
            Self::Name,
            Self::Chunks,
            Self::ArrayType,
            Self::Attr,
            Self::Attrs,
            Self::Coords,
            Self::Array,
            Self::Dataset,
        ]
    }

    /// The key of this kind's definition in the descriptor document.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DType => "dtype",
            Self::Dims => "dims",
            Self::Shape => "shape",
            Self::Name => "name",
            Self::Chunks => "chunks",
            Self::ArrayType => "array_type",
            Self::Attr => "attr",
            Self::Attrs => "attrs",
            Self::Coords => "coords",
            Self::Array => "array",
            Self::Dataset => "dataset",
        }
    }

    /// The Rust type implementing this kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::DType => "DTypeSchema",
            Self::Dims => "DimsSchema",
            Self::Shape => "ShapeSchema",
            Self::Name => "NameSchema",
            Self::Chunks => "ChunksSchema",
            Self::ArrayType => "ArrayTypeSchema",
            Self::Attr => "AttrSchema",
            Self::Attrs => "AttrsSchema",
            Self::Coords => "CoordsSchema",
            Self::Array => "ArraySchema",
            Self::Dataset => "DatasetSchema",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaKind {
    type Err = ConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|k| k.as_str() == s)
            .copied()
            .ok_or_else(|| ConstructionError::InvalidField {
                schema: "SchemaKind",
                field: "kind".into(),
                expected: "a schema kind name",
                actual: format!("{s:?}"),
            })
    }
}

/// Plain-data round trip and self-description shared by all schema kinds.
pub trait Schema: Sized {
    /// The kind implemented by this type.
    const KIND: SchemaKind;

    /// The plain-data form of this schema.
    fn serialize(&self) -> Value;

    /// Build a schema from its plain-data form.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError`] if `value` is not a valid plain-data
    /// form of this kind.
    fn deserialize(value: &Value) -> Result<Self, ConstructionError>;

    /// JSON Schema (2020-12) describing the plain-data form.
    fn descriptor() -> Value {
        descriptor::descriptor_for(Self::KIND)
    }

    /// Check `document` against [`descriptor`](Self::descriptor).
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::MalformedDocument`] listing every
    /// descriptor violation.
    fn check_document(document: &Value) -> Result<(), ConstructionError> {
        descriptor::check_document(Self::KIND, document)
    }

    /// Check `document` against the descriptor, then deserialize it.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError`] if the document is malformed or cannot
    /// be deserialized.
    fn from_document(document: &Value) -> Result<Self, ConstructionError> {
        Self::check_document(document)?;
        Self::deserialize(document)
    }
}

/// A schema of any kind.
#[derive(Debug, Clone)]
pub enum AnySchema {
    DType(DTypeSchema),
    Dims(DimsSchema),
    Shape(ShapeSchema),
    Name(NameSchema),
    Chunks(ChunksSchema),
    ArrayType(ArrayTypeSchema),
    Attr(AttrSchema),
    Attrs(AttrsSchema),
    Coords(CoordsSchema),
    Array(ArraySchema),
    Dataset(DatasetSchema),
}

impl AnySchema {
    /// The kind of the wrapped schema.
    pub fn kind(&self) -> SchemaKind {
        match self {
            Self::DType(_) => SchemaKind::DType,
            Self::Dims(_) => SchemaKind::Dims,
            Self::Shape(_) => SchemaKind::Shape,
            Self::Name(_) => SchemaKind::Name,
            Self::Chunks(_) => SchemaKind::Chunks,
            Self::ArrayType(_) => SchemaKind::ArrayType,
            Self::Attr(_) => SchemaKind::Attr,
            Self::Attrs(_) => SchemaKind::Attrs,
            Self::Coords(_) => SchemaKind::Coords,
            Self::Array(_) => SchemaKind::Array,
            Self::Dataset(_) => SchemaKind::Dataset,
        }
    }

    /// The plain-data form of the wrapped schema.
    pub fn serialize(&self) -> Value {
        match self {
            Self::DType(s) => s.serialize(),
            Self::Dims(s) => s.serialize(),
            Self::Shape(s) => s.serialize(),
            Self::Name(s) => s.serialize(),
            Self::Chunks(s) => s.serialize(),
            Self::ArrayType(s) => s.serialize(),
            Self::Attr(s) => s.serialize(),
            Self::Attrs(s) => s.serialize(),
            Self::Coords(s) => s.serialize(),
            Self::Array(s) => s.serialize(),
            Self::Dataset(s) => s.serialize(),
        }
    }

    /// Deserialize `value` as a schema of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError`] if `value` is not a valid plain-data
    /// form of `kind`.
    pub fn deserialize(kind: SchemaKind, value: &Value) -> Result<Self, ConstructionError> {
        Ok(match kind {
            SchemaKind::DType => Self::DType(DTypeSchema::deserialize(value)?),
            SchemaKind::Dims => Self::Dims(DimsSchema::deserialize(value)?),
            SchemaKind::Shape => Self::Shape(ShapeSchema::deserialize(value)?),
            SchemaKind::Name => Self::Name(NameSchema::deserialize(value)?),
            SchemaKind::Chunks => Self::Chunks(ChunksSchema::deserialize(value)?),
            SchemaKind::ArrayType => Self::ArrayType(ArrayTypeSchema::deserialize(value)?),
            SchemaKind::Attr => Self::Attr(AttrSchema::deserialize(value)?),
            SchemaKind::Attrs => Self::Attrs(AttrsSchema::deserialize(value)?),
            SchemaKind::Coords => Self::Coords(CoordsSchema::deserialize(value)?),
            SchemaKind::Array => Self::Array(ArraySchema::deserialize(value)?),
            SchemaKind::Dataset => Self::Dataset(DatasetSchema::deserialize(value)?),
        })
    }

    /// Check `document` against the descriptor of `kind`, then deserialize.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError`] if the document is malformed or cannot
    /// be deserialized.
    pub fn from_document(kind: SchemaKind, document: &Value) -> Result<Self, ConstructionError> {
        descriptor::check_document(kind, document)?;
        Self::deserialize(kind, document)
    }
}

macro_rules! impl_from_schema {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for AnySchema {
                fn from(schema: $ty) -> Self {
                    Self::$variant(schema)
                }
            }
        )*
    };
}

impl_from_schema! {
    DType => DTypeSchema,
    Dims => DimsSchema,
    Shape => ShapeSchema,
    Name => NameSchema,
    Chunks => ChunksSchema,
    ArrayType => ArrayTypeSchema,
    Attr => AttrSchema,
    Attrs => AttrsSchema,
    Coords => CoordsSchema,
    Array => ArraySchema,
    Dataset => DatasetSchema,
}

// ─── Deserialization helpers ─────────────────────────────────────────

/// Short rendering of a value for error messages.
pub(crate) fn describe(value: &Value) -> String {
    let s = value.to_string();
    if s.chars().count() > 64 {
        let head: String = s.chars().take(61).collect();
        format!("{head}...")
    } else {
        s
    }
}

pub(crate) fn invalid(
    kind: SchemaKind,
    field: impl Into<String>,
    expected: &'static str,
    actual: &Value,
) -> ConstructionError {
    ConstructionError::InvalidField {
        schema: kind.type_name(),
        field: field.into(),
        expected,
        actual: describe(actual),
    }
}

pub(crate) fn expect_object<'a>(
    kind: SchemaKind,
    field: &str,
    value: &'a Value,
) -> Result<&'a Map<String, Value>, ConstructionError> {
    value
        .as_object()
        .ok_or_else(|| invalid(kind, field, "an object", value))
}

pub(crate) fn expect_array<'a>(
    kind: SchemaKind,
    field: &str,
    value: &'a Value,
) -> Result<&'a Vec<Value>, ConstructionError> {
    value
        .as_array()
        .ok_or_else(|| invalid(kind, field, "an array", value))
}

pub(crate) fn expect_str<'a>(
    kind: SchemaKind,
    field: &str,
    value: &'a Value,
) -> Result<&'a str, ConstructionError> {
    value
        .as_str()
        .ok_or_else(|| invalid(kind, field, "a string", value))
}

pub(crate) fn expect_size(
    kind: SchemaKind,
    field: &str,
    value: &Value,
) -> Result<usize, ConstructionError> {
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| invalid(kind, field, "a non-negative integer", value))
}

/// Read an optional boolean field, falling back to `default`.
pub(crate) fn bool_field(
    kind: SchemaKind,
    obj: &Map<String, Value>,
    field: &str,
    default: bool,
) -> Result<bool, ConstructionError> {
    match obj.get(field) {
        None => Ok(default),
        Some(value) => value
            .as_bool()
            .ok_or_else(|| invalid(kind, field, "a boolean", value)),
    }
}

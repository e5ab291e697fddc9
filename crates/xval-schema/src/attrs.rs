//! # Attribute Schemas
//!
//! [`AttrSchema`] checks one attribute value; [`AttrsSchema`] checks an
//! attribute mapping under a [`KeyPolicy`].
//!
//! Attribute values are JSON values. The type check follows JSON kinds,
//! with `number` covering both integers and floats and booleans never
//! counting as numbers. Value comparison is numeric-aware (`1 == 1.0`)
//! and recurses through arrays and objects.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Number, Value};
use xval_core::{Attrs, ConstructionError, SchemaError, ValidationContext, ValidationError};

use crate::keys::KeyPolicy;
use crate::schema::{describe, expect_object, expect_str, Schema, SchemaKind};

// ─── Attribute types ─────────────────────────────────────────────────

/// JSON kind an attribute value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrType {
    String,
    Integer,
    Float,
    /// Integer or float.
    Number,
    Boolean,
    Array,
    Object,
}

impl AttrType {
    /// Returns all attribute types.
    pub fn all() -> &'static [AttrType] {
        &[
            Self::String,
            Self::Integer,
            Self::Float,
            Self::Number,
            Self::Boolean,
            Self::Array,
            Self::Object,
        ]
    }

    /// The name used in schema documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// The most specific type of `value`, `None` for JSON null.
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(Self::Boolean),
            Value::Number(n) if n.is_f64() => Some(Self::Float),
            Value::Number(_) => Some(Self::Integer),
            Value::String(_) => Some(Self::String),
            Value::Array(_) => Some(Self::Array),
            Value::Object(_) => Some(Self::Object),
        }
    }

    /// Returns true if `value` has this type.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, Self::of(value)) {
            (Self::Number, Some(Self::Integer | Self::Float)) => true,
            (expected, Some(actual)) => *expected == actual,
            (_, None) => false,
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttrType {
    type Err = ConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "str" => return Ok(Self::String),
            "int" => return Ok(Self::Integer),
            "bool" => return Ok(Self::Boolean),
            "list" => return Ok(Self::Array),
            "dict" => return Ok(Self::Object),
            _ => {}
        }
        Self::all()
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| ConstructionError::UnknownAttrType(s.to_string()))
    }
}

/// Numeric-aware structural equality.
fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, x)| b.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => actual == expected,
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

// ─── AttrSchema ──────────────────────────────────────────────────────

/// Constraint on a single attribute value. Both parts are optional; an
/// empty schema accepts any value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrSchema {
    attr_type: Option<AttrType>,
    value: Option<Value>,
}

impl AttrSchema {
    /// An unconstrained attribute.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the attribute to be of `attr_type`.
    pub fn with_type(mut self, attr_type: AttrType) -> Self {
        self.attr_type = Some(attr_type);
        self
    }

    /// Require the attribute to equal `value`. A null `value` clears the
    /// constraint, matching the plain-data form.
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into()).filter(|v| !v.is_null());
        self
    }

    /// The required attribute type, if any.
    pub fn attr_type(&self) -> Option<AttrType> {
        self.attr_type
    }

    /// The required attribute value, if any.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Type check first, then value check.
    pub fn validate(&self, actual: &Value) -> Result<(), SchemaError> {
        if let Some(expected) = self.attr_type {
            if !expected.matches(actual) {
                return Err(SchemaError::AttrType {
                    actual: describe(actual),
                    expected: expected.to_string(),
                });
            }
        }
        if let Some(expected) = &self.value {
            if !values_equal(actual, expected) {
                return Err(SchemaError::AttrValue {
                    actual: describe(actual),
                    expected: describe(expected),
                });
            }
        }
        Ok(())
    }
}

impl Schema for AttrSchema {
    const KIND: SchemaKind = SchemaKind::Attr;

    fn serialize(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(
            "type".into(),
            self.attr_type
                .map_or(Value::Null, |t| Value::String(t.as_str().to_string())),
        );
        obj.insert("value".into(), self.value.clone().unwrap_or(Value::Null));
        Value::Object(obj)
    }

    fn deserialize(value: &Value) -> Result<Self, ConstructionError> {
        let obj = expect_object(Self::KIND, "attr", value)?;
        let attr_type = match obj.get("type") {
            None | Some(Value::Null) => None,
            Some(t) => Some(expect_str(Self::KIND, "type", t)?.parse()?),
        };
        let value = obj.get("value").filter(|v| !v.is_null()).cloned();
        Ok(Self { attr_type, value })
    }
}

// ─── AttrsSchema ─────────────────────────────────────────────────────

/// Constraint on an attribute mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrsSchema {
    attrs: BTreeMap<String, AttrSchema>,
    policy: KeyPolicy,
}

impl AttrsSchema {
    /// Configure `attrs` under the default key policy.
    pub fn new<I, S>(attrs: I) -> Self
    where
        I: IntoIterator<Item = (S, AttrSchema)>,
        S: Into<String>,
    {
        Self {
            attrs: attrs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            policy: KeyPolicy::default(),
        }
    }

    /// Replace the key policy.
    pub fn with_policy(mut self, policy: KeyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Per-key attribute schemas.
    pub fn attrs(&self) -> &BTreeMap<String, AttrSchema> {
        &self.attrs
    }

    /// The key policy applied to the mapping.
    pub fn policy(&self) -> KeyPolicy {
        self.policy
    }

    /// Validate `attrs` in a fresh eager context.
    pub fn validate(&self, attrs: &Attrs) -> Result<(), ValidationError> {
        self.validate_in(attrs, &ValidationContext::eager())
    }

    /// Validate `attrs`, attributing each attribute's mismatch to its key.
    pub fn validate_in(&self, attrs: &Attrs, ctx: &ValidationContext) -> Result<(), ValidationError> {
        self.policy.check_keys(
            "attrs",
            self.attrs.keys().map(String::as_str),
            attrs.keys().map(String::as_str),
            ctx,
        )?;
        for (key, schema) in &self.attrs {
            if let Some(actual) = attrs.get(key) {
                tracing::trace!(attr = %key, "validating attribute");
                ctx.push(key.as_str()).check(schema.validate(actual))?;
            }
        }
        Ok(())
    }
}

impl Schema for AttrsSchema {
    const KIND: SchemaKind = SchemaKind::Attrs;

    fn serialize(&self) -> Value {
        let attrs: Map<String, Value> = self
            .attrs
            .iter()
            .map(|(k, v)| (k.clone(), v.serialize()))
            .collect();
        let mut obj = Map::new();
        obj.insert("attrs".into(), Value::Object(attrs));
        self.policy.serialize_into(&mut obj);
        Value::Object(obj)
    }

    fn deserialize(value: &Value) -> Result<Self, ConstructionError> {
        let obj = expect_object(Self::KIND, "attrs", value)?;
        let entries = obj.get("attrs").ok_or(ConstructionError::MissingField {
            schema: Self::KIND.type_name(),
            field: "attrs",
        })?;
        let attrs = expect_object(Self::KIND, "attrs", entries)?
            .iter()
            .map(|(k, v)| match v {
                Value::Null => Ok((k.clone(), AttrSchema::new())),
                other => AttrSchema::deserialize(other).map(|s| (k.clone(), s)),
            })
            .collect::<Result<_, _>>()?;
        Ok(Self {
            attrs,
            policy: KeyPolicy::deserialize_from(Self::KIND, obj)?,
        })
    }
}

//! # Schema Documents
//!
//! Loads schemas from JSON or YAML documents. The document is parsed into
//! a `serde_json::Value`, checked against the kind's descriptor, then
//! deserialized:
//!
//! ```text
//! file ──► text ──► JSON value ──► descriptor check ──► Schema
//!          (.yaml/.yml via serde_yaml, otherwise serde_json)
//! ```
//!
//! YAML is restricted to its JSON-compatible subset: tags are dropped and
//! non-string scalar mapping keys are stringified.

use std::path::Path;

use serde_json::{Map, Value};
use xval_core::ConstructionError;

use crate::schema::{AnySchema, Schema, SchemaKind};

/// Text format of a schema document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// `.yaml` / `.yml` are YAML, everything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }

    /// Human-readable format name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        }
    }
}

/// Parse `text` into a JSON value. `label` names the document in errors.
///
/// # Errors
///
/// Returns [`ConstructionError::DocumentLoad`] if the text is not valid in
/// `format`.
pub fn parse_document(
    text: &str,
    format: DocumentFormat,
    label: &str,
) -> Result<Value, ConstructionError> {
    let load_error = |reason: String| ConstructionError::DocumentLoad {
        path: label.to_string(),
        reason,
    };
    match format {
        DocumentFormat::Json => {
            serde_json::from_str(text).map_err(|e| load_error(format!("invalid JSON: {e}")))
        }
        DocumentFormat::Yaml => {
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(text).map_err(|e| load_error(format!("invalid YAML: {e}")))?;
            yaml_to_json_value(&yaml)
                .map_err(|e| load_error(format!("YAML-to-JSON conversion failed: {e}")))
        }
    }
}

/// Read and parse the document at `path`, picking the format from its
/// extension.
///
/// # Errors
///
/// Returns [`ConstructionError::DocumentLoad`] if the file cannot be read
/// or parsed.
pub fn load_document(path: &Path) -> Result<Value, ConstructionError> {
    let label = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|e| ConstructionError::DocumentLoad {
        path: label.clone(),
        reason: format!("cannot read file: {e}"),
    })?;
    let format = DocumentFormat::from_path(path);
    tracing::debug!(path = %label, format = format.as_str(), "loading schema document");
    parse_document(&text, format, &label)
}

/// Load a schema of type `S` from the document at `path`.
///
/// # Errors
///
/// Returns [`ConstructionError`] if the document cannot be loaded, does
/// not match the descriptor of `S`, or cannot be deserialized.
pub fn load_schema<S: Schema>(path: &Path) -> Result<S, ConstructionError> {
    S::from_document(&load_document(path)?)
}

/// Load a schema of `kind` from the document at `path`.
///
/// # Errors
///
/// As [`load_schema`].
pub fn load_any_schema(kind: SchemaKind, path: &Path) -> Result<AnySchema, ConstructionError> {
    AnySchema::from_document(kind, &load_document(path)?)
}

/// Build a schema of type `S` from document text.
///
/// # Errors
///
/// As [`load_schema`].
pub fn schema_from_str<S: Schema>(text: &str, format: DocumentFormat) -> Result<S, ConstructionError> {
    S::from_document(&parse_document(text, format, "<string>")?)
}

/// Map a YAML tree onto JSON. Tags are dropped and scalar keys are
/// stringified; anything JSON cannot hold is an error.
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    use serde_yaml::Value as Yaml;

    Ok(match yaml {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(*b),
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Number(n) => match serde_json::to_value(n) {
            Ok(number @ Value::Number(_)) => number,
            _ => return Err(format!("number {n} has no JSON form")),
        },
        Yaml::Sequence(items) => items
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)?,
        Yaml::Mapping(entries) => entries
            .iter()
            .map(|(k, v)| -> Result<(String, Value), String> {
                Ok((yaml_key(k)?, yaml_to_json_value(v)?))
            })
            .collect::<Result<Map<_, _>, _>>()
            .map(Value::Object)?,
        Yaml::Tagged(tagged) => yaml_to_json_value(&tagged.value)?,
    })
}

/// JSON object key for a YAML mapping key.
fn yaml_key(key: &serde_yaml::Value) -> Result<String, String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("mapping key {other:?} is not a scalar")),
    }
}

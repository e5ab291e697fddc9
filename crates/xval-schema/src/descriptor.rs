//! # Schema Descriptors
//!
//! JSON Schema (Draft 2020-12) documents describing the plain-data form of
//! every schema kind, and structural checking of schema documents against
//! them with the `jsonschema` crate.
//!
//! All kinds live as `$defs` of one document so the recursive kinds
//! (an array schema holds a coords schema, which holds array schemas)
//! resolve with local `$ref`s. The descriptor of a kind is that document
//! with a root `$ref` to the kind's definition. No `$ref` leaves the
//! document, so no retriever is needed.
//!
//! Descriptors check structure only. Value-level rules (a dtype string
//! must parse, an attr type must be known) are enforced by `deserialize`.

use jsonschema::Validator;
use serde_json::{json, Value};
use xval_core::ConstructionError;

use crate::schema::SchemaKind;

const DRAFT_URI: &str = "https://json-schema.org/draft/2020-12/schema";

/// The keyed-collection flags shared by attrs, coords and dataset schemas.
fn key_policy_properties() -> Value {
    json!({
        "require_all_keys": {"type": "boolean"},
        "allow_extra_keys": {"type": "boolean"}
    })
}

fn with_key_policy(mut properties: Value) -> Value {
    if let (Some(props), Value::Object(policy)) =
        (properties.as_object_mut(), key_policy_properties())
    {
        props.extend(policy);
    }
    properties
}

/// The `$defs` table holding one definition per schema kind.
fn definitions() -> Value {
    json!({
        "dtype": {"type": "string", "minLength": 1},
        "dims": {
            "type": "array",
            "items": {"type": ["string", "null"]}
        },
        "shape": {
            "type": "array",
            "items": {
                "anyOf": [
                    {"type": "integer", "minimum": 0},
                    {"type": "null"}
                ]
            }
        },
        "name": {"type": ["string", "null"]},
        "chunks": {
            "anyOf": [
                {"type": "boolean"},
                {
                    "type": "object",
                    "additionalProperties": {
                        "anyOf": [
                            {"type": "integer", "minimum": -1},
                            {"type": "array", "items": {"type": "integer", "minimum": 0}},
                            {"type": "null"}
                        ]
                    }
                }
            ]
        },
        "array_type": {"type": "string"},
        "attr": {
            "type": "object",
            "properties": {
                "type": {"type": ["string", "null"]},
                "value": {}
            },
            "additionalProperties": false
        },
        "attrs": {
            "type": "object",
            "properties": with_key_policy(json!({
                "attrs": {
                    "type": "object",
                    "additionalProperties": {
                        "anyOf": [{"$ref": "#/$defs/attr"}, {"type": "null"}]
                    }
                }
            })),
            "required": ["attrs"],
            "additionalProperties": false
        },
        "coords": {
            "type": "object",
            "properties": with_key_policy(json!({
                "coords": {
                    "type": "object",
                    "additionalProperties": {"$ref": "#/$defs/array"}
                }
            })),
            "additionalProperties": false
        },
        "array": {
            "type": "object",
            "properties": {
                "dtype": {"$ref": "#/$defs/dtype"},
                "shape": {"$ref": "#/$defs/shape"},
                "dims": {"$ref": "#/$defs/dims"},
                "name": {"$ref": "#/$defs/name"},
                "coords": {"$ref": "#/$defs/coords"},
                "chunks": {"$ref": "#/$defs/chunks"},
                "attrs": {"$ref": "#/$defs/attrs"},
                "array_type": {"$ref": "#/$defs/array_type"}
            },
            "additionalProperties": false
        },
        "dataset": {
            "type": "object",
            "properties": with_key_policy(json!({
                "data_vars": {
                    "type": "object",
                    "additionalProperties": {
                        "anyOf": [{"$ref": "#/$defs/array"}, {"type": "null"}]
                    }
                },
                "coords": {"$ref": "#/$defs/coords"},
                "attrs": {"$ref": "#/$defs/attrs"}
            })),
            "additionalProperties": false
        }
    })
}

/// The descriptor of `kind`.
pub fn descriptor_for(kind: SchemaKind) -> Value {
    json!({
        "$schema": DRAFT_URI,
        "$ref": format!("#/$defs/{}", kind.as_str()),
        "$defs": definitions()
    })
}

/// Compile the descriptor of `kind`.
///
/// # Errors
///
/// Returns [`ConstructionError::Descriptor`] if the descriptor does not
/// compile.
pub fn build_validator(kind: SchemaKind) -> Result<Validator, ConstructionError> {
    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft202012);
    opts.build(&descriptor_for(kind))
        .map_err(|e| ConstructionError::Descriptor {
            schema: kind.type_name(),
            reason: e.to_string(),
        })
}

/// Check `document` against the descriptor of `kind`.
///
/// # Errors
///
/// Returns [`ConstructionError::MalformedDocument`] with one line per
/// violation, formatted `  <instance path>: <message>`.
pub fn check_document(kind: SchemaKind, document: &Value) -> Result<(), ConstructionError> {
    let validator = build_validator(kind)?;

    let violations: Vec<String> = validator
        .iter_errors(document)
        .map(|e| {
            let path = e.instance_path.to_string();
            if path.is_empty() {
                format!("  (root): {e}")
            } else {
                format!("  {path}: {e}")
            }
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        tracing::debug!(kind = %kind, count = violations.len(), "schema document rejected");
        Err(ConstructionError::MalformedDocument {
            schema: kind.type_name(),
            violations: violations.join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_descriptors_compile() {
        let mut failures = Vec::new();
        for kind in SchemaKind::all() {
            if let Err(e) = build_validator(*kind) {
                failures.push(format!("{kind}: {e}"));
            }
        }
        assert!(
            failures.is_empty(),
            "Failed to compile descriptors:\n{}",
            failures.join("\n")
        );
    }

    #[test]
    fn test_valid_array_document() {
        let doc = json!({
            "dtype": "<i4",
            "dims": ["x", null],
            "shape": [2, null],
            "name": "foo",
            "chunks": {"x": -1, "y": [2, 2]},
            "array_type": "dense",
            "attrs": {"attrs": {"units": {"type": "string", "value": "m"}}},
            "coords": {"coords": {"x": {"dtype": "<f8", "dims": ["x"]}}}
        });
        check_document(SchemaKind::Array, &doc).unwrap();
    }

    #[test]
    fn test_unknown_array_field_rejected() {
        let err = check_document(SchemaKind::Array, &json!({"dtyp": "i4"})).unwrap_err();
        match err {
            ConstructionError::MalformedDocument { schema, violations } => {
                assert_eq!(schema, "ArraySchema");
                assert!(violations.contains("dtyp"), "got: {violations}");
            }
            other => panic!("Expected MalformedDocument, got: {other}"),
        }
    }

    #[test]
    fn test_nested_violation_has_instance_path() {
        let doc = json!({"coords": {"coords": {"x": {"shape": [-3]}}}});
        let err = check_document(SchemaKind::Array, &doc).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("/coords/coords/x/shape/0"), "got: {msg}");
    }

    #[test]
    fn test_chunk_size_below_minus_one_rejected() {
        assert!(check_document(SchemaKind::Chunks, &json!({"x": -2})).is_err());
        assert!(check_document(SchemaKind::Chunks, &json!({"x": -1})).is_ok());
        assert!(check_document(SchemaKind::Chunks, &json!("yes")).is_err());
    }

    #[test]
    fn test_attrs_requires_attrs_field() {
        let err = check_document(SchemaKind::Attrs, &json!({"require_all_keys": true}));
        assert!(err.is_err());
        check_document(SchemaKind::Attrs, &json!({"attrs": {"a": null}})).unwrap();
    }

    #[test]
    fn test_dataset_document() {
        let doc = json!({
            "data_vars": {"foo": {"dtype": "i4"}, "bar": null},
            "require_all_keys": false,
            "attrs": {"attrs": {}, "allow_extra_keys": false}
        });
        check_document(SchemaKind::Dataset, &doc).unwrap();
        let bad = json!({"data_vars": ["foo"]});
        assert!(check_document(SchemaKind::Dataset, &bad).is_err());
    }
}

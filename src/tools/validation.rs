//! Check tool inputs against the tool's declared schema before dispatch.

use serde_json::Value;

use crate::error::SyllabusError;

/// Validate a tool input payload against a JSON Schema object.
///
/// Only the top level is checked: the payload must be an object, every
/// required field must be present and non-null, and declared properties must
/// carry the declared primitive type. `null` for an optional property is
/// accepted and treated as absent.
pub fn validate_input(tool_name: &str, input: &Value, schema: &Value) -> Result<(), SyllabusError> {
    let invalid = |detail: String| SyllabusError::InvalidArgument(format!("{tool_name}: {detail}"));

    let expects_object = schema.get("type").and_then(Value::as_str) == Some("object");
    let Some(fields) = input.as_object() else {
        if expects_object {
            return Err(invalid(format!("expected object input, got {}", type_name(input))));
        }
        return Ok(());
    };

    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str);
    for name in required {
        match fields.get(name) {
            None | Some(Value::Null) => return Err(invalid(format!("missing required field '{name}'"))),
            Some(_) => {}
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };
    for (key, value) in fields {
        if value.is_null() {
            continue;
        }
        let expected = properties
            .get(key)
            .and_then(|prop| prop.get("type"))
            .and_then(Value::as_str);
        if let Some(expected) = expected {
            if !matches_type(value, expected) {
                return Err(invalid(format!(
                    "field '{key}' expected type '{expected}', got {}",
                    type_name(value)
                )));
            }
        }
    }

    Ok(())
}

fn matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

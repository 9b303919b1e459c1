//! Organ input validation against function-card JSON schemas
//!
//! Only the subset the function cards use is checked: `required`, property
//! `type` (single or list) and `enum`.

use serde_json::Value;

use crate::error::{FindingsError, Result};

/// Validate input against a JSON schema
pub fn validate_input(input: &Value, schema: &Value) -> Result<()> {
    if schema.get("type").and_then(|t| t.as_str()) == Some("object") && !input.is_object() {
        return Err(FindingsError::ValidationError("Input must be a JSON object".to_string()));
    }

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for field in required.iter().filter_map(|f| f.as_str()) {
            if input.get(field).map_or(true, Value::is_null) {
                return Err(FindingsError::ValidationError(format!(
                    "Missing required field: {}",
                    field
                )));
            }
        }
    }

    let (Some(properties), Some(fields)) = (
        schema.get("properties").and_then(|p| p.as_object()),
        input.as_object(),
    ) else {
        return Ok(());
    };

    for (key, value) in fields {
        if let Some(prop_schema) = properties.get(key) {
            validate_property(key, value, prop_schema)?;
        }
    }

    Ok(())
}

fn validate_property(key: &str, value: &Value, schema: &Value) -> Result<()> {
    let allowed: Vec<&str> = match schema.get("type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(types)) => types.iter().filter_map(|t| t.as_str()).collect(),
        _ => Vec::new(),
    };

    if !allowed.is_empty() && !allowed.iter().any(|t| matches_type(value, t)) {
        return Err(FindingsError::ValidationError(format!(
            "Field '{}' must be {}, got {}",
            key,
            allowed.join(" or "),
            type_name(value)
        )));
    }

    if let Some(options) = schema.get("enum").and_then(|e| e.as_array()) {
        if !options.contains(value) {
            return Err(FindingsError::ValidationError(format!(
                "Field '{}' must be one of {}",
                key,
                Value::Array(options.clone())
            )));
        }
    }

    Ok(())
}

fn matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "metadata": { "type": "object" },
                "make": { "type": ["string", "null"] },
                "mode": { "type": "string", "enum": ["fast", "full"] }
            },
            "required": ["metadata"]
        })
    }

    #[test]
    fn test_valid_input() {
        assert!(validate_input(&json!({ "metadata": {}, "make": null, "mode": "fast" }), &schema()).is_ok());
    }

    #[test]
    fn test_missing_required() {
        let err = validate_input(&json!({ "make": "Apple" }), &schema()).unwrap_err();
        assert!(err.to_string().contains("metadata"));
        assert!(validate_input(&json!({ "metadata": null }), &schema()).is_err());
    }

    #[test]
    fn test_type_and_enum_mismatch() {
        assert!(validate_input(&json!({ "metadata": [] }), &schema()).is_err());
        assert!(validate_input(&json!({ "metadata": {}, "make": 5 }), &schema()).is_err());
        assert!(validate_input(&json!({ "metadata": {}, "mode": "slow" }), &schema()).is_err());
    }

    #[test]
    fn test_non_object_input() {
        assert!(validate_input(&json!("metadata"), &schema()).is_err());
    }
}

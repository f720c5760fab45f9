//! Schema validation helpers for SnapStix JSON5 configuration.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Validate a single config layer against the schema.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(
        map,
        &["$schema", "generation", "brew", "collection"],
        layer,
        "",
    )?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("generation") {
        validate_generation(value, layer, "generation")?;
    }
    if let Some(value) = map.get("brew") {
        validate_brew(value, layer, "brew")?;
    }
    if let Some(value) = map.get("collection") {
        validate_collection(value, layer, "collection")?;
    }
    Ok(())
}

/// Validate the "generation" block.
fn validate_generation(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &[
            "provider",
            "model",
            "api_base_url",
            "api_key_env",
            "prompt_template",
            "request_timeout_secs",
        ],
        layer,
        path,
    )?;
    for key in ["provider", "model", "api_base_url", "api_key_env"] {
        if let Some(value) = map.get(key) {
            expect_string(value, layer, &join_path(path, key))?;
        }
    }
    if let Some(value) = map.get("prompt_template") {
        expect_optional_string(value, layer, &join_path(path, "prompt_template"))?;
    }
    if let Some(value) = map.get("request_timeout_secs") {
        if !value.is_null() {
            expect_u64(value, layer, &join_path(path, "request_timeout_secs"))?;
        }
    }
    Ok(())
}

/// Validate the "brew" block.
fn validate_brew(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["stagger_ms", "expressions"], layer, path)?;
    if let Some(value) = map.get("stagger_ms") {
        expect_u64(value, layer, &join_path(path, "stagger_ms"))?;
    }
    if let Some(list) = map.get("expressions") {
        let list_path = join_path(path, "expressions");
        let entries = expect_array(list, layer, &list_path)?;
        for (idx, entry) in entries.iter().enumerate() {
            validate_expression(entry, layer, &format!("{list_path}[{idx}]"))?;
        }
    }
    Ok(())
}

/// Validate a single expression entry.
fn validate_expression(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["label", "emoji"], layer, path)?;
    let label_path = join_path(path, "label");
    let Some(label) = map.get("label") else {
        return Err(invalid_field(layer, &label_path, "missing required field"));
    };
    expect_string(label, layer, &label_path)?;
    if let Some(value) = map.get("emoji") {
        expect_string(value, layer, &join_path(path, "emoji"))?;
    }
    Ok(())
}

/// Validate the "collection" block.
fn validate_collection(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["storage_key", "max_persisted", "path", "quota_bytes"],
        layer,
        path,
    )?;
    if let Some(value) = map.get("storage_key") {
        expect_string(value, layer, &join_path(path, "storage_key"))?;
    }
    if let Some(value) = map.get("max_persisted") {
        expect_u64(value, layer, &join_path(path, "max_persisted"))?;
    }
    if let Some(value) = map.get("path") {
        expect_optional_string(value, layer, &join_path(path, "path"))?;
    }
    if let Some(value) = map.get("quota_bytes") {
        expect_u64(value, layer, &join_path(path, "quota_bytes"))?;
    }
    Ok(())
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

/// Expect a JSON array or return a typed error.
fn expect_array<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Vec<Value>, ConfigError> {
    match value {
        Value::Array(arr) => Ok(arr),
        _ => Err(invalid_field(layer, path, "expected array")),
    }
}

/// Expect a JSON string or return a typed error.
fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.as_str().is_some() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

/// Expect a JSON string or null.
fn expect_optional_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_null() {
        return Ok(());
    }
    expect_string(value, layer, path)
}

/// Expect a non-negative JSON integer or return a typed error.
fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_u64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected non-negative integer"))
    }
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(invalid_field(layer, &join_path(path, key), "unknown key"));
        }
    }
    Ok(())
}

/// Join nested paths for better error messages.
fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Build a structured invalid-field error.
fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}

//! Schema validation helpers for consent-rs JSON5 configuration.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Validate a single config layer against the schema.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(map, &["$schema", "binding", "requests", "events"], layer, "")?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("binding") {
        validate_binding(value, layer, "binding")?;
    }
    if let Some(value) = map.get("requests") {
        validate_requests(value, layer, "requests")?;
    }
    if let Some(value) = map.get("events") {
        validate_events(value, layer, "events")?;
    }
    Ok(())
}

/// Validate the "binding" block.
fn validate_binding(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["activity_tag", "fragment_tag"], layer, path)?;
    for key in ["activity_tag", "fragment_tag"] {
        if let Some(value) = map.get(key) {
            expect_string(value, layer, &join_path(path, key))?;
        }
    }
    Ok(())
}

/// Validate the "requests" block.
fn validate_requests(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["base_request_code"], layer, path)?;
    if let Some(value) = map.get("base_request_code") {
        let field = join_path(path, "base_request_code");
        let code = expect_u64(value, layer, &field)?;
        if code > u64::from(u16::MAX) {
            return Err(invalid_field(layer, &field, "expected a 16-bit request code"));
        }
    }
    Ok(())
}

/// Validate the "events" block.
fn validate_events(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["enabled", "buffer"], layer, path)?;
    if let Some(value) = map.get("enabled") {
        expect_bool(value, layer, &join_path(path, "enabled"))?;
    }
    if let Some(value) = map.get("buffer") {
        expect_u64(value, layer, &join_path(path, "buffer"))?;
    }
    Ok(())
}

fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(invalid_field(
                layer,
                &join_path(path, key),
                "unknown key",
            ));
        }
    }
    Ok(())
}

fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    value
        .as_object()
        .ok_or_else(|| invalid_field(layer, display_path(path), "expected an object"))
}

fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_string() {
        return Ok(());
    }
    Err(invalid_field(layer, path, "expected a string"))
}

fn expect_bool(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_boolean() {
        return Ok(());
    }
    Err(invalid_field(layer, path, "expected a boolean"))
}

fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<u64, ConfigError> {
    value
        .as_u64()
        .ok_or_else(|| invalid_field(layer, path, "expected a non-negative integer"))
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "<root>" } else { path }
}

fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    ConfigError::InvalidField {
        path: format!("{layer}:{path}"),
        message: message.to_string(),
    }
}

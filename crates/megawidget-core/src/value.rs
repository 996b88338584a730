//! Untyped configuration and state values.
//!
//! Megawidgets are described by nested, string-keyed maps whose values are
//! arbitrary JSON-like data. This module names those types and provides
//! readers that turn shape mismatches into [`ValidationError`]s carrying the
//! parameter name and offending value.
//!
//! # Example
//!
//! ```
//! use megawidget_core::value::{self, keys, ConfigMap};
//! use serde_json::json;
//!
//! let config: ConfigMap = json!({"identifier": "name", "type": "Text", "maxLength": 20})
//!     .as_object()
//!     .cloned()
//!     .unwrap_or_default();
//!
//! assert_eq!(value::require_string(&config, keys::IDENTIFIER).ok(), Some("name"));
//! assert_eq!(value::optional_usize(&config, keys::MAX_LENGTH).ok(), Some(Some(20)));
//! assert_eq!(value::optional_bool(&config, keys::ENABLED, true).ok(), Some(true));
//! ```

use std::collections::BTreeMap;

use crate::error::ValidationError;

/// An arbitrary configuration, state or property value.
pub type Value = serde_json::Value;

/// A string-keyed configuration map.
pub type ConfigMap = serde_json::Map<String, Value>;

/// Values keyed by state identifier.
pub type StateMap = BTreeMap<String, Value>;

/// Configuration keys recognised by the built-in specifiers.
pub mod keys {
    /// Unique identifier of a specifier; `:`-separated for multi-state controls.
    pub const IDENTIFIER: &str = "identifier";
    /// Type name used to resolve the specifier implementation.
    pub const TYPE: &str = "type";
    /// Whether the megawidget starts enabled.
    pub const ENABLED: &str = "enabled";
    /// Whether the megawidget starts editable.
    pub const EDITABLE: &str = "editable";
    /// Optional label text.
    pub const LABEL: &str = "label";
    /// Opaque data carried along for the caller.
    pub const EXTRA_DATA: &str = "extraData";
    /// Starting state value(s).
    pub const VALUES: &str = "values";
    /// Choice list.
    pub const CHOICES: &str = "choices";
    /// Display name of a choice.
    pub const CHOICE_NAME: &str = "name";
    /// Child choices of a branch choice.
    pub const CHOICE_CHILDREN: &str = "children";
    /// Payload of a leaf choice.
    pub const CHOICE_PAYLOAD: &str = "payload";
    /// Child specifiers attached to a choice.
    pub const DETAIL_FIELDS: &str = "detailFields";
    /// Lower bound.
    pub const MIN_VALUE: &str = "minValue";
    /// Upper bound.
    pub const MAX_VALUE: &str = "maxValue";
    /// Step applied by increment/decrement gestures.
    pub const INCREMENT_DELTA: &str = "incrementDelta";
    /// Number of fractional digits kept by fraction spinners.
    pub const PRECISION: &str = "precision";
    /// Maximum number of characters of a text value.
    pub const MAX_LENGTH: &str = "maxLength";
    /// Child specifiers of a container.
    pub const FIELDS: &str = "fields";
}

/// Short name of a value's JSON kind, for error messages.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

fn wrong_shape(key: &str, value: &Value, expected: &str) -> ValidationError {
    ValidationError::invalid_shape(format!("expected {expected}, got {}", kind_name(value)))
        .with_parameter(key)
        .with_value(value.clone())
}

/// Read a mandatory, non-empty string.
pub fn require_string<'a>(map: &'a ConfigMap, key: &str) -> Result<&'a str, ValidationError> {
    match optional_string(map, key)? {
        Some(text) if !text.is_empty() => Ok(text),
        Some(_) => Err(ValidationError::invalid_value("must not be empty")
            .with_parameter(key)
            .with_value(Value::from(""))),
        None => Err(ValidationError::missing(key)),
    }
}

/// Read an optional string; `null` counts as absent.
pub fn optional_string<'a>(
    map: &'a ConfigMap,
    key: &str,
) -> Result<Option<&'a str>, ValidationError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(other) => Err(wrong_shape(key, other, "a string")),
    }
}

/// Read an optional boolean, falling back to `default`.
pub fn optional_bool(map: &ConfigMap, key: &str, default: bool) -> Result<bool, ValidationError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(other) => Err(wrong_shape(key, other, "a boolean")),
    }
}

/// Read an optional nested map.
pub fn optional_map<'a>(
    map: &'a ConfigMap,
    key: &str,
) -> Result<Option<&'a ConfigMap>, ValidationError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(inner)) => Ok(Some(inner)),
        Some(other) => Err(wrong_shape(key, other, "a map")),
    }
}

/// Read an optional list.
pub fn optional_list<'a>(
    map: &'a ConfigMap,
    key: &str,
) -> Result<Option<&'a Vec<Value>>, ValidationError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(other) => Err(wrong_shape(key, other, "a list")),
    }
}

/// Read an optional non-negative integer.
pub fn optional_usize(map: &ConfigMap, key: &str) -> Result<Option<usize>, ValidationError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                ValidationError::invalid_value("must be a non-negative integer")
                    .with_parameter(key)
                    .with_value(Value::Number(number.clone()))
            }),
        Some(other) => Err(wrong_shape(key, other, "a non-negative integer")),
    }
}

/// Interpret a list element as a configuration map.
pub fn as_config_map<'a>(value: &'a Value, key: &str) -> Result<&'a ConfigMap, ValidationError> {
    value
        .as_object()
        .ok_or_else(|| wrong_shape(key, value, "a map"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationErrorKind;
    use serde_json::json;

    fn config(value: Value) -> ConfigMap {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_require_string() {
        let map = config(json!({"identifier": "a", "empty": "", "number": 3}));
        assert_eq!(require_string(&map, "identifier").unwrap(), "a");

        let missing = require_string(&map, "type").unwrap_err();
        assert_eq!(missing.kind(), ValidationErrorKind::MissingValue);
        assert_eq!(missing.parameter(), Some("type"));

        let empty = require_string(&map, "empty").unwrap_err();
        assert_eq!(empty.kind(), ValidationErrorKind::InvalidValue);

        let wrong = require_string(&map, "number").unwrap_err();
        assert_eq!(wrong.kind(), ValidationErrorKind::InvalidShape);
        assert_eq!(wrong.value(), Some(&json!(3)));
    }

    #[test]
    fn test_optional_bool_defaults() {
        let map = config(json!({"enabled": false, "null": null, "bad": "yes"}));
        assert!(!optional_bool(&map, "enabled", true).unwrap());
        assert!(optional_bool(&map, "null", true).unwrap());
        assert!(optional_bool(&map, "absent", true).unwrap());
        assert!(optional_bool(&map, "bad", true).is_err());
    }

    #[test]
    fn test_optional_usize() {
        let map = config(json!({"ok": 12, "negative": -1, "fraction": 1.5}));
        assert_eq!(optional_usize(&map, "ok").unwrap(), Some(12));
        assert_eq!(optional_usize(&map, "absent").unwrap(), None);
        assert!(optional_usize(&map, "negative").is_err());
        assert!(optional_usize(&map, "fraction").is_err());
    }

    #[test]
    fn test_optional_collections() {
        let map = config(json!({"list": [1, 2], "map": {"a": 1}}));
        assert_eq!(optional_list(&map, "list").unwrap().map(Vec::len), Some(2));
        assert!(optional_list(&map, "map").is_err());
        assert!(optional_map(&map, "map").unwrap().is_some());
        assert!(optional_map(&map, "list").is_err());
    }

    #[test]
    fn test_kind_name() {
        assert_eq!(kind_name(&json!(null)), "null");
        assert_eq!(kind_name(&json!([1])), "list");
        assert_eq!(kind_name(&json!({"a": 1})), "map");
    }
}

//! Loading specifier configurations from JSON.
//!
//! A document holds either a list of specifier maps or a single map:
//!
//! ```
//! use megawidget::capability::Capabilities;
//! use megawidget::config;
//! use megawidget::specifier::SpecifierFactory;
//!
//! let text = r#"[
//!     {"identifier": "title", "type": "Label", "label": "Settings"},
//!     {"identifier": "verbose", "type": "CheckBox", "values": true}
//! ]"#;
//! let factory = SpecifierFactory::with_builtin_types();
//! let manager = config::load_specifiers(&factory, text, Capabilities::CONTROL).unwrap();
//! assert_eq!(manager.specifiers().len(), 2);
//! ```

use std::path::Path;

use megawidget_core::value::kind_name;
use megawidget_core::{ConfigMap, SpecificationError, SpecificationErrorKind, Value};

use crate::capability::Capabilities;
use crate::specifier::{SpecifierFactory, SpecifierManager};

fn parse_error(message: impl Into<String>) -> SpecificationError {
    SpecificationError::new(SpecificationErrorKind::InvalidShape, message)
}

/// Parse a JSON document into specifier configurations.
pub fn parse_configs(text: &str) -> Result<Vec<ConfigMap>, SpecificationError> {
    let document: Value = serde_json::from_str(text)
        .map_err(|err| parse_error(format!("malformed specifier document: {err}")))?;
    configs_from_value(document)
}

/// Split an already-parsed document into specifier configurations.
pub fn configs_from_value(document: Value) -> Result<Vec<ConfigMap>, SpecificationError> {
    match document {
        Value::Object(map) => Ok(vec![map]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                other => Err(parse_error(format!(
                    "expected a specifier map, got {}",
                    kind_name(&other)
                ))
                .with_value(other)),
            })
            .collect(),
        other => Err(parse_error(format!(
            "expected a specifier map or a list of them, got {}",
            kind_name(&other)
        ))
        .with_value(other)),
    }
}

/// Read and parse a JSON file of specifier configurations.
pub fn read_configs(path: impl AsRef<Path>) -> Result<Vec<ConfigMap>, SpecificationError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|err| parse_error(format!("cannot read {}: {err}", path.display())))?;
    parse_configs(&text)
}

/// Parse a JSON document and build its specifier forest.
pub fn load_specifiers(
    factory: &SpecifierFactory,
    text: &str,
    required: Capabilities,
) -> Result<SpecifierManager, SpecificationError> {
    SpecifierManager::new(factory, &parse_configs(text)?, required)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_map() {
        let configs = parse_configs(r#"{"identifier": "a", "type": "Label"}"#).unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0]["identifier"], "a");
    }

    #[test]
    fn test_list_with_non_map() {
        let err = parse_configs(r#"[{"identifier": "a", "type": "Label"}, 3]"#).unwrap_err();
        assert_eq!(err.kind(), SpecificationErrorKind::InvalidShape);
        assert_eq!(err.value(), Some(&Value::from(3)));
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_configs("[{").unwrap_err();
        assert_eq!(err.kind(), SpecificationErrorKind::InvalidShape);
        assert!(err.message().contains("malformed"));
    }

    #[test]
    fn test_scalar_document() {
        let err = parse_configs("\"Label\"").unwrap_err();
        assert_eq!(err.kind(), SpecificationErrorKind::InvalidShape);
    }

    #[test]
    fn test_missing_file() {
        let err = read_configs("/nonexistent/specifiers.json").unwrap_err();
        assert!(err.message().contains("cannot read"));
    }
}

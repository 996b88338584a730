//! Text and flag validation.

use megawidget_core::value::{self, keys, kind_name};
use megawidget_core::{ConfigMap, Value, ValidationError};

use super::StateValidator;

/// Validator for string values with an optional maximum length.
///
/// Like a line edit with a max length, overlong input is truncated rather
/// than rejected. Lengths count characters, not bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextValidator {
    max_length: Option<usize>,
}

impl TextValidator {
    /// Create a validator; `None` means unlimited.
    pub fn new(max_length: Option<usize>) -> Self {
        Self { max_length }
    }

    /// Build from the optional `maxLength` key.
    pub fn from_config(config: &ConfigMap) -> Result<Self, ValidationError> {
        let max_length = value::optional_usize(config, keys::MAX_LENGTH)?;
        if max_length == Some(0) {
            return Err(ValidationError::invalid_value("must be greater than zero")
                .with_parameter(keys::MAX_LENGTH)
                .with_value(Value::from(0)));
        }
        Ok(Self::new(max_length))
    }

    /// The maximum length, if any.
    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    fn truncate(&self, text: &str) -> String {
        match self.max_length {
            Some(max) => text.chars().take(max).collect(),
            None => text.to_owned(),
        }
    }
}

impl StateValidator for TextValidator {
    type State = String;

    fn convert(&self, value: &Value) -> Result<String, ValidationError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::String(text) => Ok(self.truncate(text)),
            other => Err(ValidationError::invalid_shape(format!(
                "expected a string, got {}",
                kind_name(other)
            ))
            .with_value(other.clone())),
        }
    }

    fn to_value(&self, state: &String) -> Value {
        Value::String(state.clone())
    }

    fn default_state(&self) -> String {
        String::new()
    }

    fn prune_to_state_value(&self, state: &String) -> String {
        self.truncate(state)
    }
}

/// Validator for boolean flags; `null` reads as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BooleanValidator;

impl StateValidator for BooleanValidator {
    type State = bool;

    fn convert(&self, value: &Value) -> Result<bool, ValidationError> {
        match value {
            Value::Null => Ok(false),
            Value::Bool(flag) => Ok(*flag),
            other => Err(ValidationError::invalid_shape(format!(
                "expected a boolean, got {}",
                kind_name(other)
            ))
            .with_value(other.clone())),
        }
    }

    fn to_value(&self, state: &bool) -> Value {
        Value::Bool(*state)
    }

    fn default_state(&self) -> bool {
        false
    }

    fn prune_to_state_value(&self, state: &bool) -> bool {
        *state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use megawidget_core::ValidationErrorKind;
    use serde_json::json;

    #[test]
    fn test_text_truncation_counts_characters() {
        let validator = TextValidator::new(Some(3));
        assert_eq!(validator.convert(&json!("héllo")).unwrap(), "hél");
        assert_eq!(validator.convert(&json!("ab")).unwrap(), "ab");
        assert_eq!(validator.convert(&json!(null)).unwrap(), "");
        assert_eq!(
            validator.convert(&json!(12)).unwrap_err().kind(),
            ValidationErrorKind::InvalidShape
        );
    }

    #[test]
    fn test_text_from_config() {
        let config = json!({"maxLength": 0}).as_object().cloned().unwrap();
        assert!(TextValidator::from_config(&config).is_err());
        let config = json!({}).as_object().cloned().unwrap();
        assert_eq!(TextValidator::from_config(&config).unwrap().max_length(), None);
    }

    #[test]
    fn test_boolean_validator() {
        assert!(BooleanValidator.convert(&json!(true)).unwrap());
        assert!(!BooleanValidator.convert(&json!(null)).unwrap());
        assert!(BooleanValidator.convert(&json!("true")).is_err());
    }
}

//! Numeric range validation.

use std::fmt;

use megawidget_core::value::{keys, kind_name};
use megawidget_core::{ConfigMap, Value, ValidationError, ValidationErrorKind};

use super::StateValidator;

/// A number type usable as bounded state.
pub trait BoundedNumber:
    Copy + PartialOrd + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Description used in shape errors.
    const DESCRIPTION: &'static str;

    /// Read a number from a value.
    fn from_value(value: &Value) -> Option<Self>;

    /// The untyped form of a number.
    fn into_value(self) -> Value;

    /// Default increment.
    fn unit() -> Self;

    /// Whether the number is greater than zero.
    fn is_positive(self) -> bool;

    /// Round to `precision` fractional digits.
    fn round_to(self, _precision: u32) -> Self {
        self
    }
}

impl BoundedNumber for i64 {
    const DESCRIPTION: &'static str = "an integer";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64().or_else(|| {
            value
                .as_f64()
                .filter(|n| n.fract() == 0.0 && n.abs() < 9.0e15)
                .map(|n| n as i64)
        })
    }

    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn unit() -> Self {
        1
    }

    fn is_positive(self) -> bool {
        self > 0
    }
}

impl BoundedNumber for f64 {
    const DESCRIPTION: &'static str = "a number";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64().filter(|n| n.is_finite())
    }

    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn unit() -> Self {
        1.0
    }

    fn is_positive(self) -> bool {
        self > 0.0
    }

    fn round_to(self, precision: u32) -> Self {
        let scale = 10f64.powi(precision as i32);
        (self * scale).round() / scale
    }
}

/// Maximum number of fractional digits a fraction spinner keeps.
pub const MAX_PRECISION: u32 = 10;

/// Default number of fractional digits.
pub const DEFAULT_PRECISION: u32 = 1;

/// Validator for numbers within `[minimum, maximum]`.
///
/// Values outside the range are clamped rather than rejected, and
/// fractional values are rounded to the configured precision. Controls
/// with several states additionally require them to be non-decreasing.
///
/// # Example
///
/// ```
/// use megawidget::validator::{BoundedNumberValidator, StateValidator};
/// use serde_json::json;
///
/// let validator = BoundedNumberValidator::<i64>::new(0, 10).unwrap();
/// assert_eq!(validator.convert(&json!(15)).unwrap(), 10);
/// assert_eq!(validator.convert(&json!(-3)).unwrap(), 0);
/// assert!(validator.convert(&json!("five")).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedNumberValidator<N: BoundedNumber> {
    minimum: N,
    maximum: N,
    increment_delta: N,
    precision: u32,
}

impl<N: BoundedNumber> BoundedNumberValidator<N> {
    /// Create a validator for the given range.
    pub fn new(minimum: N, maximum: N) -> Result<Self, ValidationError> {
        check_range(minimum, maximum)?;
        Ok(Self {
            minimum,
            maximum,
            increment_delta: N::unit(),
            precision: DEFAULT_PRECISION,
        })
    }

    /// Build from `minValue`, `maxValue`, `incrementDelta` and `precision`.
    pub fn from_config(config: &ConfigMap) -> Result<Self, ValidationError> {
        let minimum = require_number::<N>(config, keys::MIN_VALUE)?;
        let maximum = require_number::<N>(config, keys::MAX_VALUE)?;
        let mut validator = Self::new(minimum, maximum)?;
        if let Some(delta) = optional_number::<N>(config, keys::INCREMENT_DELTA)? {
            validator.set_increment_delta(delta)?;
        }
        if let Some(precision) = megawidget_core::value::optional_usize(config, keys::PRECISION)? {
            validator.set_precision(precision)?;
        }
        Ok(validator)
    }

    /// Get the minimum value.
    pub fn minimum(&self) -> N {
        self.minimum
    }

    /// Get the maximum value.
    pub fn maximum(&self) -> N {
        self.maximum
    }

    /// Get the increment delta.
    pub fn increment_delta(&self) -> N {
        self.increment_delta
    }

    /// Get the precision.
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Set both bounds at once.
    pub fn set_bounds(&mut self, minimum: N, maximum: N) -> Result<(), ValidationError> {
        check_range(minimum, maximum)?;
        self.minimum = minimum;
        self.maximum = maximum;
        Ok(())
    }

    /// Set the increment delta; it must be positive.
    pub fn set_increment_delta(&mut self, delta: N) -> Result<(), ValidationError> {
        if !delta.is_positive() {
            return Err(ValidationError::invalid_value("must be greater than zero")
                .with_parameter(keys::INCREMENT_DELTA)
                .with_value(delta.into_value()));
        }
        self.increment_delta = delta;
        Ok(())
    }

    /// Set the number of fractional digits kept.
    pub fn set_precision(&mut self, precision: usize) -> Result<(), ValidationError> {
        match u32::try_from(precision) {
            Ok(precision) if precision <= MAX_PRECISION => {
                self.precision = precision;
                Ok(())
            }
            _ => Err(
                ValidationError::invalid_value(format!("must be at most {MAX_PRECISION}"))
                    .with_parameter(keys::PRECISION)
                    .with_value(Value::from(precision)),
            ),
        }
    }

    /// Read a number value, reporting `parameter` on failure.
    pub fn read(&self, value: &Value, parameter: &str) -> Result<N, ValidationError> {
        N::from_value(value).ok_or_else(|| shape_error::<N>(value).with_parameter(parameter))
    }

    fn clamp(&self, value: N) -> N {
        let value = value.round_to(self.precision);
        if value < self.minimum {
            self.minimum
        } else if value > self.maximum {
            self.maximum
        } else {
            value
        }
    }
}

fn check_range<N: BoundedNumber>(minimum: N, maximum: N) -> Result<(), ValidationError> {
    if minimum > maximum {
        return Err(ValidationError::invalid_value(format!(
            "minimum {minimum} exceeds maximum {maximum}"
        ))
        .with_parameter(keys::MIN_VALUE)
        .with_value(minimum.into_value()));
    }
    Ok(())
}

fn shape_error<N: BoundedNumber>(value: &Value) -> ValidationError {
    ValidationError::invalid_shape(format!("expected {}, got {}", N::DESCRIPTION, kind_name(value)))
        .with_value(value.clone())
}

fn optional_number<N: BoundedNumber>(
    config: &ConfigMap,
    key: &str,
) -> Result<Option<N>, ValidationError> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => N::from_value(value)
            .map(Some)
            .ok_or_else(|| shape_error::<N>(value).with_parameter(key)),
    }
}

fn require_number<N: BoundedNumber>(config: &ConfigMap, key: &str) -> Result<N, ValidationError> {
    optional_number(config, key)?.ok_or_else(|| ValidationError::missing(key))
}

impl<N: BoundedNumber> StateValidator for BoundedNumberValidator<N> {
    type State = N;

    fn convert(&self, value: &Value) -> Result<N, ValidationError> {
        N::from_value(value)
            .map(|number| self.clamp(number))
            .ok_or_else(|| shape_error::<N>(value))
    }

    fn to_value(&self, state: &N) -> Value {
        state.into_value()
    }

    fn default_state(&self) -> N {
        self.minimum
    }

    fn default_state_for(&self, index: usize, count: usize) -> N {
        if count > 1 && index + 1 == count {
            self.maximum
        } else {
            self.minimum
        }
    }

    fn prune_to_state_value(&self, state: &N) -> N {
        self.clamp(*state)
    }

    fn validate_jointly(&self, states: &[N]) -> Result<(), ValidationError> {
        match states.windows(2).find(|pair| pair[0] > pair[1]) {
            Some(pair) => Err(ValidationError::new(
                ValidationErrorKind::Interdependency,
                format!("{} must not exceed {}", pair[0], pair[1]),
            )
            .with_value(Value::Array(states.iter().map(|n| n.into_value()).collect()))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: Value) -> ConfigMap {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_integer_clamping() {
        let validator = BoundedNumberValidator::<i64>::new(-5, 5).unwrap();
        assert_eq!(validator.convert(&json!(3)).unwrap(), 3);
        assert_eq!(validator.convert(&json!(30)).unwrap(), 5);
        assert_eq!(validator.convert(&json!(-30)).unwrap(), -5);
        assert_eq!(validator.convert(&json!(2.0)).unwrap(), 2);
        assert!(validator.convert(&json!(2.5)).is_err());
        assert!(validator.convert(&json!(null)).is_err());
    }

    #[test]
    fn test_fraction_rounding() {
        let mut validator = BoundedNumberValidator::<f64>::new(0.0, 1.0).unwrap();
        validator.set_precision(2).unwrap();
        assert_eq!(validator.convert(&json!(0.1234)).unwrap(), 0.12);
        assert_eq!(validator.convert(&json!(1.5)).unwrap(), 1.0);
        assert!(validator.set_precision(11).is_err());
    }

    #[test]
    fn test_from_config() {
        let validator = BoundedNumberValidator::<i64>::from_config(&config(
            json!({"minValue": 1, "maxValue": 9, "incrementDelta": 2}),
        ))
        .unwrap();
        assert_eq!(validator.minimum(), 1);
        assert_eq!(validator.maximum(), 9);
        assert_eq!(validator.increment_delta(), 2);

        let missing =
            BoundedNumberValidator::<i64>::from_config(&config(json!({"minValue": 1}))).unwrap_err();
        assert_eq!(missing.kind(), ValidationErrorKind::MissingValue);
        assert_eq!(missing.parameter(), Some("maxValue"));

        let inverted = BoundedNumberValidator::<i64>::from_config(&config(
            json!({"minValue": 10, "maxValue": 1}),
        ))
        .unwrap_err();
        assert_eq!(inverted.kind(), ValidationErrorKind::InvalidValue);

        let bad_delta = BoundedNumberValidator::<f64>::from_config(&config(
            json!({"minValue": 0, "maxValue": 1, "incrementDelta": 0}),
        ))
        .unwrap_err();
        assert_eq!(bad_delta.parameter(), Some("incrementDelta"));
    }

    #[test]
    fn test_set_bounds_rejects_inverted_range() {
        let mut validator = BoundedNumberValidator::<i64>::new(0, 5).unwrap();
        assert!(validator.set_bounds(6, 5).is_err());
        assert_eq!((validator.minimum(), validator.maximum()), (0, 5));
        validator.set_bounds(-1, 10).unwrap();
        assert_eq!(validator.prune_to_state_value(&20), 10);
    }

    #[test]
    fn test_defaults_for_ranges() {
        let validator = BoundedNumberValidator::<i64>::new(0, 100).unwrap();
        assert_eq!(validator.default_state_for(0, 1), 0);
        assert_eq!(validator.default_state_for(0, 2), 0);
        assert_eq!(validator.default_state_for(1, 2), 100);
    }

    #[test]
    fn test_joint_validation() {
        let validator = BoundedNumberValidator::<i64>::new(0, 100).unwrap();
        assert!(validator.validate_jointly(&[10, 10, 20]).is_ok());
        let err = validator.validate_jointly(&[50, 40]).unwrap_err();
        assert_eq!(err.kind(), ValidationErrorKind::Interdependency);
    }
}

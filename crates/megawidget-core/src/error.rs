//! Error types for megawidgets.
//!
//! Two families exist. Specification errors describe malformed configuration
//! and are raised once, while a specifier is being built. Property and state
//! errors are raised at runtime when a value handed to an already-built
//! megawidget is rejected. Both carry the same [`Diagnostic`] so callers can
//! report the offending identifier, type, parameter and value uniformly.

use std::fmt;

use crate::value::Value;

/// Diagnostic payload shared by every megawidget error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostic {
    /// Identifier of the offending specifier or megawidget, if known.
    pub identifier: Option<String>,
    /// Type name of the offending specifier or megawidget, if known.
    pub type_name: Option<String>,
    /// Name of the offending parameter, property or state identifier.
    pub parameter: Option<String>,
    /// The offending value.
    pub value: Option<Value>,
    /// Human-readable description of the problem.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic holding only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.type_name, &self.identifier) {
            (Some(type_name), Some(identifier)) => write!(f, "{type_name} \"{identifier}\"")?,
            (None, Some(identifier)) => write!(f, "megawidget \"{identifier}\"")?,
            (Some(type_name), None) => write!(f, "{type_name} (unidentified)")?,
            (None, None) => write!(f, "megawidget")?,
        }
        if let Some(parameter) = &self.parameter {
            write!(f, ": parameter \"{parameter}\"")?;
        }
        if let Some(value) = &self.value {
            write!(f, " (value {value})")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Generates the builder-style context setters shared by the error structs.
macro_rules! diagnostic_accessors {
    ($ty:ty) => {
        impl $ty {
            /// Attach the identifier of the offending megawidget.
            pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
                self.diagnostic.identifier = Some(identifier.into());
                self
            }

            /// Attach the type name of the offending megawidget.
            pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
                self.diagnostic.type_name = Some(type_name.into());
                self
            }

            /// Attach the name of the offending parameter.
            pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
                self.diagnostic.parameter = Some(parameter.into());
                self
            }

            /// Attach the offending value.
            pub fn with_value(mut self, value: Value) -> Self {
                self.diagnostic.value = Some(value);
                self
            }

            /// Fill in identifier and type name where they are still unknown.
            pub fn in_context(mut self, identifier: Option<&str>, type_name: Option<&str>) -> Self {
                if self.diagnostic.identifier.is_none() {
                    self.diagnostic.identifier = identifier.map(str::to_owned);
                }
                if self.diagnostic.type_name.is_none() {
                    self.diagnostic.type_name = type_name.map(str::to_owned);
                }
                self
            }

            /// The full diagnostic.
            pub fn diagnostic(&self) -> &Diagnostic {
                &self.diagnostic
            }

            /// Identifier of the offending megawidget, if known.
            pub fn identifier(&self) -> Option<&str> {
                self.diagnostic.identifier.as_deref()
            }

            /// Type name of the offending megawidget, if known.
            pub fn type_name(&self) -> Option<&str> {
                self.diagnostic.type_name.as_deref()
            }

            /// Name of the offending parameter, if known.
            pub fn parameter(&self) -> Option<&str> {
                self.diagnostic.parameter.as_deref()
            }

            /// The offending value, if known.
            pub fn value(&self) -> Option<&Value> {
                self.diagnostic.value.as_ref()
            }

            /// Human-readable description of the problem.
            pub fn message(&self) -> &str {
                &self.diagnostic.message
            }
        }
    };
}

/// What a validator objected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    /// The value has the right shape but is out of range or not allowed.
    InvalidValue,
    /// The value does not have the expected shape.
    InvalidShape,
    /// Two sibling entries share one identifier.
    DuplicateIdentifier,
    /// A required value is absent.
    MissingValue,
    /// Several values are individually acceptable but jointly invalid.
    Interdependency,
}

/// Rejection produced by a validator, before megawidget context is known.
///
/// Validators do not know which specifier or megawidget they belong to, so
/// this error is converted into a [`SpecificationError`], [`PropertyError`]
/// or [`StateError`] by the caller, which adds that context.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{diagnostic}")]
pub struct ValidationError {
    kind: ValidationErrorKind,
    diagnostic: Diagnostic,
}

impl ValidationError {
    /// Create a validation error of the given kind.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            diagnostic: Diagnostic::new(message),
        }
    }

    /// Shorthand for an [`ValidationErrorKind::InvalidValue`] error.
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::InvalidValue, message)
    }

    /// Shorthand for an [`ValidationErrorKind::InvalidShape`] error.
    pub fn invalid_shape(message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::InvalidShape, message)
    }

    /// Shorthand for a [`ValidationErrorKind::MissingValue`] error.
    pub fn missing(parameter: impl Into<String>) -> Self {
        let parameter = parameter.into();
        Self::new(ValidationErrorKind::MissingValue, "required value is missing")
            .with_parameter(parameter)
    }

    /// The kind of rejection.
    pub fn kind(&self) -> ValidationErrorKind {
        self.kind
    }

    /// Convert into a specification error raised while building a specifier.
    pub fn into_specification(self) -> SpecificationError {
        let kind = match self.kind {
            ValidationErrorKind::InvalidValue | ValidationErrorKind::Interdependency => {
                SpecificationErrorKind::InvalidValue
            }
            ValidationErrorKind::InvalidShape => SpecificationErrorKind::InvalidShape,
            ValidationErrorKind::DuplicateIdentifier => SpecificationErrorKind::DuplicateIdentifier,
            ValidationErrorKind::MissingValue => SpecificationErrorKind::MissingParameter,
        };
        SpecificationError {
            kind,
            diagnostic: self.diagnostic,
            cause: None,
        }
    }

    /// Convert into a property error raised while setting `property`.
    pub fn into_property(self, property: &str) -> PropertyError {
        let kind = match self.kind {
            ValidationErrorKind::InvalidShape => PropertyErrorKind::InvalidShape,
            ValidationErrorKind::DuplicateIdentifier => PropertyErrorKind::DuplicateIdentifier,
            _ => PropertyErrorKind::InvalidValue,
        };
        let mut diagnostic = self.diagnostic;
        if diagnostic.parameter.is_none() {
            diagnostic.parameter = Some(property.to_owned());
        }
        PropertyError { kind, diagnostic }
    }

    /// Convert into a state error raised while changing `state_identifier`.
    pub fn into_state(self, state_identifier: &str) -> StateError {
        let kind = match self.kind {
            ValidationErrorKind::Interdependency => StateErrorKind::InterdependencyConflict,
            _ => StateErrorKind::InvalidValue,
        };
        let mut diagnostic = self.diagnostic;
        if diagnostic.parameter.is_none() {
            diagnostic.parameter = Some(state_identifier.to_owned());
        }
        StateError { kind, diagnostic }
    }
}

diagnostic_accessors!(ValidationError);

/// Why a specifier could not be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecificationErrorKind {
    /// A mandatory configuration key is absent.
    MissingParameter,
    /// A configuration value is out of range or not allowed.
    InvalidValue,
    /// A configuration value does not have the expected shape.
    InvalidShape,
    /// An identifier is used more than once.
    DuplicateIdentifier,
    /// The `type` key names no registered implementation.
    UnknownType,
    /// The resolved implementation lacks a required capability.
    WrongCapability,
    /// A child specifier could not be built; see the cause.
    InvalidChild,
}

/// Malformed configuration, detected while building a specifier.
///
/// Specification errors abort construction of the offending specifier and
/// every specifier above it; there is no partial construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{diagnostic}")]
pub struct SpecificationError {
    kind: SpecificationErrorKind,
    diagnostic: Diagnostic,
    #[source]
    cause: Option<Box<SpecificationError>>,
}

impl SpecificationError {
    /// Create a specification error of the given kind.
    pub fn new(kind: SpecificationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            diagnostic: Diagnostic::new(message),
            cause: None,
        }
    }

    /// Chain an inner cause.
    pub fn with_cause(mut self, cause: SpecificationError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// The kind of failure.
    pub fn kind(&self) -> SpecificationErrorKind {
        self.kind
    }

    /// The chained inner cause, if any.
    pub fn cause(&self) -> Option<&SpecificationError> {
        self.cause.as_deref()
    }

    /// The innermost error of the cause chain.
    pub fn root_cause(&self) -> &SpecificationError {
        let mut current = self;
        while let Some(cause) = current.cause() {
            current = cause;
        }
        current
    }
}

diagnostic_accessors!(SpecificationError);

impl From<ValidationError> for SpecificationError {
    fn from(err: ValidationError) -> Self {
        err.into_specification()
    }
}

/// Why a mutable property could not be read or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyErrorKind {
    /// The megawidget has no mutable property by that name.
    NotFound,
    /// The value is out of range or not allowed.
    InvalidValue,
    /// The value does not have the expected shape.
    InvalidShape,
    /// The value repeats an identifier that must be unique.
    DuplicateIdentifier,
}

/// A rejected mutable-property access on a built megawidget.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{diagnostic}")]
pub struct PropertyError {
    kind: PropertyErrorKind,
    diagnostic: Diagnostic,
}

impl PropertyError {
    /// Create a property error of the given kind.
    pub fn new(kind: PropertyErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            diagnostic: Diagnostic::new(message),
        }
    }

    /// A property-not-found error for `name`.
    pub fn not_found(name: &str) -> Self {
        Self::new(PropertyErrorKind::NotFound, "no such mutable property").with_parameter(name)
    }

    /// The kind of failure.
    pub fn kind(&self) -> PropertyErrorKind {
        self.kind
    }
}

diagnostic_accessors!(PropertyError);

/// Why a state access was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateErrorKind {
    /// The identifier is not one of the megawidget's state identifiers.
    UnknownIdentifier,
    /// The validator rejected the value.
    InvalidValue,
    /// A committed set of staged values is jointly invalid.
    InterdependencyConflict,
}

/// A rejected state access on a built megawidget.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{diagnostic}")]
pub struct StateError {
    kind: StateErrorKind,
    diagnostic: Diagnostic,
}

impl StateError {
    /// Create a state error of the given kind.
    pub fn new(kind: StateErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            diagnostic: Diagnostic::new(message),
        }
    }

    /// An unknown-state-identifier error for `identifier`.
    pub fn unknown_identifier(identifier: &str) -> Self {
        Self::new(StateErrorKind::UnknownIdentifier, "not a state identifier of this megawidget")
            .with_parameter(identifier)
    }

    /// Convert into a property error raised while setting `property`.
    ///
    /// The state identifier, if known, stays the offending parameter.
    pub fn into_property(self, property: &str) -> PropertyError {
        let mut diagnostic = self.diagnostic;
        if diagnostic.parameter.is_none() {
            diagnostic.parameter = Some(property.to_owned());
        }
        PropertyError {
            kind: PropertyErrorKind::InvalidValue,
            diagnostic,
        }
    }

    /// The kind of failure.
    pub fn kind(&self) -> StateErrorKind {
        self.kind
    }
}

diagnostic_accessors!(StateError);

/// The main error type for megawidget operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MegawidgetError {
    /// Configuration was malformed.
    #[error(transparent)]
    Specification(#[from] SpecificationError),
    /// A mutable property access was rejected.
    #[error(transparent)]
    Property(#[from] PropertyError),
    /// A state access was rejected.
    #[error(transparent)]
    State(#[from] StateError),
}

impl MegawidgetError {
    /// The shared diagnostic of whichever family this error belongs to.
    pub fn diagnostic(&self) -> &Diagnostic {
        match self {
            Self::Specification(err) => err.diagnostic(),
            Self::Property(err) => err.diagnostic(),
            Self::State(err) => err.diagnostic(),
        }
    }

    /// The property error kind, if this is a property error.
    pub fn property_kind(&self) -> Option<PropertyErrorKind> {
        match self {
            Self::Property(err) => Some(err.kind()),
            _ => None,
        }
    }

    /// The state error kind, if this is a state error.
    pub fn state_kind(&self) -> Option<StateErrorKind> {
        match self {
            Self::State(err) => Some(err.kind()),
            _ => None,
        }
    }
}

/// A specialized Result type for megawidget operations.
pub type Result<T> = std::result::Result<T, MegawidgetError>;

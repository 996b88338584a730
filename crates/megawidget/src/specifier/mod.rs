//! Specifiers.
//!
//! A specifier is the immutable, validated description of one megawidget,
//! built once from a configuration map. Specifiers form a tree: container
//! specifiers own child specifiers, every one of which must provide a
//! declared set of [`Capabilities`].
//!
//! # Specifier Pipeline
//!
//! ```text
//! ConfigMap ──▶ SpecifierFactory ──▶ constructor ──▶ Arc<dyn Specifier>
//!                 (type lookup,        (validators,
//!                  capability check)    children)
//!
//! [ConfigMap] ──▶ SpecifierManager ──▶ forest + global uniqueness
//!                                      + starting-state correction
//! ```

mod children;
mod factory;
mod manager;
mod stateful;

use std::fmt;
use std::sync::Arc;

use megawidget_core::value::{self, keys};
use megawidget_core::{ConfigMap, SpecificationError, StateMap, ValidationError};

use crate::capability::Capabilities;
use crate::runtime::{CreationParams, Megawidget};

pub use children::{check_unique_identifiers, for_each_specifier, ChildSpecifiersManager};
pub use factory::{RegistryEntry, SpecifierConstructor, SpecifierFactory, SpecifierRegistry};
pub use manager::{SpecifierManager, SpecifierTreeNode};
pub use stateful::StatefulBase;

/// The base trait for all specifiers.
pub trait Specifier: fmt::Debug + Send + Sync {
    /// Get the base fields.
    fn specifier_base(&self) -> &SpecifierBase;

    /// The capabilities this specifier provides.
    fn capabilities(&self) -> Capabilities;

    /// Names of the mutable properties of megawidgets built from this specifier.
    fn mutable_property_names(&self) -> &'static [&'static str];

    /// Instantiate a runtime megawidget.
    fn create_megawidget(
        &self,
        params: &CreationParams,
    ) -> Result<Arc<dyn Megawidget>, SpecificationError>;

    /// The identifier.
    fn identifier(&self) -> &str {
        self.specifier_base().identifier()
    }

    /// The type name.
    fn type_name(&self) -> &str {
        self.specifier_base().type_name()
    }

    /// Whether megawidgets start enabled.
    fn is_enabled(&self) -> bool {
        self.specifier_base().is_enabled()
    }

    /// Whether megawidgets start editable.
    fn is_editable(&self) -> bool {
        self.specifier_base().is_editable()
    }

    /// The label, if any.
    fn label(&self) -> Option<&str> {
        self.specifier_base().label()
    }

    /// The opaque caller data.
    fn extra_data(&self) -> &ConfigMap {
        self.specifier_base().extra_data()
    }

    /// View as a stateful specifier.
    fn as_stateful(&self) -> Option<&dyn StatefulSpecifier> {
        None
    }

    /// View as a container specifier.
    fn as_container(&self) -> Option<&dyn ContainerSpecifier> {
        None
    }
}

/// A specifier of megawidgets that own state.
pub trait StatefulSpecifier: Specifier {
    /// The state identifiers, in order.
    fn state_identifiers(&self) -> &[String];

    /// The configured starting values, with defaults for unconfigured ones.
    fn starting_states(&self) -> StateMap;

    /// Ensure `states` holds a valid value for every state identifier.
    ///
    /// Valid entries are canonicalized; missing or invalid entries are
    /// replaced with the starting values.
    fn validate_and_correct_states(&self, states: &mut StateMap);
}

/// A specifier owning child specifiers.
pub trait ContainerSpecifier: Specifier {
    /// The children, in order.
    fn child_specifiers(&self) -> &[Arc<dyn Specifier>];
}

/// Fields common to every specifier.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecifierBase {
    identifier: String,
    type_name: String,
    enabled: bool,
    editable: bool,
    label: Option<String>,
    extra_data: ConfigMap,
}

impl SpecifierBase {
    /// Read the common keys of a configuration.
    pub fn from_config(config: &ConfigMap) -> Result<Self, SpecificationError> {
        let known_identifier = value::optional_string(config, keys::IDENTIFIER).ok().flatten();
        let known_type = value::optional_string(config, keys::TYPE).ok().flatten();
        let context = |err: ValidationError| {
            err.into_specification()
                .in_context(known_identifier, known_type)
        };

        let identifier = value::require_string(config, keys::IDENTIFIER).map_err(context)?;
        let type_name = value::require_string(config, keys::TYPE).map_err(context)?;
        Ok(Self {
            identifier: identifier.to_owned(),
            type_name: type_name.to_owned(),
            enabled: value::optional_bool(config, keys::ENABLED, true).map_err(context)?,
            editable: value::optional_bool(config, keys::EDITABLE, true).map_err(context)?,
            label: value::optional_string(config, keys::LABEL)
                .map_err(context)?
                .map(str::to_owned),
            extra_data: value::optional_map(config, keys::EXTRA_DATA)
                .map_err(context)?
                .cloned()
                .unwrap_or_default(),
        })
    }

    /// The identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Whether megawidgets start enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether megawidgets start editable.
    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// The label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The opaque caller data.
    pub fn extra_data(&self) -> &ConfigMap {
        &self.extra_data
    }

    /// Attach this specifier's identifier and type to an error.
    pub fn contextualize(&self, err: impl Into<SpecificationError>) -> SpecificationError {
        err.into()
            .in_context(Some(&self.identifier), Some(&self.type_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use megawidget_core::SpecificationErrorKind;
    use serde_json::json;

    fn config(value: serde_json::Value) -> ConfigMap {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_base_from_config() {
        let base = SpecifierBase::from_config(&config(json!({
            "identifier": "name",
            "type": "Text",
            "enabled": false,
            "label": "Name:",
            "extraData": {"column": 2},
            "unknownKey": [1, 2, 3]
        })))
        .unwrap();
        assert_eq!(base.identifier(), "name");
        assert_eq!(base.type_name(), "Text");
        assert!(!base.is_enabled());
        assert!(base.is_editable());
        assert_eq!(base.label(), Some("Name:"));
        assert_eq!(base.extra_data().get("column"), Some(&json!(2)));
    }

    #[test]
    fn test_base_missing_identifier() {
        let err = SpecifierBase::from_config(&config(json!({"type": "Text"}))).unwrap_err();
        assert_eq!(err.kind(), SpecificationErrorKind::MissingParameter);
        assert_eq!(err.parameter(), Some("identifier"));
        assert_eq!(err.type_name(), Some("Text"));
    }

    #[test]
    fn test_base_bad_shape_carries_context() {
        let err = SpecifierBase::from_config(&config(json!({
            "identifier": "flag",
            "type": "CheckBox",
            "enabled": "yes"
        })))
        .unwrap_err();
        assert_eq!(err.kind(), SpecificationErrorKind::InvalidShape);
        assert_eq!(err.identifier(), Some("flag"));
        assert_eq!(err.parameter(), Some("enabled"));
        assert_eq!(err.value(), Some(&json!("yes")));
    }
}

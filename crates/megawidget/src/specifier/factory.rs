//! Type resolution and specifier construction.
//!
//! The `type` key of a configuration map names the specifier
//! implementation. [`SpecifierRegistry`] maps implementation names, formed
//! as `<type>Specifier`, to constructor functions; it is the only place
//! dynamic type resolution happens. [`SpecifierFactory`] reads the type,
//! resolves it, checks capabilities and runs the constructor, normalizing
//! every failure into a [`SpecificationError`].
//!
//! # Example
//!
//! ```
//! use megawidget::capability::Capabilities;
//! use megawidget::specifier::SpecifierFactory;
//! use serde_json::json;
//!
//! let factory = SpecifierFactory::with_builtin_types();
//! let config = json!({"identifier": "name", "type": "Text", "maxLength": 8});
//! let specifier = factory
//!     .create_specifier(Capabilities::STATEFUL, config.as_object().unwrap())
//!     .unwrap();
//! assert_eq!(specifier.identifier(), "name");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use megawidget_core::logging::targets;
use megawidget_core::value::{self, keys};
use megawidget_core::{ConfigMap, SpecificationError, SpecificationErrorKind, Value};

use super::Specifier;
use crate::capability::Capabilities;

/// Builds a specifier from its configuration.
///
/// The factory is passed along so containers can build their children.
pub type SpecifierConstructor =
    fn(&ConfigMap, &SpecifierFactory) -> Result<Arc<dyn Specifier>, SpecificationError>;

/// A registered specifier implementation.
#[derive(Debug, Clone, Copy)]
pub struct RegistryEntry {
    /// Capabilities every specifier built by `constructor` provides.
    pub capabilities: Capabilities,
    /// The constructor.
    pub constructor: SpecifierConstructor,
}

/// Maps implementation names to constructors.
#[derive(Debug, Clone, Default)]
pub struct SpecifierRegistry {
    entries: HashMap<String, RegistryEntry>,
}

impl SpecifierRegistry {
    /// Suffix appended to a type name to form the implementation name.
    pub const IMPLEMENTATION_SUFFIX: &'static str = "Specifier";

    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in megawidget types.
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::new();
        crate::widgets::register_builtin_types(&mut registry);
        registry
    }

    /// The implementation name for a type name.
    pub fn implementation_name(type_name: &str) -> String {
        format!("{type_name}{}", Self::IMPLEMENTATION_SUFFIX)
    }

    /// Register the implementation of `type_name`.
    ///
    /// Returns the entry it replaced, if any.
    pub fn register(
        &mut self,
        type_name: &str,
        capabilities: Capabilities,
        constructor: SpecifierConstructor,
    ) -> Option<RegistryEntry> {
        tracing::trace!(target: targets::FACTORY, type_name, "registering specifier type");
        self.entries.insert(
            Self::implementation_name(type_name),
            RegistryEntry {
                capabilities: capabilities | Capabilities::MEGAWIDGET,
                constructor,
            },
        )
    }

    /// Look up the implementation of `type_name`.
    pub fn resolve(&self, type_name: &str) -> Option<&RegistryEntry> {
        self.entries.get(&Self::implementation_name(type_name))
    }

    /// Whether `type_name` is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.resolve(type_name).is_some()
    }

    /// The registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .entries
            .keys()
            .filter_map(|name| name.strip_suffix(Self::IMPLEMENTATION_SUFFIX))
            .collect();
        names.sort_unstable();
        names
    }
}

/// Creates specifiers from configuration maps.
#[derive(Debug, Clone, Default)]
pub struct SpecifierFactory {
    registry: SpecifierRegistry,
}

impl SpecifierFactory {
    /// Create a factory resolving types through `registry`.
    pub fn new(registry: SpecifierRegistry) -> Self {
        Self { registry }
    }

    /// Create a factory for the built-in megawidget types.
    pub fn with_builtin_types() -> Self {
        Self::new(SpecifierRegistry::with_builtin_types())
    }

    /// The registry.
    pub fn registry(&self) -> &SpecifierRegistry {
        &self.registry
    }

    /// Build the specifier described by `config`.
    ///
    /// The specifier must provide every capability in `required`.
    pub fn create_specifier(
        &self,
        required: Capabilities,
        config: &ConfigMap,
    ) -> Result<Arc<dyn Specifier>, SpecificationError> {
        let identifier = value::optional_string(config, keys::IDENTIFIER).ok().flatten();
        let result = self.build(required, config, identifier);
        match &result {
            Ok(specifier) => tracing::debug!(
                target: targets::FACTORY,
                identifier = specifier.identifier(),
                type_name = specifier.type_name(),
                "created specifier"
            ),
            Err(err) => tracing::debug!(
                target: targets::FACTORY,
                identifier,
                error = %err,
                "rejected specifier configuration"
            ),
        }
        result
    }

    fn build(
        &self,
        required: Capabilities,
        config: &ConfigMap,
        identifier: Option<&str>,
    ) -> Result<Arc<dyn Specifier>, SpecificationError> {
        let type_name = value::require_string(config, keys::TYPE)
            .map_err(|err| err.into_specification().in_context(identifier, None))?;

        let entry = self.registry.resolve(type_name).ok_or_else(|| {
            SpecificationError::new(
                SpecificationErrorKind::UnknownType,
                format!(
                    "no implementation named {}",
                    SpecifierRegistry::implementation_name(type_name)
                ),
            )
            .with_parameter(keys::TYPE)
            .with_value(Value::from(type_name))
            .in_context(identifier, Some(type_name))
        })?;

        if !entry.capabilities.contains(required) {
            return Err(SpecificationError::new(
                SpecificationErrorKind::WrongCapability,
                format!(
                    "lacks required capabilities {}",
                    entry.capabilities.missing(required)
                ),
            )
            .with_parameter(keys::TYPE)
            .with_value(Value::from(type_name))
            .in_context(identifier, Some(type_name)));
        }

        (entry.constructor)(config, self).map_err(|err| err.in_context(identifier, Some(type_name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: serde_json::Value) -> ConfigMap {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_implementation_name() {
        assert_eq!(SpecifierRegistry::implementation_name("ComboBox"), "ComboBoxSpecifier");
    }

    #[test]
    fn test_builtin_types_registered() {
        let registry = SpecifierRegistry::with_builtin_types();
        for type_name in [
            "Label",
            "Button",
            "CheckBox",
            "Text",
            "IntegerSpinner",
            "FractionSpinner",
            "ComboBox",
            "CheckBoxes",
            "HierarchicalChoicesTree",
            "ListBuilder",
            "Composite",
            "Group",
        ] {
            assert!(registry.contains(type_name), "{type_name} missing");
        }
        assert!(!registry.contains("Slider"));
        assert_eq!(registry.type_names().len(), 12);
    }

    #[test]
    fn test_unknown_type() {
        let factory = SpecifierFactory::with_builtin_types();
        let err = factory
            .create_specifier(
                Capabilities::NONE,
                &config(json!({"identifier": "x", "type": "Slider"})),
            )
            .unwrap_err();
        assert_eq!(err.kind(), SpecificationErrorKind::UnknownType);
        assert_eq!(err.identifier(), Some("x"));
        assert_eq!(err.type_name(), Some("Slider"));
        assert_eq!(err.value(), Some(&json!("Slider")));
        assert!(err.message().contains("SliderSpecifier"));
    }

    #[test]
    fn test_missing_type() {
        let factory = SpecifierFactory::with_builtin_types();
        let err = factory
            .create_specifier(Capabilities::NONE, &config(json!({"identifier": "x"})))
            .unwrap_err();
        assert_eq!(err.kind(), SpecificationErrorKind::MissingParameter);
        assert_eq!(err.parameter(), Some("type"));
        assert_eq!(err.identifier(), Some("x"));
    }

    #[test]
    fn test_wrong_capability() {
        let factory = SpecifierFactory::with_builtin_types();
        let err = factory
            .create_specifier(
                Capabilities::STATEFUL,
                &config(json!({"identifier": "title", "type": "Label"})),
            )
            .unwrap_err();
        assert_eq!(err.kind(), SpecificationErrorKind::WrongCapability);
        assert!(err.message().contains("STATEFUL"));
    }

    #[test]
    fn test_custom_registration() {
        fn constructor(
            config: &ConfigMap,
            factory: &SpecifierFactory,
        ) -> Result<Arc<dyn Specifier>, SpecificationError> {
            crate::widgets::LabelSpecifier::from_config(config, factory)
        }

        let mut registry = SpecifierRegistry::new();
        assert!(registry.register("Caption", Capabilities::CONTROL, constructor).is_none());
        let factory = SpecifierFactory::new(registry);
        let specifier = factory
            .create_specifier(
                Capabilities::CONTROL,
                &config(json!({"identifier": "c", "type": "Caption", "label": "Hi"})),
            )
            .unwrap();
        assert_eq!(specifier.type_name(), "Caption");
        assert_eq!(specifier.label(), Some("Hi"));
    }
}

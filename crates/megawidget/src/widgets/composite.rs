//! Containers laying out child controls.

use std::sync::Arc;

use megawidget_core::{ConfigMap, PropertyError, SpecificationError, Value};

use super::{create_children, propagate_to_children};
use crate::capability::Capabilities;
use crate::runtime::{
    ContainerMegawidget, CreationParams, Megawidget, MegawidgetBase, BASE_PROPERTY_NAMES,
};
use crate::specifier::{
    ChildSpecifiersManager, ContainerSpecifier, Specifier, SpecifierBase, SpecifierFactory,
};

pub(super) const CAPABILITIES: Capabilities = Capabilities::MEGAWIDGET
    .union(Capabilities::CONTROL)
    .union(Capabilities::CONTAINER);

/// Specifier of a container whose children are listed under `fields`.
#[derive(Debug, Clone)]
pub struct CompositeSpecifier {
    base: SpecifierBase,
    children: ChildSpecifiersManager,
}

impl CompositeSpecifier {
    /// Build from configuration; every child must be a control.
    pub fn from_config(
        config: &ConfigMap,
        factory: &SpecifierFactory,
    ) -> Result<Arc<dyn Specifier>, SpecificationError> {
        let base = SpecifierBase::from_config(config)?;
        let children = ChildSpecifiersManager::from_fields(factory, Capabilities::CONTROL, config)
            .map_err(|err| base.contextualize(err))?;
        Ok(Arc::new(Self { base, children }))
    }
}

impl Specifier for CompositeSpecifier {
    fn specifier_base(&self) -> &SpecifierBase {
        &self.base
    }

    fn capabilities(&self) -> Capabilities {
        CAPABILITIES
    }

    fn mutable_property_names(&self) -> &'static [&'static str] {
        BASE_PROPERTY_NAMES
    }

    fn create_megawidget(
        &self,
        params: &CreationParams,
    ) -> Result<Arc<dyn Megawidget>, SpecificationError> {
        Ok(Arc::new(CompositeMegawidget {
            base: MegawidgetBase::new(self, params),
            children: create_children(self.children.children(), params)?,
        }))
    }

    fn as_container(&self) -> Option<&dyn ContainerSpecifier> {
        Some(self)
    }
}

impl ContainerSpecifier for CompositeSpecifier {
    fn child_specifiers(&self) -> &[Arc<dyn Specifier>] {
        self.children.children()
    }
}

/// A container of child megawidgets.
///
/// Disabling or locking the container does the same to every child.
#[derive(Debug)]
pub struct CompositeMegawidget {
    base: MegawidgetBase,
    children: Vec<Arc<dyn Megawidget>>,
}

impl Megawidget for CompositeMegawidget {
    fn megawidget_base(&self) -> &MegawidgetBase {
        &self.base
    }

    fn mutable_property_names(&self) -> &'static [&'static str] {
        BASE_PROPERTY_NAMES
    }

    fn set_mutable_property(&self, name: &str, value: &Value) -> Result<(), PropertyError> {
        self.base.set_property(self, name, value)?;
        propagate_to_children(&self.children, name, value)
    }

    fn as_container(&self) -> Option<&dyn ContainerMegawidget> {
        Some(self)
    }
}

impl ContainerMegawidget for CompositeMegawidget {
    fn children(&self) -> &[Arc<dyn Megawidget>] {
        &self.children
    }
}

static_assertions::assert_impl_all!(CompositeSpecifier: Send, Sync);
static_assertions::assert_impl_all!(CompositeMegawidget: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use megawidget_core::SpecificationErrorKind;
    use serde_json::json;

    fn specifier(config: serde_json::Value) -> Result<Arc<dyn Specifier>, SpecificationError> {
        SpecifierFactory::with_builtin_types()
            .create_specifier(Capabilities::CONTAINER, config.as_object().unwrap())
    }

    #[test]
    fn test_group_children() {
        let group = specifier(json!({
            "identifier": "options", "type": "Group", "label": "Options",
            "fields": [
                {"identifier": "flag", "type": "CheckBox"},
                {"identifier": "name", "type": "Text"}
            ]
        }))
        .unwrap();
        let children = group.as_container().unwrap().child_specifiers();
        let identifiers: Vec<&str> = children.iter().map(|child| child.identifier()).collect();
        assert_eq!(identifiers, ["flag", "name"]);
    }

    #[test]
    fn test_empty_composite() {
        let composite = specifier(json!({"identifier": "row", "type": "Composite"})).unwrap();
        assert!(composite.as_container().unwrap().child_specifiers().is_empty());
    }

    #[test]
    fn test_duplicate_child_rejected() {
        let err = specifier(json!({
            "identifier": "row", "type": "Composite",
            "fields": [
                {"identifier": "x", "type": "CheckBox"},
                {"identifier": "x", "type": "Text"}
            ]
        }))
        .unwrap_err();
        assert_eq!(err.kind(), SpecificationErrorKind::DuplicateIdentifier);
        assert_eq!(err.parameter(), Some("fields"));
    }

    #[test]
    fn test_nested_child_failure() {
        let err = specifier(json!({
            "identifier": "outer", "type": "Composite",
            "fields": [{"identifier": "inner", "type": "Group", "fields": [{"type": "Text"}]}]
        }))
        .unwrap_err();
        assert_eq!(err.kind(), SpecificationErrorKind::InvalidChild);
        assert_eq!(err.identifier(), Some("outer"));
        assert_eq!(err.root_cause().kind(), SpecificationErrorKind::MissingParameter);
    }

    #[test]
    fn test_debug_lists_children() {
        let group = specifier(json!({
            "identifier": "options", "type": "Group",
            "fields": [{"identifier": "flag", "type": "CheckBox"}]
        }))
        .unwrap()
        .create_megawidget(&CreationParams::new())
        .unwrap();
        let dump = format!("{group:?}");
        assert!(dump.contains("CompositeMegawidget"));
        assert!(dump.contains("\"flag\""));
    }

    #[test]
    fn test_enablement_propagates() {
        let group = specifier(json!({
            "identifier": "options", "type": "Group",
            "fields": [{"identifier": "flag", "type": "CheckBox"}]
        }))
        .unwrap()
        .create_megawidget(&CreationParams::new())
        .unwrap();
        group
            .set_mutable_properties(json!({"enabled": false, "editable": false}).as_object().unwrap())
            .unwrap();
        let child = &group.as_container().unwrap().children()[0];
        assert!(!child.is_enabled());
        assert!(!child.is_editable());
        assert!(group.mutable_property("label").is_err());
    }
}

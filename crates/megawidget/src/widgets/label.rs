//! Static text.

use std::sync::Arc;

use megawidget_core::property::names;
use megawidget_core::value::kind_name;
use megawidget_core::{ConfigMap, Property, PropertyError, SpecificationError, ValidationError, Value};

use crate::capability::Capabilities;
use crate::runtime::{CreationParams, Megawidget, MegawidgetBase};
use crate::specifier::{Specifier, SpecifierBase, SpecifierFactory};

pub(super) const CAPABILITIES: Capabilities = Capabilities::MEGAWIDGET.union(Capabilities::CONTROL);

const PROPERTY_NAMES: &[&str] = &[names::ENABLED, names::EDITABLE, names::EXTRA_DATA, names::LABEL];

/// Specifier of a label.
#[derive(Debug, Clone)]
pub struct LabelSpecifier {
    base: SpecifierBase,
}

impl LabelSpecifier {
    /// Build from configuration.
    pub fn from_config(
        config: &ConfigMap,
        _factory: &SpecifierFactory,
    ) -> Result<Arc<dyn Specifier>, SpecificationError> {
        Ok(Arc::new(Self {
            base: SpecifierBase::from_config(config)?,
        }))
    }
}

impl Specifier for LabelSpecifier {
    fn specifier_base(&self) -> &SpecifierBase {
        &self.base
    }

    fn capabilities(&self) -> Capabilities {
        CAPABILITIES
    }

    fn mutable_property_names(&self) -> &'static [&'static str] {
        PROPERTY_NAMES
    }

    fn create_megawidget(
        &self,
        params: &CreationParams,
    ) -> Result<Arc<dyn Megawidget>, SpecificationError> {
        Ok(Arc::new(LabelMegawidget {
            base: MegawidgetBase::new(self, params),
            label: Property::new(self.label().unwrap_or_default().to_owned()),
        }))
    }
}

/// A label whose text may be changed at runtime.
#[derive(Debug)]
pub struct LabelMegawidget {
    base: MegawidgetBase,
    label: Property<String>,
}

impl LabelMegawidget {
    /// The current text.
    pub fn label(&self) -> String {
        self.label.get()
    }
}

impl Megawidget for LabelMegawidget {
    fn megawidget_base(&self) -> &MegawidgetBase {
        &self.base
    }

    fn mutable_property_names(&self) -> &'static [&'static str] {
        PROPERTY_NAMES
    }

    fn mutable_property(&self, name: &str) -> Result<Value, PropertyError> {
        match name {
            names::LABEL => Ok(Value::String(self.label())),
            _ => self.base.property(name),
        }
    }

    fn set_mutable_property(&self, name: &str, value: &Value) -> Result<(), PropertyError> {
        if name != names::LABEL {
            return self.base.set_property(self, name, value);
        }
        let text = match value {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => {
                return Err(self.base.contextualize(
                    ValidationError::invalid_shape(format!(
                        "expected a string, got {}",
                        kind_name(other)
                    ))
                    .with_value(other.clone())
                    .into_property(names::LABEL),
                ));
            }
        };
        if self.label.set(text) {
            self.base.renderer().synchronize_to_property(self, names::LABEL);
        }
        Ok(())
    }
}

static_assertions::assert_impl_all!(LabelSpecifier: Send, Sync);
static_assertions::assert_impl_all!(LabelMegawidget: Send, Sync);

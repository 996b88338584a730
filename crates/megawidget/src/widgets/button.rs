//! Push buttons.

use std::sync::Arc;

use megawidget_core::logging::targets;
use megawidget_core::{ConfigMap, PropertyError, SpecificationError, Value};

use crate::capability::Capabilities;
use crate::runtime::{
    CreationParams, InvocationListener, Megawidget, MegawidgetBase, NotifierMegawidget,
    BASE_PROPERTY_NAMES,
};
use crate::specifier::{Specifier, SpecifierBase, SpecifierFactory};

pub(super) const CAPABILITIES: Capabilities = Capabilities::MEGAWIDGET
    .union(Capabilities::CONTROL)
    .union(Capabilities::NOTIFIER);

/// Specifier of a button.
#[derive(Debug, Clone)]
pub struct ButtonSpecifier {
    base: SpecifierBase,
}

impl ButtonSpecifier {
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

impl Specifier for ButtonSpecifier {
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
        Ok(Arc::new(ButtonMegawidget {
            base: MegawidgetBase::new(self, params),
            listener: params.invocation_listener.clone(),
        }))
    }
}

/// A stateless control reporting invocations.
pub struct ButtonMegawidget {
    base: MegawidgetBase,
    listener: Option<Arc<dyn InvocationListener>>,
}

impl Megawidget for ButtonMegawidget {
    fn megawidget_base(&self) -> &MegawidgetBase {
        &self.base
    }

    fn mutable_property_names(&self) -> &'static [&'static str] {
        BASE_PROPERTY_NAMES
    }

    fn set_mutable_property(&self, name: &str, value: &Value) -> Result<(), PropertyError> {
        self.base.set_property(self, name, value)
    }

    fn as_notifier(&self) -> Option<&dyn NotifierMegawidget> {
        Some(self)
    }
}

impl NotifierMegawidget for ButtonMegawidget {
    fn invoke(&self) {
        if !self.is_enabled() {
            tracing::trace!(
                target: targets::STATE,
                megawidget = self.identifier(),
                "ignored invocation of disabled button"
            );
            return;
        }
        if let Some(listener) = &self.listener {
            listener.invoked(self);
        }
    }
}

impl std::fmt::Debug for ButtonMegawidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ButtonMegawidget")
            .field("base", &self.base)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

static_assertions::assert_impl_all!(ButtonMegawidget: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::InvocationEvent;
    use megawidget_core::Signal;
    use parking_lot::Mutex;
    use serde_json::json;

    #[test]
    fn test_invoke_reports_unless_disabled() {
        let signal = Arc::new(Signal::<InvocationEvent>::new());
        let received = Arc::new(Mutex::new(Vec::new()));
        let received_clone = received.clone();
        signal.connect(move |event| received_clone.lock().push(event.source.clone()));

        let config = json!({"identifier": "apply", "type": "Button"});
        let specifier =
            ButtonSpecifier::from_config(config.as_object().unwrap(), &SpecifierFactory::default())
                .unwrap();
        let button = specifier
            .create_megawidget(&CreationParams::new().with_invocation_listener(signal))
            .unwrap();
        let notifier = button.as_notifier().unwrap();

        notifier.invoke();
        button.set_mutable_property("enabled", &json!(false)).unwrap();
        notifier.invoke();

        assert_eq!(*received.lock(), vec!["apply".to_string()]);
    }
}

//! Single-value controls: check boxes and text fields.

use std::sync::Arc;

use megawidget_core::property::names;
use megawidget_core::{
    ConfigMap, GuardState, PropertyError, SpecificationError, StateError, StateMap, Value,
};

use super::{apply_values, values_of};
use crate::capability::Capabilities;
use crate::runtime::{
    CreationParams, Megawidget, MegawidgetBase, StatefulCore, StatefulMegawidget,
};
use crate::specifier::{
    Specifier, SpecifierBase, SpecifierFactory, StatefulBase, StatefulSpecifier,
};
use crate::validator::{BooleanValidator, StateValidator, TextValidator};

pub(super) const CAPABILITIES: Capabilities = Capabilities::MEGAWIDGET
    .union(Capabilities::CONTROL)
    .union(Capabilities::STATEFUL);

const PROPERTY_NAMES: &[&str] = &[names::ENABLED, names::EDITABLE, names::EXTRA_DATA, names::VALUES];

/// Specifier of a control holding one validated value.
#[derive(Debug, Clone)]
pub struct ValueSpecifier<V: StateValidator> {
    base: SpecifierBase,
    stateful: StatefulBase<V>,
}

/// A check box: one boolean state.
pub type CheckBoxSpecifier = ValueSpecifier<BooleanValidator>;

/// A text field: one string state, optionally length-limited.
pub type TextSpecifier = ValueSpecifier<TextValidator>;

impl<V: StateValidator> ValueSpecifier<V> {
    /// Build with the given validator.
    pub fn new(
        base: SpecifierBase,
        config: &ConfigMap,
        validator: V,
    ) -> Result<Self, SpecificationError> {
        let stateful = StatefulBase::from_config(&base, config, validator, false)?;
        Ok(Self { base, stateful })
    }

    /// The validator.
    pub fn validator(&self) -> &V {
        self.stateful.validator()
    }
}

impl CheckBoxSpecifier {
    /// Build from configuration.
    pub fn from_config(
        config: &ConfigMap,
        _factory: &SpecifierFactory,
    ) -> Result<Arc<dyn Specifier>, SpecificationError> {
        let base = SpecifierBase::from_config(config)?;
        Ok(Arc::new(Self::new(base, config, BooleanValidator)?))
    }
}

impl TextSpecifier {
    /// Build from configuration; reads `maxLength`.
    pub fn from_config(
        config: &ConfigMap,
        _factory: &SpecifierFactory,
    ) -> Result<Arc<dyn Specifier>, SpecificationError> {
        let base = SpecifierBase::from_config(config)?;
        let validator = TextValidator::from_config(config).map_err(|err| base.contextualize(err))?;
        Ok(Arc::new(Self::new(base, config, validator)?))
    }
}

impl<V: StateValidator> Specifier for ValueSpecifier<V> {
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
        Ok(Arc::new(ValueMegawidget {
            base: MegawidgetBase::new(self, params),
            core: self.stateful.create_core(params),
        }))
    }

    fn as_stateful(&self) -> Option<&dyn StatefulSpecifier> {
        Some(self)
    }
}

impl<V: StateValidator> StatefulSpecifier for ValueSpecifier<V> {
    fn state_identifiers(&self) -> &[String] {
        self.stateful.state_identifiers()
    }

    fn starting_states(&self) -> StateMap {
        self.stateful.starting_states()
    }

    fn validate_and_correct_states(&self, states: &mut StateMap) {
        self.stateful.correct_states(states);
    }
}

/// A control holding one validated value.
#[derive(Debug)]
pub struct ValueMegawidget<V: StateValidator> {
    base: MegawidgetBase,
    core: StatefulCore<V>,
}

impl<V: StateValidator> ValueMegawidget<V> {
    /// The typed state.
    pub fn value(&self) -> Option<V::State> {
        self.core.typed_state(0)
    }
}

impl<V: StateValidator> Megawidget for ValueMegawidget<V> {
    fn megawidget_base(&self) -> &MegawidgetBase {
        &self.base
    }

    fn mutable_property_names(&self) -> &'static [&'static str] {
        PROPERTY_NAMES
    }

    fn mutable_property(&self, name: &str) -> Result<Value, PropertyError> {
        match name {
            names::VALUES => Ok(values_of(self)),
            _ => self.base.property(name),
        }
    }

    fn set_mutable_property(&self, name: &str, value: &Value) -> Result<(), PropertyError> {
        match name {
            names::VALUES => apply_values(self, value),
            _ => self.base.set_property(self, name, value),
        }
    }

    fn as_stateful(&self) -> Option<&dyn StatefulMegawidget> {
        Some(self)
    }
}

impl<V: StateValidator> StatefulMegawidget for ValueMegawidget<V> {
    fn state_identifiers(&self) -> &[String] {
        self.core.identifiers()
    }

    fn state(&self, identifier: &str) -> Result<Value, StateError> {
        self.core
            .state(identifier)
            .map_err(|err| self.base.contextualize_state(err))
    }

    fn states(&self) -> StateMap {
        self.core.states()
    }

    fn set_state(&self, identifier: &str, value: &Value) -> Result<(), StateError> {
        self.core.set_state(self, identifier, value)
    }

    fn set_states(&self, states: &StateMap) -> Result<(), StateError> {
        self.core.set_states(self, states)
    }

    fn notify_state_change(&self, identifier: &str, value: &Value) -> Result<(), StateError> {
        self.core.notify(self, identifier, value)
    }

    fn notify_state_changes(&self, states: &StateMap) -> Result<(), StateError> {
        self.core.notify_many(self, states)
    }

    fn guard_state(&self) -> GuardState {
        self.core.guard_state()
    }
}

static_assertions::assert_impl_all!(CheckBoxSpecifier: Send, Sync);
static_assertions::assert_impl_all!(ValueMegawidget<TextValidator>: Send, Sync);

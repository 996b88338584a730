//! Bounded numeric spinners.
//!
//! A spinner owns one number per state identifier, clamped to a range that
//! may be revised at runtime. Multi-state spinners (identifier `"low:high"`)
//! require their values to be non-decreasing in identifier order; since an
//! edit of one end may be transiently out of order, spinners stage changes
//! and validate them jointly on commit.

use std::sync::Arc;

use megawidget_core::property::names;
use megawidget_core::{
    order_for_batch, ConfigMap, GuardState, PropertyError, SpecificationError, StateError,
    StateMap, Value,
};

use super::{apply_values, values_of};
use crate::capability::Capabilities;
use crate::runtime::{
    apply_atomically, CreationParams, ExplicitCommitCore, ExplicitCommitMegawidget, Megawidget,
    MegawidgetBase, StatefulMegawidget,
};
use crate::specifier::{
    Specifier, SpecifierBase, SpecifierFactory, StatefulBase, StatefulSpecifier,
};
use crate::validator::{BoundedNumber, BoundedNumberValidator};

pub(super) const CAPABILITIES: Capabilities = Capabilities::MEGAWIDGET
    .union(Capabilities::CONTROL)
    .union(Capabilities::STATEFUL)
    .union(Capabilities::EXPLICIT_COMMIT)
    .union(Capabilities::BOUNDS);

const PROPERTY_NAMES: &[&str] = &[
    names::ENABLED,
    names::EDITABLE,
    names::EXTRA_DATA,
    names::MIN_VALUE,
    names::MAX_VALUE,
    names::INCREMENT_DELTA,
    names::VALUES,
];

/// Specifier of a spinner over `N`.
#[derive(Debug, Clone)]
pub struct SpinnerSpecifier<N: BoundedNumber> {
    base: SpecifierBase,
    stateful: StatefulBase<BoundedNumberValidator<N>>,
}

/// Spinner over integers.
pub type IntegerSpinnerSpecifier = SpinnerSpecifier<i64>;

/// Spinner over fractional numbers rounded to a precision.
pub type FractionSpinnerSpecifier = SpinnerSpecifier<f64>;

impl<N: BoundedNumber> SpinnerSpecifier<N> {
    /// Build from configuration; `minValue` and `maxValue` are required.
    pub fn from_config(
        config: &ConfigMap,
        _factory: &SpecifierFactory,
    ) -> Result<Arc<dyn Specifier>, SpecificationError> {
        let base = SpecifierBase::from_config(config)?;
        let validator =
            BoundedNumberValidator::from_config(config).map_err(|err| base.contextualize(err))?;
        let stateful = StatefulBase::from_config(&base, config, validator, true)?;
        Ok(Arc::new(Self { base, stateful }))
    }

    /// The validator.
    pub fn validator(&self) -> &BoundedNumberValidator<N> {
        self.stateful.validator()
    }
}

impl<N: BoundedNumber> Specifier for SpinnerSpecifier<N> {
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
        Ok(Arc::new(SpinnerMegawidget {
            base: MegawidgetBase::new(self, params),
            staging: ExplicitCommitCore::new(self.stateful.create_core(params)),
        }))
    }

    fn as_stateful(&self) -> Option<&dyn StatefulSpecifier> {
        Some(self)
    }
}

impl<N: BoundedNumber> StatefulSpecifier for SpinnerSpecifier<N> {
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

/// A spinner megawidget.
#[derive(Debug)]
pub struct SpinnerMegawidget<N: BoundedNumber> {
    base: MegawidgetBase,
    staging: ExplicitCommitCore<BoundedNumberValidator<N>>,
}

impl<N: BoundedNumber> SpinnerMegawidget<N> {
    /// Replace both bounds at once, clamping every state.
    pub fn set_bounds(&self, minimum: &Value, maximum: &Value) -> Result<(), PropertyError> {
        self.staging.core().revise(self, names::MIN_VALUE, |validator| {
            let minimum = validator.read(minimum, names::MIN_VALUE)?;
            let maximum = validator.read(maximum, names::MAX_VALUE)?;
            validator.set_bounds(minimum, maximum)
        })?;
        let renderer = self.base.renderer();
        renderer.synchronize_to_property(self, names::MIN_VALUE);
        renderer.synchronize_to_property(self, names::MAX_VALUE);
        Ok(())
    }

    fn revise_bound(&self, name: &str, value: &Value) -> Result<(), PropertyError> {
        self.staging.core().revise(self, name, |validator| {
            let bound = validator.read(value, name)?;
            match name {
                names::MIN_VALUE => validator.set_bounds(bound, validator.maximum()),
                names::MAX_VALUE => validator.set_bounds(validator.minimum(), bound),
                _ => validator.set_increment_delta(bound),
            }
        })?;
        self.base.renderer().synchronize_to_property(self, name);
        Ok(())
    }

    fn apply_batch(&self, properties: &ConfigMap) -> Result<(), PropertyError> {
        let pair = match (properties.get(names::MIN_VALUE), properties.get(names::MAX_VALUE)) {
            (Some(minimum), Some(maximum)) => {
                self.set_bounds(minimum, maximum)?;
                true
            }
            _ => false,
        };
        for (name, value) in order_for_batch(properties) {
            if pair && matches!(name, names::MIN_VALUE | names::MAX_VALUE) {
                continue;
            }
            self.set_mutable_property(name, value)?;
        }
        Ok(())
    }

    fn bound(&self, read: impl FnOnce(&BoundedNumberValidator<N>) -> N) -> Value {
        self.staging.core().with_validator(read).into_value()
    }
}

impl<N: BoundedNumber> Megawidget for SpinnerMegawidget<N> {
    fn megawidget_base(&self) -> &MegawidgetBase {
        &self.base
    }

    fn mutable_property_names(&self) -> &'static [&'static str] {
        PROPERTY_NAMES
    }

    fn mutable_property(&self, name: &str) -> Result<Value, PropertyError> {
        match name {
            names::MIN_VALUE => Ok(self.bound(BoundedNumberValidator::minimum)),
            names::MAX_VALUE => Ok(self.bound(BoundedNumberValidator::maximum)),
            names::INCREMENT_DELTA => Ok(self.bound(BoundedNumberValidator::increment_delta)),
            names::VALUES => Ok(values_of(self)),
            _ => self.base.property(name),
        }
    }

    fn set_mutable_property(&self, name: &str, value: &Value) -> Result<(), PropertyError> {
        match name {
            names::MIN_VALUE | names::MAX_VALUE | names::INCREMENT_DELTA => {
                self.revise_bound(name, value)
            }
            names::VALUES => apply_values(self, value),
            _ => self.base.set_property(self, name, value),
        }
    }

    /// Applies `minValue` and `maxValue` together when both are present, so
    /// a range may be moved past its old position in one batch.
    fn set_mutable_properties(&self, properties: &ConfigMap) -> Result<(), PropertyError> {
        self.base.check_property_names(PROPERTY_NAMES, properties)?;
        apply_atomically(self, properties, |batch| self.apply_batch(batch))
    }

    fn as_stateful(&self) -> Option<&dyn StatefulMegawidget> {
        Some(self)
    }

    fn as_explicit_commit(&self) -> Option<&dyn ExplicitCommitMegawidget> {
        Some(self)
    }
}

impl<N: BoundedNumber> StatefulMegawidget for SpinnerMegawidget<N> {
    fn state_identifiers(&self) -> &[String] {
        self.staging.core().identifiers()
    }

    fn state(&self, identifier: &str) -> Result<Value, StateError> {
        self.staging
            .core()
            .state(identifier)
            .map_err(|err| self.base.contextualize_state(err))
    }

    fn states(&self) -> StateMap {
        self.staging.core().states()
    }

    fn set_state(&self, identifier: &str, value: &Value) -> Result<(), StateError> {
        self.staging.set_state(self, identifier, value)
    }

    fn set_states(&self, states: &StateMap) -> Result<(), StateError> {
        self.staging.set_states(self, states)
    }

    fn notify_state_change(&self, identifier: &str, value: &Value) -> Result<(), StateError> {
        self.staging.core().notify(self, identifier, value)
    }

    fn notify_state_changes(&self, states: &StateMap) -> Result<(), StateError> {
        self.staging.core().notify_many(self, states)
    }

    fn guard_state(&self) -> GuardState {
        self.staging.core().guard_state()
    }
}

impl<N: BoundedNumber> ExplicitCommitMegawidget for SpinnerMegawidget<N> {
    fn stage_state(&self, identifier: &str, value: &Value) -> Result<(), StateError> {
        self.staging.stage(self, identifier, value)
    }

    fn commit(&self) -> Result<(), StateError> {
        self.staging.commit(self)
    }

    fn uncommitted_states(&self) -> StateMap {
        self.staging.uncommitted_states()
    }
}

static_assertions::assert_impl_all!(IntegerSpinnerSpecifier: Send, Sync);
static_assertions::assert_impl_all!(SpinnerMegawidget<f64>: Send, Sync);

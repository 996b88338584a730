//! State validators.
//!
//! A validator holds the currently accepted bounds or shape of one control's
//! state (a numeric range, a maximum length, a choice list) and converts
//! arbitrary [`Value`]s into the canonical typed state. Specifiers own one
//! validator each; every runtime megawidget gets its own deep clone, so
//! revising bounds at runtime never affects the specifier or any sibling
//! instance.
//!
//! # Built-in Validators
//!
//! - [`BoundedNumberValidator`]: Integer or fractional values clamped to a range
//! - [`FlatChoicesValidator`]: One or several identifiers from a flat choice list
//! - [`HierarchicalChoicesValidator`]: A selection within a choice tree
//! - [`TextValidator`]: Strings truncated to a maximum length
//! - [`BooleanValidator`]: Flags

mod bounded_number;
mod choices;
mod text;

use std::fmt;

use megawidget_core::{Value, ValidationError};

use crate::choices::ChoiceList;

pub use bounded_number::{BoundedNumber, BoundedNumberValidator};
pub use choices::{Cardinality, FlatChoicesValidator, HierarchicalChoicesValidator, PruneFallback};
pub use text::{BooleanValidator, TextValidator};

/// Trait for state validators.
///
/// # Thread Safety
///
/// Validators must be `Send + Sync` so runtime megawidgets can be shared.
pub trait StateValidator: Clone + fmt::Debug + Send + Sync + 'static {
    /// The canonical typed state.
    type State: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;

    /// Convert an arbitrary value into the canonical state.
    ///
    /// Values outside the current bounds are either corrected (clamped,
    /// truncated) or rejected, depending on the validator.
    fn convert(&self, value: &Value) -> Result<Self::State, ValidationError>;

    /// The untyped form of a state.
    fn to_value(&self, state: &Self::State) -> Value;

    /// The state used when none is configured or the configured one is unusable.
    fn default_state(&self) -> Self::State;

    /// The default for the `index`-th of `count` states of one control.
    fn default_state_for(&self, _index: usize, _count: usize) -> Self::State {
        self.default_state()
    }

    /// Recompute a state so it stays valid against the current bounds.
    ///
    /// Called after the bounds or choices were revised.
    fn prune_to_state_value(&self, state: &Self::State) -> Self::State;

    /// Fold an accepted state into the working bounds.
    ///
    /// Only unbounded validators do anything here.
    fn admit(&mut self, _state: &Self::State) {}

    /// Check that all states of one control are jointly acceptable.
    fn validate_jointly(&self, _states: &[Self::State]) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// A validator whose bounds are a list of choices.
pub trait ChoicesValidator: StateValidator {
    /// The choices currently available.
    fn available_choices(&self) -> &ChoiceList;

    /// Replace the working choice list.
    ///
    /// The list is re-validated first; on failure the previous list is kept.
    fn set_available_choices(&mut self, choices: &Value) -> Result<(), ValidationError>;

    /// Whether states are restricted to the available choices.
    fn is_bounded(&self) -> bool;
}

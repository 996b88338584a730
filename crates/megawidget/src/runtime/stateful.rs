//! The stateful runtime core.
//!
//! [`StatefulCore`] holds the state values, validator clone and reentrancy
//! guard of one stateful megawidget and implements the guarded state
//! machine shared by every stateful megawidget:
//!
//! ```text
//!            set_state / notify / commit
//!   Idle ────────────────────────────────▶ SettingState
//!    ▲                                          │
//!    └──────── renderer synced, listener ───────┘
//!              notified, guard released
//! ```
//!
//! While in `SettingState`, nested `set_state` calls and renderer echoes are
//! suppressed. The internal lock is released before any renderer hook or
//! listener runs.

use std::sync::Arc;

use parking_lot::Mutex;

use megawidget_core::logging::targets;
use megawidget_core::property::names;
use megawidget_core::{
    GuardState, PropertyError, ReentrancyGuard, StateError, StateMap, ValidationError, Value,
};

use super::{StateChangeListener, StatefulMegawidget};
use crate::validator::{ChoicesValidator, StateValidator};

struct CoreState<V: StateValidator> {
    validator: V,
    states: Vec<V::State>,
}

/// Whether a change came from the program or from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Programmatic,
    User,
}

/// Guarded state storage for a stateful megawidget.
pub struct StatefulCore<V: StateValidator> {
    identifiers: Vec<String>,
    inner: Mutex<CoreState<V>>,
    guard: ReentrancyGuard,
    listener: Option<Arc<dyn StateChangeListener>>,
}

impl<V: StateValidator> StatefulCore<V> {
    /// Create a core holding `states`, one per identifier.
    ///
    /// The states must already be valid; specifiers resolve them.
    pub fn new(
        identifiers: Vec<String>,
        mut validator: V,
        states: Vec<V::State>,
        listener: Option<Arc<dyn StateChangeListener>>,
    ) -> Self {
        debug_assert_eq!(identifiers.len(), states.len());
        for state in &states {
            validator.admit(state);
        }
        Self {
            identifiers,
            inner: Mutex::new(CoreState { validator, states }),
            guard: ReentrancyGuard::new(),
            listener,
        }
    }

    /// The state identifiers, in order.
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    /// The reentrancy guard.
    pub fn guard(&self) -> &ReentrancyGuard {
        &self.guard
    }

    /// Whether a state change is in flight.
    pub fn guard_state(&self) -> GuardState {
        self.guard.state()
    }

    /// Position of a state identifier.
    pub fn index_of(&self, identifier: &str) -> Result<usize, StateError> {
        self.identifiers
            .iter()
            .position(|candidate| candidate == identifier)
            .ok_or_else(|| StateError::unknown_identifier(identifier))
    }

    /// Get one state value.
    pub fn state(&self, identifier: &str) -> Result<Value, StateError> {
        let index = self.index_of(identifier)?;
        let inner = self.inner.lock();
        Ok(inner.validator.to_value(&inner.states[index]))
    }

    /// Get every state value.
    pub fn states(&self) -> StateMap {
        let inner = self.inner.lock();
        self.identifiers
            .iter()
            .zip(&inner.states)
            .map(|(identifier, state)| (identifier.clone(), inner.validator.to_value(state)))
            .collect()
    }

    /// Get one typed state.
    pub fn typed_state(&self, index: usize) -> Option<V::State> {
        self.inner.lock().states.get(index).cloned()
    }

    /// Read the validator.
    pub fn with_validator<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        f(&self.inner.lock().validator)
    }

    /// Convert a value for the state `identifier`, returning its index.
    pub fn convert(
        &self,
        identifier: &str,
        value: &Value,
    ) -> Result<(usize, V::State), StateError> {
        let index = self.index_of(identifier)?;
        let state = self
            .inner
            .lock()
            .validator
            .convert(value)
            .map_err(|err| err.into_state(identifier))?;
        Ok((index, state))
    }

    /// Convert every entry of `states`; nothing is applied.
    pub fn convert_all(&self, states: &StateMap) -> Result<Vec<(usize, V::State)>, StateError> {
        states
            .iter()
            .map(|(identifier, value)| self.convert(identifier, value))
            .collect()
    }

    /// Programmatically change one state value.
    pub fn set_state(
        &self,
        owner: &dyn StatefulMegawidget,
        identifier: &str,
        value: &Value,
    ) -> Result<(), StateError> {
        if self.suppressed(owner, identifier, "set_state") {
            return Ok(());
        }
        let change = self
            .convert(identifier, value)
            .map_err(|err| owner.megawidget_base().contextualize_state(err))?;
        self.apply(owner, vec![change], Origin::Programmatic, &[])
    }

    /// Programmatically change several state values atomically.
    pub fn set_states(
        &self,
        owner: &dyn StatefulMegawidget,
        states: &StateMap,
    ) -> Result<(), StateError> {
        if states.is_empty() || self.suppressed(owner, "*", "set_states") {
            return Ok(());
        }
        let changes = self
            .convert_all(states)
            .map_err(|err| owner.megawidget_base().contextualize_state(err))?;
        self.apply(owner, changes, Origin::Programmatic, &[])
    }

    /// Report a user-driven change of one state value.
    pub fn notify(
        &self,
        owner: &dyn StatefulMegawidget,
        identifier: &str,
        value: &Value,
    ) -> Result<(), StateError> {
        if self.suppressed(owner, identifier, "notify") {
            return Ok(());
        }
        let change = self
            .convert(identifier, value)
            .map_err(|err| owner.megawidget_base().contextualize_state(err))?;
        self.apply(owner, vec![change], Origin::User, &[(identifier, value)])
    }

    /// Report user-driven changes of several state values.
    ///
    /// A single entry takes the single-value path; two or more are reported
    /// to the listener as one simultaneous change.
    pub fn notify_many(
        &self,
        owner: &dyn StatefulMegawidget,
        states: &StateMap,
    ) -> Result<(), StateError> {
        let mut entries = states.iter();
        match (entries.next(), entries.next()) {
            (None, _) => Ok(()),
            (Some((identifier, value)), None) => self.notify(owner, identifier, value),
            _ => {
                if self.suppressed(owner, "*", "notify") {
                    return Ok(());
                }
                let changes = self
                    .convert_all(states)
                    .map_err(|err| owner.megawidget_base().contextualize_state(err))?;
                let raw: Vec<(&str, &Value)> = states
                    .iter()
                    .map(|(identifier, value)| (identifier.as_str(), value))
                    .collect();
                self.apply(owner, changes, Origin::User, &raw)
            }
        }
    }

    /// Apply already-converted changes and commit them to the renderer.
    ///
    /// The staged set is validated jointly with the untouched states before
    /// anything is stored.
    pub(crate) fn apply_programmatic(
        &self,
        owner: &dyn StatefulMegawidget,
        changes: Vec<(usize, V::State)>,
    ) -> Result<(), StateError> {
        self.apply(owner, changes, Origin::Programmatic, &[])
    }

    fn suppressed(
        &self,
        owner: &dyn StatefulMegawidget,
        identifier: &str,
        operation: &str,
    ) -> bool {
        if self.guard.is_engaged() {
            tracing::trace!(
                target: targets::STATE,
                megawidget = owner.identifier(),
                state = identifier,
                operation,
                "suppressed re-entrant state change"
            );
            return true;
        }
        false
    }

    fn apply(
        &self,
        owner: &dyn StatefulMegawidget,
        changes: Vec<(usize, V::State)>,
        origin: Origin,
        raw: &[(&str, &Value)],
    ) -> Result<(), StateError> {
        let Some(_token) = self.guard.try_enter() else {
            tracing::trace!(
                target: targets::STATE,
                megawidget = owner.identifier(),
                "suppressed re-entrant state change"
            );
            return Ok(());
        };

        let (changed, canonical) = {
            let mut inner = self.inner.lock();
            let mut candidate = inner.states.clone();
            for (index, state) in &changes {
                candidate[*index] = state.clone();
            }
            if candidate == inner.states {
                tracing::trace!(
                    target: targets::STATE,
                    megawidget = owner.identifier(),
                    "state unchanged"
                );
                return Ok(());
            }
            let first = changes
                .first()
                .map_or("", |(index, _)| self.identifiers[*index].as_str());
            inner.validator.validate_jointly(&candidate).map_err(|err: ValidationError| {
                owner.megawidget_base().contextualize_state(err.into_state(first))
            })?;

            let changed: Vec<usize> = (0..candidate.len())
                .filter(|index| candidate[*index] != inner.states[*index])
                .collect();
            for index in &changed {
                let state = candidate[*index].clone();
                inner.validator.admit(&state);
            }
            inner.states = candidate;
            let canonical: StateMap = changes
                .iter()
                .map(|(index, _)| {
                    let identifier = self.identifiers[*index].clone();
                    (identifier, inner.validator.to_value(&inner.states[*index]))
                })
                .collect();
            (changed, canonical)
        };

        tracing::debug!(
            target: targets::STATE,
            megawidget = owner.identifier(),
            origin = ?origin,
            changed = changed.len(),
            "state applied"
        );

        let renderer = owner.megawidget_base().renderer().clone();
        match origin {
            Origin::Programmatic => {
                for index in &changed {
                    renderer.synchronize_to_state(owner, &self.identifiers[*index]);
                }
            }
            Origin::User => {
                // The renderer already shows what the user entered unless it was corrected.
                for (identifier, value) in raw {
                    if canonical.get(*identifier) != Some(*value) {
                        renderer.synchronize_to_state(owner, identifier);
                    }
                }
                if let Some(listener) = &self.listener {
                    match canonical.iter().next() {
                        Some((identifier, value)) if canonical.len() == 1 => {
                            listener.state_changed(owner, identifier, value)
                        }
                        _ => listener.states_changed(owner, &canonical),
                    }
                }
            }
        }
        Ok(())
    }

    /// Revise the validator's bounds and prune every state against them.
    pub fn revise(
        &self,
        owner: &dyn StatefulMegawidget,
        property: &str,
        revise: impl FnOnce(&mut V) -> Result<(), ValidationError>,
    ) -> Result<(), PropertyError> {
        let changed = {
            let mut inner = self.inner.lock();
            let mut candidate = inner.validator.clone();
            revise(&mut candidate)
                .map_err(|err| owner.megawidget_base().contextualize(err.into_property(property)))?;
            self.swap_in(&mut inner, candidate)
                .map_err(|err| owner.megawidget_base().contextualize(err.into_property(property)))?
        };
        tracing::debug!(
            target: targets::PROPERTY,
            megawidget = owner.identifier(),
            property,
            pruned = changed.len(),
            "bounds revised"
        );

        let _token = self.guard.try_enter();
        let renderer = owner.megawidget_base().renderer().clone();
        for index in changed {
            renderer.synchronize_to_state(owner, &self.identifiers[index]);
        }
        Ok(())
    }

    fn swap_in(
        &self,
        inner: &mut CoreState<V>,
        mut candidate: V,
    ) -> Result<Vec<usize>, ValidationError> {
        let pruned: Vec<V::State> = inner
            .states
            .iter()
            .map(|state| candidate.prune_to_state_value(state))
            .collect();
        candidate.validate_jointly(&pruned)?;
        for state in &pruned {
            candidate.admit(state);
        }
        let changed = (0..pruned.len())
            .filter(|index| pruned[*index] != inner.states[*index])
            .collect();
        inner.validator = candidate;
        inner.states = pruned;
        Ok(changed)
    }
}

impl<V: ChoicesValidator> StatefulCore<V> {
    /// The available choices in configuration form.
    pub fn choices(&self) -> Value {
        self.inner.lock().validator.available_choices().to_value()
    }

    /// Replace the choice list, pruning the state to match.
    ///
    /// The renderer is asked to prepare first. If the new list is rejected
    /// the preparation is cancelled and the previous choices and state are
    /// kept.
    pub fn set_choices(
        &self,
        owner: &dyn StatefulMegawidget,
        choices: &Value,
    ) -> Result<(), PropertyError> {
        let renderer = owner.megawidget_base().renderer().clone();
        renderer.prepare_for_choices_change(owner);

        let outcome = {
            let mut inner = self.inner.lock();
            let mut candidate = inner.validator.clone();
            candidate
                .set_available_choices(choices)
                .and_then(|()| self.swap_in(&mut inner, candidate))
        };
        let changed = match outcome {
            Ok(changed) => changed,
            Err(err) => {
                tracing::debug!(
                    target: targets::CHOICES,
                    megawidget = owner.identifier(),
                    error = %err,
                    "choice replacement rejected"
                );
                renderer.cancel_preparation(owner);
                return Err(owner
                    .megawidget_base()
                    .contextualize(err.into_property(names::CHOICES)));
            }
        };
        tracing::debug!(
            target: targets::CHOICES,
            megawidget = owner.identifier(),
            pruned = changed.len(),
            "choices replaced"
        );

        let _token = self.guard.try_enter();
        renderer.synchronize_to_choices(owner);
        for index in changed {
            renderer.synchronize_to_state(owner, &self.identifiers[index]);
        }
        Ok(())
    }
}

impl<V: StateValidator> std::fmt::Debug for StatefulCore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatefulCore")
            .field("identifiers", &self.identifiers)
            .field("guard", &self.guard.state())
            .finish_non_exhaustive()
    }
}

//! The explicit-commit state machine.
//!
//! Some controls have interdependent states, such as the lower and upper
//! value of a range, whose values may be transiently invalid mid-edit but
//! valid once every edit has landed. [`ExplicitCommitCore`] layers a staging
//! area over [`StatefulCore`]: staged values are converted immediately but
//! only validated jointly, and only stored, on [`commit`].
//!
//! [`commit`]: ExplicitCommitCore::commit

use std::collections::BTreeMap;

use parking_lot::Mutex;

use megawidget_core::logging::targets;
use megawidget_core::{StateError, StateMap, Value};

use super::{StatefulCore, StatefulMegawidget};
use crate::validator::StateValidator;

/// Staging layer over a [`StatefulCore`].
pub struct ExplicitCommitCore<V: StateValidator> {
    core: StatefulCore<V>,
    uncommitted: Mutex<BTreeMap<usize, V::State>>,
}

impl<V: StateValidator> ExplicitCommitCore<V> {
    /// Wrap a stateful core.
    pub fn new(core: StatefulCore<V>) -> Self {
        Self {
            core,
            uncommitted: Mutex::new(BTreeMap::new()),
        }
    }

    /// The wrapped core.
    pub fn core(&self) -> &StatefulCore<V> {
        &self.core
    }

    /// Record a pending value for `identifier`.
    ///
    /// Nothing is recorded when the value equals the staged value, or the
    /// committed one if nothing is staged.
    pub fn stage(
        &self,
        owner: &dyn StatefulMegawidget,
        identifier: &str,
        value: &Value,
    ) -> Result<(), StateError> {
        let (index, state) = self
            .core
            .convert(identifier, value)
            .map_err(|err| owner.megawidget_base().contextualize_state(err))?;
        self.stage_converted(index, state);
        Ok(())
    }

    fn stage_converted(&self, index: usize, state: V::State) {
        let mut uncommitted = self.uncommitted.lock();
        let current = match uncommitted.get(&index) {
            Some(staged) => staged.clone(),
            None => match self.core.typed_state(index) {
                Some(committed) => committed,
                None => return,
            },
        };
        if current != state {
            tracing::trace!(
                target: targets::STATE,
                state = self.core.identifiers()[index].as_str(),
                "staged state value"
            );
            uncommitted.insert(index, state);
        }
    }

    /// Apply every staged value at once.
    ///
    /// A no-op if nothing is staged or a state change is already in flight.
    /// The staged map is cleared whether or not the joint validation passes;
    /// on failure no state changes.
    pub fn commit(&self, owner: &dyn StatefulMegawidget) -> Result<(), StateError> {
        if self.core.guard().is_engaged() {
            tracing::trace!(
                target: targets::STATE,
                megawidget = owner.identifier(),
                "suppressed re-entrant commit"
            );
            return Ok(());
        }
        let staged = std::mem::take(&mut *self.uncommitted.lock());
        if staged.is_empty() {
            return Ok(());
        }
        // Bounds may have been revised since staging.
        let changes = self.core.with_validator(|validator| {
            staged
                .into_iter()
                .map(|(index, state)| (index, validator.prune_to_state_value(&state)))
                .collect::<Vec<_>>()
        });
        self.core.apply_programmatic(owner, changes)
    }

    /// Stage one value and commit.
    pub fn set_state(
        &self,
        owner: &dyn StatefulMegawidget,
        identifier: &str,
        value: &Value,
    ) -> Result<(), StateError> {
        if self.core.guard().is_engaged() {
            return Ok(());
        }
        self.stage(owner, identifier, value)?;
        self.commit(owner)
    }

    /// Stage several values and commit them together.
    ///
    /// If any value fails conversion nothing is staged.
    pub fn set_states(
        &self,
        owner: &dyn StatefulMegawidget,
        states: &StateMap,
    ) -> Result<(), StateError> {
        if self.core.guard().is_engaged() {
            return Ok(());
        }
        let changes = self
            .core
            .convert_all(states)
            .map_err(|err| owner.megawidget_base().contextualize_state(err))?;
        for (index, state) in changes {
            self.stage_converted(index, state);
        }
        self.commit(owner)
    }

    /// The staged values not yet committed.
    pub fn uncommitted_states(&self) -> StateMap {
        let uncommitted = self.uncommitted.lock();
        self.core.with_validator(|validator| {
            uncommitted
                .iter()
                .map(|(index, state)| {
                    (self.core.identifiers()[*index].clone(), validator.to_value(state))
                })
                .collect()
        })
    }
}

impl<V: StateValidator> std::fmt::Debug for ExplicitCommitCore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplicitCommitCore")
            .field("core", &self.core)
            .field("uncommitted", &self.uncommitted.lock().len())
            .finish()
    }
}

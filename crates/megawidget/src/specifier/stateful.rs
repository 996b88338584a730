//! Shared plumbing of stateful specifiers.

use megawidget_core::logging::targets;
use megawidget_core::value::keys;
use megawidget_core::{ConfigMap, SpecificationError, StateMap, ValidationError, Value};

use super::SpecifierBase;
use crate::runtime::{CreationParams, StatefulCore};
use crate::validator::StateValidator;

/// The validator, state identifiers and starting states of a stateful
/// specifier.
///
/// Every stateful built-in specifier embeds one of these and forwards
/// [`StatefulSpecifier`](super::StatefulSpecifier) to it.
#[derive(Debug, Clone)]
pub struct StatefulBase<V: StateValidator> {
    state_identifiers: Vec<String>,
    validator: V,
    starting: Vec<V::State>,
}

impl<V: StateValidator> StatefulBase<V> {
    /// Build from the specifier's configuration.
    ///
    /// With `multi_state`, the identifier is split on `:` into one state
    /// identifier per part. When that yields several state identifiers,
    /// `values` is read as a map keyed by them; with a single state
    /// identifier, `values` is the starting value itself.
    pub fn from_config(
        base: &SpecifierBase,
        config: &ConfigMap,
        validator: V,
        multi_state: bool,
    ) -> Result<Self, SpecificationError> {
        let state_identifiers = state_identifiers(base.identifier(), multi_state)
            .map_err(|err| base.contextualize(err))?;
        let count = state_identifiers.len();
        let keyed = multi_state && count > 1;
        let configured = config.get(keys::VALUES).filter(|value| !value.is_null());

        let mut starting = Vec::with_capacity(count);
        for (index, identifier) in state_identifiers.iter().enumerate() {
            let value = match configured {
                None => None,
                Some(Value::Object(map)) if keyed => map.get(identifier.as_str()),
                Some(other) if keyed => {
                    return Err(base.contextualize(
                        ValidationError::invalid_shape("expected a map of state values")
                            .with_parameter(keys::VALUES)
                            .with_value(other.clone()),
                    ));
                }
                Some(value) => Some(value),
            };
            let state = match value {
                Some(value) => validator
                    .convert(value)
                    .map_err(|err| base.contextualize(values_error(err, value)))?,
                None => validator.default_state_for(index, count),
            };
            starting.push(state);
        }
        validator.validate_jointly(&starting).map_err(|err| {
            base.contextualize(values_error(err, configured.unwrap_or(&Value::Null)))
        })?;

        Ok(Self {
            state_identifiers,
            validator,
            starting,
        })
    }

    /// The state identifiers, in order.
    pub fn state_identifiers(&self) -> &[String] {
        &self.state_identifiers
    }

    /// The validator.
    pub fn validator(&self) -> &V {
        &self.validator
    }

    /// The configured or default starting states.
    pub fn starting(&self) -> &[V::State] {
        &self.starting
    }

    /// The starting states in untyped form.
    pub fn starting_states(&self) -> StateMap {
        self.state_identifiers
            .iter()
            .zip(&self.starting)
            .map(|(identifier, state)| (identifier.clone(), self.validator.to_value(state)))
            .collect()
    }

    /// Resolve the typed starting states from externally supplied values.
    ///
    /// Usable entries win over the configured starting values. If the
    /// combination is jointly invalid, every state falls back.
    pub fn resolve(&self, states: &StateMap) -> Vec<V::State> {
        let resolved: Vec<V::State> = self
            .state_identifiers
            .iter()
            .zip(&self.starting)
            .map(|(identifier, fallback)| {
                states
                    .get(identifier)
                    .and_then(|value| self.validator.convert(value).ok())
                    .unwrap_or_else(|| fallback.clone())
            })
            .collect();
        if self.validator.validate_jointly(&resolved).is_ok() {
            resolved
        } else {
            self.starting.clone()
        }
    }

    /// Rewrite `states` so every state identifier maps to a valid value.
    pub fn correct_states(&self, states: &mut StateMap) {
        let resolved = self.resolve(states);
        for (identifier, state) in self.state_identifiers.iter().zip(&resolved) {
            let corrected = self.validator.to_value(state);
            if states.get(identifier) != Some(&corrected) {
                tracing::trace!(
                    target: targets::MANAGER,
                    state = identifier.as_str(),
                    "starting state corrected"
                );
                states.insert(identifier.clone(), corrected);
            }
        }
    }

    /// Create the runtime core for one megawidget.
    ///
    /// The core receives its own copy of the validator.
    pub fn create_core(&self, params: &CreationParams) -> StatefulCore<V> {
        StatefulCore::new(
            self.state_identifiers.clone(),
            self.validator.clone(),
            self.resolve(&params.states),
            params.state_listener.clone(),
        )
    }
}

fn state_identifiers(
    identifier: &str,
    multi_state: bool,
) -> Result<Vec<String>, ValidationError> {
    if !multi_state {
        return Ok(vec![identifier.to_owned()]);
    }
    let mut identifiers: Vec<String> = Vec::new();
    for part in identifier.split(':') {
        if part.is_empty() {
            return Err(ValidationError::invalid_value("empty state identifier")
                .with_parameter(keys::IDENTIFIER)
                .with_value(Value::from(identifier)));
        }
        if identifiers.iter().any(|existing| existing == part) {
            return Err(ValidationError::new(
                megawidget_core::ValidationErrorKind::DuplicateIdentifier,
                format!("state identifier \"{part}\" is repeated"),
            )
            .with_parameter(keys::IDENTIFIER)
            .with_value(Value::from(identifier)));
        }
        identifiers.push(part.to_owned());
    }
    Ok(identifiers)
}

fn values_error(err: ValidationError, value: &Value) -> ValidationError {
    let err = if err.parameter().is_none() {
        err.with_parameter(keys::VALUES)
    } else {
        err
    };
    if err.value().is_none() {
        err.with_value(value.clone())
    } else {
        err
    }
}

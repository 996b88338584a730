//! Choice list validation, flat and hierarchical.

use std::collections::HashSet;

use megawidget_core::value::{self, keys, kind_name};
use megawidget_core::{ConfigMap, Value, ValidationError, ValidationErrorKind};

use super::{ChoicesValidator, StateValidator};
use crate::choices::{identifier_of, selection, ChoiceList, Selection};

/// How many choices a state may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly one choice (or none when the list is empty).
    Single,
    /// Any subset of the choices.
    Multiple,
}

/// What a pruned state falls back to when none of it survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneFallback {
    /// The first available choice.
    FirstAvailable,
    /// Nothing.
    Empty,
}

/// Validator for states drawn from a flat choice list.
///
/// The state is a list of choice identifiers. A bounded validator rejects
/// identifiers missing from its choices and prunes them after the choices
/// change; an unbounded one accepts them and folds them into its choices.
///
/// # Example
///
/// ```
/// use megawidget::choices::ChoiceList;
/// use megawidget::validator::{ChoicesValidator, FlatChoicesValidator, StateValidator};
/// use serde_json::json;
///
/// let choices = ChoiceList::parse_value(&json!(["A", "B", "C"]), false).unwrap();
/// let mut validator = FlatChoicesValidator::single(choices);
/// let state = validator.convert(&json!("B")).unwrap();
///
/// validator.set_available_choices(&json!(["A", "C"])).unwrap();
/// assert_eq!(validator.prune_to_state_value(&state), vec!["A".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FlatChoicesValidator {
    choices: ChoiceList,
    cardinality: Cardinality,
    fallback: PruneFallback,
    bounded: bool,
}

impl FlatChoicesValidator {
    /// Create a validator with an explicit policy.
    pub fn new(
        choices: ChoiceList,
        cardinality: Cardinality,
        fallback: PruneFallback,
        bounded: bool,
    ) -> Self {
        Self {
            choices,
            cardinality,
            fallback,
            bounded,
        }
    }

    /// Bounded single selection falling back to the first choice.
    pub fn single(choices: ChoiceList) -> Self {
        Self::new(choices, Cardinality::Single, PruneFallback::FirstAvailable, true)
    }

    /// Bounded multiple selection falling back to nothing.
    pub fn multiple(choices: ChoiceList) -> Self {
        Self::new(choices, Cardinality::Multiple, PruneFallback::Empty, true)
    }

    /// Unbounded multiple selection.
    pub fn unbounded(choices: ChoiceList) -> Self {
        Self::new(choices, Cardinality::Multiple, PruneFallback::Empty, false)
    }

    /// Build from the `choices` key of a configuration, applying the given policy.
    pub fn from_config(
        config: &ConfigMap,
        cardinality: Cardinality,
        fallback: PruneFallback,
        bounded: bool,
    ) -> Result<Self, ValidationError> {
        let mut validator = Self::new(ChoiceList::default(), cardinality, fallback, bounded);
        match value::optional_list(config, keys::CHOICES)? {
            Some(nodes) => {
                let choices = ChoiceList::parse(nodes, false)?;
                validator.check_choices(&choices, &Value::Array(nodes.clone()))?;
                validator.choices = choices;
            }
            None if validator.requires_choices() => {
                return Err(ValidationError::missing(keys::CHOICES));
            }
            None => {}
        }
        Ok(validator)
    }

    /// How many choices a state may hold.
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// The pruning fallback.
    pub fn fallback(&self) -> PruneFallback {
        self.fallback
    }

    fn requires_choices(&self) -> bool {
        self.bounded && self.cardinality == Cardinality::Single
    }

    fn check_choices(&self, choices: &ChoiceList, raw: &Value) -> Result<(), ValidationError> {
        if choices.is_empty() && self.requires_choices() {
            return Err(ValidationError::invalid_value("at least one choice is required")
                .with_parameter(keys::CHOICES)
                .with_value(raw.clone()));
        }
        Ok(())
    }

    fn fallback_state(&self) -> Vec<String> {
        match self.fallback {
            PruneFallback::FirstAvailable => self
                .choices
                .first()
                .map(|choice| vec![choice.identifier().to_owned()])
                .unwrap_or_default(),
            PruneFallback::Empty => Vec::new(),
        }
    }

    fn check_member(&self, identifier: String) -> Result<String, ValidationError> {
        if self.bounded && !self.choices.contains(&identifier) {
            return Err(ValidationError::invalid_value("not one of the available choices")
                .with_value(Value::String(identifier)));
        }
        Ok(identifier)
    }
}

impl StateValidator for FlatChoicesValidator {
    type State = Vec<String>;

    fn convert(&self, value: &Value) -> Result<Vec<String>, ValidationError> {
        match (self.cardinality, value) {
            (Cardinality::Single, Value::String(_) | Value::Object(_)) => {
                Ok(vec![self.check_member(identifier_of(value)?)?])
            }
            (Cardinality::Single, other) => Err(ValidationError::invalid_shape(format!(
                "expected a choice identifier, got {}",
                kind_name(other)
            ))
            .with_value(other.clone())),
            (Cardinality::Multiple, Value::Null) => Ok(Vec::new()),
            (Cardinality::Multiple, Value::String(_)) => {
                Ok(vec![self.check_member(identifier_of(value)?)?])
            }
            (Cardinality::Multiple, Value::Array(nodes)) => {
                let mut seen = HashSet::new();
                let mut state = Vec::with_capacity(nodes.len());
                for node in nodes {
                    let identifier = self.check_member(identifier_of(node)?)?;
                    if !seen.insert(identifier.clone()) {
                        return Err(ValidationError::new(
                            ValidationErrorKind::DuplicateIdentifier,
                            "choice is selected more than once",
                        )
                        .with_value(Value::String(identifier)));
                    }
                    state.push(identifier);
                }
                // A bounded selection is a set; keep it in choice order.
                if self.bounded {
                    state.sort_by_key(|identifier| self.choices.position(identifier));
                }
                Ok(state)
            }
            (Cardinality::Multiple, other) => Err(ValidationError::invalid_shape(format!(
                "expected a list of choice identifiers, got {}",
                kind_name(other)
            ))
            .with_value(other.clone())),
        }
    }

    fn to_value(&self, state: &Vec<String>) -> Value {
        match self.cardinality {
            Cardinality::Single => state
                .first()
                .map(|identifier| Value::String(identifier.clone()))
                .unwrap_or(Value::Null),
            Cardinality::Multiple => {
                Value::Array(state.iter().cloned().map(Value::String).collect())
            }
        }
    }

    fn default_state(&self) -> Vec<String> {
        self.fallback_state()
    }

    fn prune_to_state_value(&self, state: &Vec<String>) -> Vec<String> {
        if !self.bounded {
            return state.clone();
        }
        let surviving: Vec<String> = state
            .iter()
            .filter(|identifier| self.choices.contains(identifier))
            .cloned()
            .collect();
        let complete = match self.cardinality {
            Cardinality::Single => surviving.len() == 1,
            Cardinality::Multiple => !surviving.is_empty() || state.is_empty(),
        };
        if complete {
            surviving
        } else {
            self.fallback_state()
        }
    }

    fn admit(&mut self, state: &Vec<String>) {
        if self.bounded {
            return;
        }
        for identifier in state {
            if self.choices.admit(identifier) {
                tracing::trace!(
                    target: megawidget_core::logging::targets::CHOICES,
                    identifier = identifier.as_str(),
                    "folded value into unbounded choices"
                );
            }
        }
    }
}

impl ChoicesValidator for FlatChoicesValidator {
    fn available_choices(&self) -> &ChoiceList {
        &self.choices
    }

    fn set_available_choices(&mut self, choices: &Value) -> Result<(), ValidationError> {
        let parsed = ChoiceList::parse_value(choices, false)?;
        self.check_choices(&parsed, choices)?;
        self.choices = parsed;
        Ok(())
    }

    fn is_bounded(&self) -> bool {
        self.bounded
    }
}

/// Validator for selections within a choice tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HierarchicalChoicesValidator {
    choices: ChoiceList,
}

impl HierarchicalChoicesValidator {
    /// Create a validator over a choice tree.
    pub fn new(choices: ChoiceList) -> Self {
        Self { choices }
    }

    /// Build from the mandatory `choices` key of a configuration.
    pub fn from_config(config: &ConfigMap) -> Result<Self, ValidationError> {
        let nodes = value::optional_list(config, keys::CHOICES)?
            .ok_or_else(|| ValidationError::missing(keys::CHOICES))?;
        Ok(Self::new(ChoiceList::parse(nodes, true)?))
    }
}

impl StateValidator for HierarchicalChoicesValidator {
    type State = Vec<Selection>;

    fn convert(&self, value: &Value) -> Result<Vec<Selection>, ValidationError> {
        selection::parse(value, self.choices.choices())
    }

    fn to_value(&self, state: &Vec<Selection>) -> Value {
        selection::to_value(state)
    }

    fn default_state(&self) -> Vec<Selection> {
        Vec::new()
    }

    fn prune_to_state_value(&self, state: &Vec<Selection>) -> Vec<Selection> {
        selection::prune(state, self.choices.choices())
    }
}

impl ChoicesValidator for HierarchicalChoicesValidator {
    fn available_choices(&self) -> &ChoiceList {
        &self.choices
    }

    fn set_available_choices(&mut self, choices: &Value) -> Result<(), ValidationError> {
        self.choices = ChoiceList::parse_value(choices, true)?;
        Ok(())
    }

    fn is_bounded(&self) -> bool {
        true
    }
}

//! The choice model.
//!
//! A choice list is configured as a list whose elements are either plain
//! strings or maps. Both forms are parsed once into [`Choice`] values, so
//! later code never inspects raw configuration again:
//!
//! ```text
//! "Red"                                   -> Leaf { identifier: "Red", name: "Red" }
//! {"name": "Green", "identifier": "g"}    -> Leaf { identifier: "g", name: "Green" }
//! {"name": "Shades", "children": [...]}   -> Branch { identifier: "Shades", ... }
//! ```
//!
//! When a map omits `identifier`, its `name` serves as the identifier.
//! Identifiers are unique among siblings.

pub mod selection;

use std::collections::HashSet;

use megawidget_core::value::{self, keys, kind_name};
use megawidget_core::{ConfigMap, Value, ValidationError, ValidationErrorKind};

pub use selection::{synchronize_nodes, SelectableNode, Selection};

/// One element of a choice list.
#[derive(Debug, Clone, PartialEq)]
pub enum Choice {
    /// A selectable value.
    Leaf {
        /// Identifier, unique among siblings.
        identifier: String,
        /// Display name.
        name: String,
        /// Optional caller data attached to the choice.
        payload: Option<Value>,
    },
    /// A named node owning further choices.
    Branch {
        /// Identifier, unique among siblings.
        identifier: String,
        /// Display name.
        name: String,
        /// Child choices, in order.
        children: Vec<Choice>,
    },
}

impl Choice {
    /// A leaf whose identifier and name are both `text`.
    pub fn leaf(text: impl Into<String>) -> Self {
        let text = text.into();
        Choice::Leaf {
            identifier: text.clone(),
            name: text,
            payload: None,
        }
    }

    /// Parse one configured choice element.
    ///
    /// Branches are only accepted when `hierarchical` is set.
    pub fn parse(node: &Value, hierarchical: bool) -> Result<Self, ValidationError> {
        let map = match node {
            Value::String(text) if text.is_empty() => {
                return Err(ValidationError::invalid_value("choice name must not be empty")
                    .with_parameter(keys::CHOICES)
                    .with_value(node.clone()));
            }
            Value::String(text) => return Ok(Choice::leaf(text.as_str())),
            Value::Object(map) => map,
            other => {
                return Err(ValidationError::invalid_shape(format!(
                    "choice must be a string or a map, got {}",
                    kind_name(other)
                ))
                .with_parameter(keys::CHOICES)
                .with_value(other.clone()));
            }
        };

        let name = name_in(map, node)?;
        let identifier = value::optional_string(map, keys::IDENTIFIER)?
            .filter(|identifier| !identifier.is_empty())
            .unwrap_or(name.as_str())
            .to_owned();

        match value::optional_list(map, keys::CHOICE_CHILDREN)? {
            Some(children) if hierarchical => {
                let children = ChoiceList::parse(children, true)?.into_choices();
                Ok(Choice::Branch {
                    identifier,
                    name,
                    children,
                })
            }
            Some(_) => Err(ValidationError::invalid_shape("this choice list does not nest")
                .with_parameter(keys::CHOICE_CHILDREN)
                .with_value(node.clone())),
            None => Ok(Choice::Leaf {
                identifier,
                name,
                payload: map.get(keys::CHOICE_PAYLOAD).cloned(),
            }),
        }
    }

    /// The identifier.
    pub fn identifier(&self) -> &str {
        match self {
            Choice::Leaf { identifier, .. } | Choice::Branch { identifier, .. } => identifier,
        }
    }

    /// The display name.
    pub fn name(&self) -> &str {
        match self {
            Choice::Leaf { name, .. } | Choice::Branch { name, .. } => name,
        }
    }

    /// The payload of a leaf.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Choice::Leaf { payload, .. } => payload.as_ref(),
            Choice::Branch { .. } => None,
        }
    }

    /// Child choices; empty for a leaf.
    pub fn children(&self) -> &[Choice] {
        match self {
            Choice::Leaf { .. } => &[],
            Choice::Branch { children, .. } => children,
        }
    }

    /// Whether this is a branch.
    pub fn is_branch(&self) -> bool {
        matches!(self, Choice::Branch { .. })
    }

    /// The configuration form of this choice.
    ///
    /// A leaf whose identifier equals its name and carries no payload is
    /// written as a plain string.
    pub fn to_value(&self) -> Value {
        match self {
            Choice::Leaf {
                identifier,
                name,
                payload: None,
            } if identifier == name => Value::String(name.clone()),
            Choice::Leaf {
                identifier,
                name,
                payload,
            } => {
                let mut map = ConfigMap::new();
                map.insert(keys::IDENTIFIER.into(), Value::String(identifier.clone()));
                map.insert(keys::CHOICE_NAME.into(), Value::String(name.clone()));
                if let Some(payload) = payload {
                    map.insert(keys::CHOICE_PAYLOAD.into(), payload.clone());
                }
                Value::Object(map)
            }
            Choice::Branch {
                identifier,
                name,
                children,
            } => {
                let mut map = ConfigMap::new();
                map.insert(keys::IDENTIFIER.into(), Value::String(identifier.clone()));
                map.insert(keys::CHOICE_NAME.into(), Value::String(name.clone()));
                map.insert(
                    keys::CHOICE_CHILDREN.into(),
                    Value::Array(children.iter().map(Choice::to_value).collect()),
                );
                Value::Object(map)
            }
        }
    }
}

fn name_in(map: &ConfigMap, node: &Value) -> Result<String, ValidationError> {
    let name = value::optional_string(map, keys::CHOICE_NAME)?
        .or(value::optional_string(map, keys::IDENTIFIER)?);
    match name {
        Some(name) if !name.is_empty() => Ok(name.to_owned()),
        _ => Err(ValidationError::missing(keys::CHOICE_NAME).with_value(node.clone())),
    }
}

/// Resolve a choice element, given as a string or a map, to its display name.
pub fn name_of(node: &Value) -> Result<String, ValidationError> {
    match node {
        Value::String(text) => Ok(text.clone()),
        Value::Object(map) => name_in(map, node),
        other => Err(ValidationError::invalid_shape(format!(
            "choice must be a string or a map, got {}",
            kind_name(other)
        ))
        .with_value(other.clone())),
    }
}

/// Resolve a choice element, given as a string or a map, to its identifier.
///
/// A map without an `identifier` falls back to its `name`.
pub fn identifier_of(node: &Value) -> Result<String, ValidationError> {
    match node {
        Value::Object(map) => match value::optional_string(map, keys::IDENTIFIER)? {
            Some(identifier) if !identifier.is_empty() => Ok(identifier.to_owned()),
            _ => name_in(map, node),
        },
        other => name_of(other),
    }
}

/// An ordered list of sibling choices with unique identifiers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChoiceList {
    choices: Vec<Choice>,
}

impl ChoiceList {
    /// Parse a configured choice list, checking sibling uniqueness at every level.
    pub fn parse(nodes: &[Value], hierarchical: bool) -> Result<Self, ValidationError> {
        let choices = nodes
            .iter()
            .map(|node| Choice::parse(node, hierarchical))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_choices(choices)
    }

    /// Parse a choice list given as an untyped value.
    pub fn parse_value(value: &Value, hierarchical: bool) -> Result<Self, ValidationError> {
        match value {
            Value::Array(nodes) => Self::parse(nodes, hierarchical),
            other => Err(ValidationError::invalid_shape(format!(
                "expected a list of choices, got {}",
                kind_name(other)
            ))
            .with_parameter(keys::CHOICES)
            .with_value(other.clone())),
        }
    }

    /// Wrap already-built choices, checking sibling uniqueness.
    pub fn from_choices(choices: Vec<Choice>) -> Result<Self, ValidationError> {
        let mut seen = HashSet::new();
        for choice in &choices {
            if !seen.insert(choice.identifier()) {
                return Err(ValidationError::new(
                    ValidationErrorKind::DuplicateIdentifier,
                    "choice identifier is used more than once",
                )
                .with_parameter(keys::CHOICES)
                .with_value(Value::String(choice.identifier().to_owned())));
            }
        }
        Ok(Self { choices })
    }

    /// The choices, in order.
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    /// Consume the list, returning its choices.
    pub fn into_choices(self) -> Vec<Choice> {
        self.choices
    }

    /// Number of top-level choices.
    pub fn len(&self) -> usize {
        self.choices.len()
    }

    /// Whether there are no choices.
    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// The first choice.
    pub fn first(&self) -> Option<&Choice> {
        self.choices.first()
    }

    /// Find a top-level choice by identifier.
    pub fn find(&self, identifier: &str) -> Option<&Choice> {
        self.choices.iter().find(|choice| choice.identifier() == identifier)
    }

    /// Index of the top-level choice with this identifier.
    pub fn position(&self, identifier: &str) -> Option<usize> {
        self.choices
            .iter()
            .position(|choice| choice.identifier() == identifier)
    }

    /// Whether a top-level choice has this identifier.
    pub fn contains(&self, identifier: &str) -> bool {
        self.find(identifier).is_some()
    }

    /// Top-level identifiers, in order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.choices.iter().map(Choice::identifier)
    }

    /// Append a leaf for `identifier` unless one already exists.
    ///
    /// Returns `true` if the list grew.
    pub fn admit(&mut self, identifier: &str) -> bool {
        if self.contains(identifier) {
            return false;
        }
        self.choices.push(Choice::leaf(identifier));
        true
    }

    /// The configuration form of the list.
    pub fn to_value(&self) -> Value {
        Value::Array(self.choices.iter().map(Choice::to_value).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn list(value: Value, hierarchical: bool) -> Result<ChoiceList, ValidationError> {
        ChoiceList::parse_value(&value, hierarchical)
    }

    #[test]
    fn test_parse_strings_and_maps() {
        let choices = list(
            json!(["Red", {"name": "Green", "identifier": "g"}, {"name": "Blue", "payload": 3}]),
            false,
        )
        .unwrap();
        let ids: Vec<&str> = choices.identifiers().collect();
        assert_eq!(ids, vec!["Red", "g", "Blue"]);
        assert_eq!(choices.find("g").map(Choice::name), Some("Green"));
        assert_eq!(choices.find("Blue").and_then(Choice::payload), Some(&json!(3)));
    }

    #[test]
    fn test_parse_rejects_duplicates() {
        let err = list(json!(["a", {"name": "b", "identifier": "a"}]), false).unwrap_err();
        assert_eq!(err.kind(), ValidationErrorKind::DuplicateIdentifier);
        assert_eq!(err.value(), Some(&json!("a")));
    }

    #[test]
    fn test_duplicates_allowed_across_levels() {
        let choices = list(json!([{"name": "x", "children": ["x", "y"]}, "y"]), true).unwrap();
        assert_eq!(choices.len(), 2);
        assert_eq!(choices.first().map(|c| c.children().len()), Some(2));
    }

    #[test]
    fn test_nested_duplicates_rejected() {
        let err = list(json!([{"name": "x", "children": ["y", "y"]}]), true).unwrap_err();
        assert_eq!(err.kind(), ValidationErrorKind::DuplicateIdentifier);
    }

    #[test]
    fn test_flat_list_rejects_children() {
        let err = list(json!([{"name": "x", "children": ["y"]}]), false).unwrap_err();
        assert_eq!(err.kind(), ValidationErrorKind::InvalidShape);
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        assert_eq!(
            list(json!([1]), false).unwrap_err().kind(),
            ValidationErrorKind::InvalidShape
        );
        assert_eq!(
            list(json!("a"), false).unwrap_err().kind(),
            ValidationErrorKind::InvalidShape
        );
        assert_eq!(
            list(json!([{"payload": 1}]), false).unwrap_err().kind(),
            ValidationErrorKind::MissingValue
        );
        assert_eq!(
            list(json!([""]), false).unwrap_err().kind(),
            ValidationErrorKind::InvalidValue
        );
    }

    #[test]
    fn test_name_and_identifier_of() {
        assert_eq!(name_of(&json!("a")).unwrap(), "a");
        assert_eq!(identifier_of(&json!("a")).unwrap(), "a");
        let node = json!({"name": "Long Name", "identifier": "short"});
        assert_eq!(name_of(&node).unwrap(), "Long Name");
        assert_eq!(identifier_of(&node).unwrap(), "short");
        assert_eq!(identifier_of(&json!({"name": "only"})).unwrap(), "only");
        assert!(identifier_of(&json!(5)).is_err());
    }

    #[test]
    fn test_to_value_preserves_form() {
        let source = json!(["a", {"identifier": "b", "name": "Bee"}]);
        let choices = list(source.clone(), false).unwrap();
        assert_eq!(choices.to_value(), source);
    }

    #[test]
    fn test_admit() {
        let mut choices = list(json!(["a"]), false).unwrap();
        assert!(!choices.admit("a"));
        assert!(choices.admit("z"));
        assert_eq!(choices.identifiers().collect::<Vec<_>>(), vec!["a", "z"]);
    }
}

//! Hierarchical selections.
//!
//! The state of a hierarchical choice control is a structurally parallel
//! subset of its choice tree. A leaf is selected by membership. A branch is
//! selected by virtue of having selected descendants, and is recorded as a
//! node carrying its own child subset:
//!
//! ```text
//! choices                      selection
//! ├── Fruit                    ├── Fruit
//! │   ├── Apple                │   └── Pear
//! │   └── Pear                 └── Bread
//! ├── Bread
//! └── Cheese
//! ```
//!
//! Selections never contain empty branches.

use std::collections::HashSet;

use megawidget_core::value::{self, keys, kind_name};
use megawidget_core::{ConfigMap, Value, ValidationError, ValidationErrorKind};

use super::{identifier_of, Choice};

/// One selected element of a choice tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A selected leaf.
    Leaf(String),
    /// A branch with selected descendants.
    Branch {
        /// Identifier of the branch choice.
        identifier: String,
        /// The selected subset of the branch's children.
        children: Vec<Selection>,
    },
}

impl Selection {
    /// Select `choice` together with its whole subtree.
    ///
    /// Returns `None` for a branch with no leaves below it.
    pub fn covering(choice: &Choice) -> Option<Self> {
        match choice {
            Choice::Leaf { identifier, .. } => Some(Selection::Leaf(identifier.clone())),
            Choice::Branch {
                identifier,
                children,
                ..
            } => {
                let children: Vec<Selection> = children.iter().filter_map(Self::covering).collect();
                (!children.is_empty()).then(|| Selection::Branch {
                    identifier: identifier.clone(),
                    children,
                })
            }
        }
    }

    /// The identifier of the selected choice.
    pub fn identifier(&self) -> &str {
        match self {
            Selection::Leaf(identifier) | Selection::Branch { identifier, .. } => identifier,
        }
    }

    /// The selected children; empty for a leaf.
    pub fn children(&self) -> &[Selection] {
        match self {
            Selection::Leaf(_) => &[],
            Selection::Branch { children, .. } => children,
        }
    }

    /// The configuration form of this selection.
    pub fn to_value(&self) -> Value {
        match self {
            Selection::Leaf(identifier) => Value::String(identifier.clone()),
            Selection::Branch {
                identifier,
                children,
            } => {
                let mut map = ConfigMap::new();
                map.insert(keys::IDENTIFIER.into(), Value::String(identifier.clone()));
                map.insert(keys::CHOICE_CHILDREN.into(), to_value(children));
                Value::Object(map)
            }
        }
    }
}

/// The configuration form of a list of selections.
pub fn to_value(selections: &[Selection]) -> Value {
    Value::Array(selections.iter().map(Selection::to_value).collect())
}

/// Parse a selection against a choice tree.
///
/// Elements are identifiers (a branch identifier selects the whole subtree)
/// or maps with an `identifier` and an optional `children` list that
/// narrows the branch to a subset. Unknown identifiers are rejected.
pub fn parse(value: &Value, choices: &[Choice]) -> Result<Vec<Selection>, ValidationError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(nodes) => parse_level(nodes, choices),
        other => Err(ValidationError::invalid_shape(format!(
            "expected a list of selected choices, got {}",
            kind_name(other)
        ))
        .with_value(other.clone())),
    }
}

fn parse_level(nodes: &[Value], choices: &[Choice]) -> Result<Vec<Selection>, ValidationError> {
    let mut seen = HashSet::new();
    let mut selections = Vec::with_capacity(nodes.len());
    for node in nodes {
        let identifier = identifier_of(node)?;
        if !seen.insert(identifier.clone()) {
            return Err(ValidationError::new(
                ValidationErrorKind::DuplicateIdentifier,
                "choice is selected more than once",
            )
            .with_value(Value::String(identifier)));
        }

        let choice = choices
            .iter()
            .find(|choice| choice.identifier() == identifier)
            .ok_or_else(|| {
                ValidationError::invalid_value("not one of the available choices")
                    .with_value(Value::String(identifier.clone()))
            })?;

        let narrowed = match node {
            Value::Object(map) => value::optional_list(map, keys::CHOICE_CHILDREN)?,
            _ => None,
        };
        let selection = match (narrowed, choice) {
            (None, choice) => Selection::covering(choice),
            (Some(children), Choice::Branch { children: available, .. }) => {
                let children = parse_level(children, available)?;
                (!children.is_empty()).then_some(Selection::Branch {
                    identifier,
                    children,
                })
            }
            (Some(_), Choice::Leaf { .. }) => {
                return Err(ValidationError::invalid_shape("a leaf choice has no children")
                    .with_parameter(keys::CHOICE_CHILDREN)
                    .with_value(node.clone()));
            }
        };
        selections.extend(selection);
    }
    Ok(selections)
}

/// Prune a selection against a revised choice tree.
///
/// Elements whose identifier no longer exists, or whose choice changed
/// between leaf and branch, are removed. Surviving elements keep their
/// relative nesting, and branches left without selections are dropped.
pub fn prune(selections: &[Selection], choices: &[Choice]) -> Vec<Selection> {
    selections
        .iter()
        .filter_map(|selection| {
            let choice = choices
                .iter()
                .find(|choice| choice.identifier() == selection.identifier())?;
            match (selection, choice) {
                (Selection::Leaf(_), Choice::Leaf { .. }) => Some(selection.clone()),
                (
                    Selection::Branch {
                        identifier,
                        children,
                    },
                    Choice::Branch {
                        children: available,
                        ..
                    },
                ) => {
                    let children = prune(children, available);
                    (!children.is_empty()).then(|| Selection::Branch {
                        identifier: identifier.clone(),
                        children,
                    })
                }
                _ => None,
            }
        })
        .collect()
}

/// A rendered node that mirrors one choice.
///
/// Rendering collaborators implement this for their tree nodes so that
/// [`synchronize_nodes`] can push a selection into them.
pub trait SelectableNode {
    /// Identifier of the choice this node renders.
    fn identifier(&self) -> &str;

    /// Set the selected flag of a leaf node.
    fn set_selected(&mut self, selected: bool);

    /// Child nodes of a branch node; `None` for a leaf.
    fn children_mut(&mut self) -> Option<&mut [Self]>
    where
        Self: Sized;
}

/// Synchronize rendered nodes to a selection.
///
/// Walks both trees in lock-step by identifier: each leaf's selected flag is
/// set from membership, and each branch is recursed into with its matching
/// subset of the selection, or an empty one if nothing below it is selected.
pub fn synchronize_nodes<N: SelectableNode>(nodes: &mut [N], selections: &[Selection]) {
    for node in nodes {
        let entry = selections
            .iter()
            .find(|selection| selection.identifier() == node.identifier());
        match node.children_mut() {
            Some(children) => synchronize_nodes(children, entry.map_or(&[][..], Selection::children)),
            None => node.set_selected(entry.is_some()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choices::ChoiceList;
    use serde_json::json;

    fn tree() -> ChoiceList {
        ChoiceList::parse_value(
            &json!([
                {"name": "Fruit", "children": ["Apple", "Pear", {"name": "Citrus", "children": ["Lime", "Lemon"]}]},
                "Bread",
                "Cheese"
            ]),
            true,
        )
        .unwrap()
    }

    #[derive(Debug)]
    struct Node {
        id: &'static str,
        selected: bool,
        children: Option<Vec<Node>>,
    }

    impl Node {
        fn leaf(id: &'static str) -> Self {
            Self {
                id,
                selected: false,
                children: None,
            }
        }

        fn branch(id: &'static str, children: Vec<Node>) -> Self {
            Self {
                id,
                selected: false,
                children: Some(children),
            }
        }
    }

    impl SelectableNode for Node {
        fn identifier(&self) -> &str {
            self.id
        }

        fn set_selected(&mut self, selected: bool) {
            self.selected = selected;
        }

        fn children_mut(&mut self) -> Option<&mut [Self]> {
            self.children.as_deref_mut()
        }
    }

    #[test]
    fn test_branch_identifier_selects_subtree() {
        let choices = tree();
        let selection = parse(&json!(["Fruit"]), choices.choices()).unwrap();
        assert_eq!(
            to_value(&selection),
            json!([{"identifier": "Fruit", "children": [
                "Apple", "Pear", {"identifier": "Citrus", "children": ["Lime", "Lemon"]}
            ]}])
        );
    }

    #[test]
    fn test_narrowed_branch() {
        let choices = tree();
        let selection = parse(
            &json!([{"identifier": "Fruit", "children": ["Pear"]}, "Bread"]),
            choices.choices(),
        )
        .unwrap();
        assert_eq!(selection.len(), 2);
        assert_eq!(selection[0].children(), &[Selection::Leaf("Pear".into())]);
    }

    #[test]
    fn test_parse_rejects_unknown_and_duplicates() {
        let choices = tree();
        let unknown = parse(&json!(["Milk"]), choices.choices()).unwrap_err();
        assert_eq!(unknown.kind(), ValidationErrorKind::InvalidValue);

        let nested = parse(
            &json!([{"identifier": "Fruit", "children": ["Milk"]}]),
            choices.choices(),
        )
        .unwrap_err();
        assert_eq!(nested.kind(), ValidationErrorKind::InvalidValue);

        let duplicate = parse(&json!(["Bread", "Bread"]), choices.choices()).unwrap_err();
        assert_eq!(duplicate.kind(), ValidationErrorKind::DuplicateIdentifier);

        let leaf_children = parse(
            &json!([{"identifier": "Bread", "children": []}]),
            choices.choices(),
        )
        .unwrap_err();
        assert_eq!(leaf_children.kind(), ValidationErrorKind::InvalidShape);
    }

    #[test]
    fn test_empty_narrowing_is_dropped() {
        let choices = tree();
        let selection = parse(
            &json!([{"identifier": "Fruit", "children": []}]),
            choices.choices(),
        )
        .unwrap();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_prune_keeps_surviving_nesting() {
        let choices = tree();
        let selection = parse(
            &json!([{"identifier": "Fruit", "children": ["Apple", {"identifier": "Citrus", "children": ["Lime"]}]}, "Cheese"]),
            choices.choices(),
        )
        .unwrap();

        let revised = ChoiceList::parse_value(
            &json!([
                {"name": "Fruit", "children": ["Pear", {"name": "Citrus", "children": ["Lime"]}]},
                "Cheese"
            ]),
            true,
        )
        .unwrap();
        let pruned = prune(&selection, revised.choices());
        assert_eq!(
            to_value(&pruned),
            json!([
                {"identifier": "Fruit", "children": [{"identifier": "Citrus", "children": ["Lime"]}]},
                "Cheese"
            ])
        );
    }

    #[test]
    fn test_prune_drops_emptied_branches_and_kind_changes() {
        let choices = tree();
        let selection = parse(&json!([{"identifier": "Fruit", "children": ["Apple"]}, "Bread"]), choices.choices()).unwrap();
        let revised = ChoiceList::parse_value(
            &json!([{"name": "Fruit", "children": ["Pear"]}, {"name": "Bread", "children": ["Rye"]}]),
            true,
        )
        .unwrap();
        assert!(prune(&selection, revised.choices()).is_empty());
    }

    #[test]
    fn test_synchronize_nodes() {
        let choices = tree();
        let selection = parse(
            &json!([{"identifier": "Fruit", "children": ["Pear"]}, "Cheese"]),
            choices.choices(),
        )
        .unwrap();
        let mut nodes = vec![
            Node::branch(
                "Fruit",
                vec![
                    Node::leaf("Apple"),
                    Node::leaf("Pear"),
                    Node::branch("Citrus", vec![Node::leaf("Lime"), Node::leaf("Lemon")]),
                ],
            ),
            Node::leaf("Bread"),
            Node::leaf("Cheese"),
        ];
        nodes[1].selected = true;
        if let Some(children) = nodes[0].children.as_mut() {
            children[0].selected = true;
        }

        synchronize_nodes(&mut nodes, &selection);

        let fruit = nodes[0].children.as_ref().unwrap();
        assert!(!fruit[0].selected);
        assert!(fruit[1].selected);
        assert!(fruit[2].children.as_ref().unwrap().iter().all(|n| !n.selected));
        assert!(!nodes[1].selected);
        assert!(nodes[2].selected);
    }
}

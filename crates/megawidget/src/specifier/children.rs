//! Child specifier management and identifier uniqueness.

use std::collections::HashSet;
use std::sync::Arc;

use megawidget_core::logging::targets;
use megawidget_core::value::{self, keys};
use megawidget_core::{SpecificationError, SpecificationErrorKind, Value};

use super::{Specifier, SpecifierFactory};
use crate::capability::Capabilities;

/// The ordered children of a container specifier.
///
/// Every child must provide the required capabilities, and every identifier
/// claimed within the subtree, including state identifiers of multi-state
/// children, is unique.
#[derive(Debug, Clone, Default)]
pub struct ChildSpecifiersManager {
    required: Capabilities,
    children: Vec<Arc<dyn Specifier>>,
    claimed: HashSet<String>,
}

impl ChildSpecifiersManager {
    /// Create an empty manager whose children must provide `required`.
    pub fn new(required: Capabilities) -> Self {
        Self {
            required,
            children: Vec::new(),
            claimed: HashSet::new(),
        }
    }

    /// Build every child configuration in `configs` through `factory`.
    ///
    /// `parameter` names the configuration key the list came from. A child
    /// failure is wrapped in an [`SpecificationErrorKind::InvalidChild`]
    /// error carrying the failure as its cause.
    pub fn build(
        factory: &SpecifierFactory,
        required: Capabilities,
        configs: &[Value],
        parameter: &str,
    ) -> Result<Self, SpecificationError> {
        let mut manager = Self::new(required);
        for config in configs {
            let config = value::as_config_map(config, parameter)?;
            let child = factory.create_specifier(required, config).map_err(|cause| {
                SpecificationError::new(
                    SpecificationErrorKind::InvalidChild,
                    format!("invalid child specifier: {}", cause.message()),
                )
                .with_parameter(parameter)
                .with_value(Value::Object(config.clone()))
                .with_cause(cause)
            })?;
            manager
                .add(child)
                .map_err(|err| err.with_parameter(parameter))?;
        }
        Ok(manager)
    }

    /// Build the children listed under the `fields` key, if any.
    pub fn from_fields(
        factory: &SpecifierFactory,
        required: Capabilities,
        config: &megawidget_core::ConfigMap,
    ) -> Result<Self, SpecificationError> {
        match value::optional_list(config, keys::FIELDS)? {
            Some(configs) => Self::build(factory, required, configs, keys::FIELDS),
            None => Ok(Self::new(required)),
        }
    }

    /// Append a child.
    pub fn add(&mut self, child: Arc<dyn Specifier>) -> Result<(), SpecificationError> {
        if !child.capabilities().contains(self.required) {
            return Err(SpecificationError::new(
                SpecificationErrorKind::WrongCapability,
                format!(
                    "child lacks required capabilities {}",
                    child.capabilities().missing(self.required)
                ),
            )
            .in_context(Some(child.identifier()), Some(child.type_name())));
        }

        let mut incoming = Vec::new();
        let mut duplicate = None;
        for_each_specifier(std::slice::from_ref(&child), &mut |specifier| {
            for identifier in claimed_identifiers(specifier) {
                if duplicate.is_none()
                    && (self.claimed.contains(identifier) || incoming.contains(&identifier))
                {
                    duplicate = Some(duplicate_error(specifier, identifier));
                }
                incoming.push(identifier);
            }
        });
        if let Some(err) = duplicate {
            return Err(err);
        }

        self.claimed
            .extend(incoming.into_iter().map(str::to_owned));
        self.children.push(child);
        Ok(())
    }

    /// The children, in order.
    pub fn children(&self) -> &[Arc<dyn Specifier>] {
        &self.children
    }

    /// The capabilities every child provides.
    pub fn required_capabilities(&self) -> Capabilities {
        self.required
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether there are no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Visit every specifier of a forest depth-first, parents before children.
pub fn for_each_specifier<'a>(
    roots: &'a [Arc<dyn Specifier>],
    visit: &mut dyn FnMut(&'a dyn Specifier),
) {
    for specifier in roots {
        visit(specifier.as_ref());
        if let Some(container) = specifier.as_container() {
            for_each_specifier(container.child_specifiers(), visit);
        }
    }
}

/// Check that no identifier is claimed twice anywhere in a forest.
///
/// The first collision in depth-first order is reported.
pub fn check_unique_identifiers(roots: &[Arc<dyn Specifier>]) -> Result<(), SpecificationError> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut duplicate = None;
    for_each_specifier(roots, &mut |specifier| {
        for identifier in claimed_identifiers(specifier) {
            if !seen.insert(identifier) && duplicate.is_none() {
                duplicate = Some(duplicate_error(specifier, identifier));
            }
        }
    });
    match duplicate {
        Some(err) => {
            tracing::debug!(target: targets::MANAGER, error = %err, "duplicate identifier");
            Err(err)
        }
        None => Ok(()),
    }
}

/// The specifier identifier plus any distinct state identifiers.
fn claimed_identifiers(specifier: &dyn Specifier) -> Vec<&str> {
    let mut claimed = vec![specifier.identifier()];
    if let Some(stateful) = specifier.as_stateful() {
        for identifier in stateful.state_identifiers() {
            if !claimed.contains(&identifier.as_str()) {
                claimed.push(identifier);
            }
        }
    }
    claimed
}

fn duplicate_error(specifier: &dyn Specifier, identifier: &str) -> SpecificationError {
    SpecificationError::new(
        SpecificationErrorKind::DuplicateIdentifier,
        format!("identifier \"{identifier}\" is used more than once"),
    )
    .with_parameter(keys::IDENTIFIER)
    .with_value(Value::from(identifier))
    .in_context(Some(specifier.identifier()), Some(specifier.type_name()))
}

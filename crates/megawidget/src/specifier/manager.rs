//! The top-level specifier entry point.

use std::sync::Arc;

use megawidget_core::logging::{span_names, targets, DebugTreeNode, TreeDebug, TreeFormatOptions};
use megawidget_core::value;
use megawidget_core::{ConfigMap, PerfSpan, SpecificationError, StateMap, Value};

use super::{check_unique_identifiers, for_each_specifier, Specifier, SpecifierFactory};
use crate::capability::Capabilities;
use crate::runtime::{CreationParams, Megawidget};

/// Builds and owns a forest of specifiers.
///
/// Construction is all-or-nothing: if any specifier fails to build, or any
/// identifier is claimed twice anywhere in the forest, nothing is kept.
#[derive(Debug, Clone)]
pub struct SpecifierManager {
    specifiers: Vec<Arc<dyn Specifier>>,
    required: Capabilities,
}

impl SpecifierManager {
    /// Build one specifier per configuration map.
    pub fn new(
        factory: &SpecifierFactory,
        configs: &[ConfigMap],
        required: Capabilities,
    ) -> Result<Self, SpecificationError> {
        let _span = PerfSpan::new(span_names::BUILD);
        let specifiers = configs
            .iter()
            .map(|config| factory.create_specifier(required, config))
            .collect::<Result<Vec<_>, _>>()?;
        check_unique_identifiers(&specifiers)?;
        tracing::debug!(
            target: targets::MANAGER,
            count = specifiers.len(),
            "built specifier forest"
        );
        Ok(Self {
            specifiers,
            required,
        })
    }

    /// Build from a list of untyped values, each of which must be a map.
    pub fn from_values(
        factory: &SpecifierFactory,
        configs: &[Value],
        required: Capabilities,
    ) -> Result<Self, SpecificationError> {
        let configs = configs
            .iter()
            .map(|config| value::as_config_map(config, "specifiers").cloned())
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(factory, &configs, required)
    }

    /// The top-level specifiers, in order.
    pub fn specifiers(&self) -> &[Arc<dyn Specifier>] {
        &self.specifiers
    }

    /// The capabilities every top-level specifier provides.
    pub fn required_capabilities(&self) -> Capabilities {
        self.required
    }

    /// Find a specifier anywhere in the forest.
    pub fn find(&self, identifier: &str) -> Option<&dyn Specifier> {
        let mut found = None;
        for_each_specifier(&self.specifiers, &mut |specifier| {
            if found.is_none() && specifier.identifier() == identifier {
                found = Some(specifier);
            }
        });
        found
    }

    /// Every state identifier in the forest, in depth-first order.
    pub fn state_identifiers(&self) -> Vec<String> {
        let mut identifiers = Vec::new();
        for_each_specifier(&self.specifiers, &mut |specifier| {
            if let Some(stateful) = specifier.as_stateful() {
                identifiers.extend(stateful.state_identifiers().iter().cloned());
            }
        });
        identifiers
    }

    /// Ensure `states` holds a valid starting value for every state
    /// identifier in the forest.
    ///
    /// Entries belonging to no specifier are left alone.
    pub fn populate_starting_states(&self, states: &mut StateMap) {
        for_each_specifier(&self.specifiers, &mut |specifier| {
            if let Some(stateful) = specifier.as_stateful() {
                stateful.validate_and_correct_states(states);
            }
        });
        tracing::trace!(
            target: targets::MANAGER,
            count = states.len(),
            "populated starting states"
        );
    }

    /// Create a runtime megawidget for every top-level specifier.
    pub fn create_megawidgets(
        &self,
        params: &CreationParams,
    ) -> Result<Vec<Arc<dyn Megawidget>>, SpecificationError> {
        let _span = PerfSpan::new(span_names::CREATE);
        self.specifiers
            .iter()
            .map(|specifier| specifier.create_megawidget(params))
            .collect()
    }

    /// Render the forest as an indented tree.
    pub fn format_tree(&self, options: TreeFormatOptions) -> String {
        let nodes: Vec<Box<dyn DebugTreeNode + '_>> = self
            .specifiers
            .iter()
            .map(|specifier| {
                Box::new(SpecifierTreeNode(specifier.as_ref())) as Box<dyn DebugTreeNode + '_>
            })
            .collect();
        TreeDebug::with_options(options).format(&nodes)
    }
}

/// Tree-debug view of one specifier.
pub struct SpecifierTreeNode<'a>(pub &'a dyn Specifier);

impl DebugTreeNode for SpecifierTreeNode<'_> {
    fn debug_label(&self) -> String {
        self.0.identifier().to_owned()
    }

    fn debug_type(&self) -> Option<String> {
        Some(self.0.type_name().to_owned())
    }

    fn debug_properties(&self) -> Vec<String> {
        let mut properties = vec![format!("capabilities={}", self.0.capabilities())];
        if !self.0.is_enabled() {
            properties.push("disabled".to_owned());
        }
        if !self.0.is_editable() {
            properties.push("read-only".to_owned());
        }
        if let Some(label) = self.0.label() {
            properties.push(format!("label={label:?}"));
        }
        if let Some(stateful) = self.0.as_stateful() {
            for (identifier, value) in stateful.starting_states() {
                properties.push(format!("{identifier}={value}"));
            }
        }
        properties
    }

    fn debug_children(&self) -> Vec<Box<dyn DebugTreeNode + '_>> {
        match self.0.as_container() {
            Some(container) => container
                .child_specifiers()
                .iter()
                .map(|child| Box::new(SpecifierTreeNode(child.as_ref())) as Box<dyn DebugTreeNode + '_>)
                .collect(),
            None => Vec::new(),
        }
    }
}

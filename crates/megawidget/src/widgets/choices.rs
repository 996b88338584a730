//! Choice-based controls.
//!
//! One generic specifier and megawidget serve every choice control; the
//! registered constructors differ only in the validator policy:
//!
//! | type | cardinality | bounded | prune fallback |
//! |---|---|---|---|
//! | `ComboBox` | single | yes | first choice |
//! | `CheckBoxes` | multiple | yes | empty |
//! | `ListBuilder` | multiple | no | (never prunes) |
//! | `HierarchicalChoicesTree` | selection tree | yes | drop vanished nodes |
//!
//! `CheckBoxes` choices may carry `detailFields`: child specifiers shown
//! alongside their check box. They are fixed at build time.

use std::collections::BTreeMap;
use std::sync::Arc;

use megawidget_core::property::names;
use megawidget_core::value::{self, keys};
use megawidget_core::{
    ConfigMap, GuardState, PropertyError, SpecificationError, StateError, StateMap, Value,
};

use super::{apply_values, create_children, propagate_to_children, values_of};
use crate::capability::Capabilities;
use crate::choices::{identifier_of, ChoiceList};
use crate::runtime::{
    ContainerMegawidget, CreationParams, Megawidget, MegawidgetBase, StatefulCore,
    StatefulMegawidget,
};
use crate::specifier::{
    ChildSpecifiersManager, ContainerSpecifier, Specifier, SpecifierBase, SpecifierFactory,
    StatefulBase, StatefulSpecifier,
};
use crate::validator::{
    Cardinality, ChoicesValidator, FlatChoicesValidator, HierarchicalChoicesValidator,
    PruneFallback,
};

pub(super) const CAPABILITIES: Capabilities = Capabilities::MEGAWIDGET
    .union(Capabilities::CONTROL)
    .union(Capabilities::STATEFUL)
    .union(Capabilities::CHOICES)
    .union(Capabilities::MUTABLE_CHOICES);

pub(super) const CONTAINER_CAPABILITIES: Capabilities =
    CAPABILITIES.union(Capabilities::CONTAINER);

const PROPERTY_NAMES: &[&str] = &[
    names::ENABLED,
    names::EDITABLE,
    names::EXTRA_DATA,
    names::CHOICES,
    names::VALUES,
];

/// Specifier of a choice control.
#[derive(Debug, Clone)]
pub struct ChoicesSpecifier<V: ChoicesValidator> {
    base: SpecifierBase,
    stateful: StatefulBase<V>,
    capabilities: Capabilities,
    children: ChildSpecifiersManager,
    detail_fields: BTreeMap<String, Vec<String>>,
}

/// A flat choice control.
pub type FlatChoicesSpecifier = ChoicesSpecifier<FlatChoicesValidator>;

/// A tree of choices.
pub type HierarchicalChoicesSpecifier = ChoicesSpecifier<HierarchicalChoicesValidator>;

impl<V: ChoicesValidator> ChoicesSpecifier<V> {
    /// Build with the given validator and capabilities.
    pub fn new(
        base: SpecifierBase,
        config: &ConfigMap,
        validator: V,
        capabilities: Capabilities,
    ) -> Result<Self, SpecificationError> {
        let stateful = StatefulBase::from_config(&base, config, validator, false)?;
        Ok(Self {
            base,
            stateful,
            capabilities,
            children: ChildSpecifiersManager::new(Capabilities::CONTROL),
            detail_fields: BTreeMap::new(),
        })
    }

    /// The choices configured at build time.
    pub fn available_choices(&self) -> &ChoiceList {
        self.stateful.validator().available_choices()
    }

    /// The detail fields attached to the choice `identifier`.
    pub fn detail_fields(&self, identifier: &str) -> Vec<&Arc<dyn Specifier>> {
        let Some(owned) = self.detail_fields.get(identifier) else {
            return Vec::new();
        };
        self.children
            .children()
            .iter()
            .filter(|child| owned.iter().any(|owned| owned == child.identifier()))
            .collect()
    }
}

fn flat(
    config: &ConfigMap,
    cardinality: Cardinality,
    fallback: PruneFallback,
    bounded: bool,
    capabilities: Capabilities,
) -> Result<FlatChoicesSpecifier, SpecificationError> {
    let base = SpecifierBase::from_config(config)?;
    let validator = FlatChoicesValidator::from_config(config, cardinality, fallback, bounded)
        .map_err(|err| base.contextualize(err))?;
    ChoicesSpecifier::new(base, config, validator, capabilities)
}

/// Build a `ComboBox` specifier.
pub fn combo_box(
    config: &ConfigMap,
    _factory: &SpecifierFactory,
) -> Result<Arc<dyn Specifier>, SpecificationError> {
    let specifier = flat(
        config,
        Cardinality::Single,
        PruneFallback::FirstAvailable,
        true,
        CAPABILITIES,
    )?;
    Ok(Arc::new(specifier))
}

/// Build a `CheckBoxes` specifier, including its detail fields.
pub fn check_boxes(
    config: &ConfigMap,
    factory: &SpecifierFactory,
) -> Result<Arc<dyn Specifier>, SpecificationError> {
    let mut specifier = flat(
        config,
        Cardinality::Multiple,
        PruneFallback::Empty,
        true,
        CONTAINER_CAPABILITIES,
    )?;
    attach_detail_fields(&mut specifier, config, factory)
        .map_err(|err| specifier.base.contextualize(err))?;
    Ok(Arc::new(specifier))
}

/// Build a `ListBuilder` specifier.
pub fn list_builder(
    config: &ConfigMap,
    _factory: &SpecifierFactory,
) -> Result<Arc<dyn Specifier>, SpecificationError> {
    let specifier = flat(
        config,
        Cardinality::Multiple,
        PruneFallback::Empty,
        false,
        CAPABILITIES,
    )?;
    Ok(Arc::new(specifier))
}

/// Build a `HierarchicalChoicesTree` specifier.
pub fn hierarchical_choices_tree(
    config: &ConfigMap,
    _factory: &SpecifierFactory,
) -> Result<Arc<dyn Specifier>, SpecificationError> {
    let base = SpecifierBase::from_config(config)?;
    let validator =
        HierarchicalChoicesValidator::from_config(config).map_err(|err| base.contextualize(err))?;
    Ok(Arc::new(ChoicesSpecifier::new(base, config, validator, CAPABILITIES)?))
}

fn attach_detail_fields(
    specifier: &mut FlatChoicesSpecifier,
    config: &ConfigMap,
    factory: &SpecifierFactory,
) -> Result<(), SpecificationError> {
    let Some(nodes) = value::optional_list(config, keys::CHOICES)? else {
        return Ok(());
    };
    for node in nodes {
        let Some(map) = node.as_object() else {
            continue;
        };
        let Some(configs) = value::optional_list(map, keys::DETAIL_FIELDS)? else {
            continue;
        };
        let built = ChildSpecifiersManager::build(
            factory,
            Capabilities::CONTROL,
            configs,
            keys::DETAIL_FIELDS,
        )?;
        let mut owned = Vec::with_capacity(built.len());
        for child in built.children() {
            specifier.children.add(child.clone())?;
            owned.push(child.identifier().to_owned());
        }
        specifier.detail_fields.insert(identifier_of(node)?, owned);
    }
    Ok(())
}

impl<V: ChoicesValidator> Specifier for ChoicesSpecifier<V> {
    fn specifier_base(&self) -> &SpecifierBase {
        &self.base
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn mutable_property_names(&self) -> &'static [&'static str] {
        PROPERTY_NAMES
    }

    fn create_megawidget(
        &self,
        params: &CreationParams,
    ) -> Result<Arc<dyn Megawidget>, SpecificationError> {
        Ok(Arc::new(ChoicesMegawidget {
            base: MegawidgetBase::new(self, params),
            core: self.stateful.create_core(params),
            children: create_children(self.children.children(), params)?,
        }))
    }

    fn as_stateful(&self) -> Option<&dyn StatefulSpecifier> {
        Some(self)
    }

    fn as_container(&self) -> Option<&dyn ContainerSpecifier> {
        if self.capabilities.contains(Capabilities::CONTAINER) {
            Some(self)
        } else {
            None
        }
    }
}

impl<V: ChoicesValidator> StatefulSpecifier for ChoicesSpecifier<V> {
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

impl<V: ChoicesValidator> ContainerSpecifier for ChoicesSpecifier<V> {
    fn child_specifiers(&self) -> &[Arc<dyn Specifier>] {
        self.children.children()
    }
}

/// A choice control whose choice list may be replaced at runtime.
#[derive(Debug)]
pub struct ChoicesMegawidget<V: ChoicesValidator> {
    base: MegawidgetBase,
    core: StatefulCore<V>,
    children: Vec<Arc<dyn Megawidget>>,
}

impl<V: ChoicesValidator> ChoicesMegawidget<V> {
    /// The available choices in configuration form.
    pub fn choices(&self) -> Value {
        self.core.choices()
    }

    /// Replace the choice list, pruning the state to match.
    pub fn set_choices(&self, choices: &Value) -> Result<(), PropertyError> {
        self.core.set_choices(self, choices)
    }
}

impl<V: ChoicesValidator> Megawidget for ChoicesMegawidget<V> {
    fn megawidget_base(&self) -> &MegawidgetBase {
        &self.base
    }

    fn mutable_property_names(&self) -> &'static [&'static str] {
        PROPERTY_NAMES
    }

    fn mutable_property(&self, name: &str) -> Result<Value, PropertyError> {
        match name {
            names::CHOICES => Ok(self.choices()),
            names::VALUES => Ok(values_of(self)),
            _ => self.base.property(name),
        }
    }

    fn set_mutable_property(&self, name: &str, value: &Value) -> Result<(), PropertyError> {
        match name {
            names::CHOICES => self.set_choices(value),
            names::VALUES => apply_values(self, value),
            _ => {
                self.base.set_property(self, name, value)?;
                propagate_to_children(&self.children, name, value)
            }
        }
    }

    fn as_stateful(&self) -> Option<&dyn StatefulMegawidget> {
        Some(self)
    }

    fn as_container(&self) -> Option<&dyn ContainerMegawidget> {
        if self.capabilities().contains(Capabilities::CONTAINER) {
            Some(self)
        } else {
            None
        }
    }
}

impl<V: ChoicesValidator> StatefulMegawidget for ChoicesMegawidget<V> {
    fn state_identifiers(&self) -> &[String] {
        self.core.identifiers()
    }

    fn state(&self, identifier: &str) -> Result<Value, StateError> {
        self.core
            .state(identifier)
            .map_err(|err| self.base.contextualize_state(err))
    }

    fn states(&self) -> StateMap {
        self.core.states()
    }

    fn set_state(&self, identifier: &str, value: &Value) -> Result<(), StateError> {
        self.core.set_state(self, identifier, value)
    }

    fn set_states(&self, states: &StateMap) -> Result<(), StateError> {
        self.core.set_states(self, states)
    }

    fn notify_state_change(&self, identifier: &str, value: &Value) -> Result<(), StateError> {
        self.core.notify(self, identifier, value)
    }

    fn notify_state_changes(&self, states: &StateMap) -> Result<(), StateError> {
        self.core.notify_many(self, states)
    }

    fn guard_state(&self) -> GuardState {
        self.core.guard_state()
    }
}

impl<V: ChoicesValidator> ContainerMegawidget for ChoicesMegawidget<V> {
    fn children(&self) -> &[Arc<dyn Megawidget>] {
        &self.children
    }
}

static_assertions::assert_impl_all!(FlatChoicesSpecifier: Send, Sync);
static_assertions::assert_impl_all!(ChoicesMegawidget<HierarchicalChoicesValidator>: Send, Sync);

//! Built-in megawidget types.
//!
//! Each type pairs a specifier with the runtime megawidget it creates:
//!
//! | type | specifier | megawidget |
//! |---|---|---|
//! | `Label` | [`LabelSpecifier`] | [`LabelMegawidget`] |
//! | `Button` | [`ButtonSpecifier`] | [`ButtonMegawidget`] |
//! | `CheckBox`, `Text` | [`ValueSpecifier`] | [`ValueMegawidget`] |
//! | `IntegerSpinner`, `FractionSpinner` | [`SpinnerSpecifier`] | [`SpinnerMegawidget`] |
//! | `ComboBox`, `CheckBoxes`, `ListBuilder`, `HierarchicalChoicesTree` | [`ChoicesSpecifier`] | [`ChoicesMegawidget`] |
//! | `Composite`, `Group` | [`CompositeSpecifier`] | [`CompositeMegawidget`] |

mod button;
mod choices;
mod composite;
mod label;
mod spinner;
mod value;

use std::sync::Arc;

use megawidget_core::property::names;
use megawidget_core::{PropertyError, StateMap, ValidationError, Value};

use crate::runtime::{Megawidget, StatefulMegawidget};
use crate::specifier::SpecifierRegistry;

pub use button::{ButtonMegawidget, ButtonSpecifier};
pub use choices::{
    ChoicesMegawidget, ChoicesSpecifier, FlatChoicesSpecifier, HierarchicalChoicesSpecifier,
};
pub use composite::{CompositeMegawidget, CompositeSpecifier};
pub use label::{LabelMegawidget, LabelSpecifier};
pub use spinner::{
    FractionSpinnerSpecifier, IntegerSpinnerSpecifier, SpinnerMegawidget, SpinnerSpecifier,
};
pub use value::{CheckBoxSpecifier, TextSpecifier, ValueMegawidget, ValueSpecifier};

/// Register every built-in type.
pub fn register_builtin_types(registry: &mut SpecifierRegistry) {
    registry.register("Label", label::CAPABILITIES, LabelSpecifier::from_config);
    registry.register("Button", button::CAPABILITIES, ButtonSpecifier::from_config);
    registry.register("CheckBox", value::CAPABILITIES, CheckBoxSpecifier::from_config);
    registry.register("Text", value::CAPABILITIES, TextSpecifier::from_config);
    registry.register(
        "IntegerSpinner",
        spinner::CAPABILITIES,
        IntegerSpinnerSpecifier::from_config,
    );
    registry.register(
        "FractionSpinner",
        spinner::CAPABILITIES,
        FractionSpinnerSpecifier::from_config,
    );
    registry.register("ComboBox", choices::CAPABILITIES, choices::combo_box);
    registry.register("CheckBoxes", choices::CONTAINER_CAPABILITIES, choices::check_boxes);
    registry.register("ListBuilder", choices::CAPABILITIES, choices::list_builder);
    registry.register(
        "HierarchicalChoicesTree",
        choices::CAPABILITIES,
        choices::hierarchical_choices_tree,
    );
    registry.register("Composite", composite::CAPABILITIES, CompositeSpecifier::from_config);
    registry.register("Group", composite::CAPABILITIES, CompositeSpecifier::from_config);
}

/// The `values` property: the state itself for a single-state megawidget,
/// otherwise a map of every state.
fn values_of(stateful: &dyn StatefulMegawidget) -> Value {
    match stateful.state_identifiers() {
        [single] => stateful.state(single).unwrap_or(Value::Null),
        _ => Value::Object(stateful.states().into_iter().collect()),
    }
}

/// Apply the `values` property as a programmatic state change.
fn apply_values(stateful: &dyn StatefulMegawidget, value: &Value) -> Result<(), PropertyError> {
    let result = match (stateful.state_identifiers(), value) {
        ([single], value) => stateful.set_state(single, value),
        (_, Value::Object(map)) => {
            let states: StateMap = map
                .iter()
                .map(|(identifier, value)| (identifier.clone(), value.clone()))
                .collect();
            stateful.set_states(&states)
        }
        (_, other) => {
            return Err(stateful.megawidget_base().contextualize(
                ValidationError::invalid_shape("expected a map of state values")
                    .with_value(other.clone())
                    .into_property(names::VALUES),
            ));
        }
    };
    result.map_err(|err| err.into_property(names::VALUES))
}

/// Pass an enablement change on to every child.
fn propagate_to_children(
    children: &[Arc<dyn Megawidget>],
    name: &str,
    value: &Value,
) -> Result<(), PropertyError> {
    if matches!(name, names::ENABLED | names::EDITABLE) {
        for child in children {
            child.set_mutable_property(name, value)?;
        }
    }
    Ok(())
}

/// Instantiate child megawidgets.
fn create_children(
    children: &[Arc<dyn crate::specifier::Specifier>],
    params: &crate::runtime::CreationParams,
) -> Result<Vec<Arc<dyn Megawidget>>, megawidget_core::SpecificationError> {
    children
        .iter()
        .map(|child| child.create_megawidget(params))
        .collect()
}

//! Declarative megawidgets.
//!
//! A megawidget is a composite control described by a configuration map.
//! This crate turns such maps into validated, immutable *specifiers*, and
//! specifiers into live runtime megawidgets holding guarded state:
//!
//! - **Specifiers** ([`specifier`]): The factory resolves a map's `type` to
//!   a registered implementation, checks required capabilities and builds
//!   the specifier, recursively for containers. The specifier manager owns a
//!   forest and enforces identifier uniqueness across it.
//! - **Validators** ([`validator`]): Per-type conversion, pruning and joint
//!   validation of state values, including flat and hierarchical choices
//!   and bounded numbers.
//! - **Runtime** ([`runtime`]): Runtime megawidgets with the mutable
//!   property protocol, the reentrancy-guarded state machine, explicit
//!   commit, and the manager that mirrors every state change.
//! - **Built-ins** ([`widgets`]): Labels, buttons, check boxes, text,
//!   spinners, choice controls and composites.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use megawidget::prelude::*;
//! use serde_json::json;
//!
//! let specifiers = SpecifierManager::from_values(
//!     &SpecifierFactory::with_builtin_types(),
//!     &[json!({
//!         "identifier": "color",
//!         "type": "ComboBox",
//!         "choices": ["red", "green", "blue"],
//!         "values": "green"
//!     })],
//!     Capabilities::CONTROL,
//! )?;
//! let manager =
//!     MegawidgetManager::new(&specifiers, StateMap::new(), Arc::new(NullRendererProvider))?;
//!
//! // Removing the selected choice prunes the state back to the first choice.
//! manager.set_mutable_properties("color", json!({"choices": ["red", "blue"]}).as_object().unwrap())?;
//! assert_eq!(manager.state("color"), Some(json!("red")));
//! # Ok::<(), megawidget_core::MegawidgetError>(())
//! ```

pub mod capability;
pub mod choices;
pub mod config;
pub mod prelude;
pub mod runtime;
pub mod specifier;
pub mod validator;
pub mod widgets;

#[cfg(test)]
pub(crate) mod testing;

pub use megawidget_core::{
    ConfigMap, MegawidgetError, PropertyError, SpecificationError, StateError, StateMap,
    ValidationError, Value,
};

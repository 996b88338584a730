//! Runtime megawidgets.
//!
//! A runtime megawidget is the live, stateful object a [`Specifier`]
//! instantiates. Every megawidget exposes the mutable-property protocol;
//! capability traits add the rest:
//!
//! - [`StatefulMegawidget`]: Guarded state access and user notification
//! - [`ExplicitCommitMegawidget`]: Staged state changes applied on commit
//! - [`ContainerMegawidget`]: Child megawidgets
//! - [`NotifierMegawidget`]: Invocation by the user
//!
//! Runtime megawidgets use interior mutability throughout, so every
//! operation takes `&self` and a listener or renderer may call back into
//! the megawidget that is notifying it.

mod explicit_commit;
mod listener;
mod manager;
mod renderer;
mod stateful;

use std::fmt;
use std::sync::Arc;

use megawidget_core::logging::targets;
use megawidget_core::property::names;
use megawidget_core::{
    order_for_batch, ConfigMap, GuardState, Property, PropertyError, StateError, StateMap, Value,
};

use crate::capability::Capabilities;
use crate::specifier::Specifier;

pub use explicit_commit::ExplicitCommitCore;
pub use listener::{InvocationEvent, InvocationListener, StateChangeEvent, StateChangeListener};
pub use manager::MegawidgetManager;
pub use renderer::{NullRenderer, NullRendererProvider, Renderer, RendererProvider};
pub use stateful::StatefulCore;

/// Mutable properties every megawidget has.
pub const BASE_PROPERTY_NAMES: &[&str] = &[names::ENABLED, names::EDITABLE, names::EXTRA_DATA];

/// The base trait for all runtime megawidgets.
pub trait Megawidget: fmt::Debug + Send + Sync {
    /// Get the base fields.
    fn megawidget_base(&self) -> &MegawidgetBase;

    /// Names of the mutable properties this megawidget exposes.
    fn mutable_property_names(&self) -> &'static [&'static str];

    /// Set one mutable property.
    fn set_mutable_property(&self, name: &str, value: &Value) -> Result<(), PropertyError>;

    /// Get one mutable property.
    fn mutable_property(&self, name: &str) -> Result<Value, PropertyError> {
        self.megawidget_base().property(name)
    }

    /// Set several mutable properties in one batch.
    ///
    /// Unknown names are rejected before anything is applied. Properties
    /// that bound others (choices, minimum and maximum) are applied before
    /// independent ones, and state values last, so values are validated
    /// against the bounds of the same batch. If any property is rejected,
    /// every property of the batch and the state are restored.
    fn set_mutable_properties(&self, properties: &ConfigMap) -> Result<(), PropertyError> {
        self.megawidget_base()
            .check_property_names(self.mutable_property_names(), properties)?;
        apply_atomically(self, properties, |batch| {
            order_for_batch(batch)
                .into_iter()
                .try_for_each(|(name, value)| self.set_mutable_property(name, value))
        })
    }

    /// Get every mutable property.
    fn mutable_properties(&self) -> ConfigMap {
        self.mutable_property_names()
            .iter()
            .filter_map(|name| {
                self.mutable_property(name)
                    .ok()
                    .map(|value| ((*name).to_owned(), value))
            })
            .collect()
    }

    /// The identifier.
    fn identifier(&self) -> &str {
        self.megawidget_base().identifier()
    }

    /// The type name.
    fn type_name(&self) -> &str {
        self.megawidget_base().type_name()
    }

    /// The capabilities.
    fn capabilities(&self) -> Capabilities {
        self.megawidget_base().capabilities()
    }

    /// Whether the megawidget is enabled.
    fn is_enabled(&self) -> bool {
        self.megawidget_base().is_enabled()
    }

    /// Whether the megawidget is editable.
    fn is_editable(&self) -> bool {
        self.megawidget_base().is_editable()
    }

    /// View as a stateful megawidget.
    fn as_stateful(&self) -> Option<&dyn StatefulMegawidget> {
        None
    }

    /// View as an explicit-commit megawidget.
    fn as_explicit_commit(&self) -> Option<&dyn ExplicitCommitMegawidget> {
        None
    }

    /// View as a container.
    fn as_container(&self) -> Option<&dyn ContainerMegawidget> {
        None
    }

    /// View as a notifier.
    fn as_notifier(&self) -> Option<&dyn NotifierMegawidget> {
        None
    }
}

/// A megawidget owning one or more state values.
pub trait StatefulMegawidget: Megawidget {
    /// The state identifiers, in order.
    fn state_identifiers(&self) -> &[String];

    /// Get one state value.
    fn state(&self, identifier: &str) -> Result<Value, StateError>;

    /// Get every state value.
    fn states(&self) -> StateMap;

    /// Programmatically change one state value.
    ///
    /// A no-op while another state change is in flight, and when the value
    /// equals the current one. Listeners are not notified.
    fn set_state(&self, identifier: &str, value: &Value) -> Result<(), StateError>;

    /// Programmatically change several state values atomically.
    fn set_states(&self, states: &StateMap) -> Result<(), StateError>;

    /// Report a user-driven change of one state value.
    ///
    /// Records the value and notifies the state-change listener. Suppressed
    /// while another state change is in flight.
    fn notify_state_change(&self, identifier: &str, value: &Value) -> Result<(), StateError>;

    /// Report user-driven changes of several state values at once.
    fn notify_state_changes(&self, states: &StateMap) -> Result<(), StateError>;

    /// Whether a state change is in flight.
    fn guard_state(&self) -> GuardState;
}

/// A stateful megawidget that stages changes and applies them on commit.
pub trait ExplicitCommitMegawidget: StatefulMegawidget {
    /// Record a pending state value without applying it.
    fn stage_state(&self, identifier: &str, value: &Value) -> Result<(), StateError>;

    /// Apply every staged value at once.
    ///
    /// Staged values are validated jointly; on failure none are applied.
    /// The staged values are discarded either way.
    fn commit(&self) -> Result<(), StateError>;

    /// The staged values not yet committed.
    fn uncommitted_states(&self) -> StateMap;
}

/// A megawidget owning child megawidgets.
pub trait ContainerMegawidget: Megawidget {
    /// The children, in order.
    fn children(&self) -> &[Arc<dyn Megawidget>];
}

/// A megawidget the user can invoke.
pub trait NotifierMegawidget: Megawidget {
    /// Report an invocation; ignored while disabled.
    fn invoke(&self);
}

/// Parameters shared by every megawidget created from one specifier tree.
#[derive(Clone)]
pub struct CreationParams {
    /// Starting state values, keyed by state identifier.
    pub states: StateMap,
    /// Supplies each megawidget's renderer.
    pub renderers: Arc<dyn RendererProvider>,
    /// Hears user-driven state changes.
    pub state_listener: Option<Arc<dyn StateChangeListener>>,
    /// Hears invocations.
    pub invocation_listener: Option<Arc<dyn InvocationListener>>,
}

impl Default for CreationParams {
    fn default() -> Self {
        Self {
            states: StateMap::new(),
            renderers: Arc::new(NullRendererProvider),
            state_listener: None,
            invocation_listener: None,
        }
    }
}

impl CreationParams {
    /// Create default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use these starting states.
    pub fn with_states(mut self, states: StateMap) -> Self {
        self.states = states;
        self
    }

    /// Use this renderer provider.
    pub fn with_renderers(mut self, renderers: Arc<dyn RendererProvider>) -> Self {
        self.renderers = renderers;
        self
    }

    /// Use this state-change listener.
    pub fn with_state_listener(mut self, listener: Arc<dyn StateChangeListener>) -> Self {
        self.state_listener = Some(listener);
        self
    }

    /// Use this invocation listener.
    pub fn with_invocation_listener(mut self, listener: Arc<dyn InvocationListener>) -> Self {
        self.invocation_listener = Some(listener);
        self
    }
}

/// Run `apply` on a property batch, undoing it if it fails partway.
///
/// The batch's properties and `values` are captured first. On failure they
/// are handed back to `apply`, which restores the choices or bounds before
/// the state they constrain.
pub fn apply_atomically<M>(
    megawidget: &M,
    properties: &ConfigMap,
    apply: impl Fn(&ConfigMap) -> Result<(), PropertyError>,
) -> Result<(), PropertyError>
where
    M: Megawidget + ?Sized,
{
    let snapshot: ConfigMap = megawidget
        .mutable_properties()
        .into_iter()
        .filter(|(name, _)| name == names::VALUES || properties.contains_key(name))
        .collect();
    let result = apply(properties);
    if let Err(err) = &result {
        tracing::debug!(
            target: targets::PROPERTY,
            identifier = megawidget.identifier(),
            error = %err,
            "property batch rolled back"
        );
        if let Err(restore_err) = apply(&snapshot) {
            tracing::warn!(
                target: targets::PROPERTY,
                identifier = megawidget.identifier(),
                error = %restore_err,
                "property batch could not be fully rolled back"
            );
        }
    }
    result
}

/// Fields shared by every runtime megawidget.
pub struct MegawidgetBase {
    identifier: String,
    type_name: String,
    capabilities: Capabilities,
    enabled: Property<bool>,
    editable: Property<bool>,
    extra_data: Property<ConfigMap>,
    renderer: Arc<dyn Renderer>,
}

impl MegawidgetBase {
    /// Create the base for a megawidget built from `specifier`.
    pub fn new(specifier: &dyn Specifier, params: &CreationParams) -> Self {
        let renderer = params
            .renderers
            .renderer_for(specifier.identifier(), specifier.type_name());
        Self {
            identifier: specifier.identifier().to_owned(),
            type_name: specifier.type_name().to_owned(),
            capabilities: specifier.capabilities(),
            enabled: Property::new(specifier.is_enabled()),
            editable: Property::new(specifier.is_editable()),
            extra_data: Property::new(specifier.extra_data().clone()),
            renderer,
        }
    }

    /// The identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The capabilities.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// The renderer.
    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }

    /// Whether the megawidget is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Whether the megawidget is editable.
    pub fn is_editable(&self) -> bool {
        self.editable.get()
    }

    /// The opaque caller data.
    pub fn extra_data(&self) -> ConfigMap {
        self.extra_data.get()
    }

    /// Get a base property.
    pub fn property(&self, name: &str) -> Result<Value, PropertyError> {
        match name {
            names::ENABLED => Ok(Value::Bool(self.is_enabled())),
            names::EDITABLE => Ok(Value::Bool(self.is_editable())),
            names::EXTRA_DATA => Ok(Value::Object(self.extra_data())),
            _ => Err(self.contextualize(PropertyError::not_found(name))),
        }
    }

    /// Set a base property, synchronizing the renderer if it changed.
    pub fn set_property(
        &self,
        owner: &dyn Megawidget,
        name: &str,
        value: &Value,
    ) -> Result<(), PropertyError> {
        let changed = match (name, value) {
            (names::ENABLED, Value::Bool(flag)) => self.enabled.set(*flag),
            (names::EDITABLE, Value::Bool(flag)) => self.editable.set(*flag),
            (names::EXTRA_DATA, Value::Object(map)) => self.extra_data.set(map.clone()),
            (names::EXTRA_DATA, Value::Null) => self.extra_data.set(ConfigMap::new()),
            (names::ENABLED | names::EDITABLE | names::EXTRA_DATA, other) => {
                let expected = if name == names::EXTRA_DATA { "a map" } else { "a boolean" };
                return Err(self.contextualize(
                    megawidget_core::ValidationError::invalid_shape(format!(
                        "expected {expected}, got {}",
                        megawidget_core::value::kind_name(other)
                    ))
                    .with_value(other.clone())
                    .into_property(name),
                ));
            }
            _ => return Err(self.contextualize(PropertyError::not_found(name))),
        };
        if changed {
            tracing::debug!(
                target: targets::PROPERTY,
                identifier = self.identifier.as_str(),
                property = name,
                "property changed"
            );
            self.renderer.synchronize_to_property(owner, name);
        }
        Ok(())
    }

    /// Reject a batch containing names outside `declared`.
    pub fn check_property_names(
        &self,
        declared: &[&str],
        properties: &ConfigMap,
    ) -> Result<(), PropertyError> {
        match properties.keys().find(|name| !declared.contains(&name.as_str())) {
            Some(unknown) => Err(self.contextualize(PropertyError::not_found(unknown))),
            None => Ok(()),
        }
    }

    /// Attach this megawidget's identifier and type to a property error.
    pub fn contextualize(&self, err: PropertyError) -> PropertyError {
        err.in_context(Some(&self.identifier), Some(&self.type_name))
    }

    /// Attach this megawidget's identifier and type to a state error.
    pub fn contextualize_state(&self, err: StateError) -> StateError {
        err.in_context(Some(&self.identifier), Some(&self.type_name))
    }
}

impl std::fmt::Debug for MegawidgetBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MegawidgetBase")
            .field("identifier", &self.identifier)
            .field("type_name", &self.type_name)
            .field("capabilities", &self.capabilities)
            .field("enabled", &self.is_enabled())
            .field("editable", &self.is_editable())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(dyn Megawidget: fmt::Debug, Send, Sync);
static_assertions::assert_impl_all!(MegawidgetBase: Send, Sync);
static_assertions::assert_impl_all!(CreationParams: Send, Sync);

//! The runtime megawidget manager.
//!
//! [`MegawidgetManager`] instantiates every runtime megawidget of a
//! [`SpecifierManager`] forest, indexes them by identifier and by state
//! identifier, and keeps a mirror of every state value it sees.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use megawidget_core::logging::targets;
use megawidget_core::{
    ConfigMap, PropertyError, PropertyErrorKind, Signal, SpecificationError, StateError,
    StateMap, Value,
};

use super::{
    CreationParams, InvocationEvent, Megawidget, RendererProvider, StateChangeEvent,
    StateChangeListener, StatefulMegawidget,
};
use crate::specifier::SpecifierManager;

/// Records user-driven changes in the mirror, then re-emits them.
struct ManagerListener {
    states: Arc<Mutex<StateMap>>,
    signal: Arc<Signal<StateChangeEvent>>,
}

impl StateChangeListener for ManagerListener {
    fn state_changed(&self, source: &dyn StatefulMegawidget, identifier: &str, value: &Value) {
        self.states
            .lock()
            .insert(identifier.to_owned(), value.clone());
        self.signal.state_changed(source, identifier, value);
    }

    fn states_changed(&self, source: &dyn StatefulMegawidget, states: &StateMap) {
        self.states
            .lock()
            .extend(states.iter().map(|(identifier, value)| (identifier.clone(), value.clone())));
        self.signal.states_changed(source, states);
    }
}

/// Owns the runtime megawidgets of one specifier forest.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use megawidget::capability::Capabilities;
/// use megawidget::runtime::{MegawidgetManager, NullRendererProvider};
/// use megawidget::specifier::{SpecifierFactory, SpecifierManager};
/// use megawidget_core::StateMap;
/// use serde_json::json;
///
/// let specifiers = SpecifierManager::from_values(
///     &SpecifierFactory::with_builtin_types(),
///     &[json!({"identifier": "flag", "type": "CheckBox"})],
///     Capabilities::CONTROL,
/// )
/// .unwrap();
/// let manager =
///     MegawidgetManager::new(&specifiers, StateMap::new(), Arc::new(NullRendererProvider))
///         .unwrap();
///
/// manager.set_state("flag", &json!(true)).unwrap();
/// assert_eq!(manager.state("flag"), Some(json!(true)));
/// ```
pub struct MegawidgetManager {
    megawidgets: Vec<Arc<dyn Megawidget>>,
    by_identifier: HashMap<String, Arc<dyn Megawidget>>,
    by_state: HashMap<String, Arc<dyn Megawidget>>,
    states: Arc<Mutex<StateMap>>,
    state_changed: Arc<Signal<StateChangeEvent>>,
    invoked: Arc<Signal<InvocationEvent>>,
}

impl MegawidgetManager {
    /// Instantiate every megawidget of `specifiers`.
    ///
    /// `states` is completed with starting values for every state
    /// identifier before anything is created.
    pub fn new(
        specifiers: &SpecifierManager,
        mut states: StateMap,
        renderers: Arc<dyn RendererProvider>,
    ) -> Result<Self, SpecificationError> {
        specifiers.populate_starting_states(&mut states);

        let states = Arc::new(Mutex::new(states));
        let state_changed = Arc::new(Signal::new());
        let invoked = Arc::new(Signal::new());
        let listener = Arc::new(ManagerListener {
            states: states.clone(),
            signal: state_changed.clone(),
        });

        let params = CreationParams::new()
            .with_states(states.lock().clone())
            .with_renderers(renderers)
            .with_state_listener(listener)
            .with_invocation_listener(invoked.clone());
        let megawidgets = specifiers.create_megawidgets(&params)?;

        let mut by_identifier = HashMap::new();
        let mut by_state = HashMap::new();
        index(&megawidgets, &mut by_identifier, &mut by_state);
        tracing::debug!(
            target: targets::MANAGER,
            megawidgets = by_identifier.len(),
            states = by_state.len(),
            "created megawidgets"
        );

        Ok(Self {
            megawidgets,
            by_identifier,
            by_state,
            states,
            state_changed,
            invoked,
        })
    }

    /// The top-level megawidgets, in order.
    pub fn megawidgets(&self) -> &[Arc<dyn Megawidget>] {
        &self.megawidgets
    }

    /// Find a megawidget anywhere in the tree.
    pub fn find(&self, identifier: &str) -> Option<&Arc<dyn Megawidget>> {
        self.by_identifier.get(identifier)
    }

    /// Find the megawidget owning a state identifier.
    pub fn owner_of(&self, state_identifier: &str) -> Option<&Arc<dyn Megawidget>> {
        self.by_state.get(state_identifier)
    }

    /// The last known value of one state.
    pub fn state(&self, identifier: &str) -> Option<Value> {
        self.states.lock().get(identifier).cloned()
    }

    /// The last known value of every state.
    pub fn states(&self) -> StateMap {
        self.states.lock().clone()
    }

    /// Programmatically change one state value.
    pub fn set_state(&self, identifier: &str, value: &Value) -> Result<(), StateError> {
        let stateful = self.stateful_owner(identifier)?;
        stateful.set_state(identifier, value)?;
        self.refresh(stateful);
        Ok(())
    }

    /// Programmatically change several state values.
    ///
    /// Values are grouped by owning megawidget; each group is applied
    /// atomically. Every identifier is checked before anything is applied.
    pub fn set_states(&self, states: &StateMap) -> Result<(), StateError> {
        let mut groups: Vec<(&Arc<dyn Megawidget>, StateMap)> = Vec::new();
        for (identifier, value) in states {
            let owner = self
                .by_state
                .get(identifier)
                .ok_or_else(|| StateError::unknown_identifier(identifier))?;
            match groups.iter().position(|(existing, _)| Arc::ptr_eq(*existing, owner)) {
                Some(position) => {
                    groups[position].1.insert(identifier.clone(), value.clone());
                }
                None => groups.push((owner, StateMap::from([(identifier.clone(), value.clone())]))),
            }
        }
        for (owner, group) in groups {
            if let Some(stateful) = owner.as_stateful() {
                stateful.set_states(&group)?;
                self.refresh(stateful);
            }
        }
        Ok(())
    }

    /// Set mutable properties of the megawidget `identifier`.
    pub fn set_mutable_properties(
        &self,
        identifier: &str,
        properties: &ConfigMap,
    ) -> Result<(), PropertyError> {
        let megawidget = self.find(identifier).ok_or_else(|| {
            PropertyError::new(PropertyErrorKind::NotFound, "no such megawidget")
                .with_identifier(identifier)
        })?;
        let outcome = megawidget.set_mutable_properties(properties);
        // Choices and bounds may have pruned or clamped the state.
        if let Some(stateful) = megawidget.as_stateful() {
            self.refresh(stateful);
        }
        outcome
    }

    /// Get every mutable property of the megawidget `identifier`.
    pub fn mutable_properties(&self, identifier: &str) -> Option<ConfigMap> {
        self.find(identifier)
            .map(|megawidget| megawidget.mutable_properties())
    }

    /// Emitted for every user-driven state change.
    pub fn state_changed(&self) -> &Arc<Signal<StateChangeEvent>> {
        &self.state_changed
    }

    /// Emitted for every invocation of a notifier megawidget.
    pub fn invoked(&self) -> &Arc<Signal<InvocationEvent>> {
        &self.invoked
    }

    fn stateful_owner(&self, identifier: &str) -> Result<&dyn StatefulMegawidget, StateError> {
        self.by_state
            .get(identifier)
            .and_then(|owner| owner.as_stateful())
            .ok_or_else(|| StateError::unknown_identifier(identifier))
    }

    fn refresh(&self, stateful: &dyn StatefulMegawidget) {
        self.states.lock().extend(stateful.states());
    }
}

fn index(
    megawidgets: &[Arc<dyn Megawidget>],
    by_identifier: &mut HashMap<String, Arc<dyn Megawidget>>,
    by_state: &mut HashMap<String, Arc<dyn Megawidget>>,
) {
    for megawidget in megawidgets {
        by_identifier.insert(megawidget.identifier().to_owned(), megawidget.clone());
        if let Some(stateful) = megawidget.as_stateful() {
            for identifier in stateful.state_identifiers() {
                by_state.insert(identifier.clone(), megawidget.clone());
            }
        }
        if let Some(container) = megawidget.as_container() {
            index(container.children(), by_identifier, by_state);
        }
    }
}

impl std::fmt::Debug for MegawidgetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MegawidgetManager")
            .field("megawidgets", &self.by_identifier.len())
            .field("states", &*self.states.lock())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(MegawidgetManager: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Capabilities;
    use crate::specifier::SpecifierFactory;
    use crate::testing::RecordingProvider;
    use megawidget_core::StateErrorKind;
    use serde_json::json;

    fn manager(configs: &[serde_json::Value]) -> (MegawidgetManager, Arc<RecordingProvider>) {
        let specifiers = SpecifierManager::from_values(
            &SpecifierFactory::with_builtin_types(),
            configs,
            Capabilities::CONTROL,
        )
        .unwrap();
        let provider = Arc::new(RecordingProvider::default());
        let manager = MegawidgetManager::new(&specifiers, StateMap::new(), provider.clone()).unwrap();
        (manager, provider)
    }

    fn form() -> Vec<serde_json::Value> {
        vec![
            json!({"identifier": "color", "type": "ComboBox", "choices": ["red", "blue"]}),
            json!({"identifier": "options", "type": "Group", "fields": [
                {"identifier": "flag", "type": "CheckBox"},
                {"identifier": "low:high", "type": "IntegerSpinner",
                 "minValue": 0, "maxValue": 9, "values": {"low": 1, "high": 5}}
            ]}),
            json!({"identifier": "apply", "type": "Button"}),
        ]
    }

    #[test]
    fn test_indexes_and_starting_states() {
        let (manager, _) = manager(&form());
        assert_eq!(manager.megawidgets().len(), 3);
        assert!(manager.find("flag").is_some());
        assert_eq!(manager.owner_of("high").unwrap().identifier(), "low:high");
        assert_eq!(
            manager.states(),
            StateMap::from([
                ("color".to_string(), json!("red")),
                ("flag".to_string(), json!(false)),
                ("high".to_string(), json!(5)),
                ("low".to_string(), json!(1)),
            ])
        );
    }

    #[test]
    fn test_user_change_mirrored_and_emitted() {
        let (manager, _) = manager(&form());
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        manager
            .state_changed()
            .connect(move |event| events_clone.lock().push(event.clone()));

        let flag = manager.find("flag").unwrap().as_stateful().unwrap();
        flag.notify_state_change("flag", &json!(true)).unwrap();

        assert_eq!(manager.state("flag"), Some(json!(true)));
        let events = events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source, "flag");
    }

    #[test]
    fn test_set_states_across_owners() {
        let (manager, provider) = manager(&form());
        manager
            .set_states(&StateMap::from([
                ("color".to_string(), json!("blue")),
                ("low".to_string(), json!(3)),
                ("high".to_string(), json!(4)),
            ]))
            .unwrap();
        assert_eq!(manager.state("color"), Some(json!("blue")));
        assert_eq!(manager.state("low"), Some(json!(3)));
        assert_eq!(provider.renderer("color").events(), ["state:color"]);
    }

    #[test]
    fn test_unknown_state_rejected_before_applying() {
        let (manager, _) = manager(&form());
        let err = manager
            .set_states(&StateMap::from([
                ("color".to_string(), json!("blue")),
                ("missing".to_string(), json!(1)),
            ]))
            .unwrap_err();
        assert_eq!(err.kind(), StateErrorKind::UnknownIdentifier);
        assert_eq!(manager.state("color"), Some(json!("red")));
    }

    #[test]
    fn test_properties_refresh_mirror() {
        let (manager, _) = manager(&form());
        manager
            .set_mutable_properties("low:high", json!({"maxValue": 3}).as_object().unwrap())
            .unwrap();
        assert_eq!(manager.state("high"), Some(json!(3)));
        assert_eq!(
            manager.mutable_properties("low:high").unwrap()["maxValue"],
            json!(3)
        );

        let err = manager
            .set_mutable_properties("nothing", &ConfigMap::new())
            .unwrap_err();
        assert_eq!(err.kind(), PropertyErrorKind::NotFound);
        assert!(manager.mutable_properties("nothing").is_none());
    }

    #[test]
    fn test_invocations_emitted() {
        let (manager, _) = manager(&form());
        let count = Arc::new(Mutex::new(0));
        let count_clone = count.clone();
        manager
            .invoked()
            .connect(move |_| *count_clone.lock() += 1);
        manager.find("apply").unwrap().as_notifier().unwrap().invoke();
        assert_eq!(*count.lock(), 1);
    }
}

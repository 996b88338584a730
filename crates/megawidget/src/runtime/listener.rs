//! External listener contracts.
//!
//! A state-change listener hears about user-driven state changes of
//! stateful megawidgets; an invocation listener hears about activations of
//! notifier megawidgets such as buttons. Programmatic `set_state` calls are
//! never reported.
//!
//! Both contracts are implemented by [`Signal`]s carrying the matching event
//! type, so callers who prefer connect/disconnect can pass a signal instead
//! of writing a listener:
//!
//! ```
//! use std::sync::Arc;
//! use megawidget::runtime::{StateChangeEvent, StateChangeListener};
//! use megawidget_core::Signal;
//!
//! let changes = Arc::new(Signal::<StateChangeEvent>::new());
//! changes.connect(|event| println!("{} changed: {:?}", event.source, event.states));
//! let listener: Arc<dyn StateChangeListener> = changes;
//! ```

use serde::{Deserialize, Serialize};

use megawidget_core::{Signal, StateMap, Value};

use super::{Megawidget, StatefulMegawidget};

/// Receives user-driven state changes.
pub trait StateChangeListener: Send + Sync {
    /// One state of `source` changed.
    fn state_changed(&self, source: &dyn StatefulMegawidget, identifier: &str, value: &Value);

    /// Several states of `source` changed together, as one atomic update.
    fn states_changed(&self, source: &dyn StatefulMegawidget, states: &StateMap);
}

/// Receives activations of notifier megawidgets.
pub trait InvocationListener: Send + Sync {
    /// `source` was invoked.
    fn invoked(&self, source: &dyn Megawidget);
}

/// A user-driven state change, as carried by a [`Signal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChangeEvent {
    /// Identifier of the megawidget whose state changed.
    pub source: String,
    /// The changed state values, keyed by state identifier.
    pub states: StateMap,
}

/// An invocation, as carried by a [`Signal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationEvent {
    /// Identifier of the invoked megawidget.
    pub source: String,
}

impl StateChangeListener for Signal<StateChangeEvent> {
    fn state_changed(&self, source: &dyn StatefulMegawidget, identifier: &str, value: &Value) {
        self.emit(StateChangeEvent {
            source: source.identifier().to_owned(),
            states: StateMap::from([(identifier.to_owned(), value.clone())]),
        });
    }

    fn states_changed(&self, source: &dyn StatefulMegawidget, states: &StateMap) {
        self.emit(StateChangeEvent {
            source: source.identifier().to_owned(),
            states: states.clone(),
        });
    }
}

impl InvocationListener for Signal<InvocationEvent> {
    fn invoked(&self, source: &dyn Megawidget) {
        self.emit(InvocationEvent {
            source: source.identifier().to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_serialization() {
        let event = StateChangeEvent {
            source: "range".into(),
            states: StateMap::from([("low".to_string(), json!(1)), ("high".to_string(), json!(9))]),
        };
        let encoded = serde_json::to_value(&event).unwrap();
        assert_eq!(encoded, json!({"source": "range", "states": {"high": 9, "low": 1}}));
        let decoded: StateChangeEvent = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, event);
    }
}

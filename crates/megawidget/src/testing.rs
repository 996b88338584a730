//! Recording collaborators for unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use megawidget_core::{StateMap, Value};

use crate::capability::Capabilities;
use crate::runtime::{
    CreationParams, Megawidget, Renderer, RendererProvider, StateChangeListener,
    StatefulMegawidget,
};
use crate::specifier::SpecifierFactory;

/// Records every hook call as a short string.
#[derive(Default)]
pub(crate) struct RecordingRenderer {
    events: Mutex<Vec<String>>,
    echo: Mutex<Option<Value>>,
}

impl RecordingRenderer {
    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub(crate) fn clear(&self) {
        self.events.lock().clear();
    }

    /// Call `set_state` with `value` from inside every state synchronization.
    pub(crate) fn echo(&self, value: Value) {
        *self.echo.lock() = Some(value);
    }

    fn record(&self, event: String) {
        self.events.lock().push(event);
    }
}

impl Renderer for RecordingRenderer {
    fn synchronize_to_state(&self, megawidget: &dyn StatefulMegawidget, identifier: &str) {
        self.record(format!("state:{identifier}"));
        let echo = self.echo.lock().clone();
        if let Some(value) = echo {
            let _ = megawidget.set_state(identifier, &value);
        }
    }

    fn prepare_for_choices_change(&self, _megawidget: &dyn StatefulMegawidget) {
        self.record("prepare".into());
    }

    fn cancel_preparation(&self, _megawidget: &dyn StatefulMegawidget) {
        self.record("cancel".into());
    }

    fn synchronize_to_choices(&self, _megawidget: &dyn StatefulMegawidget) {
        self.record("choices".into());
    }

    fn synchronize_to_property(&self, _megawidget: &dyn Megawidget, name: &str) {
        self.record(format!("property:{name}"));
    }
}

/// Hands out one [`RecordingRenderer`] per identifier and keeps them.
#[derive(Default)]
pub(crate) struct RecordingProvider {
    renderers: Mutex<HashMap<String, Arc<RecordingRenderer>>>,
}

impl RecordingProvider {
    pub(crate) fn renderer(&self, identifier: &str) -> Arc<RecordingRenderer> {
        self.renderers
            .lock()
            .entry(identifier.to_owned())
            .or_default()
            .clone()
    }
}

impl RendererProvider for RecordingProvider {
    fn renderer_for(&self, identifier: &str, _type_name: &str) -> Arc<dyn Renderer> {
        self.renderer(identifier)
    }
}

/// Records listener calls as `(source, states)` pairs.
#[derive(Default)]
pub(crate) struct RecordingListener {
    calls: Mutex<Vec<(String, StateMap)>>,
}

impl RecordingListener {
    pub(crate) fn calls(&self) -> Vec<(String, StateMap)> {
        self.calls.lock().clone()
    }
}

impl StateChangeListener for RecordingListener {
    fn state_changed(&self, source: &dyn StatefulMegawidget, identifier: &str, value: &Value) {
        self.calls.lock().push((
            source.identifier().to_owned(),
            StateMap::from([(identifier.to_owned(), value.clone())]),
        ));
    }

    fn states_changed(&self, source: &dyn StatefulMegawidget, states: &StateMap) {
        self.calls
            .lock()
            .push((source.identifier().to_owned(), states.clone()));
    }
}

/// A megawidget wired to recording collaborators.
pub(crate) struct Recorded {
    pub(crate) megawidget: Arc<dyn Megawidget>,
    pub(crate) renderer: Arc<RecordingRenderer>,
    pub(crate) listener: Arc<RecordingListener>,
}

impl Recorded {
    pub(crate) fn stateful(&self) -> &dyn StatefulMegawidget {
        self.megawidget
            .as_stateful()
            .expect("megawidget is stateful")
    }
}

/// Build one megawidget from a JSON configuration with recording collaborators.
pub(crate) fn recorded(config: serde_json::Value) -> Recorded {
    let provider = Arc::new(RecordingProvider::default());
    let listener = Arc::new(RecordingListener::default());
    let config = config.as_object().cloned().expect("configuration is a map");
    let specifier = SpecifierFactory::with_builtin_types()
        .create_specifier(Capabilities::NONE, &config)
        .expect("valid specifier");
    let params = CreationParams::new()
        .with_renderers(provider.clone())
        .with_state_listener(listener.clone());
    let megawidget = specifier
        .create_megawidget(&params)
        .expect("megawidget created");
    Recorded {
        renderer: provider.renderer(specifier.identifier()),
        megawidget,
        listener,
    }
}

//! Shared helpers for megawidget integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Once};

use megawidget::prelude::*;
use parking_lot::Mutex;

static INIT: Once = Once::new();

/// Install a test subscriber honouring `RUST_LOG`.
pub fn setup() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Records renderer hook calls.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Renderer for Recorder {
    fn synchronize_to_state(&self, _megawidget: &dyn StatefulMegawidget, identifier: &str) {
        self.events.lock().push(format!("state:{identifier}"));
    }

    fn prepare_for_choices_change(&self, _megawidget: &dyn StatefulMegawidget) {
        self.events.lock().push("prepare".into());
    }

    fn cancel_preparation(&self, _megawidget: &dyn StatefulMegawidget) {
        self.events.lock().push("cancel".into());
    }

    fn synchronize_to_choices(&self, _megawidget: &dyn StatefulMegawidget) {
        self.events.lock().push("choices".into());
    }

    fn synchronize_to_property(&self, _megawidget: &dyn Megawidget, name: &str) {
        self.events.lock().push(format!("property:{name}"));
    }
}

/// One [`Recorder`] per megawidget identifier.
#[derive(Default)]
pub struct Recorders {
    recorders: Mutex<HashMap<String, Arc<Recorder>>>,
}

impl Recorders {
    pub fn get(&self, identifier: &str) -> Arc<Recorder> {
        self.recorders
            .lock()
            .entry(identifier.to_owned())
            .or_default()
            .clone()
    }
}

impl RendererProvider for Recorders {
    fn renderer_for(&self, identifier: &str, _type_name: &str) -> Arc<dyn Renderer> {
        self.get(identifier)
    }
}

pub fn factory() -> SpecifierFactory {
    SpecifierFactory::with_builtin_types()
}

pub fn config(value: serde_json::Value) -> ConfigMap {
    value
        .as_object()
        .cloned()
        .expect("test configuration is a map")
}

/// Build a forest of controls.
pub fn forest(configs: &[serde_json::Value]) -> Result<SpecifierManager, SpecificationError> {
    SpecifierManager::from_values(&factory(), configs, Capabilities::CONTROL)
}

/// Build a manager over a forest with recording renderers.
pub fn managed(configs: &[serde_json::Value]) -> (MegawidgetManager, Arc<Recorders>) {
    setup();
    let specifiers = forest(configs).expect("valid forest");
    let recorders = Arc::new(Recorders::default());
    let manager = MegawidgetManager::new(&specifiers, StateMap::new(), recorders.clone())
        .expect("megawidgets created");
    (manager, recorders)
}

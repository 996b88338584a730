//! Runtime state behaviour: pruning, reentrancy, batches and commits.

mod common;

use std::sync::Arc;

use common::{config, managed};
use megawidget::prelude::*;
use parking_lot::Mutex;
use serde_json::json;

#[test]
fn test_combo_box_prunes_to_first_choice() {
    let (manager, recorders) = managed(&[json!({
        "identifier": "letter", "type": "ComboBox", "choices": ["A", "B", "C"], "values": "B"
    })]);
    manager
        .set_mutable_properties("letter", &config(json!({"choices": ["A", "C"]})))
        .unwrap();

    assert_eq!(manager.state("letter"), Some(json!("A")));
    assert_eq!(
        recorders.get("letter").events(),
        ["prepare", "choices", "state:letter"]
    );
}

#[test]
fn test_hierarchical_prune_drops_empty_branches() {
    let (manager, _) = managed(&[json!({
        "identifier": "tree", "type": "HierarchicalChoicesTree",
        "choices": [
            {"name": "Fruit", "children": ["Apple", "Pear"]},
            {"name": "Bread", "children": ["Rye"]}
        ],
        "values": [{"identifier": "Fruit", "children": ["Pear"]}, "Bread"]
    })]);
    manager
        .set_mutable_properties(
            "tree",
            &config(json!({"choices": [
                {"name": "Fruit", "children": ["Apple"]},
                {"name": "Bread", "children": ["Rye", "Spelt"]}
            ]})),
        )
        .unwrap();
    assert_eq!(
        manager.state("tree"),
        Some(json!([{"identifier": "Bread", "children": ["Rye"]}]))
    );
}

#[test]
fn test_re_setting_a_value_is_silent() {
    let (manager, recorders) = managed(&[json!({"identifier": "name", "type": "Text"})]);
    manager.set_state("name", &json!("Ada")).unwrap();
    recorders.get("name").clear();

    manager.set_state("name", &json!("Ada")).unwrap();
    assert!(recorders.get("name").events().is_empty());
}

#[test]
fn test_repeated_user_change_notifies_once() {
    let (manager, _) = managed(&[json!({"identifier": "flag", "type": "CheckBox"})]);
    let heard = Arc::new(Mutex::new(Vec::new()));
    let sink = heard.clone();
    manager
        .state_changed()
        .connect(move |event: &StateChangeEvent| sink.lock().push(event.states.clone()));

    let flag = manager.find("flag").unwrap().as_stateful().unwrap();
    flag.notify_state_change("flag", &json!(true)).unwrap();
    flag.notify_state_change("flag", &json!(true)).unwrap();

    assert_eq!(heard.lock().len(), 1);
    assert_eq!(manager.state("flag"), Some(json!(true)));
}

#[test]
fn test_listener_set_state_is_suppressed() {
    let specifiers = common::forest(&[json!({"identifier": "flag", "type": "CheckBox"})]).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));

    struct Reverting(Arc<Mutex<Vec<Value>>>);
    impl StateChangeListener for Reverting {
        fn state_changed(&self, source: &dyn StatefulMegawidget, identifier: &str, value: &Value) {
            self.0.lock().push(value.clone());
            // Suppressed: the change is still in flight.
            source.set_state(identifier, &json!(false)).unwrap();
        }

        fn states_changed(&self, _source: &dyn StatefulMegawidget, _states: &StateMap) {}
    }

    let megawidgets = specifiers
        .create_megawidgets(
            &CreationParams::new().with_state_listener(Arc::new(Reverting(seen.clone()))),
        )
        .unwrap();
    let flag = megawidgets[0].as_stateful().unwrap();
    flag.notify_state_change("flag", &json!(true)).unwrap();

    assert_eq!(*seen.lock(), [json!(true)]);
    assert_eq!(flag.state("flag").unwrap(), json!(true));
}

#[test]
fn test_batch_applies_bounds_before_values() {
    let (manager, _) = managed(&[json!({
        "identifier": "count", "type": "IntegerSpinner", "minValue": 0, "maxValue": 10
    })]);
    manager
        .set_mutable_properties("count", &config(json!({"values": 15, "maxValue": 20})))
        .unwrap();
    assert_eq!(manager.state("count"), Some(json!(15)));
}

#[test]
fn test_batch_applies_choices_before_values() {
    let (manager, _) = managed(&[json!({
        "identifier": "pick", "type": "CheckBoxes", "choices": ["a", "b"], "values": ["a"]
    })]);
    manager
        .set_mutable_properties("pick", &config(json!({"values": ["c"], "choices": ["b", "c"]})))
        .unwrap();
    assert_eq!(manager.state("pick"), Some(json!(["c"])));
    assert_eq!(
        manager.mutable_properties("pick").unwrap()["choices"],
        json!(["b", "c"])
    );
}

#[test]
fn test_unknown_property_rejects_whole_batch() {
    let (manager, _) = managed(&[json!({"identifier": "flag", "type": "CheckBox"})]);
    let err = manager
        .set_mutable_properties("flag", &config(json!({"values": true, "colour": "red"})))
        .unwrap_err();
    assert_eq!(err.kind(), PropertyErrorKind::NotFound);
    assert_eq!(manager.state("flag"), Some(json!(false)));
}

#[test]
fn test_commit_is_atomic() {
    let (manager, recorders) = managed(&[json!({
        "identifier": "low:high", "type": "IntegerSpinner",
        "minValue": 0, "maxValue": 10, "values": {"low": 2, "high": 5}
    })]);
    let range = manager.find("low:high").unwrap().as_explicit_commit().unwrap();

    range.stage_state("low", &json!(8)).unwrap();
    assert_eq!(range.uncommitted_states(), StateMap::from([("low".into(), json!(8))]));
    let err = range.commit().unwrap_err();
    assert_eq!(err.kind(), StateErrorKind::InterdependencyConflict);
    assert!(range.uncommitted_states().is_empty());
    assert_eq!(range.state("low").unwrap(), json!(2));

    range.stage_state("high", &json!(9)).unwrap();
    range.stage_state("low", &json!(8)).unwrap();
    range.commit().unwrap();
    assert_eq!(range.states()["low"], json!(8));
    assert_eq!(range.states()["high"], json!(9));
    assert_eq!(
        recorders.get("low:high").events(),
        ["state:low", "state:high"]
    );
}

#[test]
fn test_unbounded_list_accepts_new_values() {
    let (manager, _) = managed(&[json!({
        "identifier": "tags", "type": "ListBuilder", "choices": ["rust"]
    })]);
    manager.set_state("tags", &json!(["rust", "wasm"])).unwrap();
    manager
        .set_mutable_properties("tags", &config(json!({"choices": []})))
        .unwrap();
    assert_eq!(manager.state("tags"), Some(json!(["rust", "wasm"])));
}

#[test]
fn test_disabled_group_disables_children() {
    let (manager, recorders) = managed(&[json!({
        "identifier": "box", "type": "Group", "fields": [
            {"identifier": "flag", "type": "CheckBox"},
            {"identifier": "go", "type": "Button"}
        ]
    })]);
    manager
        .set_mutable_properties("box", &config(json!({"enabled": false})))
        .unwrap();
    assert!(!manager.find("flag").unwrap().is_enabled());
    assert!(!manager.find("go").unwrap().is_enabled());
    assert_eq!(recorders.get("flag").events(), ["property:enabled"]);
}

#[test]
fn test_label_updates_render() {
    let (manager, recorders) = managed(&[json!({
        "identifier": "title", "type": "Label", "label": "Draft"
    })]);
    manager
        .set_mutable_properties("title", &config(json!({"label": "Final"})))
        .unwrap();
    assert_eq!(
        manager.mutable_properties("title").unwrap()["label"],
        json!("Final")
    );
    assert_eq!(recorders.get("title").events(), ["property:label"]);
}

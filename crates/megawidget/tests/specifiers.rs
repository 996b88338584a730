//! Specifier construction, factory resolution and forest uniqueness.

mod common;

use std::sync::Arc;

use common::{config, factory, forest, setup};
use megawidget::prelude::*;
use megawidget::config as loader;
use megawidget::specifier::SpecifierRegistry;
use megawidget::widgets::LabelSpecifier;
use megawidget_core::TreeFormatOptions;
use serde_json::json;

#[test]
fn test_unique_identifiers_across_nesting() {
    setup();
    let err = forest(&[
        json!({"identifier": "name", "type": "Text"}),
        json!({"identifier": "outer", "type": "Composite", "fields": [
            {"identifier": "inner", "type": "Group", "fields": [
                {"identifier": "name", "type": "CheckBox"}
            ]}
        ]}),
    ])
    .unwrap_err();
    assert_eq!(err.kind(), SpecificationErrorKind::DuplicateIdentifier);
    assert_eq!(err.identifier(), Some("name"));
}

#[test]
fn test_state_identifier_collides_with_specifier() {
    let err = forest(&[
        json!({"identifier": "low", "type": "CheckBox"}),
        json!({"identifier": "low:high", "type": "IntegerSpinner",
               "minValue": 0, "maxValue": 10}),
    ])
    .unwrap_err();
    assert_eq!(err.kind(), SpecificationErrorKind::DuplicateIdentifier);
}

#[test]
fn test_forest_is_all_or_nothing() {
    let err = forest(&[
        json!({"identifier": "ok", "type": "Label"}),
        json!({"identifier": "bad", "type": "Slider"}),
    ])
    .unwrap_err();
    assert_eq!(err.kind(), SpecificationErrorKind::UnknownType);
    assert!(err.message().contains("SliderSpecifier"));
}

#[test]
fn test_capability_requirement() {
    let err = factory()
        .create_specifier(
            Capabilities::STATEFUL,
            &config(json!({"identifier": "title", "type": "Label"})),
        )
        .unwrap_err();
    assert_eq!(err.kind(), SpecificationErrorKind::WrongCapability);

    let specifier = factory()
        .create_specifier(
            Capabilities::STATEFUL | Capabilities::CHOICES,
            &config(json!({"identifier": "pick", "type": "ComboBox", "choices": ["a"]})),
        )
        .unwrap();
    assert!(specifier.capabilities().contains(Capabilities::MUTABLE_CHOICES));
}

#[test]
fn test_missing_type_and_identifier() {
    let err = factory()
        .create_specifier(Capabilities::NONE, &config(json!({"identifier": "x"})))
        .unwrap_err();
    assert_eq!(err.kind(), SpecificationErrorKind::MissingParameter);
    assert_eq!(err.parameter(), Some("type"));

    let err = factory()
        .create_specifier(Capabilities::NONE, &config(json!({"type": "Label"})))
        .unwrap_err();
    assert_eq!(err.kind(), SpecificationErrorKind::MissingParameter);
    assert_eq!(err.parameter(), Some("identifier"));
}

#[test]
fn test_custom_registration() {
    let mut registry = SpecifierRegistry::with_builtin_types();
    registry.register("Heading", Capabilities::CONTROL, LabelSpecifier::from_config);
    let factory = SpecifierFactory::new(registry);

    let specifier = factory
        .create_specifier(
            Capabilities::CONTROL,
            &config(json!({"identifier": "h1", "type": "Heading", "label": "Intro"})),
        )
        .unwrap();
    assert_eq!(specifier.type_name(), "Heading");
    assert_eq!(specifier.label(), Some("Intro"));
}

#[test]
fn test_starting_states_are_corrected() {
    let specifiers = forest(&[
        json!({"identifier": "pick", "type": "ComboBox", "choices": ["a", "b"], "values": "b"}),
        json!({"identifier": "size", "type": "IntegerSpinner", "minValue": 1, "maxValue": 5}),
        json!({"identifier": "low:high", "type": "IntegerSpinner", "minValue": 0, "maxValue": 9,
               "values": {"low": 2, "high": 6}}),
    ])
    .unwrap();
    let mut states = StateMap::from([
        ("pick".to_string(), json!("zzz")),
        ("size".to_string(), json!(40)),
        ("low".to_string(), json!(8)),
        ("high".to_string(), json!(3)),
    ]);
    specifiers.populate_starting_states(&mut states);

    assert_eq!(states["pick"], json!("b"));
    assert_eq!(states["size"], json!(5));
    // Jointly invalid, so both fall back to the configured values.
    assert_eq!(states["low"], json!(2));
    assert_eq!(states["high"], json!(6));
}

#[test]
fn test_load_from_json() {
    let text = r#"[
        {"identifier": "title", "type": "Label", "label": "Export"},
        {"identifier": "format", "type": "ComboBox", "choices": ["csv", "json"]},
        {"identifier": "extras", "type": "Group", "fields": [
            {"identifier": "header", "type": "CheckBox", "values": true}
        ]}
    ]"#;
    let specifiers = loader::load_specifiers(&factory(), text, Capabilities::CONTROL).unwrap();
    assert_eq!(specifiers.specifiers().len(), 3);
    assert!(specifiers.find("header").is_some());

    let dump = specifiers.format_tree(TreeFormatOptions::default());
    assert!(dump.contains("extras"));
    assert!(dump.contains("header"));
}

#[test]
fn test_specifiers_shared_across_threads() {
    let specifiers = Arc::new(
        forest(&[json!({"identifier": "flag", "type": "CheckBox"})]).unwrap(),
    );
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let specifiers = specifiers.clone();
            std::thread::spawn(move || {
                specifiers
                    .create_megawidgets(&CreationParams::new())
                    .map(|megawidgets| megawidgets.len())
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), 1);
    }
}

//! Tests for selector parsing, validation and matching

use crate::element::UIElementAttributes;
use crate::{AutomationError, Selector};

fn attrs(type_name: &str, name: Option<&str>, text: Option<&str>) -> UIElementAttributes {
    UIElementAttributes {
        type_name: type_name.to_string(),
        name: name.map(str::to_string),
        text: text.map(str::to_string),
        visible: true,
        enabled: true,
        ..Default::default()
    }
}

#[test]
fn test_parse_real_name() {
    let sel: Selector = "{name='Repo' type='QLineEdit' visible='1'}".parse().unwrap();
    assert_eq!(sel.type_name(), Some("QLineEdit"));
    assert_eq!(sel.name(), Some("Repo"));
    assert_eq!(sel.visible(), Some(true));
    assert!(sel.properties().is_empty());
}

#[test]
fn test_unknown_keys_become_properties() {
    let sel: Selector = "{type='ProjectExplorer::JsonWizard' windowTitle='Git Repository Clone'}"
        .parse()
        .unwrap();
    assert_eq!(
        sel.properties().get("windowTitle").map(String::as_str),
        Some("Git Repository Clone")
    );
}

#[test]
fn test_quoting_and_escapes() {
    let sel: Selector = r#"{text="it's" name='a\'b' type=QLabel}"#.parse().unwrap();
    assert_eq!(sel.text(), Some("it's"));
    assert_eq!(sel.name(), Some("a'b"));
    assert_eq!(sel.type_name(), Some("QLabel"));
}

#[test]
fn test_leading_spaces_in_values_survive() {
    let sel: Selector = "{text='  Import Project' type='QModelIndex'}".parse().unwrap();
    assert_eq!(sel.text(), Some("  Import Project"));
}

#[test]
fn test_nested_container() {
    let sel: Selector = "{text='Cancel' type='QPushButton' window={type='QDialog' visible='1'}}"
        .parse()
        .unwrap();
    let container = sel.container().expect("container parsed");
    assert_eq!(container.type_name(), Some("QDialog"));
    assert_eq!(container.visible(), Some(true));
}

#[test]
fn test_symbolic_reference_needs_object_map() {
    let err = "{type='QLabel' window=':Qt Creator_Core::Internal::MainWindow'}"
        .parse::<Selector>()
        .unwrap_err();
    assert!(matches!(err, AutomationError::InvalidSelector(_)));
}

#[test]
fn test_invalid_selectors_rejected() {
    for input in [
        "{}",
        "type='QLabel'",
        "{type='QLabel'",
        "{type=''}",
        "{type='QLabel' visible='maybe'}",
        "{type='QLabel' occurrence='0'}",
        "{type='QLabel' text={type='QDialog'}}",
        "{type='QLabel'} trailing",
    ] {
        let result = input.parse::<Selector>();
        assert!(
            matches!(result, Err(AutomationError::InvalidSelector(_))),
            "{input:?} should be rejected, got {result:?}"
        );
    }
}

#[test]
fn test_builder_requires_a_constraint() {
    assert!(Selector::builder().build().is_err());
    assert!(Selector::builder().property(" ", "x").build().is_err());
    assert!(Selector::builder().visible(true).build().is_ok());
}

#[test]
fn test_display_is_canonical_and_reparses() {
    let sel: Selector = "{visible='1' type='QPushButton' text='Next >' occurrence='2'}"
        .parse()
        .unwrap();
    let rendered = sel.to_string();
    assert_eq!(
        rendered,
        "{occurrence='2' text='Next >' type='QPushButton' visible='1'}"
    );
    let again: Selector = rendered.parse().unwrap();
    assert_eq!(again, sel);
}

#[test]
fn test_matches_attributes() {
    let sel: Selector = "{type='QLineEdit' name='Dir' visible='1'}".parse().unwrap();
    assert!(sel.matches_attributes(&attrs("QLineEdit", Some("Dir"), None)));
    assert!(!sel.matches_attributes(&attrs("QLineEdit", Some("Repo"), None)));
    assert!(!sel.matches_attributes(&attrs("QComboBox", Some("Dir"), None)));

    let mut hidden = attrs("QLineEdit", Some("Dir"), None);
    hidden.visible = false;
    assert!(!sel.matches_attributes(&hidden));
}

#[test]
fn test_unnamed_flag() {
    let sel: Selector = "{type='QLabel' unnamed='1'}".parse().unwrap();
    assert!(sel.matches_attributes(&attrs("QLabel", None, Some("x"))));
    assert!(sel.matches_attributes(&attrs("QLabel", Some(""), None)));
    assert!(!sel.matches_attributes(&attrs("QLabel", Some("statusLabel"), None)));
}

#[test]
fn test_property_constraints() {
    let sel: Selector = "{type='QMenu' title='File'}".parse().unwrap();
    let mut menu = attrs("QMenu", None, None);
    assert!(!sel.matches_attributes(&menu));
    menu.properties.insert("title".into(), "File".into());
    assert!(sel.matches_attributes(&menu));
}

#[test]
fn test_serde_roundtrip_keeps_container() {
    let sel: Selector = "{type='QLabel' window={type='QDialog'}}".parse().unwrap();
    let json = serde_json::to_string(&sel).unwrap();
    let back: Selector = serde_json::from_str(&json).unwrap();
    assert_eq!(back, sel);
}

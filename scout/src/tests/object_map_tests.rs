//! Tests for object map parsing and symbolic name resolution

use crate::{names, AutomationError, ObjectMap};

const MAP: &str = "
# comment lines and blank lines are skipped

:Main_Window\t{type='Core::Internal::MainWindow' visible='1'}
:Main.Clear_QToolButton\t{text='Clear' type='QToolButton' window=':Main_Window'}
:Main.Pane.Label_QLabel {type='QLabel' window=':Main.Clear_QToolButton'}
";

#[test]
fn test_parse_and_resolve_with_window_reference() {
    let map = ObjectMap::parse(MAP).unwrap();
    assert_eq!(map.len(), 3);

    let clear = map.resolve(":Main.Clear_QToolButton").unwrap();
    assert_eq!(clear.text(), Some("Clear"));
    let window = clear.container().expect("window resolved");
    assert_eq!(window.type_name(), Some("Core::Internal::MainWindow"));
}

#[test]
fn test_space_separated_entries_and_chains() {
    let map = ObjectMap::parse(MAP).unwrap();
    let label = map.resolve(":Main.Pane.Label_QLabel").unwrap();
    let outer = label
        .container()
        .and_then(|c| c.container())
        .expect("two levels of containers");
    assert_eq!(outer.type_name(), Some("Core::Internal::MainWindow"));
}

#[test]
fn test_real_names_resolve_directly() {
    let map = ObjectMap::parse(MAP).unwrap();
    let sel = map
        .resolve("{type='QLabel' window=':Main_Window'}")
        .unwrap();
    assert!(sel.container().is_some());
}

#[test]
fn test_unknown_name() {
    let map = ObjectMap::parse(MAP).unwrap();
    let err = map.resolve(":Nope").unwrap_err();
    assert!(matches!(err, AutomationError::InvalidSelector(_)));
    assert!(map.resolve("Main_Window").is_err());
}

#[test]
fn test_cycles_are_detected() {
    let map = ObjectMap::parse(
        ":A\t{type='QWidget' window=':B'}\n:B\t{type='QWidget' window=':A'}\n",
    )
    .unwrap();
    let err = map.resolve(":A").unwrap_err();
    assert!(err.to_string().contains("cyclic"), "{err}");
    assert_eq!(map.validate().len(), 2);
}

#[test]
fn test_malformed_lines() {
    assert!(ObjectMap::parse("Main_Window\t{type='QWidget'}").is_err());
    assert!(ObjectMap::parse(":Main_Window no braces here").is_err());
    assert!(ObjectMap::parse(":A\t{type='X'}\n:A\t{type='Y'}").is_err());
}

#[test]
fn test_merge_overrides() {
    let mut map = ObjectMap::parse(MAP).unwrap();
    let mut extra = ObjectMap::new();
    extra.insert(":Main_Window", "{type='QMainWindow'}");
    map.merge(extra);
    assert_eq!(map.real_name(":Main_Window"), Some("{type='QMainWindow'}"));
    let clear = map.resolve(":Main.Clear_QToolButton").unwrap();
    assert_eq!(
        clear.container().and_then(|c| c.type_name()),
        Some("QMainWindow")
    );
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("objects.map");
    std::fs::write(&path, MAP).unwrap();
    let map = ObjectMap::load(&path).unwrap();
    assert_eq!(map.symbolic_names().count(), 3);
    assert!(ObjectMap::load(dir.path().join("missing.map")).is_err());
}

#[test]
fn test_builtin_map_is_valid() {
    let map = names::builtin();
    assert!(!map.is_empty());
    let failures = map.validate();
    assert!(failures.is_empty(), "invalid built-in entries: {failures:?}");
    for name in [
        names::MAIN_WINDOW,
        names::CLONE_FINISH,
        names::CLONE_RESULT_LABEL,
        names::OUTPUT_PANE,
        names::PLUGIN_ERRORS_CLOSE,
        names::BUILD_CONFIG_COMBO,
    ] {
        assert!(map.real_name(name).is_some(), "{name} missing from built-in map");
    }
}

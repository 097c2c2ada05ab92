//! Tests for the simulated engine and the locator on top of it

use crate::platforms::simulated::{
    NodeId, SimHandle, SimulatedApplication, SimulatedEngine, Widget, ROOT,
};
use crate::platforms::AutomationEngine;
use crate::{AutomationError, Locator, Resolution, Selector};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct TwoButtons;

impl SimulatedApplication for TwoButtons {
    fn program(&self) -> &str {
        "buttons"
    }

    fn build(&self, handle: &SimHandle, _args: &[String]) -> Result<NodeId, AutomationError> {
        let window = handle.add(ROOT, Widget::new("QMainWindow").property("windowTitle", "Main"))?;
        let panel = handle.add(window, Widget::new("QWidget").named("panel"))?;
        handle.add(panel, Widget::new("QPushButton").text("OK").named("first"))?;
        handle.add(window, Widget::new("QPushButton").text("OK").named("second"))?;
        handle.add(window, Widget::new("QLabel").text("hidden").hidden())?;
        Ok(window)
    }
}

fn launched() -> Arc<SimulatedEngine> {
    super::init_tracing();
    let engine = SimulatedEngine::with_poll_interval(Arc::new(TwoButtons), Duration::from_millis(10));
    engine.launch("buttons", &[]).unwrap();
    engine
}

fn locator(engine: &Arc<SimulatedEngine>, selector: &str) -> Locator {
    Locator::new(engine.clone(), selector.parse().unwrap())
}

#[tokio::test]
async fn test_first_match_in_depth_first_order() {
    let engine = launched();
    let ok = locator(&engine, "{type='QPushButton' text='OK'}")
        .wait(Some(Duration::ZERO))
        .await
        .unwrap();
    assert_eq!(ok.name().as_deref(), Some("first"));

    let second = locator(&engine, "{type='QPushButton' text='OK' occurrence='2'}")
        .wait(Some(Duration::ZERO))
        .await
        .unwrap();
    assert_eq!(second.name().as_deref(), Some("second"));

    let all = locator(&engine, "{type='QPushButton'}").all(None).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_resolution_is_idempotent() {
    let engine = launched();
    let loc = locator(&engine, "{type='QPushButton' text='OK'}");
    let a = loc.wait(Some(Duration::ZERO)).await.unwrap();
    let b = loc.wait(Some(Duration::ZERO)).await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a.attributes(), b.attributes());
}

#[tokio::test]
async fn test_container_matches_any_ancestor() {
    let engine = launched();
    let in_panel = locator(&engine, "{type='QPushButton' window={name='panel'}}")
        .wait(Some(Duration::ZERO))
        .await
        .unwrap();
    assert_eq!(in_panel.name().as_deref(), Some("first"));

    let in_main = locator(&engine, "{name='second' window={windowTitle='Main'}}");
    assert!(in_main.exists());
}

#[tokio::test]
async fn test_visibility_follows_ancestors() {
    let engine = launched();
    let panel = engine.handle().find_named("panel").unwrap();
    let visible_first = locator(&engine, "{name='first' visible='1'}");
    assert!(visible_first.exists());
    engine.handle().set_visible(panel, false).unwrap();
    assert!(!visible_first.exists());
    assert!(locator(&engine, "{name='first' visible='0'}").exists());
}

#[tokio::test]
async fn test_not_found_after_timeout() {
    let engine = launched();
    let start = Instant::now();
    let err = locator(&engine, "{type='QCheckBox'}")
        .wait(Some(Duration::from_millis(200)))
        .await
        .unwrap_err();
    let elapsed = start.elapsed();
    assert!(matches!(err, AutomationError::ElementNotFound(_)));
    assert!(elapsed >= Duration::from_millis(200), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(200 + 10 + 200), "{elapsed:?}");
}

#[tokio::test]
async fn test_element_appearing_later_is_found() {
    let engine = launched();
    let handle = engine.handle().clone();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        let _ = handle.add(ROOT, Widget::new("QDialog").text("late"));
    });
    let start = Instant::now();
    let dialog = locator(&engine, "{type='QDialog'}")
        .wait(Some(Duration::from_secs(5)))
        .await
        .unwrap();
    assert_eq!(dialog.text().unwrap(), "late");
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_handles_detach_when_removed() {
    let engine = launched();
    let button = locator(&engine, "{name='second'}").wait(None).await.unwrap();
    assert!(button.is_alive());
    let id = engine.handle().find_named("second").unwrap();
    engine.handle().remove(id).unwrap();
    assert!(!button.is_alive());
    assert!(matches!(button.click(), Err(AutomationError::ElementDetached(_))));
    assert!(matches!(button.text(), Err(AutomationError::ElementDetached(_))));
}

#[tokio::test]
async fn test_click_requires_enabled_and_runs_handler() {
    let engine = launched();
    let handle = engine.handle();
    let id = handle.find_named("first").unwrap();
    let clicks = Arc::new(AtomicUsize::new(0));
    let counter = clicks.clone();
    handle
        .on_click(id, Arc::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
        .unwrap();

    let button = engine.element_for(id).unwrap();
    button.click().unwrap();
    handle.set_enabled(id, false).unwrap();
    assert!(matches!(button.click(), Err(AutomationError::ElementNotEnabled(_))));
    assert_eq!(clicks.load(Ordering::SeqCst), 1);

    let hidden = locator(&engine, "{type='QLabel'}").wait(None).await.unwrap();
    assert!(matches!(hidden.click(), Err(AutomationError::ElementNotVisible(_))));
}

#[tokio::test]
async fn test_click_at_checks_bounds() {
    let engine = launched();
    let window = locator(&engine, "{type='QMainWindow'}").wait(None).await.unwrap();
    let (_, _, w, h) = window.bounds().unwrap();
    assert!(window.click_at(w / 2.0, h / 2.0).is_ok());
    assert!(matches!(
        window.click_at(w + 1.0, 0.0),
        Err(AutomationError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn test_resolve_or_falls_back() {
    let engine = launched();
    let primary = locator(&engine, "{type='QDialog'}");
    let alternate = locator(&engine, "{type='QMainWindow'}");
    match primary
        .resolve_or(&alternate, Some(Duration::from_millis(50)))
        .await
    {
        Resolution::Alternate(window) => assert_eq!(window.type_name(), "QMainWindow"),
        other => panic!("expected the alternate, got {other:?}"),
    }

    let missing = locator(&engine, "{type='QToolBar'}");
    assert!(matches!(
        primary.resolve_or(&missing, Some(Duration::ZERO)).await,
        Resolution::Missing(AutomationError::ElementNotFound(_))
    ));

    assert!(alternate
        .resolve_or(&primary, Some(Duration::ZERO))
        .await
        .is_found());
}

#[tokio::test]
async fn test_nested_locators() {
    let engine = launched();
    let panel = locator(&engine, "{name='panel'}");
    let inner = panel
        .locator(Selector::builder().type_name("QPushButton").build().unwrap())
        .unwrap();
    let found = inner.all(None).await.unwrap();
    assert_eq!(found.len(), 1);

    let panel_el = panel.wait(None).await.unwrap();
    let scoped = panel_el
        .locator(Selector::builder().text("OK").build().unwrap())
        .unwrap();
    assert_eq!(scoped.wait(None).await.unwrap().name().as_deref(), Some("first"));
}

#[tokio::test]
async fn test_launch_lifecycle() {
    let engine = launched();
    assert!(engine.is_running());
    assert!(matches!(
        engine.launch("buttons", &[]),
        Err(AutomationError::UnsupportedOperation(_))
    ));
    assert!(engine.launch("other", &[]).is_err());

    // removing every window counts as the application exiting
    engine.handle().clear().unwrap();
    assert!(!engine.is_running());
    engine.launch("buttons", &[]).unwrap();
    engine.terminate().unwrap();
    assert!(!engine.is_running());
}

#[tokio::test]
async fn test_nested_locator_keeps_inner_container() {
    let engine = launched();
    let main = locator(&engine, "{type='QMainWindow'}");

    let excluded = main
        .locator("{type='QPushButton' window={name='nowhere'}}".parse().unwrap())
        .unwrap();
    assert!(!excluded.exists(), "{}", excluded.selector_string());

    let in_panel = main
        .locator("{type='QPushButton' window={name='panel'}}".parse().unwrap())
        .unwrap();
    let found = in_panel.all(None).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name().as_deref(), Some("first"));

    let outer = in_panel.selector_string();
    assert!(outer.contains("panel") && outer.contains("QMainWindow"), "{outer}");
}

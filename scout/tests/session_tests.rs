use scout::names;
use scout::platforms::simulated::SimulatedEngine;
use scout::scenarios::shared::{
    create_project_or_file_select_type, open_application_output, open_vcs_log,
};
use scout::simulation::{IdeOptions, SimulatedIde};
use scout::{AutomationError, ObjectMap, Session, SessionConfig};
use std::time::Duration;

fn session() -> Session {
    let ide = SimulatedIde::new(IdeOptions::default());
    let engine = SimulatedEngine::with_poll_interval(ide, Duration::from_millis(10));
    let config = SessionConfig {
        object_timeout_ms: 1_000,
        poll_interval_ms: 10,
        startup_grace_ms: 50,
        ..SessionConfig::default()
    };
    Session::new(engine, config).unwrap()
}

#[tokio::test]
async fn test_launch_and_exit_through_menu() {
    let session = session();
    let main_window = session.launch().await.unwrap();
    assert_eq!(main_window.type_name(), "Core::Internal::MainWindow");
    assert!(session.engine().is_running());

    session.invoke_menu_item("File", &["Exit"]).await.unwrap();
    assert!(!session.engine().is_running());
    assert!(!main_window.is_alive());
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_temp_dirs_removed_on_shutdown() {
    let session = session();
    session.launch().await.unwrap();
    let a = session.temp_dir().unwrap();
    let b = session.temp_dir().unwrap();
    assert_ne!(a, b);
    assert!(a.is_dir() && b.is_dir());
    session.shutdown().await.unwrap();
    assert!(!a.exists());
    assert!(!b.exists());
}

#[tokio::test]
async fn test_submenus_and_output_panes() {
    let session = session();
    session.launch().await.unwrap();
    assert!(!session.object_exists(names::VCS_PANE_LABEL));
    open_vcs_log(&session).await.unwrap();
    assert!(session.object_exists(names::VCS_PANE_LABEL));
    assert!(session.object_exists(names::OUTPUT_PANE));
    open_application_output(&session).await.unwrap();
    assert!(!session.object_exists(names::VCS_PANE_LABEL));
    assert!(session.object_exists(names::OUTPUT_PANE));

    let err = session
        .invoke_menu_item("View", &["No Such Item"])
        .await
        .unwrap_err();
    assert!(matches!(err, AutomationError::ElementNotFound(_)));
    assert!(session.invoke_menu_item("View", &[]).await.is_err());
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_new_dialog_opens_clone_wizard() {
    let session = session();
    session.launch().await.unwrap();
    create_project_or_file_select_type(&session, "  Import Project", "Git Clone")
        .await
        .unwrap();
    assert!(session.find_object(names::CLONE_WIZARD).await.is_ok());
    // Finish is hidden on the first page
    assert!(!session.object_exists(names::CLONE_FINISH));
    session.click_button(names::CLONE_CANCEL).await.unwrap();
    assert!(!session.object_exists(names::NEW_WIZARD));
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_object_timeout_bounds_lookups() {
    let session = session();
    session.launch().await.unwrap();
    let start = std::time::Instant::now();
    let err = session
        .wait_for_object(names::CONFIGURE_PROJECT, Some(Duration::from_millis(150)))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(start.elapsed() < Duration::from_millis(150 + 10 + 250));
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_custom_object_map() {
    let map = ObjectMap::parse(
        ":My.Clear\t{text='Clear' type='QToolButton' window=':Qt Creator_Core::Internal::MainWindow'}",
    )
    .unwrap();
    let session = session().with_object_map(map);
    session.launch().await.unwrap();
    assert!(session.find_object(":My.Clear").await.is_ok());
    assert!(matches!(
        session.locator(":Not.Mapped"),
        Err(AutomationError::InvalidSelector(_))
    ));
    assert!(!session.object_exists(":Not.Mapped"));
    session.shutdown().await.unwrap();
}

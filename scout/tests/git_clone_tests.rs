use scout::platforms::simulated::SimulatedEngine;
use scout::scenarios::{CloneEnding, CloneState, GitCloneScenario};
use scout::simulation::{IdeOptions, SimulatedIde};
use scout::{run_scenario, Session, SessionConfig, Verdict};
use std::sync::Arc;
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn session(options: IdeOptions) -> (Session, Arc<SimulatedIde>) {
    session_with_timeout(options, 5_000)
}

fn session_with_timeout(options: IdeOptions, object_timeout_ms: u64) -> (Session, Arc<SimulatedIde>) {
    init_tracing();
    let ide = SimulatedIde::new(options);
    let engine = SimulatedEngine::with_poll_interval(ide.clone(), Duration::from_millis(10));
    let config = SessionConfig {
        object_timeout_ms,
        wait_timeout_ms: 5_000,
        poll_interval_ms: 10,
        startup_grace_ms: 100,
        ..SessionConfig::default()
    };
    (Session::new(engine, config).unwrap(), ide)
}

fn slow_steps() -> IdeOptions {
    IdeOptions {
        step_delay: Duration::from_millis(150),
        ..IdeOptions::default()
    }
}

fn messages(session: &Session, verdict: Verdict) -> Vec<String> {
    session
        .outcomes()
        .records()
        .into_iter()
        .filter(|r| r.verdict == verdict)
        .map(|r| format!("{}: {}", r.message, r.detail.unwrap_or_default()))
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_all_endings_pass() {
    let (session, ide) = session(slow_steps());
    let scenario = GitCloneScenario::new().with_finish_timeout(Duration::from_secs(10));
    let summary = run_scenario(&scenario, &session).await;

    assert!(summary.succeeded(), "failures: {:?}", messages(&session, Verdict::Fail));
    assert_eq!(summary.fatals, 0, "{:?}", messages(&session, Verdict::Fatal));
    assert_eq!(summary.warnings, 0, "{:?}", messages(&session, Verdict::Warning));
    assert!(summary.passes > 20);

    let traces = scenario.traces();
    assert_eq!(traces.len(), 3);
    assert!(traces.iter().all(|t| t.completed()), "{traces:?}");
    assert!(traces[0].states().contains(&CloneState::Canceled));
    assert!(!traces[0].states().contains(&CloneState::FilesVerified));
    for trace in &traces[1..] {
        assert!(trace.states().contains(&CloneState::Finished));
        assert!(trace.states().contains(&CloneState::FilesVerified));
    }

    // Finish opened the cloned project
    let opened = ide.opened_project().expect("project opened");
    assert!(opened.ends_with("myCloneOfIfw"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_during_clone() {
    let (session, _ide) = session(slow_steps());
    let scenario = GitCloneScenario::new().with_endings(&[CloneEnding::CancelImmediately]);
    let summary = run_scenario(&scenario, &session).await;
    assert!(summary.succeeded(), "{:?}", messages(&session, Verdict::Fail));

    let records = session.outcomes().records();
    let label = records
        .iter()
        .find(|r| r.message == "Verifying expected result (Failed.)")
        .expect("result label checked");
    assert_eq!(label.verdict, Verdict::Pass);
    let abnormal = records
        .iter()
        .find(|r| r.message == "Searching for result in clone log")
        .expect("vcs log checked");
    assert_eq!(abnormal.verdict, Verdict::Pass);

    let trace = &scenario.traces()[0];
    assert_eq!(
        trace.states(),
        &[
            CloneState::Idle,
            CloneState::DialogOpened,
            CloneState::CloningInProgress,
            CloneState::Canceled,
            CloneState::LogVerified,
            CloneState::VcsLogVerified,
            CloneState::Closed,
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_git_failure_is_a_warning() {
    let (session, _ide) = session(IdeOptions {
        clone_failure: Some("unable to access 'https://code.qt.io/': Could not resolve host".into()),
        ..slow_steps()
    });
    let scenario = GitCloneScenario::new().with_endings(&[CloneEnding::FinishButton]);
    let summary = run_scenario(&scenario, &session).await;

    assert!(summary.succeeded(), "{:?}", messages(&session, Verdict::Fail));
    assert_eq!(summary.warnings, 1);
    let trace = &scenario.traces()[0];
    assert_eq!(trace.current(), CloneState::Closed);
    assert!(!trace.states().contains(&CloneState::Finished));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unopenable_project_is_reported() {
    let (session, ide) = session(IdeOptions {
        project_openable: false,
        ..IdeOptions::default()
    });
    let scenario = GitCloneScenario::new().with_endings(&[CloneEnding::FinishButton]);
    let summary = run_scenario(&scenario, &session).await;

    assert_eq!(summary.fails, 1);
    let fails = messages(&session, Verdict::Fail);
    assert!(fails[0].starts_with("The checked out project was not being opened."));
    assert!(fails[0].contains("myCloneOfIfw"));
    assert!(ide.opened_project().is_none());
    // the pass still ran through the version control checks
    assert!(scenario.traces()[0].completed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_missing_files_fail() {
    let (session, _ide) = session(IdeOptions {
        clone_files: vec![".gitignore".into(), "installerfw.pro".into()],
        ..IdeOptions::default()
    });
    let scenario = GitCloneScenario::new().with_endings(&[CloneEnding::CancelButton]);
    let summary = run_scenario(&scenario, &session).await;

    assert_eq!(summary.fails, 3, "{:?}", messages(&session, Verdict::Fail));
    let fails = messages(&session, Verdict::Fail);
    assert!(fails.iter().any(|f| f.contains("src/sdk/main.cpp")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_plugin_error_skips_scenario() {
    let (session, _ide) = session(IdeOptions {
        plugin_error: Some("Plugin Git failed to load".into()),
        ..IdeOptions::default()
    });
    let scenario = GitCloneScenario::new();
    let summary = run_scenario(&scenario, &session).await;

    assert_eq!(summary.fatals, 1);
    assert!(scenario.traces().is_empty());
    let fatal = messages(&session, Verdict::Fatal);
    assert!(fatal[0].contains("Plugin Git failed to load"));
    assert!(!session.engine().is_running());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_repeated_progress_lines_fail() {
    let (session, ide) = session(IdeOptions {
        repeated_progress: true,
        ..slow_steps()
    });
    let scenario = GitCloneScenario::new()
        .with_clone_dir("ifwCopy")
        .with_endings(&[CloneEnding::FinishButton]);
    let summary = run_scenario(&scenario, &session).await;

    let fails = messages(&session, Verdict::Fail);
    assert_eq!(summary.fails, 3, "{fails:?}");
    for line in ["remote: Total", "Receiving objects:", "Resolving deltas:"] {
        assert!(
            fails.iter().any(|f| f.contains(line) && f.contains("expected 1, got 2")),
            "{line} not reported: {fails:?}"
        );
    }
    assert_eq!(summary.fatals, 0);
    // the log checks do not stop the pass
    assert!(scenario.traces()[0].completed());
    let opened = ide.opened_project().expect("project opened");
    assert!(opened.ends_with("ifwCopy"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_clone_without_fatal_line() {
    let (session, ide) = session_with_timeout(
        IdeOptions {
            silent_clone_failure: true,
            ..slow_steps()
        },
        1_000,
    );
    let scenario = GitCloneScenario::new().with_endings(&[CloneEnding::FinishButton]);
    let start = std::time::Instant::now();
    let summary = run_scenario(&scenario, &session).await;
    // stopped on the Failed. label instead of waiting out the finish timeout
    assert!(start.elapsed() < Duration::from_secs(30), "{:?}", start.elapsed());

    // no fatal: line, so this is not the "failed outside the IDE" warning
    assert_eq!(summary.warnings, 0, "{:?}", messages(&session, Verdict::Warning));

    let fails = messages(&session, Verdict::Fail);
    assert!(fails.iter().any(|f| f.contains("remote: Total")), "{fails:?}");
    assert!(fails.iter().any(|f| f.starts_with("Verifying expected result (Succeeded.)")), "{fails:?}");
    assert!(fails.iter().any(|f| f.contains("src/sdk/main.cpp")), "{fails:?}");
    assert_eq!(summary.fails, 9, "{fails:?}");

    // Finish never enables: fatal, then the wizard is left through Cancel
    let fatals = messages(&session, Verdict::Fatal);
    assert_eq!(fatals.len(), 1, "{fatals:?}");
    assert!(fatals[0].starts_with("Cloning failed"));
    assert!(fatals[0].contains("remote: Enumerating objects"));
    assert!(ide.opened_project().is_none());

    let trace = &scenario.traces()[0];
    assert_eq!(
        trace.states(),
        &[
            CloneState::Idle,
            CloneState::DialogOpened,
            CloneState::CloningInProgress,
            CloneState::Finished,
            CloneState::LogVerified,
            CloneState::FilesVerified,
            CloneState::Closed,
        ]
    );
    assert!(!trace.completed());
}

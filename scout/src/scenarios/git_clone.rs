//! Cloning a remote repository through the IDE's Git clone wizard

use super::shared::{close_proposal_popup, create_project_or_file_select_type, open_vcs_log};
use super::Scenario;
use crate::element::UIElement;
use crate::errors::AutomationError;
use crate::locator::Resolution;
use crate::names;
use crate::session::Session;
use crate::text::{check_log, LogExpectation};
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

pub const CLONE_URL: &str = "https://code.qt.io/installer-framework/installer-framework.git";
const CLONE_DIR: &str = "myCloneOfIfw";
/// Files every checkout of [`CLONE_URL`] contains
const EXPECTED_FILES: &[&str] = &[
    ".gitignore",
    "LICENSE.GPL3-EXCEPT",
    "installerfw.pro",
    "tests/test-installer/create-test-installer.bat",
    "src/sdk/main.cpp",
];
const RUNNING: &str = "Running Git clone...";
const SUCCEEDED: &str = "Succeeded.";
const FAILED: &str = "Failed.";

/// How one pass through the wizard ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CloneEnding {
    /// Cancel while the clone is still running
    CancelImmediately,
    /// Let the clone finish, then leave through Cancel
    CancelButton,
    /// Let the clone finish, then open the project through Finish
    FinishButton,
}

impl CloneEnding {
    pub const ALL: [CloneEnding; 3] = [
        CloneEnding::CancelImmediately,
        CloneEnding::CancelButton,
        CloneEnding::FinishButton,
    ];

    pub fn canceled(self) -> bool {
        self == CloneEnding::CancelImmediately
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CloneState {
    Idle,
    DialogOpened,
    CloningInProgress,
    Canceled,
    Finished,
    LogVerified,
    FilesVerified,
    VcsLogVerified,
    Closed,
}

/// States one wizard pass went through, in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioTrace {
    pub ending: CloneEnding,
    states: Vec<CloneState>,
}

impl ScenarioTrace {
    pub fn new(ending: CloneEnding) -> Self {
        Self {
            ending,
            states: vec![CloneState::Idle],
        }
    }

    pub fn states(&self) -> &[CloneState] {
        &self.states
    }

    pub fn current(&self) -> CloneState {
        self.states.last().copied().unwrap_or(CloneState::Idle)
    }

    fn visited(&self, state: CloneState) -> bool {
        self.states.contains(&state)
    }

    /// Whether the pass ran through every verification step
    pub fn completed(&self) -> bool {
        self.visited(CloneState::VcsLogVerified) && self.current() == CloneState::Closed
    }

    /// Moves to `next`, rejecting transitions the workflow does not have.
    /// Any state may jump to `Closed` when a pass is abandoned.
    pub fn advance(&mut self, next: CloneState) -> Result<(), AutomationError> {
        use CloneState::*;
        let from = self.current();
        let legal = match (from, next) {
            (Closed, _) => false,
            (_, Closed) => true,
            (Idle, DialogOpened) => true,
            (DialogOpened, CloningInProgress) => true,
            (CloningInProgress, Canceled | Finished) => true,
            (Canceled | Finished, LogVerified) => true,
            (LogVerified, FilesVerified) => self.visited(Finished),
            (LogVerified, VcsLogVerified) => self.visited(Canceled),
            (FilesVerified, VcsLogVerified) => true,
            _ => false,
        };
        if !legal {
            return Err(AutomationError::Internal(format!(
                "illegal clone state transition {from:?} -> {next:?}"
            )));
        }
        debug!(?from, to = ?next, ending = ?self.ending, "clone state");
        self.states.push(next);
        Ok(())
    }
}

/// How a running clone came to rest
enum CloneEnd {
    Completed(String),
    /// git itself failed, with the log text
    FailedOutside,
    TimedOut(String),
}

/// Clones [`CLONE_URL`] once per configured [`CloneEnding`], verifying the
/// clone log, the checked-out files and the Version Control output pane.
pub struct GitCloneScenario {
    url: String,
    clone_dir: String,
    endings: Vec<CloneEnding>,
    finish_timeout: Duration,
    result_timeout: Duration,
    project_timeout: Duration,
    traces: Mutex<Vec<ScenarioTrace>>,
}

impl Default for GitCloneScenario {
    fn default() -> Self {
        Self {
            url: CLONE_URL.to_string(),
            clone_dir: CLONE_DIR.to_string(),
            endings: CloneEnding::ALL.to_vec(),
            finish_timeout: Duration::from_secs(90),
            result_timeout: Duration::from_secs(3),
            project_timeout: Duration::from_secs(5),
            traces: Mutex::new(Vec::new()),
        }
    }
}

impl GitCloneScenario {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_clone_dir(mut self, dir: impl Into<String>) -> Self {
        self.clone_dir = dir.into();
        self
    }

    pub fn with_endings(mut self, endings: &[CloneEnding]) -> Self {
        self.endings = endings.to_vec();
        self
    }

    /// How long to wait for the clone to complete
    pub fn with_finish_timeout(mut self, timeout: Duration) -> Self {
        self.finish_timeout = timeout;
        self
    }

    /// Traces of the passes run so far
    pub fn traces(&self) -> Vec<ScenarioTrace> {
        self.traces.lock().map(|t| t.clone()).unwrap_or_default()
    }

    /// Directory name the wizard proposes for the URL
    fn suggested_dir(&self) -> &str {
        let base = self.url.trim_end_matches('/');
        let base = base.rsplit(['/', ':']).next().unwrap_or(base);
        base.strip_suffix(".git").unwrap_or(base)
    }

    #[instrument(skip(self, session, trace))]
    async fn run_ending(
        &self,
        session: &Session,
        ending: CloneEnding,
        trace: &mut ScenarioTrace,
    ) -> Result<(), AutomationError> {
        let outcomes = session.outcomes();
        create_project_or_file_select_type(session, "  Import Project", "Git Clone").await?;
        trace.advance(CloneState::DialogOpened)?;

        let repo = session.wait_for_object(names::REPO_EDIT, None).await?;
        session.replace_editor_content(&repo, &self.url)?;
        close_proposal_popup(session).await?;
        let target = session.temp_dir()?;
        let working_copy = session.wait_for_object(names::WORKING_COPY_EDIT, None).await?;
        session.replace_editor_content(&working_copy, &target.display().to_string())?;
        let dir_edit = session.wait_for_object(names::CLONE_DIR_EDIT, None).await?;
        outcomes.compare(
            dir_edit.text()?.as_str(),
            self.suggested_dir(),
            "Verifying the suggested clone directory",
        );
        session.replace_editor_content(&dir_edit, &self.clone_dir)?;
        session.click_button(names::WIZARD_NEXT).await?;

        let log = session
            .wait_for_object(names::CLONE_LOG, Some(Duration::from_secs(1)))
            .await?;
        let label = session.wait_for_object(names::CLONE_RESULT_LABEL, None).await?;
        outcomes.compare(label.text()?.as_str(), RUNNING, "Verifying the clone is running");
        trace.advance(CloneState::CloningInProgress)?;

        if ending.canceled() {
            // wait until git has written more than the "Cloning into" line
            let min_len = 20 + self.clone_dir.len();
            session
                .wait_for(None, || Ok(log.text()?.len() > min_len))
                .await;
            session.click_button(names::CLONE_CANCEL).await?;
            trace.advance(CloneState::Canceled)?;
            if !self.verify_canceled(session).await? {
                return trace.advance(CloneState::Closed);
            }
            trace.advance(CloneState::LogVerified)?;
            session.click_button(names::CLONE_CANCEL).await?;
        } else {
            let log_text = match self.wait_until_cloned(session, &log).await? {
                CloneEnd::Completed(text) => text,
                CloneEnd::FailedOutside => {
                    outcomes.warning("Cloning failed outside the IDE.", None);
                    session.click_button(names::CLONE_CANCEL).await?;
                    return trace.advance(CloneState::Closed);
                }
                CloneEnd::TimedOut(text) => {
                    outcomes.fail("Cloning failed", Some(&text));
                    session.click_button(names::CLONE_CANCEL).await?;
                    return trace.advance(CloneState::Closed);
                }
            };
            trace.advance(CloneState::Finished)?;
            self.verify_finished(session, &log_text).await?;
            trace.advance(CloneState::LogVerified)?;
            self.verify_files(session, &target);
            trace.advance(CloneState::FilesVerified)?;
            if !self.leave_wizard(session, ending).await? {
                return trace.advance(CloneState::Closed);
            }
        }

        self.verify_vcs_log(session, &target, ending.canceled()).await?;
        trace.advance(CloneState::VcsLogVerified)?;
        trace.advance(CloneState::Closed)
    }

    /// Waits for Finish to become enabled. Stops early once the clone has
    /// visibly failed, since Finish then never enables.
    async fn wait_until_cloned(
        &self,
        session: &Session,
        log: &UIElement,
    ) -> Result<CloneEnd, AutomationError> {
        let finish = session.locator(names::CLONE_FINISH)?;
        let label = session.locator(names::CLONE_RESULT_LABEL)?;
        let waited = session
            .wait_for_async(Some(self.finish_timeout), || {
                let finish = finish.clone();
                let label = label.clone();
                async move {
                    if log.text()?.contains("fatal: ") {
                        return Ok(true);
                    }
                    if let Ok(label) = label.wait(Some(Duration::ZERO)).await {
                        if label.text()? == FAILED {
                            return Ok(true);
                        }
                    }
                    match finish.wait(Some(Duration::ZERO)).await {
                        Ok(button) => button.is_enabled(),
                        Err(_) => Ok(false),
                    }
                }
            })
            .await;
        let text = log.text()?;
        if text.contains("fatal: ") {
            return Ok(CloneEnd::FailedOutside);
        }
        if !waited.is_satisfied() {
            warn!(timeout = ?self.finish_timeout, "clone did not complete");
            return Ok(CloneEnd::TimedOut(text));
        }
        Ok(CloneEnd::Completed(text))
    }

    /// Log and result label checks of a clone that ran to completion
    async fn verify_finished(&self, session: &Session, log_text: &str) -> Result<(), AutomationError> {
        let outcomes = session.outcomes();
        check_log(
            outcomes,
            log_text,
            &[
                LogExpectation::Count("remote: Total".into(), 1),
                LogExpectation::Count("Receiving objects:".into(), 1),
                LogExpectation::Count("Resolving deltas:".into(), 1),
                LogExpectation::Absent("Stopping...".into()),
                LogExpectation::Contains(format!("'{}'...", self.clone_dir)),
            ],
        );
        match session.find_object(names::CLONE_RESULT_LABEL).await {
            Ok(label) => {
                self.verify_label(session, &label, SUCCEEDED).await;
            }
            Err(e) if e.is_not_found() => {
                outcomes.fail("Could not find resultLabel", Some(&e.to_string()));
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Result label check after Cancel. When the label is gone the pass is
    /// still accepted if the wizard is, i.e. cloning failed before Cancel.
    async fn verify_canceled(&self, session: &Session) -> Result<bool, AutomationError> {
        let label = session.locator(names::CLONE_RESULT_LABEL)?;
        let wizard = session.locator(names::NEW_WIZARD)?;
        match label.resolve_or(&wizard, Some(Duration::ZERO)).await {
            Resolution::Found(label) => {
                self.verify_label(session, &label, FAILED).await;
                Ok(true)
            }
            Resolution::Alternate(_) => {
                session.outcomes().warning(
                    "Could not find resultLabel",
                    Some("Cloning might have failed before clicking 'Cancel'"),
                );
                Ok(true)
            }
            Resolution::Missing(e) => {
                session.outcomes().warning(
                    "Could not find resultLabel",
                    Some("Cloning might have failed before clicking 'Cancel'"),
                );
                debug!(error = %e, "clone wizard is gone as well");
                Ok(false)
            }
        }
    }

    async fn verify_label(&self, session: &Session, label: &UIElement, expected: &str) -> bool {
        let waited = session
            .wait_for(Some(self.result_timeout), || Ok(label.text()? == expected))
            .await;
        session.outcomes().verify(
            waited.is_satisfied(),
            &format!("Verifying expected result ({expected})"),
        )
    }

    fn verify_files(&self, session: &Session, target: &Path) {
        let root = target.join(&self.clone_dir);
        for file in EXPECTED_FILES {
            let path = file.split('/').fold(root.clone(), |p, part| p.join(part));
            session
                .outcomes()
                .verify(path.exists(), &format!("Verify the existence of {file}"));
        }
    }

    /// Leaves a completed clone through the ending's button. False when the
    /// button could not be used and the wizard was canceled instead.
    async fn leave_wizard(&self, session: &Session, ending: CloneEnding) -> Result<bool, AutomationError> {
        let outcomes = session.outcomes();
        let button = match ending {
            CloneEnding::FinishButton => names::CLONE_FINISH,
            _ => names::CLONE_CANCEL,
        };
        if let Err(e) = session.click_button(button).await {
            let log = session.find_object(names::CLONE_LOG).await?.text()?;
            outcomes.fatal("Cloning failed", Some(&format!("{e}\n{log}")));
            session.click_button(names::CLONE_CANCEL).await?;
            return Ok(false);
        }
        if ending != CloneEnding::FinishButton {
            return Ok(true);
        }

        let configure = session.locator(names::CONFIGURE_PROJECT)?;
        match configure.wait(Some(self.project_timeout)).await {
            Ok(button) => {
                button.click()?;
                outcomes.passes("The checked out project was being opened.");
            }
            Err(e) if e.is_not_found() => {
                session.click_button(names::CANNOT_OPEN_DETAILS).await?;
                let details = session
                    .wait_for_object(names::CANNOT_OPEN_TEXT, None)
                    .await?
                    .text()?;
                outcomes.fail("The checked out project was not being opened.", Some(&details));
                session.click_button(names::CANNOT_OPEN_OK).await?;
                let dialog = session.locator(names::CANNOT_OPEN_PROJECT)?;
                session
                    .wait_for(None, || Ok(!dialog.exists()))
                    .await
                    .into_result("Cannot Open Project dialog closing")?;
            }
            Err(e) => return Err(e),
        }
        Ok(true)
    }

    async fn verify_vcs_log(
        &self,
        session: &Session,
        target: &Path,
        canceled: bool,
    ) -> Result<(), AutomationError> {
        let outcomes = session.outcomes();
        open_vcs_log(session).await?;
        let vcs_log = session.wait_for_object(names::OUTPUT_PANE, None).await?.text()?;
        outcomes.log(&format!("Clone log is: {vcs_log}"));
        outcomes.verify(
            vcs_log.contains(&format!("Running in {}:", target.display())),
            "Searching for target directory in clone log",
        );
        let command = ["clone", "--progress", self.url.as_str(), self.clone_dir.as_str()].join(" ");
        outcomes.verify(
            vcs_log.contains(&command),
            "Searching for git parameters in clone log",
        );
        outcomes.compare(
            vcs_log.contains(" terminated abnormally"),
            canceled,
            "Searching for result in clone log",
        );
        session.click_button(names::OUTPUT_CLEAR).await
    }
}

#[async_trait]
impl Scenario for GitCloneScenario {
    fn name(&self) -> &str {
        "git-clone"
    }

    async fn run(&self, session: &Session) -> Result<(), AutomationError> {
        for ending in &self.endings {
            let mut trace = ScenarioTrace::new(*ending);
            info!(?ending, "clone pass");
            let result = self.run_ending(session, *ending, &mut trace).await;
            if let Ok(mut traces) = self.traces.lock() {
                traces.push(trace);
            }
            result?;
        }
        Ok(())
    }
}

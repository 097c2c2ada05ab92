//! End-to-end user workflows driven against a [`Session`].
//!
//! A scenario is a linear sequence of resolve, act, poll and assert steps.
//! [`run_scenario`] wraps one in the application lifecycle: launch, the
//! plugin-error check, the scenario body, and shutdown.

mod git_clone;
mod new_project;
pub mod shared;

pub use git_clone::{CloneEnding, CloneState, GitCloneScenario, ScenarioTrace, CLONE_URL};
pub use new_project::{NewProjectScenario, ProjectKind};

use crate::errors::AutomationError;
use crate::outcome::Summary;
use crate::session::Session;
use async_trait::async_trait;
use tracing::{error, info, instrument};

#[async_trait]
pub trait Scenario: Send + Sync {
    /// Short identifier, also used to tag recorded verdicts
    fn name(&self) -> &str;

    /// Runs the scenario body against an already launched application
    async fn run(&self, session: &Session) -> Result<(), AutomationError>;
}

/// Launches the application, runs `scenario` and shuts down again.
///
/// Errors escaping the scenario are recorded as verdicts rather than returned,
/// so the summary always reflects the whole run.
#[instrument(skip_all, fields(scenario = scenario.name()))]
pub async fn run_scenario(scenario: &dyn Scenario, session: &Session) -> Summary {
    let outcomes = session.outcomes();
    outcomes.set_scenario(Some(scenario.name()));

    match session.launch().await {
        Ok(_) => {
            if shared::started_without_plugin_error(session).await {
                if let Err(e) = scenario.run(session).await {
                    error!(error = %e, "scenario aborted");
                    outcomes.record_error(&format!("{} aborted", scenario.name()), &e);
                }
            }
        }
        Err(e) => outcomes.record_error("Starting the application", &e),
    }

    if let Err(e) = session.shutdown().await {
        outcomes.record_error("Shutting down the application", &e);
    }
    outcomes.set_scenario(None);
    let summary = outcomes.summary();
    info!(?summary, "scenario done");
    summary
}

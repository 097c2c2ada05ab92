//! Creating, building and running a new Qt application project

use super::shared::{create_project_or_file_select_type, open_application_output, select_combo_item};
use super::Scenario;
use crate::errors::AutomationError;
use crate::names;
use crate::session::Session;
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProjectKind {
    QtWidgets,
    QtQuick,
}

impl ProjectKind {
    pub fn template(self) -> &'static str {
        match self {
            ProjectKind::QtWidgets => "Qt Widgets Application",
            ProjectKind::QtQuick => "Qt Quick Application",
        }
    }
}

/// Creates an application from a wizard template, then builds and runs it
/// in each build configuration.
pub struct NewProjectScenario {
    kind: ProjectKind,
    project_name: String,
    build_system: String,
    configurations: Vec<String>,
    build_timeout: Duration,
    run_timeout: Duration,
}

impl NewProjectScenario {
    pub fn new(kind: ProjectKind) -> Self {
        Self {
            kind,
            project_name: "SampleApp".to_string(),
            build_system: "qmake".to_string(),
            configurations: vec!["Debug".to_string(), "Release".to_string()],
            build_timeout: Duration::from_secs(60),
            run_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_build_system(mut self, build_system: impl Into<String>) -> Self {
        self.build_system = build_system.into();
        self
    }

    pub fn with_configurations(mut self, configurations: &[&str]) -> Self {
        self.configurations = configurations.iter().map(|c| c.to_string()).collect();
        self
    }

    fn project_file(&self) -> String {
        match self.build_system.as_str() {
            "qmake" => format!("{}.pro", self.project_name),
            "Qbs" => format!("{}.qbs", self.project_name),
            _ => "CMakeLists.txt".to_string(),
        }
    }

    #[instrument(skip(self, session))]
    async fn create_project(&self, session: &Session, location: &Path) -> Result<(), AutomationError> {
        create_project_or_file_select_type(session, "  Application (Qt)", self.kind.template()).await?;
        let name = session.wait_for_object(names::PROJECT_NAME_EDIT, None).await?;
        session.replace_editor_content(&name, &self.project_name)?;
        let path = session.wait_for_object(names::PROJECT_PATH_EDIT, None).await?;
        session.replace_editor_content(&path, &location.display().to_string())?;
        session.click_button(names::WIZARD_NEXT).await?;

        select_combo_item(session, names::BUILD_SYSTEM_COMBO, &self.build_system).await?;
        session.click_button(names::WIZARD_NEXT).await?;
        session.click_button(names::WIZARD_FINISH).await?;

        let project_file = location.join(&self.project_name).join(self.project_file());
        session.outcomes().verify(
            project_file.is_file(),
            &format!("Verifying {} was created", project_file.display()),
        );
        Ok(())
    }

    #[instrument(skip(self, session))]
    async fn build_and_run(&self, session: &Session, configuration: &str) -> Result<(), AutomationError> {
        let outcomes = session.outcomes();
        select_combo_item(session, names::BUILD_CONFIG_COMBO, configuration).await?;

        session.click_button(names::BUILD_BUTTON).await?;
        let progress = session.wait_for_object(names::BUILD_PROGRESS, None).await?;
        session
            .wait_for(Some(self.build_timeout), || {
                let text = progress.text()?;
                Ok(text == "Finished" || text == "Failed")
            })
            .await
            .into_result(&format!("{configuration} build"))?;
        outcomes.compare(
            progress.text()?.as_str(),
            "Finished",
            &format!("Verifying the {configuration} build finished"),
        );
        let issues = session.wait_for_object(names::ISSUES_COUNT, None).await?.text()?;
        outcomes.compare(issues.as_str(), "0", "Verifying the build produced no issues");

        session.click_button(names::RUN_BUTTON).await?;
        open_application_output(session).await?;
        let output = session.wait_for_object(names::OUTPUT_PANE, None).await?;
        let waited = session
            .wait_for(Some(self.run_timeout), || {
                Ok(output.text()?.contains("exited with code"))
            })
            .await;
        let text = output.text()?;
        if !waited.is_satisfied() {
            outcomes.fail("Application did not exit", Some(&text));
            return Ok(());
        }
        outcomes.verify(
            text.contains(&self.project_name),
            "Verifying the application output names the project",
        );
        outcomes.verify(
            text.contains("exited with code 0"),
            "Verifying the application exited cleanly",
        );
        Ok(())
    }
}

#[async_trait]
impl Scenario for NewProjectScenario {
    fn name(&self) -> &str {
        "new-project"
    }

    async fn run(&self, session: &Session) -> Result<(), AutomationError> {
        let location = session.temp_dir()?;
        self.create_project(session, &location).await?;
        for configuration in &self.configurations {
            info!(%configuration, "build and run");
            self.build_and_run(session, configuration).await?;
        }
        Ok(())
    }
}

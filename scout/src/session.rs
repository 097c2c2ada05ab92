use crate::config::SessionConfig;
use crate::element::UIElement;
use crate::errors::AutomationError;
use crate::locator::Locator;
use crate::names;
use crate::object_map::ObjectMap;
use crate::outcome::Outcomes;
use crate::platforms::AutomationEngine;
use crate::poll::{self, WaitCondition, Waited};
use crate::selector::Selector;
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info, instrument, warn};

/// Everything a scenario needs to talk to one running target application.
///
/// The session owns the application's lifecycle: [`Session::launch`] starts
/// it, [`Session::shutdown`] exits it and removes the temporary directories
/// handed out by [`Session::temp_dir`].
pub struct Session {
    engine: Arc<dyn AutomationEngine>,
    objects: ObjectMap,
    config: SessionConfig,
    outcomes: Outcomes,
    temp_dirs: Mutex<Vec<TempDir>>,
}

impl Session {
    /// Session using the built-in object map
    pub fn new(engine: Arc<dyn AutomationEngine>, config: SessionConfig) -> Result<Self, AutomationError> {
        config.validate()?;
        Ok(Self {
            engine,
            objects: names::builtin(),
            config,
            outcomes: Outcomes::new(),
            temp_dirs: Mutex::new(Vec::new()),
        })
    }

    /// Adds (or overrides) symbolic names
    pub fn with_object_map(mut self, objects: ObjectMap) -> Self {
        self.objects.merge(objects);
        self
    }

    pub fn engine(&self) -> &Arc<dyn AutomationEngine> {
        &self.engine
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn outcomes(&self) -> &Outcomes {
        &self.outcomes
    }

    pub fn objects(&self) -> &ObjectMap {
        &self.objects
    }

    pub fn object_timeout(&self) -> Duration {
        self.config.object_timeout()
    }

    /// Resolves a symbolic (`:...`) or real (`{...}`) name
    pub fn selector(&self, name: &str) -> Result<Selector, AutomationError> {
        self.objects.resolve(name)
    }

    pub fn locator(&self, name: &str) -> Result<Locator, AutomationError> {
        Ok(self.locator_for(self.selector(name)?))
    }

    pub fn locator_for(&self, selector: Selector) -> Locator {
        Locator::new(self.engine.clone(), selector).set_default_timeout(self.object_timeout())
    }

    /// Waits for the named object, using the session's object timeout when
    /// `timeout` is `None`
    #[instrument(level = "debug", skip(self, timeout))]
    pub async fn wait_for_object(
        &self,
        name: &str,
        timeout: Option<Duration>,
    ) -> Result<UIElement, AutomationError> {
        self.locator(name)?.wait(timeout).await
    }

    /// Looks the object up once, without waiting
    pub async fn find_object(&self, name: &str) -> Result<UIElement, AutomationError> {
        self.locator(name)?.wait(Some(Duration::ZERO)).await
    }

    /// Whether the named object exists right now. Unknown names count as absent.
    pub fn object_exists(&self, name: &str) -> bool {
        match self.locator(name) {
            Ok(locator) => locator.exists(),
            Err(e) => {
                warn!(%name, error = %e, "object_exists on unresolvable name");
                false
            }
        }
    }

    pub fn wait_condition(&self, timeout: Option<Duration>) -> WaitCondition {
        self.config.wait(timeout.map(|t| t.as_millis() as u64))
    }

    /// Polls `predicate` with the session's poll interval. The caller decides
    /// what a timeout means.
    pub async fn wait_for<P>(&self, timeout: Option<Duration>, predicate: P) -> Waited
    where
        P: FnMut() -> Result<bool, AutomationError>,
    {
        poll::wait_for(self.wait_condition(timeout), predicate).await
    }

    pub async fn wait_for_async<P, Fut>(&self, timeout: Option<Duration>, predicate: P) -> Waited
    where
        P: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, AutomationError>>,
    {
        poll::wait_for_async(self.wait_condition(timeout), predicate).await
    }

    /// Waits for the named button, then for it to become enabled, then clicks
    #[instrument(level = "debug", skip(self))]
    pub async fn click_button(&self, name: &str) -> Result<(), AutomationError> {
        let button = self.wait_for_object(name, None).await?;
        self.click_when_enabled(&button).await
    }

    pub async fn click_when_enabled(&self, element: &UIElement) -> Result<(), AutomationError> {
        self.wait_for(Some(self.object_timeout()), || element.is_enabled())
            .await
            .into_result(&format!("{:?} becoming enabled", element.attributes()))?;
        element.click()
    }

    /// Replaces the full content of an editor widget
    pub fn replace_editor_content(&self, editor: &UIElement, text: &str) -> Result<(), AutomationError> {
        editor.set_text(text)?;
        let now = editor.text()?;
        if now != text {
            return Err(AutomationError::AssertionMismatch(format!(
                "editor content is {now:?} after typing {text:?}"
            )));
        }
        Ok(())
    }

    /// Walks the menu bar: `invoke_menu_item("View", &["Output Panes", "Version Control"])`
    #[instrument(level = "debug", skip(self))]
    pub async fn invoke_menu_item(&self, menu: &str, path: &[&str]) -> Result<(), AutomationError> {
        if path.is_empty() {
            return Err(AutomationError::InvalidArgument(format!(
                "menu path below '{menu}' is empty"
            )));
        }
        let main_window = self.selector(names::MAIN_WINDOW)?;
        let bar_item = Selector::builder()
            .type_name("QMenuBarItem")
            .text(menu)
            .visible(true)
            .container(main_window)
            .build()?;
        self.locator_for(bar_item).wait(None).await?.click()?;

        let mut title = menu;
        for item in path {
            let popup = Selector::builder()
                .type_name("QMenu")
                .property("title", title)
                .visible(true)
                .build()?;
            let action = Selector::builder()
                .type_name("QAction")
                .text(*item)
                .visible(true)
                .container(popup)
                .build()?;
            let action = self.locator_for(action).wait(None).await?;
            self.click_when_enabled(&action).await?;
            title = *item;
        }
        debug!(menu, ?path, "menu item invoked");
        Ok(())
    }

    /// Fresh temporary directory, removed on shutdown
    pub fn temp_dir(&self) -> Result<PathBuf, AutomationError> {
        let dir = tempfile::Builder::new()
            .prefix("scout-")
            .tempdir()
            .map_err(|e| AutomationError::PlatformError(format!("cannot create temp dir: {e}")))?;
        let path = dir.path().to_path_buf();
        self.temp_dirs
            .lock()
            .map_err(|_| AutomationError::Internal("temp dir list poisoned".to_string()))?
            .push(dir);
        Ok(path)
    }

    /// Starts the configured program and waits for its main window
    #[instrument(skip(self), fields(program = %self.config.program))]
    pub async fn launch(&self) -> Result<UIElement, AutomationError> {
        let engine = self.engine.clone();
        let program = self.config.program.clone();
        let args = self.config.program_args.clone();
        tokio::task::spawn_blocking(move || engine.launch(&program, &args))
            .await
            .map_err(|e| AutomationError::PlatformError(format!("Task join error: {e}")))??;
        let main_window = self.wait_for_object(names::MAIN_WINDOW, None).await?;
        info!("target application is up");
        Ok(main_window)
    }

    /// Exits through *File → Exit*, falling back to terminating the program
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), AutomationError> {
        if self.engine.is_running() {
            if let Err(e) = self.invoke_menu_item("File", &["Exit"]).await {
                warn!(error = %e, "could not exit through the menu, terminating");
            }
            let engine = self.engine.clone();
            let exited = self
                .wait_for(Some(Duration::from_secs(5)), move || Ok(!engine.is_running()))
                .await;
            if !exited.is_satisfied() {
                self.engine.terminate()?;
            }
        }
        let dirs = std::mem::take(
            &mut *self
                .temp_dirs
                .lock()
                .map_err(|_| AutomationError::Internal("temp dir list poisoned".to_string()))?,
        );
        for dir in dirs {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!(path = %path.display(), error = %e, "could not remove temp dir");
            }
        }
        Ok(())
    }
}

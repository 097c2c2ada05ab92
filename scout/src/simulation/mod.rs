//! A scripted stand-in for the IDE, built on the simulated engine.
//!
//! [`SimulatedIde`] reproduces the parts of the IDE the scenarios drive: the
//! menu bar, the output panes, the New Project dialog, the Git clone wizard
//! with a background clone, and project build/run. Timings are compressed to
//! [`IdeOptions::step_delay`].

mod clone;
mod project;

use crate::errors::AutomationError;
use crate::platforms::simulated::{NodeId, SimHandle, SimulatedApplication, Widget, ROOT};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

pub use clone::DEFAULT_CLONE_FILES;

pub const PROGRAM: &str = "qtcreator";

#[derive(Debug, Clone)]
pub struct IdeOptions {
    /// Delay between two progress steps of a clone, build or run
    pub step_delay: Duration,
    /// Makes every clone fail with `fatal: <message>` after the first step
    pub clone_failure: Option<String>,
    /// Makes every clone end as `Failed.` after the first step without
    /// writing a `fatal: ` line
    pub silent_clone_failure: bool,
    /// Writes each clone progress line twice
    pub repeated_progress: bool,
    /// Whether a freshly cloned project can be opened
    pub project_openable: bool,
    /// Shows the plugin error overview at startup with this text
    pub plugin_error: Option<String>,
    /// Files (relative, `/`-separated) a successful clone creates
    pub clone_files: Vec<String>,
}

impl Default for IdeOptions {
    fn default() -> Self {
        Self {
            step_delay: Duration::from_millis(50),
            clone_failure: None,
            silent_clone_failure: false,
            repeated_progress: false,
            project_openable: true,
            plugin_error: None,
            clone_files: DEFAULT_CLONE_FILES.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// The simulated IDE program
pub struct SimulatedIde {
    options: IdeOptions,
    current: Mutex<Option<Arc<Ide>>>,
}

impl SimulatedIde {
    pub fn new(options: IdeOptions) -> Arc<Self> {
        Arc::new(Self {
            options,
            current: Mutex::new(None),
        })
    }

    /// Directory of the last project the IDE opened, if any
    pub fn opened_project(&self) -> Option<PathBuf> {
        let current = self.current.lock().ok()?.clone()?;
        let project = current.project.lock().ok()?;
        project.as_ref().map(|p| p.dir.clone())
    }
}

impl SimulatedApplication for SimulatedIde {
    fn program(&self) -> &str {
        PROGRAM
    }

    fn build(&self, handle: &SimHandle, _args: &[String]) -> Result<NodeId, AutomationError> {
        let ide = Ide::build(handle.clone(), self.options.clone())?;
        let main_window = ide.main_window;
        if let Ok(mut current) = self.current.lock() {
            if let Some(previous) = current.replace(ide) {
                previous.stop_workers();
            }
        }
        Ok(main_window)
    }
}

pub(crate) struct Panes {
    pub vcs_label: NodeId,
    pub vcs_output: NodeId,
    pub app_label: NodeId,
    pub app_output: NodeId,
}

pub(crate) struct Toolbar {
    pub build_config: NodeId,
    pub build: NodeId,
    pub run: NodeId,
    pub progress: NodeId,
    pub issues: NodeId,
    pub configure: NodeId,
}

#[derive(Debug, Clone)]
pub(crate) struct OpenProject {
    pub name: String,
    pub dir: PathBuf,
    pub built: Vec<String>,
}

pub(crate) struct Ide {
    pub handle: SimHandle,
    pub options: IdeOptions,
    pub main_window: NodeId,
    pub panes: Panes,
    pub toolbar: Toolbar,
    pub project: Mutex<Option<OpenProject>>,
    popups: Mutex<Vec<NodeId>>,
    workers: Mutex<Vec<Arc<AtomicBool>>>,
    this: Weak<Ide>,
}

impl Ide {
    fn build(handle: SimHandle, options: IdeOptions) -> Result<Arc<Ide>, AutomationError> {
        let h = &handle;
        let main_window = h.add(
            ROOT,
            Widget::new("Core::Internal::MainWindow")
                .bounds(0.0, 0.0, 1600.0, 1000.0)
                .property("windowTitle", "Qt Creator"),
        )?;
        let menubar = h.add(main_window, Widget::new("QMenuBar").bounds(0.0, 0.0, 1600.0, 24.0))?;

        let build_config = h.add(
            main_window,
            Widget::new("QComboBox").named("buildConfiguration").text("Debug").hidden(),
        )?;
        let build = h.add(
            main_window,
            Widget::new("Core::Internal::FancyToolButton").text("Build Project").disabled(),
        )?;
        let run = h.add(
            main_window,
            Widget::new("Core::Internal::FancyToolButton").text("Run").disabled(),
        )?;
        let progress = h.add(main_window, Widget::new("QLabel").named("buildProgress").text(""))?;
        let issues = h.add(main_window, Widget::new("QLabel").named("issuesCount").text("0"))?;
        let configure = h.add(
            main_window,
            Widget::new("QPushButton").text("Configure Project").hidden(),
        )?;

        let pane_area = h.add(main_window, Widget::new("QWidget").named("outputPaneArea"))?;
        let vcs_label = h.add(pane_area, Widget::new("QLabel").text("Version Control").hidden())?;
        let vcs_output = h.add(pane_area, Widget::new("Core::OutputWindow").text("").hidden())?;
        let app_label = h.add(pane_area, Widget::new("QLabel").text("Application Output").hidden())?;
        let app_output = h.add(pane_area, Widget::new("Core::OutputWindow").text("").hidden())?;
        let clear = h.add(pane_area, Widget::new("QToolButton").text("Clear"))?;

        let ide = Arc::new_cyclic(|this| Ide {
            handle: handle.clone(),
            options,
            main_window,
            panes: Panes {
                vcs_label,
                vcs_output,
                app_label,
                app_output,
            },
            toolbar: Toolbar {
                build_config,
                build,
                run,
                progress,
                issues,
                configure,
            },
            project: Mutex::new(None),
            popups: Mutex::new(Vec::new()),
            workers: Mutex::new(Vec::new()),
            this: this.clone(),
        });

        ide.on_click(clear, |ide, _| ide.clear_visible_pane())?;
        ide.on_click(configure, |ide, id| ide.handle.set_visible(id, false))?;
        ide.on_click(build, |ide, _| ide.start_build())?;
        ide.on_click(run, |ide, _| ide.start_run())?;

        let file = ide.add_menu(menubar, "File")?;
        ide.add_action(file, "New Project...", |ide, _| ide.open_new_dialog())?;
        ide.add_action(file, "Exit", |ide, _| ide.exit())?;

        let view = ide.add_menu(menubar, "View")?;
        let panes = ide.add_submenu(view, "Output Panes")?;
        ide.add_action(panes, "Version Control", |ide, _| ide.show_pane(PaneKind::Vcs))?;
        ide.add_action(panes, "Application Output", |ide, _| {
            ide.show_pane(PaneKind::Application)
        })?;

        if let Some(message) = ide.options.plugin_error.clone() {
            ide.show_plugin_errors(&message)?;
        }
        info!(main_window, "simulated IDE built");
        Ok(ide)
    }

    /// Registers a click handler that logs instead of propagating errors
    pub(crate) fn on_click<F>(&self, id: NodeId, f: F) -> Result<(), AutomationError>
    where
        F: Fn(&Arc<Ide>, NodeId) -> Result<(), AutomationError> + Send + Sync + 'static,
    {
        let weak = self.this.clone();
        self.handle.on_click(
            id,
            Arc::new(move |_, node| {
                if let Some(ide) = weak.upgrade() {
                    if let Err(e) = f(&ide, node) {
                        warn!(node, error = %e, "simulated click handler failed");
                    }
                }
            }),
        )
    }

    pub(crate) fn on_text<F>(&self, id: NodeId, f: F) -> Result<(), AutomationError>
    where
        F: Fn(&Arc<Ide>, NodeId, &str) -> Result<(), AutomationError> + Send + Sync + 'static,
    {
        let weak = self.this.clone();
        self.handle.on_text(
            id,
            Arc::new(move |_, node, text| {
                if let Some(ide) = weak.upgrade() {
                    if let Err(e) = f(&ide, node, text) {
                        warn!(node, error = %e, "simulated text handler failed");
                    }
                }
            }),
        )
    }

    pub(crate) fn on_click_at<F>(&self, id: NodeId, f: F) -> Result<(), AutomationError>
    where
        F: Fn(&Arc<Ide>, NodeId, f64, f64) -> Result<(), AutomationError> + Send + Sync + 'static,
    {
        let weak = self.this.clone();
        self.handle.on_click_at(
            id,
            Arc::new(move |_, node, x, y| {
                if let Some(ide) = weak.upgrade() {
                    if let Err(e) = f(&ide, node, x, y) {
                        warn!(node, error = %e, "simulated click handler failed");
                    }
                }
            }),
        )
    }

    fn add_menu(&self, menubar: NodeId, title: &str) -> Result<NodeId, AutomationError> {
        let item = self.handle.add(menubar, Widget::new("QMenuBarItem").text(title))?;
        let popup = self.popup(title)?;
        self.on_click(item, move |ide, _| {
            ide.hide_popups()?;
            ide.handle.set_visible(popup, true)
        })?;
        Ok(popup)
    }

    fn add_submenu(&self, parent: NodeId, title: &str) -> Result<NodeId, AutomationError> {
        let action = self.handle.add(parent, Widget::new("QAction").text(title))?;
        let popup = self.popup(title)?;
        self.on_click(action, move |ide, _| ide.handle.set_visible(popup, true))?;
        Ok(popup)
    }

    fn add_action<F>(&self, popup: NodeId, text: &str, f: F) -> Result<NodeId, AutomationError>
    where
        F: Fn(&Arc<Ide>, NodeId) -> Result<(), AutomationError> + Send + Sync + 'static,
    {
        let action = self.handle.add(popup, Widget::new("QAction").text(text))?;
        self.on_click(action, move |ide, node| {
            ide.hide_popups()?;
            f(ide, node)
        })?;
        Ok(action)
    }

    fn popup(&self, title: &str) -> Result<NodeId, AutomationError> {
        let popup = self
            .handle
            .add(ROOT, Widget::new("QMenu").property("title", title).hidden())?;
        if let Ok(mut popups) = self.popups.lock() {
            popups.push(popup);
        }
        Ok(popup)
    }

    fn hide_popups(&self) -> Result<(), AutomationError> {
        let popups = self.popups.lock().map(|p| p.clone()).unwrap_or_default();
        for popup in popups {
            self.handle.set_visible(popup, false)?;
        }
        Ok(())
    }

    fn show_plugin_errors(&self, message: &str) -> Result<(), AutomationError> {
        let dialog = self.handle.add(
            ROOT,
            Widget::new("ExtensionSystem::Internal::PluginErrorOverview")
                .named("pluginErrorOverview")
                .property("windowTitle", "Qt Creator - Plugin loader messages"),
        )?;
        self.handle
            .add(dialog, Widget::new("QTextEdit").named("pluginError").text(message))?;
        let close = self.handle.add(dialog, Widget::new("QPushButton").text("Close"))?;
        self.on_click(close, move |ide, _| ide.handle.remove(dialog))
    }

    pub(crate) fn show_pane(&self, kind: PaneKind) -> Result<(), AutomationError> {
        let p = &self.panes;
        let vcs = kind == PaneKind::Vcs;
        self.handle.set_visible(p.vcs_label, vcs)?;
        self.handle.set_visible(p.vcs_output, vcs)?;
        self.handle.set_visible(p.app_label, !vcs)?;
        self.handle.set_visible(p.app_output, !vcs)?;
        debug!(?kind, "output pane shown");
        Ok(())
    }

    fn clear_visible_pane(&self) -> Result<(), AutomationError> {
        for pane in [self.panes.vcs_output, self.panes.app_output] {
            if self.handle.attributes(pane)?.visible {
                self.handle.set_text(pane, "")?;
            }
        }
        Ok(())
    }

    pub(crate) fn vcs_append(&self, line: &str) -> Result<(), AutomationError> {
        self.handle.append_text(self.panes.vcs_output, line)
    }

    pub(crate) fn app_append(&self, line: &str) -> Result<(), AutomationError> {
        self.handle.append_text(self.panes.app_output, line)
    }

    /// Stop flag for a new background worker
    pub(crate) fn worker_flag(&self) -> Arc<AtomicBool> {
        let flag = Arc::new(AtomicBool::new(false));
        if let Ok(mut workers) = self.workers.lock() {
            workers.retain(|w| !w.load(Ordering::SeqCst));
            workers.push(flag.clone());
        }
        flag
    }

    fn stop_workers(&self) {
        if let Ok(workers) = self.workers.lock() {
            for worker in workers.iter() {
                worker.store(true, Ordering::SeqCst);
            }
        }
    }

    /// Shows the project as open and enables build and run
    pub(crate) fn open_project(&self, name: &str, dir: PathBuf) -> Result<(), AutomationError> {
        info!(name, dir = %dir.display(), "project opened");
        if let Ok(mut project) = self.project.lock() {
            *project = Some(OpenProject {
                name: name.to_string(),
                dir,
                built: Vec::new(),
            });
        }
        let t = &self.toolbar;
        self.handle.set_visible(t.build_config, true)?;
        self.handle.set_enabled(t.build, true)?;
        self.handle.set_enabled(t.run, true)
    }

    fn exit(&self) -> Result<(), AutomationError> {
        info!("simulated IDE exiting");
        self.stop_workers();
        self.handle.clear()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PaneKind {
    Vcs,
    Application,
}

/// Sleeps `delay` in small slices; false if `stop` was raised meanwhile
pub(crate) fn pause(delay: Duration, stop: &AtomicBool) -> bool {
    let slice = Duration::from_millis(5);
    let mut left = delay;
    while !left.is_zero() {
        if stop.load(Ordering::SeqCst) {
            return false;
        }
        let step = left.min(slice);
        std::thread::sleep(step);
        left -= step;
    }
    !stop.load(Ordering::SeqCst)
}

//! New Project dialog, project wizard, build and run

use super::{pause, Ide};
use crate::errors::AutomationError;
use crate::platforms::simulated::{NodeId, Widget, ROOT};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

pub const IMPORT_CATEGORY: &str = "  Import Project";
pub const APPLICATION_CATEGORY: &str = "  Application (Qt)";
pub const GIT_CLONE_TEMPLATE: &str = "Git Clone";
pub const WIDGETS_TEMPLATE: &str = "Qt Widgets Application";
pub const QUICK_TEMPLATE: &str = "Qt Quick Application";

const CATALOG: &[(&str, &[&str])] = &[
    (IMPORT_CATEGORY, &[GIT_CLONE_TEMPLATE]),
    (APPLICATION_CATEGORY, &[WIDGETS_TEMPLATE, QUICK_TEMPLATE]),
];

const BUILD_SYSTEMS: &[&str] = &["CMake", "qmake", "Qbs"];
const BUILD_CONFIGS: &[&str] = &["Debug", "Release"];

struct NewDialog {
    window: NodeId,
    choose: NodeId,
    templates: Vec<(NodeId, &'static str)>,
    selected: Mutex<Option<&'static str>>,
}

struct ProjectWizard {
    template: String,
    window: NodeId,
    pages: Vec<NodeId>,
    current: Mutex<usize>,
    name: NodeId,
    path: NodeId,
    build_system: NodeId,
    next: NodeId,
    finish: NodeId,
}

impl Ide {
    pub(crate) fn open_new_dialog(&self) -> Result<(), AutomationError> {
        let h = &self.handle;
        let window = h.add(
            ROOT,
            Widget::new("Core::Internal::NewDialog")
                .bounds(200.0, 150.0, 800.0, 500.0)
                .property("windowTitle", "New Project"),
        )?;
        let categories = h.add(window, Widget::new("QTreeView").named("categoriesView"))?;
        let list = h.add(window, Widget::new("QListView").named("templatesView"))?;
        let choose = h.add(window, Widget::new("QPushButton").text("Choose...").disabled())?;
        let cancel = h.add(window, Widget::new("QPushButton").text("Cancel"))?;

        let mut category_items = Vec::new();
        let mut templates = Vec::new();
        for (category, names) in CATALOG {
            let item = h.add(categories, Widget::new("QModelIndex").text(*category))?;
            let mut shown = Vec::new();
            for name in names.iter() {
                let id = h.add(list, Widget::new("QModelIndex").text(*name).hidden())?;
                templates.push((id, *name));
                shown.push(id);
            }
            category_items.push((item, shown));
        }
        let dialog = Arc::new(NewDialog {
            window,
            choose,
            templates,
            selected: Mutex::new(None),
        });

        for (item, shown) in category_items {
            let d = dialog.clone();
            self.on_click(item, move |ide, _| {
                for (id, _) in &d.templates {
                    ide.handle.set_visible(*id, shown.contains(id))?;
                }
                ide.select_template(&d, None)
            })?;
        }
        for (id, name) in dialog.templates.clone() {
            let d = dialog.clone();
            self.on_click(id, move |ide, _| ide.select_template(&d, Some(name)))?;
        }
        let d = dialog.clone();
        self.on_click(choose, move |ide, _| ide.choose_template(&d))?;
        self.on_click(cancel, move |ide, _| ide.handle.remove(window))?;
        debug!(window, "new dialog opened");
        Ok(())
    }

    fn select_template(&self, d: &NewDialog, name: Option<&'static str>) -> Result<(), AutomationError> {
        if let Ok(mut selected) = d.selected.lock() {
            *selected = name;
        }
        for (id, template) in &d.templates {
            let on = if Some(*template) == name { "true" } else { "false" };
            self.handle.set_property(*id, "selected", on)?;
        }
        self.handle.set_enabled(d.choose, name.is_some())
    }

    fn choose_template(&self, d: &NewDialog) -> Result<(), AutomationError> {
        let selected = d.selected.lock().ok().and_then(|s| *s);
        let Some(template) = selected else {
            return Ok(());
        };
        self.handle.remove(d.window)?;
        info!(template, "template chosen");
        match template {
            GIT_CLONE_TEMPLATE => self.open_clone_wizard(),
            other => self.open_project_wizard(other),
        }
    }

    fn open_project_wizard(&self, template: &str) -> Result<(), AutomationError> {
        let h = &self.handle;
        let window = h.add(
            ROOT,
            Widget::new("ProjectExplorer::JsonWizard")
                .bounds(100.0, 100.0, 700.0, 500.0)
                .property("windowTitle", template),
        )?;
        let location = h.add(window, Widget::new("Utils::ProjectIntroPage"))?;
        let name = h.add(
            location,
            Widget::new("QLineEdit").named("ProjectName").text("untitled"),
        )?;
        let path = h.add(
            location,
            Widget::new("Utils::FancyLineEdit")
                .named("ProjectPath")
                .text(std::env::temp_dir().display().to_string()),
        )?;
        let kits = h.add(window, Widget::new("ProjectExplorer::JsonFieldPage").hidden())?;
        let build_system = h.add(
            kits,
            Widget::new("QComboBox")
                .named("BuildSystem")
                .text(BUILD_SYSTEMS[0])
                .property("items", BUILD_SYSTEMS.join(",")),
        )?;
        let summary = h.add(window, Widget::new("ProjectExplorer::JsonSummaryPage").hidden())?;
        h.add(summary, Widget::new("QLabel").named("filesLabel").text(""))?;

        let next = h.add(window, Widget::new("QPushButton").text("Next >"))?;
        let cancel = h.add(window, Widget::new("QPushButton").text("Cancel"))?;
        let finish = h.add(window, Widget::new("QPushButton").text("Finish").hidden())?;

        let wizard = Arc::new(ProjectWizard {
            template: template.to_string(),
            window,
            pages: vec![location, kits, summary],
            current: Mutex::new(0),
            name,
            path,
            build_system,
            next,
            finish,
        });
        self.on_text(build_system, move |ide, id, text| {
            ide.restrict_to_items(id, text, BUILD_SYSTEMS, BUILD_SYSTEMS[0])
        })?;
        let w = wizard.clone();
        self.on_click(next, move |ide, _| ide.wizard_next(&w))?;
        let w = wizard.clone();
        self.on_click(finish, move |ide, _| ide.wizard_finish(&w))?;
        self.on_click(cancel, move |ide, _| ide.handle.remove(window))?;
        debug!(template, "project wizard opened");
        Ok(())
    }

    /// Combo boxes only accept one of their items; anything else falls back
    fn restrict_to_items(
        &self,
        combo: NodeId,
        text: &str,
        items: &[&str],
        fallback: &str,
    ) -> Result<(), AutomationError> {
        if !items.contains(&text) {
            self.handle.set_text(combo, fallback)?;
        }
        Ok(())
    }

    fn wizard_next(&self, w: &ProjectWizard) -> Result<(), AutomationError> {
        let mut current = w
            .current
            .lock()
            .map_err(|_| AutomationError::Internal("wizard page lock poisoned".to_string()))?;
        if *current == 0 {
            let name = self.handle.text(w.name)?;
            let path = PathBuf::from(self.handle.text(w.path)?);
            if name.trim().is_empty() || !path.is_dir() {
                debug!(%name, path = %path.display(), "project location rejected");
                return Ok(());
            }
        }
        if *current + 1 >= w.pages.len() {
            return Ok(());
        }
        self.handle.set_visible(w.pages[*current], false)?;
        *current += 1;
        self.handle.set_visible(w.pages[*current], true)?;
        let last = *current + 1 == w.pages.len();
        self.handle.set_visible(w.next, !last)?;
        self.handle.set_visible(w.finish, last)
    }

    fn wizard_finish(&self, w: &ProjectWizard) -> Result<(), AutomationError> {
        let name = self.handle.text(w.name)?;
        let dir = PathBuf::from(self.handle.text(w.path)?).join(&name);
        let build_system = self.handle.text(w.build_system)?;
        write_project(&dir, &name, &w.template, &build_system)?;
        self.handle.remove(w.window)?;
        self.handle.set_text(self.toolbar.build_config, BUILD_CONFIGS[0])?;
        let config = self.toolbar.build_config;
        self.on_text(config, move |ide, id, text| {
            ide.restrict_to_items(id, text, BUILD_CONFIGS, BUILD_CONFIGS[0])
        })?;
        self.open_project(&name, dir)
    }

    pub(crate) fn start_build(self: &Arc<Self>) -> Result<(), AutomationError> {
        let Some((name, dir)) = self.current_project() else {
            return Ok(());
        };
        let config = self.handle.text(self.toolbar.build_config)?;
        let t = &self.toolbar;
        self.handle.set_text(t.progress, "Building...")?;
        self.handle.set_enabled(t.build, false)?;
        self.handle.set_enabled(t.run, false)?;

        let stop = self.worker_flag();
        let ide = self.clone();
        std::thread::spawn(move || {
            for _ in 0..3 {
                if !pause(ide.options.step_delay, &stop) {
                    return;
                }
            }
            let sources_ok = dir.join("main.cpp").is_file();
            let t = &ide.toolbar;
            let (progress, issues) = if sources_ok { ("Finished", "0") } else { ("Failed", "1") };
            let _ = ide.handle.set_text(t.issues, issues);
            if sources_ok {
                if let Ok(mut project) = ide.project.lock() {
                    if let Some(p) = project.as_mut() {
                        p.built.push(config.clone());
                    }
                }
            }
            let _ = ide.handle.set_enabled(t.build, true);
            let _ = ide.handle.set_enabled(t.run, true);
            let _ = ide.handle.set_text(t.progress, progress);
            info!(%name, %config, progress, "build done");
        });
        Ok(())
    }

    pub(crate) fn start_run(self: &Arc<Self>) -> Result<(), AutomationError> {
        let Some((name, dir)) = self.current_project() else {
            return Ok(());
        };
        let config = self.handle.text(self.toolbar.build_config)?;
        let built = self
            .project
            .lock()
            .ok()
            .and_then(|p| p.as_ref().map(|p| p.built.contains(&config)))
            .unwrap_or(false);
        self.handle.set_text(self.panes.app_output, "")?;
        if !built {
            return self.app_append(&format!(
                "Error: {name} has not been built for the {config} configuration.\n"
            ));
        }
        let executable = dir
            .join(format!("build-{}", config.to_lowercase()))
            .join(&name);
        self.app_append(&format!("Starting {}...\n", executable.display()))?;

        let stop = self.worker_flag();
        let ide = self.clone();
        std::thread::spawn(move || {
            if !pause(ide.options.step_delay, &stop) {
                return;
            }
            let _ = ide.app_append(&format!("{} exited with code 0\n", executable.display()));
        });
        Ok(())
    }

    fn current_project(&self) -> Option<(String, PathBuf)> {
        let project = self.project.lock().ok()?;
        project.as_ref().map(|p| (p.name.clone(), p.dir.clone()))
    }
}

/// Lays out the files the template generates
fn write_project(dir: &Path, name: &str, template: &str, build_system: &str) -> Result<(), AutomationError> {
    let quick = template == QUICK_TEMPLATE;
    let mut sources = vec!["main.cpp".to_string()];
    if quick {
        sources.push("Main.qml".to_string());
    } else {
        sources.extend(["mainwindow.cpp", "mainwindow.h", "mainwindow.ui"].map(String::from));
    }
    let project_file = match build_system {
        "qmake" => format!("{name}.pro"),
        "Qbs" => format!("{name}.qbs"),
        _ => "CMakeLists.txt".to_string(),
    };
    std::fs::create_dir_all(dir).map_err(|e| project_error(dir, e))?;
    for file in sources.iter().chain(std::iter::once(&project_file)) {
        let path = dir.join(file);
        std::fs::write(&path, format!("// {name}: {file}\n")).map_err(|e| project_error(&path, e))?;
    }
    Ok(())
}

fn project_error(path: &Path, e: std::io::Error) -> AutomationError {
    AutomationError::PlatformError(format!("cannot write {}: {e}", path.display()))
}

//! The Git clone wizard and its background clone

use super::{pause, Ide};
use crate::errors::AutomationError;
use crate::platforms::simulated::{NodeId, Widget, ROOT};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// What a successful clone of the installer framework leaves behind
pub const DEFAULT_CLONE_FILES: &[&str] = &[
    ".gitignore",
    "LICENSE.GPL3-EXCEPT",
    "installerfw.pro",
    "tests/test-installer/create-test-installer.bat",
    "src/sdk/main.cpp",
];

const PROGRESS: &[&str] = &[
    "remote: Enumerating objects: 52340, done.\n",
    "remote: Counting objects: 100% (2211/2211), done.\n",
    "remote: Compressing objects: 100% (1024/1024), done.\n",
    "remote: Total 52340 (delta 1187), reused 2000 (delta 1000), pack-reused 50129\n",
    "Receiving objects: 100% (52340/52340), 21.31 MiB | 4.20 MiB/s, done.\n",
    "Resolving deltas: 100% (37110/37110), done.\n",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Editing,
    Running,
    Succeeded,
    Failed,
}

struct FieldPage {
    page: NodeId,
    repo: NodeId,
    working_copy: NodeId,
    dir: NodeId,
    recursive: NodeId,
    popup: Mutex<Option<NodeId>>,
}

struct ClonePage {
    log: NodeId,
    status: NodeId,
}

/// State shared by the wizard's handlers and the clone thread
struct CloneWizard {
    window: NodeId,
    next: NodeId,
    cancel: NodeId,
    finish: NodeId,
    fields: FieldPage,
    page: Mutex<Option<ClonePage>>,
    phase: Mutex<Phase>,
    stop: Mutex<Option<Arc<AtomicBool>>>,
    target: Mutex<Option<(PathBuf, String)>>,
}

impl Ide {
    pub(crate) fn open_clone_wizard(&self) -> Result<(), AutomationError> {
        let h = &self.handle;
        let window = h.add(
            ROOT,
            Widget::new("ProjectExplorer::JsonWizard")
                .bounds(100.0, 100.0, 700.0, 500.0)
                .property("windowTitle", "Git Repository Clone"),
        )?;
        let page = h.add(
            window,
            Widget::new("ProjectExplorer::JsonFieldPage").bounds(0.0, 0.0, 700.0, 450.0),
        )?;
        let repo = h.add(page, Widget::new("QLineEdit").named("Repo").bounds(20.0, 40.0, 600.0, 24.0))?;
        let working_copy = h.add(
            page,
            Widget::new("Utils::BaseValidatingLineEdit")
                .named("WorkingCopy")
                .text(std::env::temp_dir().display().to_string())
                .bounds(20.0, 120.0, 600.0, 24.0),
        )?;
        let dir = h.add(page, Widget::new("QLineEdit").named("Dir").bounds(20.0, 160.0, 600.0, 24.0))?;
        let recursive = h.add(
            page,
            Widget::new("QCheckBox")
                .text("Recursive")
                .property("checked", "false")
                .bounds(20.0, 200.0, 120.0, 20.0),
        )?;
        let next = h.add(window, Widget::new("QPushButton").text("Next >").disabled())?;
        let cancel = h.add(window, Widget::new("QPushButton").text("Cancel"))?;
        let finish = h.add(window, Widget::new("QPushButton").text("Finish").hidden().disabled())?;

        let wizard = Arc::new(CloneWizard {
            window,
            next,
            cancel,
            finish,
            fields: FieldPage {
                page,
                repo,
                working_copy,
                dir,
                recursive,
                popup: Mutex::new(None),
            },
            page: Mutex::new(None),
            phase: Mutex::new(Phase::Editing),
            stop: Mutex::new(None),
            target: Mutex::new(None),
        });

        let w = wizard.clone();
        self.on_text(repo, move |ide, _, url| ide.repo_changed(&w, url))?;
        for field in [working_copy, dir] {
            let w = wizard.clone();
            self.on_text(field, move |ide, _, _| ide.update_next(&w))?;
        }
        let w = wizard.clone();
        self.on_click_at(page, move |ide, _, _, y| {
            // only clicks below the checkbox row reach the page behind the popup
            let (_, cy, _, ch) = ide.handle.bounds(w.fields.recursive)?;
            if y > cy + ch {
                if let Some(popup) = w.fields.popup.lock().ok().and_then(|mut p| p.take()) {
                    ide.handle.remove(popup)?;
                }
            }
            ide.update_next(&w)
        })?;
        let w = wizard.clone();
        self.on_click(next, move |ide, _| ide.start_clone(&w))?;
        let w = wizard.clone();
        self.on_click(cancel, move |ide, _| ide.cancel_clone(&w))?;
        let w = wizard;
        self.on_click(finish, move |ide, _| ide.finish_clone(&w))?;
        info!(window, "clone wizard opened");
        Ok(())
    }

    fn repo_changed(&self, w: &CloneWizard, url: &str) -> Result<(), AutomationError> {
        let suggested = url
            .trim_end_matches('/')
            .rsplit(['/', ':'])
            .next()
            .unwrap_or_default()
            .trim_end_matches(".git")
            .to_string();
        self.handle.set_text(w.fields.dir, suggested)?;
        let mut popup = w
            .fields
            .popup
            .lock()
            .map_err(|_| AutomationError::Internal("popup lock poisoned".to_string()))?;
        if popup.is_none() && !url.is_empty() {
            let id = self.handle.add(
                w.fields.page,
                Widget::new("QListView")
                    .named("proposalPopup")
                    .text(url)
                    .bounds(20.0, 64.0, 600.0, 120.0),
            )?;
            *popup = Some(id);
        }
        drop(popup);
        self.update_next(w)
    }

    /// Next is usable once every field is filled and the popup is gone
    fn update_next(&self, w: &CloneWizard) -> Result<(), AutomationError> {
        let popup_open = w
            .fields
            .popup
            .lock()
            .map(|p| p.is_some_and(|id| self.handle.exists(id)))
            .unwrap_or(false);
        let filled = [w.fields.repo, w.fields.working_copy, w.fields.dir]
            .into_iter()
            .map(|id| self.handle.text(id).map(|t| !t.trim().is_empty()))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .all(|f| f);
        self.handle.set_enabled(w.next, filled && !popup_open)
    }

    fn start_clone(self: &Arc<Self>, w: &Arc<CloneWizard>) -> Result<(), AutomationError> {
        let url = self.handle.text(w.fields.repo)?;
        let target = PathBuf::from(self.handle.text(w.fields.working_copy)?);
        let clone_dir = self.handle.text(w.fields.dir)?;
        let recursive = self
            .handle
            .attributes(w.fields.recursive)?
            .properties
            .get("checked")
            .is_some_and(|c| c == "true");

        self.handle.remove(w.fields.page)?;
        let page = self.handle.add(
            w.window,
            Widget::new("ProjectExplorer::JsonWizardPage").bounds(0.0, 0.0, 700.0, 450.0),
        )?;
        let log = self.handle.add(
            page,
            Widget::new("QPlainTextEdit").named("logPlainTextEdit").text(""),
        )?;
        let status = self.handle.add(
            page,
            Widget::new("QLabel").named("statusLabel").text("Running Git clone..."),
        )?;
        self.handle.set_visible(w.next, false)?;
        self.handle.set_visible(w.finish, true)?;

        if let Ok(mut p) = w.page.lock() {
            *p = Some(ClonePage { log, status });
        }
        if let Ok(mut t) = w.target.lock() {
            *t = Some((target.clone(), clone_dir.clone()));
        }
        let mut args = vec!["clone", "--progress"];
        if recursive {
            args.push("--recursive");
        }
        self.vcs_append(&format!(
            "Running in {}: git {} {url} {clone_dir}\n",
            target.display(),
            args.join(" ")
        ))?;
        self.handle
            .append_text(log, &format!("Cloning into '{clone_dir}'...\n"))?;
        if let Ok(mut phase) = w.phase.lock() {
            *phase = Phase::Running;
        }

        let stop = self.worker_flag();
        if let Ok(mut s) = w.stop.lock() {
            *s = Some(stop.clone());
        }
        let ide = self.clone();
        let wizard = w.clone();
        std::thread::spawn(move || ide.run_clone(&wizard, &stop, log, status, &target, &clone_dir));
        debug!(%url, "clone started");
        Ok(())
    }

    fn run_clone(
        &self,
        w: &CloneWizard,
        stop: &AtomicBool,
        log: NodeId,
        status: NodeId,
        target: &Path,
        clone_dir: &str,
    ) {
        for (step, line) in PROGRESS.iter().enumerate() {
            if !pause(self.options.step_delay, stop) {
                return;
            }
            let Ok(phase) = w.phase.lock() else { return };
            if *phase != Phase::Running {
                return;
            }
            let _ = self.handle.append_text(log, line);
            if self.options.repeated_progress {
                let _ = self.handle.append_text(log, line);
            }
            let fails = self.options.clone_failure.is_some() || self.options.silent_clone_failure;
            if step == 0 && fails {
                drop(phase);
                self.end_clone(w, Phase::Failed, |ide| {
                    if let Some(message) = &ide.options.clone_failure {
                        ide.handle.append_text(log, &format!("fatal: {message}\n"))?;
                    }
                    ide.handle.set_text(status, "Failed.")?;
                    ide.vcs_append("The command \"git\" terminated with exit code 128.\n")
                });
                return;
            }
        }
        if !pause(self.options.step_delay, stop) {
            return;
        }
        self.end_clone(w, Phase::Succeeded, |ide| {
            let root = target.join(clone_dir);
            for file in &ide.options.clone_files {
                let path = root.join(file);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(io_error)?;
                }
                std::fs::write(&path, b"").map_err(io_error)?;
            }
            ide.handle.set_text(status, "Succeeded.")?;
            ide.handle.set_enabled(w.finish, true)?;
            ide.vcs_append("The command \"git\" finished successfully.\n")
        });
    }

    /// Moves a running clone into its final phase, unless it was canceled
    fn end_clone<F>(&self, w: &CloneWizard, to: Phase, f: F)
    where
        F: FnOnce(&Ide) -> Result<(), AutomationError>,
    {
        let Ok(mut phase) = w.phase.lock() else { return };
        if *phase != Phase::Running {
            return;
        }
        *phase = to;
        if let Err(e) = f(self) {
            warn!(error = %e, "simulated clone could not finish");
        }
        info!(phase = ?to, "clone ended");
    }

    fn cancel_clone(&self, w: &CloneWizard) -> Result<(), AutomationError> {
        let mut phase = w
            .phase
            .lock()
            .map_err(|_| AutomationError::Internal("phase lock poisoned".to_string()))?;
        if *phase == Phase::Running {
            *phase = Phase::Failed;
            if let Some(stop) = w.stop.lock().ok().and_then(|s| s.clone()) {
                stop.store(true, std::sync::atomic::Ordering::SeqCst);
            }
            if let Some(page) = w.page.lock().ok().and_then(|p| p.as_ref().map(|p| (p.log, p.status))) {
                let (log, status) = page;
                self.handle.append_text(log, "Stopping...\n")?;
                self.handle.set_text(status, "Failed.")?;
            }
            self.vcs_append("The command \"git\" terminated abnormally.\n")?;
            info!("clone canceled");
            return Ok(());
        }
        drop(phase);
        info!(cancel = w.cancel, "clone wizard closed");
        self.handle.remove(w.window)
    }

    fn finish_clone(&self, w: &CloneWizard) -> Result<(), AutomationError> {
        let target = w.target.lock().ok().and_then(|t| t.clone());
        self.handle.remove(w.window)?;
        let Some((target, clone_dir)) = target else {
            return Ok(());
        };
        let project_dir = target.join(&clone_dir);
        if self.options.project_openable {
            self.open_project(&clone_dir, project_dir)?;
            self.handle.set_visible(self.toolbar.configure, true)
        } else {
            self.show_cannot_open(&project_dir)
        }
    }

    fn show_cannot_open(&self, project_dir: &Path) -> Result<(), AutomationError> {
        let h = &self.handle;
        let dialog = h.add(
            ROOT,
            Widget::new("QMessageBox").property("windowTitle", "Cannot Open Project"),
        )?;
        let details = h.add(
            dialog,
            Widget::new("QTextEdit")
                .text(format!(
                    "Failed opening project \"{}\": no importer accepted it.",
                    project_dir.display()
                ))
                .hidden(),
        )?;
        let show = h.add(dialog, Widget::new("QPushButton").text("Show Details..."))?;
        let ok = h.add(dialog, Widget::new("QPushButton").text("OK"))?;
        self.on_click(show, move |ide, _| ide.handle.set_visible(details, true))?;
        self.on_click(ok, move |ide, _| ide.handle.remove(dialog))
    }
}

fn io_error(e: std::io::Error) -> AutomationError {
    AutomationError::PlatformError(format!("simulated clone: {e}"))
}

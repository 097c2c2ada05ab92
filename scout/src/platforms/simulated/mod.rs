//! In-process target application.
//!
//! [`SimulatedEngine`] drives a widget tree held in memory instead of a real
//! toolkit. Applications describe themselves through [`SimulatedApplication`]
//! and react to clicks and typing through handlers registered on the tree.

mod tree;

pub use tree::{ClickHandler, NodeId, PointHandler, SimHandle, TextHandler, Widget, ROOT};

use crate::element::{Bounds, UIElement, UIElementAttributes, UIElementImpl};
use crate::errors::AutomationError;
use crate::locator::Locator;
use crate::platforms::AutomationEngine;
use crate::selector::Selector;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{info, instrument};

/// A program the simulated engine can launch
pub trait SimulatedApplication: Send + Sync {
    /// Program name accepted by [`AutomationEngine::launch`]
    fn program(&self) -> &str;

    /// Builds the initial widgets under `root` and returns the main window
    fn build(&self, handle: &SimHandle, args: &[String]) -> Result<NodeId, AutomationError>;
}

pub struct SimulatedEngine {
    handle: SimHandle,
    application: Arc<dyn SimulatedApplication>,
    running: AtomicBool,
    poll_interval: Duration,
    this: Weak<SimulatedEngine>,
}

impl SimulatedEngine {
    pub fn new(application: Arc<dyn SimulatedApplication>) -> Arc<Self> {
        Self::with_poll_interval(application, crate::poll::DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(
        application: Arc<dyn SimulatedApplication>,
        poll_interval: Duration,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            handle: SimHandle::new(),
            application,
            running: AtomicBool::new(false),
            poll_interval,
            this: this.clone(),
        })
    }

    /// Direct access to the widget tree, for tests and scripted applications
    pub fn handle(&self) -> &SimHandle {
        &self.handle
    }

    fn element(&self, id: NodeId) -> UIElement {
        UIElement::new(Box::new(SimulatedElement {
            handle: self.handle.clone(),
            engine: self.this.clone(),
            id,
        }))
    }

    pub fn element_for(&self, id: NodeId) -> Result<UIElement, AutomationError> {
        if !self.handle.exists(id) {
            return Err(AutomationError::ElementDetached(format!(
                "simulated node #{id} no longer exists"
            )));
        }
        Ok(self.element(id))
    }
}

impl AutomationEngine for SimulatedEngine {
    fn get_root_element(&self) -> UIElement {
        self.element(ROOT)
    }

    #[instrument(level = "info", skip(self, args))]
    fn launch(&self, program: &str, args: &[String]) -> Result<UIElement, AutomationError> {
        if program != self.application.program() {
            return Err(AutomationError::InvalidArgument(format!(
                "simulated engine only knows '{}', not '{program}'",
                self.application.program()
            )));
        }
        if self.is_running() {
            return Err(AutomationError::UnsupportedOperation(format!(
                "'{program}' is already running"
            )));
        }
        self.running.store(true, Ordering::SeqCst);
        self.handle.clear()?;
        match self.application.build(&self.handle, args) {
            Ok(main_window) => {
                info!(main_window, "simulated application started");
                Ok(self.element(main_window))
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    fn terminate(&self) -> Result<(), AutomationError> {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("simulated application terminated");
        }
        self.handle.clear()
    }

    /// An application that removed all of its windows has exited
    fn is_running(&self) -> bool {
        if !self.running.load(Ordering::SeqCst) {
            return false;
        }
        let has_windows = self
            .handle
            .children(ROOT)
            .map(|windows| !windows.is_empty())
            .unwrap_or(false);
        if !has_windows {
            self.running.store(false, Ordering::SeqCst);
        }
        has_windows
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[derive(Clone)]
pub struct SimulatedElement {
    handle: SimHandle,
    engine: Weak<SimulatedEngine>,
    id: NodeId,
}

impl std::fmt::Debug for SimulatedElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedElement")
            .field("id", &self.id)
            .field("attributes", &self.handle.attributes(self.id).ok())
            .finish()
    }
}

impl SimulatedElement {
    pub fn node_id(&self) -> NodeId {
        self.id
    }

    fn wrap(&self, id: NodeId) -> UIElement {
        UIElement::new(Box::new(SimulatedElement {
            handle: self.handle.clone(),
            engine: self.engine.clone(),
            id,
        }))
    }
}

impl UIElementImpl for SimulatedElement {
    fn object_id(&self) -> usize {
        self.id
    }

    fn attributes(&self) -> Result<UIElementAttributes, AutomationError> {
        self.handle.attributes(self.id)
    }

    fn children(&self) -> Result<Vec<UIElement>, AutomationError> {
        Ok(self
            .handle
            .children(self.id)?
            .into_iter()
            .map(|id| self.wrap(id))
            .collect())
    }

    fn parent(&self) -> Result<Option<UIElement>, AutomationError> {
        Ok(self.handle.parent(self.id)?.map(|id| self.wrap(id)))
    }

    fn bounds(&self) -> Result<Bounds, AutomationError> {
        self.handle.bounds(self.id)
    }

    fn click(&self) -> Result<(), AutomationError> {
        self.handle.click(self.id)
    }

    fn click_at(&self, x: f64, y: f64) -> Result<(), AutomationError> {
        self.handle.click_at(self.id, x, y)
    }

    fn set_text(&self, text: &str) -> Result<(), AutomationError> {
        self.handle.type_text(self.id, text)
    }

    fn is_alive(&self) -> bool {
        self.handle.exists(self.id)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn create_locator(&self, selector: Selector) -> Result<Locator, AutomationError> {
        let engine = self.engine.upgrade().ok_or_else(|| {
            AutomationError::PlatformError("simulated engine has been dropped".to_string())
        })?;
        Ok(Locator::new(engine, selector).within(self.wrap(self.id)))
    }

    fn clone_box(&self) -> Box<dyn UIElementImpl> {
        Box::new(self.clone())
    }
}

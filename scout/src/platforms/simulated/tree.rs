//! In-memory widget tree backing the simulated engine

use crate::element::{Bounds, UIElementAttributes};
use crate::errors::AutomationError;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::trace;

pub type NodeId = usize;

/// Callback run when a widget is clicked
pub type ClickHandler = Arc<dyn Fn(&SimHandle, NodeId) + Send + Sync>;
/// Callback run for a click at a relative point
pub type PointHandler = Arc<dyn Fn(&SimHandle, NodeId, f64, f64) + Send + Sync>;
/// Callback run after a widget's text was replaced
pub type TextHandler = Arc<dyn Fn(&SimHandle, NodeId, &str) + Send + Sync>;

/// Description of a widget to insert
#[derive(Debug, Clone)]
pub struct Widget {
    pub type_name: String,
    pub name: Option<String>,
    pub text: Option<String>,
    pub visible: bool,
    pub enabled: bool,
    pub bounds: Bounds,
    pub properties: BTreeMap<String, String>,
}

impl Widget {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: None,
            text: None,
            visible: true,
            enabled: true,
            bounds: (0.0, 0.0, 100.0, 30.0),
            properties: BTreeMap::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn bounds(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bounds = (x, y, width, height);
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

struct Node {
    widget: Widget,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    on_click: Option<ClickHandler>,
    on_click_at: Option<PointHandler>,
    on_text: Option<TextHandler>,
}

struct Tree {
    nodes: HashMap<NodeId, Node>,
    next_id: NodeId,
}

/// Root node id; the root is never removed
pub const ROOT: NodeId = 0;

/// Shared, cloneable handle on the widget tree.
///
/// Mutations are atomic per call. Handlers are invoked after the lock is
/// released, so they may freely mutate the tree themselves.
#[derive(Clone)]
pub struct SimHandle {
    tree: Arc<Mutex<Tree>>,
}

impl fmt::Debug for SimHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes = self.lock().map(|t| t.nodes.len()).unwrap_or(0);
        f.debug_struct("SimHandle").field("nodes", &nodes).finish()
    }
}

impl Default for SimHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SimHandle {
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            ROOT,
            Node {
                widget: Widget::new("Desktop").bounds(0.0, 0.0, 1920.0, 1080.0),
                parent: None,
                children: Vec::new(),
                on_click: None,
                on_click_at: None,
                on_text: None,
            },
        );
        Self {
            tree: Arc::new(Mutex::new(Tree { nodes, next_id: 1 })),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tree>, AutomationError> {
        self.tree
            .lock()
            .map_err(|_| AutomationError::Internal("simulated tree lock poisoned".to_string()))
    }

    fn detached(id: NodeId) -> AutomationError {
        AutomationError::ElementDetached(format!("simulated node #{id} no longer exists"))
    }

    pub fn add(&self, parent: NodeId, widget: Widget) -> Result<NodeId, AutomationError> {
        let mut tree = self.lock()?;
        if !tree.nodes.contains_key(&parent) {
            return Err(Self::detached(parent));
        }
        let id = tree.next_id;
        tree.next_id += 1;
        trace!(id, parent, type_name = %widget.type_name, "add widget");
        tree.nodes.insert(
            id,
            Node {
                widget,
                parent: Some(parent),
                children: Vec::new(),
                on_click: None,
                on_click_at: None,
                on_text: None,
            },
        );
        if let Some(p) = tree.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        Ok(id)
    }

    /// Removes a node and its whole subtree
    pub fn remove(&self, id: NodeId) -> Result<(), AutomationError> {
        if id == ROOT {
            return Err(AutomationError::InvalidArgument(
                "the root node cannot be removed".to_string(),
            ));
        }
        let mut tree = self.lock()?;
        let Some(node) = tree.nodes.get(&id) else {
            return Ok(());
        };
        if let Some(parent) = node.parent {
            if let Some(p) = tree.nodes.get_mut(&parent) {
                p.children.retain(|c| *c != id);
            }
        }
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = tree.nodes.remove(&next) {
                pending.extend(node.children);
            }
        }
        Ok(())
    }

    /// Removes everything below the root
    pub fn clear(&self) -> Result<(), AutomationError> {
        let children = self.children(ROOT)?;
        for child in children {
            self.remove(child)?;
        }
        Ok(())
    }

    pub fn exists(&self, id: NodeId) -> bool {
        self.lock().map(|t| t.nodes.contains_key(&id)).unwrap_or(false)
    }

    pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>, AutomationError> {
        let tree = self.lock()?;
        tree.nodes
            .get(&id)
            .map(|n| n.children.clone())
            .ok_or_else(|| Self::detached(id))
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, AutomationError> {
        let tree = self.lock()?;
        tree.nodes
            .get(&id)
            .map(|n| n.parent)
            .ok_or_else(|| Self::detached(id))
    }

    pub fn attributes(&self, id: NodeId) -> Result<UIElementAttributes, AutomationError> {
        let tree = self.lock()?;
        let node = tree.nodes.get(&id).ok_or_else(|| Self::detached(id))?;
        let w = &node.widget;
        // a widget only shows when every ancestor does
        let mut visible = w.visible;
        let mut up = node.parent;
        while let (true, Some(p)) = (visible, up) {
            let parent = tree.nodes.get(&p).ok_or_else(|| Self::detached(p))?;
            visible = parent.widget.visible;
            up = parent.parent;
        }
        Ok(UIElementAttributes {
            type_name: w.type_name.clone(),
            name: w.name.clone(),
            text: w.text.clone(),
            visible,
            enabled: w.enabled,
            properties: w.properties.clone(),
        })
    }

    pub fn bounds(&self, id: NodeId) -> Result<Bounds, AutomationError> {
        let tree = self.lock()?;
        tree.nodes
            .get(&id)
            .map(|n| n.widget.bounds)
            .ok_or_else(|| Self::detached(id))
    }

    fn update<F>(&self, id: NodeId, f: F) -> Result<(), AutomationError>
    where
        F: FnOnce(&mut Node),
    {
        let mut tree = self.lock()?;
        let node = tree.nodes.get_mut(&id).ok_or_else(|| Self::detached(id))?;
        f(node);
        Ok(())
    }

    pub fn set_text(&self, id: NodeId, text: impl Into<String>) -> Result<(), AutomationError> {
        let text = text.into();
        self.update(id, |n| n.widget.text = Some(text))
    }

    pub fn append_text(&self, id: NodeId, more: &str) -> Result<(), AutomationError> {
        self.update(id, |n| {
            n.widget.text.get_or_insert_with(String::new).push_str(more)
        })
    }

    pub fn text(&self, id: NodeId) -> Result<String, AutomationError> {
        Ok(self.attributes(id)?.text.unwrap_or_default())
    }

    pub fn set_enabled(&self, id: NodeId, enabled: bool) -> Result<(), AutomationError> {
        self.update(id, |n| n.widget.enabled = enabled)
    }

    pub fn set_visible(&self, id: NodeId, visible: bool) -> Result<(), AutomationError> {
        self.update(id, |n| n.widget.visible = visible)
    }

    pub fn set_property(
        &self,
        id: NodeId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), AutomationError> {
        let (key, value) = (key.into(), value.into());
        self.update(id, |n| {
            n.widget.properties.insert(key, value);
        })
    }

    pub fn on_click(&self, id: NodeId, handler: ClickHandler) -> Result<(), AutomationError> {
        self.update(id, |n| n.on_click = Some(handler))
    }

    pub fn on_click_at(&self, id: NodeId, handler: PointHandler) -> Result<(), AutomationError> {
        self.update(id, |n| n.on_click_at = Some(handler))
    }

    pub fn on_text(&self, id: NodeId, handler: TextHandler) -> Result<(), AutomationError> {
        self.update(id, |n| n.on_text = Some(handler))
    }

    /// First node (depth-first) whose object name equals `name`
    pub fn find_named(&self, name: &str) -> Option<NodeId> {
        let tree = self.lock().ok()?;
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            let node = tree.nodes.get(&id)?;
            if node.widget.name.as_deref() == Some(name) {
                return Some(id);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    pub(crate) fn click(&self, id: NodeId) -> Result<(), AutomationError> {
        let handler = {
            let tree = self.lock()?;
            let node = tree.nodes.get(&id).ok_or_else(|| Self::detached(id))?;
            node.on_click.clone()
        };
        if let Some(handler) = handler {
            handler(self, id);
        }
        Ok(())
    }

    pub(crate) fn click_at(&self, id: NodeId, x: f64, y: f64) -> Result<(), AutomationError> {
        let handler = {
            let tree = self.lock()?;
            let node = tree.nodes.get(&id).ok_or_else(|| Self::detached(id))?;
            node.on_click_at.clone()
        };
        if let Some(handler) = handler {
            handler(self, id, x, y);
        }
        Ok(())
    }

    pub(crate) fn type_text(&self, id: NodeId, text: &str) -> Result<(), AutomationError> {
        let handler = {
            let mut tree = self.lock()?;
            let node = tree.nodes.get_mut(&id).ok_or_else(|| Self::detached(id))?;
            node.widget.text = Some(text.to_string());
            node.on_text.clone()
        };
        if let Some(handler) = handler {
            handler(self, id, text);
        }
        Ok(())
    }
}

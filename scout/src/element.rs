use crate::errors::AutomationError;
use crate::locator::Locator;
use crate::selector::Selector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Debug;
use tracing::{debug, instrument};

/// Represents a live UI element in the target application.
///
/// A handle stays usable only while the element exists; once the application
/// destroys it (dialog closed, page switched) every call fails with
/// [`AutomationError::ElementDetached`].
#[derive(Debug)]
pub struct UIElement {
    inner: Box<dyn UIElementImpl>,
}

/// Snapshot of the properties selectors match against
#[derive(Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UIElementAttributes {
    /// Toolkit class name, e.g. `QPushButton`
    #[serde(rename = "type")]
    pub type_name: String,
    /// Object name, `None` for unnamed objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub visible: bool,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl fmt::Debug for UIElementAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug_struct = f.debug_struct("UIElementAttributes");
        debug_struct.field("type", &self.type_name);
        if let Some(name) = &self.name {
            debug_struct.field("name", name);
        }
        if let Some(text) = &self.text {
            if !text.is_empty() {
                let shown: String = text.chars().take(40).collect();
                debug_struct.field("text", &shown);
            }
        }
        if !self.visible {
            debug_struct.field("visible", &false);
        }
        if !self.enabled {
            debug_struct.field("enabled", &false);
        }
        if !self.properties.is_empty() {
            debug_struct.field("properties", &self.properties);
        }
        debug_struct.finish()
    }
}

/// Geometry of an element relative to its window: x, y, width, height
pub type Bounds = (f64, f64, f64, f64);

/// Interface for platform-specific element implementations
pub trait UIElementImpl: Send + Sync + Debug {
    /// Identity of the underlying element, stable for the element's lifetime
    fn object_id(&self) -> usize;
    fn attributes(&self) -> Result<UIElementAttributes, AutomationError>;
    fn children(&self) -> Result<Vec<UIElement>, AutomationError>;
    fn parent(&self) -> Result<Option<UIElement>, AutomationError>;
    fn bounds(&self) -> Result<Bounds, AutomationError>;
    fn click(&self) -> Result<(), AutomationError>;
    /// Click at a point relative to the element's top-left corner
    fn click_at(&self, x: f64, y: f64) -> Result<(), AutomationError>;
    fn set_text(&self, text: &str) -> Result<(), AutomationError>;
    fn is_alive(&self) -> bool;
    fn as_any(&self) -> &dyn std::any::Any;
    fn create_locator(&self, selector: Selector) -> Result<Locator, AutomationError>;
    fn clone_box(&self) -> Box<dyn UIElementImpl>;
}

impl UIElement {
    pub fn new(impl_: Box<dyn UIElementImpl>) -> Self {
        Self { inner: impl_ }
    }

    pub fn object_id(&self) -> usize {
        self.inner.object_id()
    }

    /// Attributes, or an empty default when the element is gone
    pub fn attributes(&self) -> UIElementAttributes {
        self.inner.attributes().unwrap_or_default()
    }

    pub fn try_attributes(&self) -> Result<UIElementAttributes, AutomationError> {
        self.inner.attributes()
    }

    pub fn type_name(&self) -> String {
        self.attributes().type_name
    }

    pub fn name(&self) -> Option<String> {
        self.attributes().name
    }

    /// Current text (label caption, line edit content, log contents)
    pub fn text(&self) -> Result<String, AutomationError> {
        Ok(self.inner.attributes()?.text.unwrap_or_default())
    }

    pub fn is_enabled(&self) -> Result<bool, AutomationError> {
        Ok(self.inner.attributes()?.enabled)
    }

    pub fn is_visible(&self) -> Result<bool, AutomationError> {
        Ok(self.inner.attributes()?.visible)
    }

    pub fn property(&self, key: &str) -> Option<String> {
        self.attributes().properties.get(key).cloned()
    }

    /// Whether the element still exists in the target application
    pub fn is_alive(&self) -> bool {
        self.inner.is_alive()
    }

    pub fn children(&self) -> Result<Vec<UIElement>, AutomationError> {
        self.inner.children()
    }

    pub fn parent(&self) -> Result<Option<UIElement>, AutomationError> {
        self.inner.parent()
    }

    pub fn bounds(&self) -> Result<Bounds, AutomationError> {
        self.inner.bounds()
    }

    #[instrument(level = "debug", skip(self), fields(element = ?self.attributes()))]
    pub fn click(&self) -> Result<(), AutomationError> {
        self.ensure_interactable()?;
        self.inner.click()
    }

    /// Clicks a point relative to the element, for targets that have no
    /// locator of their own (e.g. the blank area of a wizard page).
    #[instrument(level = "debug", skip(self))]
    pub fn click_at(&self, x: f64, y: f64) -> Result<(), AutomationError> {
        let (_, _, width, height) = self.bounds()?;
        if x < 0.0 || y < 0.0 || x > width || y > height {
            return Err(AutomationError::InvalidArgument(format!(
                "point ({x}, {y}) lies outside the element ({width}x{height})"
            )));
        }
        self.inner.click_at(x, y)
    }

    /// Replaces the whole editor content with `text`
    #[instrument(level = "debug", skip(self, text))]
    pub fn set_text(&self, text: &str) -> Result<(), AutomationError> {
        self.ensure_interactable()?;
        debug!(chars = text.len(), "replacing editor content");
        self.inner.set_text(text)
    }

    /// Locator scoped to this element's subtree
    pub fn locator(&self, selector: Selector) -> Result<Locator, AutomationError> {
        self.inner.create_locator(selector)
    }

    pub fn as_any(&self) -> &dyn std::any::Any {
        self.inner.as_any()
    }

    fn ensure_interactable(&self) -> Result<(), AutomationError> {
        let attrs = self.inner.attributes()?;
        if !attrs.visible {
            return Err(AutomationError::ElementNotVisible(format!("{attrs:?}")));
        }
        if !attrs.enabled {
            return Err(AutomationError::ElementNotEnabled(format!("{attrs:?}")));
        }
        Ok(())
    }
}

impl PartialEq for UIElement {
    fn eq(&self, other: &Self) -> bool {
        self.object_id() == other.object_id()
    }
}

impl Eq for UIElement {}

impl Clone for UIElement {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_box(),
        }
    }
}

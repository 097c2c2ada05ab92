use tracing::{debug, instrument, warn};

use crate::element::UIElement;
use crate::errors::AutomationError;
use crate::platforms::AutomationEngine;
use crate::selector::Selector;
use std::sync::Arc;
use std::time::Duration;
use tokio::task;

// Default timeout if none is specified on the locator itself
const DEFAULT_LOCATOR_TIMEOUT: Duration = Duration::from_secs(20);

/// Finds elements for one selector, waiting for them to appear.
///
/// Handles are never cached: every call resolves the selector against the
/// live tree again.
#[derive(Clone)]
pub struct Locator {
    engine: Arc<dyn AutomationEngine>,
    selector: Selector,
    timeout: Duration, // Default timeout for this locator instance
    root: Option<UIElement>,
}

/// Outcome of [`Locator::resolve_or`]
#[derive(Debug)]
pub enum Resolution {
    /// The primary selector resolved
    Found(UIElement),
    /// Only the fallback selector resolved
    Alternate(UIElement),
    /// Neither resolved; carries the primary lookup's error
    Missing(AutomationError),
}

impl Resolution {
    pub fn found(self) -> Option<UIElement> {
        match self {
            Resolution::Found(el) => Some(el),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

impl Locator {
    /// Create a new locator with the given selector
    pub(crate) fn new(engine: Arc<dyn AutomationEngine>, selector: Selector) -> Self {
        Self {
            engine,
            selector,
            timeout: DEFAULT_LOCATOR_TIMEOUT,
            root: None,
        }
    }

    /// Set a default timeout for waiting operations on this locator instance.
    /// This timeout is used if no specific timeout is passed to wait methods.
    pub fn set_default_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the root element for this locator
    pub fn within(mut self, element: UIElement) -> Self {
        self.root = Some(element);
        self
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get all elements matching this locator, waiting up to the timeout for
    /// the first one to appear.
    pub async fn all(&self, timeout: Option<Duration>) -> Result<Vec<UIElement>, AutomationError> {
        let effective_timeout = timeout.unwrap_or(self.timeout);
        let engine = self.engine.clone();
        let selector = self.selector.clone();
        let root = self.root.clone();
        task::spawn_blocking(move || {
            engine.find_elements(&selector, root.as_ref(), Some(effective_timeout))
        })
        .await
        .map_err(|e| AutomationError::PlatformError(format!("Task join error: {e}")))?
    }

    /// Wait for an element matching the locator to appear, up to the specified timeout.
    /// If no timeout is provided, uses the locator's default timeout.
    /// Fails with [`AutomationError::ElementNotFound`] once the timeout elapses.
    #[instrument(level = "debug", skip(self, timeout), fields(selector = %self.selector))]
    pub async fn wait(&self, timeout: Option<Duration>) -> Result<UIElement, AutomationError> {
        let effective_timeout = timeout.unwrap_or(self.timeout);
        debug!(?effective_timeout, "waiting for element");

        // The engine's find_element blocks while it polls, so keep it off
        // the async worker threads.
        let engine = self.engine.clone();
        let selector = self.selector.clone();
        let root = self.root.clone();

        task::spawn_blocking(move || {
            engine.find_element(&selector, root.as_ref(), Some(effective_timeout))
        })
        .await
        .map_err(|e| AutomationError::PlatformError(format!("Task join error: {e}")))?
    }

    /// Whether a matching element exists right now
    pub fn exists(&self) -> bool {
        match self.engine.query(&self.selector, self.root.as_ref()) {
            Ok(matches) => self.selector.pick(matches).is_some(),
            Err(_) => false,
        }
    }

    /// Resolves the selector, or checks `alternate` when it does not appear.
    ///
    /// The alternate is only checked for existence, without waiting: it
    /// describes a state the application is expected to be in already.
    #[instrument(level = "debug", skip(self, alternate, timeout), fields(selector = %self.selector))]
    pub async fn resolve_or(&self, alternate: &Locator, timeout: Option<Duration>) -> Resolution {
        match self.wait(timeout).await {
            Ok(element) => Resolution::Found(element),
            Err(e) if e.is_not_found() => {
                let fallback = alternate
                    .engine
                    .query(&alternate.selector, alternate.root.as_ref())
                    .ok()
                    .and_then(|matches| alternate.selector.pick(matches));
                match fallback {
                    Some(element) => {
                        warn!(fallback = %alternate.selector, "primary not found, using alternate");
                        Resolution::Alternate(element)
                    }
                    None => Resolution::Missing(e),
                }
            }
            Err(e) => Resolution::Missing(e),
        }
    }

    fn with_selector(&self, selector: Selector) -> Locator {
        Locator {
            engine: self.engine.clone(),
            selector,
            timeout: self.timeout,
            root: self.root.clone(),
        }
    }

    /// Locator for `selector` inside elements matched by this locator.
    ///
    /// Containers already on `selector` stay in place; this locator's
    /// selector becomes the container of the outermost one.
    pub fn locator(&self, selector: Selector) -> Result<Locator, AutomationError> {
        let nested = nest(&selector, &self.selector)?;
        Ok(self.with_selector(nested))
    }

    pub fn selector_string(&self) -> String {
        self.selector.to_string()
    }
}

fn nest(selector: &Selector, outer: &Selector) -> Result<Selector, AutomationError> {
    let container = match selector.container() {
        Some(inner) => nest(inner, outer)?,
        None => outer.clone(),
    };
    rebuild(selector).container(container).build()
}

fn rebuild(selector: &Selector) -> crate::selector::SelectorBuilder {
    let mut builder = Selector::builder();
    if let Some(v) = selector.type_name() {
        builder = builder.type_name(v);
    }
    if let Some(v) = selector.name() {
        builder = builder.name(v);
    }
    if let Some(v) = selector.text() {
        builder = builder.text(v);
    }
    if let Some(v) = selector.container() {
        builder = builder.container(v.clone());
    }
    if let Some(v) = selector.visible() {
        builder = builder.visible(v);
    }
    if let Some(v) = selector.unnamed() {
        builder = builder.unnamed(v);
    }
    if let Some(v) = selector.occurrence() {
        builder = builder.occurrence(v);
    }
    for (key, value) in selector.properties() {
        builder = builder.property(key, value);
    }
    builder
}

use crate::poll::DEFAULT_POLL_INTERVAL;
use crate::{AutomationError, Selector, UIElement};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

pub mod simulated;

/// Fallback when neither the caller nor the locator supplies a timeout
pub const DEFAULT_FIND_TIMEOUT: Duration = Duration::from_secs(20);

/// The seam to whatever actually drives the target application.
///
/// Lookups are blocking; callers on an async runtime go through
/// [`crate::Locator`], which moves them onto the blocking pool.
pub trait AutomationEngine: Send + Sync {
    /// Root of the target application's object tree
    fn get_root_element(&self) -> UIElement;

    /// One snapshot of every element under `root` (or the application root)
    /// that structurally matches `selector`, in depth-first pre-order.
    /// The selector's `occurrence` is not applied here.
    fn query(
        &self,
        selector: &Selector,
        root: Option<&UIElement>,
    ) -> Result<Vec<UIElement>, AutomationError> {
        let root = match root {
            Some(el) => el.clone(),
            None => self.get_root_element(),
        };
        let mut found = Vec::new();
        let mut stack = root.children()?;
        stack.reverse();
        while let Some(element) = stack.pop() {
            if selector.matches_element(&element) {
                found.push(element.clone());
            }
            // elements can vanish mid-walk; skip their subtree
            if let Ok(mut children) = element.children() {
                children.reverse();
                stack.extend(children);
            }
        }
        trace!(matches = found.len(), %selector, "query");
        Ok(found)
    }

    /// Waits until an element matching `selector` exists. Ambiguous matches
    /// resolve to the first in traversal order unless the selector carries an
    /// occurrence index.
    fn find_element(
        &self,
        selector: &Selector,
        root: Option<&UIElement>,
        timeout: Option<Duration>,
    ) -> Result<UIElement, AutomationError> {
        let timeout = timeout.unwrap_or(DEFAULT_FIND_TIMEOUT);
        let interval = self.poll_interval();
        let start = Instant::now();
        loop {
            let matches = self.query(selector, root)?;
            let count = matches.len();
            if let Some(element) = selector.pick(matches) {
                if count > 1 && selector.occurrence().is_none() {
                    debug!(count, %selector, "ambiguous selector, using first match");
                }
                return Ok(element);
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Err(AutomationError::ElementNotFound(format!(
                    "{selector} did not appear within {timeout:?}"
                )));
            }
            std::thread::sleep(interval.min(timeout - elapsed));
        }
    }

    /// Waits until at least one element matches and returns all matches
    fn find_elements(
        &self,
        selector: &Selector,
        root: Option<&UIElement>,
        timeout: Option<Duration>,
    ) -> Result<Vec<UIElement>, AutomationError> {
        let first = self.find_element(&selector.without_occurrence(), root, timeout)?;
        let all = self.query(selector, root)?;
        if all.is_empty() {
            // the match vanished between the two snapshots
            return Ok(vec![first]);
        }
        Ok(all)
    }

    /// Starts the target application and returns its main window
    fn launch(&self, program: &str, args: &[String]) -> Result<UIElement, AutomationError>;

    /// Stops the target application; a no-op when it is not running
    fn terminate(&self) -> Result<(), AutomationError>;

    fn is_running(&self) -> bool;

    fn poll_interval(&self) -> Duration {
        DEFAULT_POLL_INTERVAL
    }

    /// Enable downcasting to concrete engine types
    fn as_any(&self) -> &dyn std::any::Any;
}

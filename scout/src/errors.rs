use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AutomationError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Assertion mismatch: {0}")]
    AssertionMismatch(String),

    #[error("Element is detached from the UI tree: {0}")]
    ElementDetached(String),

    #[error("Element is not enabled: {0}")]
    ElementNotEnabled(String),

    #[error("Element is not visible: {0}")]
    ElementNotVisible(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Platform-specific error: {0}")]
    PlatformError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AutomationError {
    /// True for errors that mean "the element is not there (yet)".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AutomationError::ElementNotFound(_) | AutomationError::ElementDetached(_)
        )
    }
}

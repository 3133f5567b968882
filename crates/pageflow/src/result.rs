//! Result and error types for Pageflow.

use thiserror::Error;

/// Result type for Pageflow operations
pub type PageflowResult<T> = Result<T, PageflowError>;

/// Errors that can occur in Pageflow
#[derive(Debug, Error)]
pub enum PageflowError {
    /// Element lookup found nothing (backend adapters only; the resolver turns this into an outcome)
    #[error("Element not found: {locator}")]
    ElementNotFound {
        /// Locator that matched nothing
        locator: String,
    },

    /// Element handle no longer refers to a live element
    #[error("Stale element reference: {element_id}")]
    StaleElement {
        /// Backend element id
        element_id: String,
    },

    /// Backend refused a mutating action (not interactable, click intercepted, ...)
    #[error("Action rejected: {message}")]
    ActionRejected {
        /// Error message
        message: String,
    },

    /// Transport or connection fault; fatal for the flow
    #[error("Session error: {message}")]
    Session {
        /// Error message
        message: String,
    },

    /// Operation attempted on a session that was already closed
    #[error("Session already closed")]
    SessionClosed,

    /// Locator cannot be expressed on the target backend
    #[error("Invalid locator {locator}: {message}")]
    InvalidLocator {
        /// Locator as displayed
        locator: String,
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// HTTP transport error
    #[cfg(feature = "webdriver")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl PageflowError {
    /// Create a session (transport) error
    #[must_use]
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    /// Create an action-rejected error
    #[must_use]
    pub fn action_rejected(message: impl Into<String>) -> Self {
        Self::ActionRejected {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Faults that terminate a flow immediately and are never retried
    #[must_use]
    pub fn is_session_fault(&self) -> bool {
        match self {
            Self::StaleElement { .. } | Self::ActionRejected { .. } | Self::ElementNotFound { .. } => {
                false
            }
            Self::Session { .. }
            | Self::SessionClosed
            | Self::InvalidLocator { .. }
            | Self::Config { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Yaml(_) => true,
            #[cfg(feature = "webdriver")]
            Self::Http(_) => true,
        }
    }

    /// Action failures that earn one re-resolve-and-retry
    #[must_use]
    pub const fn is_retryable_action_failure(&self) -> bool {
        matches!(
            self,
            Self::StaleElement { .. } | Self::ActionRejected { .. } | Self::ElementNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_fault_classification() {
        assert!(PageflowError::session("connection reset").is_session_fault());
        assert!(PageflowError::SessionClosed.is_session_fault());
        assert!(PageflowError::config("bad").is_session_fault());
        assert!(!PageflowError::action_rejected("intercepted").is_session_fault());
        assert!(!PageflowError::StaleElement {
            element_id: "e-1".to_string()
        }
        .is_session_fault());
    }

    #[test]
    fn test_retryable_action_failures() {
        assert!(PageflowError::StaleElement {
            element_id: "e-1".to_string()
        }
        .is_retryable_action_failure());
        assert!(PageflowError::action_rejected("not interactable").is_retryable_action_failure());
        assert!(!PageflowError::session("gone").is_retryable_action_failure());
    }

    #[test]
    fn test_error_display() {
        let err = PageflowError::InvalidLocator {
            locator: "css=#x".to_string(),
            message: "not supported on android".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid locator css=#x: not supported on android"
        );
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PageflowError = io_err.into();
        assert!(err.to_string().contains("I/O"));
        assert!(err.is_session_fault());
    }
}

//! Result and error types for chatprobe.

use crate::message::MessageGroup;
use thiserror::Error;

/// Result type for chatprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving the chat UI
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    Page {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// No element matched a selector
    #[error("No element matches selector `{selector}`")]
    ElementNotFound {
        /// CSS selector
        selector: String,
    },

    /// JavaScript evaluation error
    #[error("Evaluation of `{function}` failed: {message}")]
    Evaluation {
        /// Name of the page function
        function: String,
        /// Error message
        message: String,
    },

    /// Input simulation error
    #[error("Input on `{selector}` failed: {message}")]
    Input {
        /// CSS selector
        selector: String,
        /// Error message
        message: String,
    },

    /// A wait did not observe its condition in time
    #[error("Timed out after {ms}ms waiting for {waited_for}{}", last_error_suffix(.last_error))]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// Description of the awaited condition
        waited_for: String,
        /// Last transient error seen while polling
        last_error: Option<String>,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Rendered message groups differ from the expected ones
    #[error("Messages in `{view}` do not match\n  expected: {expected:?}\n    actual: {actual:?}")]
    MessageMismatch {
        /// Message table id
        view: String,
        /// Expected trailing groups
        expected: Vec<MessageGroup>,
        /// Rendered trailing groups
        actual: Vec<MessageGroup>,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    Screenshot {
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
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    last_error
        .as_ref()
        .map(|e| format!(" (last error: {e})"))
        .unwrap_or_default()
}

impl ProbeError {
    /// Create an assertion error
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
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

    /// Create an element-not-found error
    #[must_use]
    pub fn not_found(selector: impl Into<String>) -> Self {
        Self::ElementNotFound {
            selector: selector.into(),
        }
    }

    /// Whether a polling wait may retry after this error.
    ///
    /// Evaluation and page errors show up while the document is being
    /// replaced (form submit, navigation); everything else is final.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Evaluation { .. } | Self::Page { .. })
    }
}

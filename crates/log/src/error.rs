//! Logger errors.

use thiserror::Error;

/// Result type for logger setup.
pub type LogResult<T> = Result<T, LogError>;

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LogError {
    /// The filter directive does not parse.
    #[error("invalid filter '{filter}': {reason}")]
    Filter {
        /// Directive as given.
        filter: String,
        /// Parser message.
        reason: String,
    },

    /// The global subscriber could not be installed.
    #[error("failed to install subscriber: {0}")]
    Install(String),
}

impl LogError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Filter { .. } => "LOG:FILTER",
            Self::Install(_) => "LOG:INSTALL",
        }
    }
}

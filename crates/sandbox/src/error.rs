//! Sandbox lifecycle errors.

use thiserror::Error;

use crate::state::SandboxState;

/// Misuse of the sandbox lifecycle.
///
/// Snippet faults are never reported here; they end up in the run's
/// [`ExecutionOutcome`](crate::ExecutionOutcome).
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SandboxError {
    /// The requested state change is not part of the lifecycle.
    #[error("invalid sandbox transition from {from} to {to}")]
    InvalidTransition {
        /// State the sandbox was in.
        from: SandboxState,
        /// State that was requested.
        to: SandboxState,
    },
}

impl SandboxError {
    /// Stable error code for categorization.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "SANDBOX:INVALID_TRANSITION",
        }
    }
}

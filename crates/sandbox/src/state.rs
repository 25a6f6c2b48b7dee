//! Sandbox lifecycle states and transition validation.

use serde::Serialize;

use crate::error::SandboxError;

/// Lifecycle of one sandboxed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SandboxState {
    /// Bindings are ready; the snippet has not started.
    Prepared,
    /// The engine is executing the snippet.
    Running,
    /// The snippet ran to its natural end.
    Completed,
    /// The snippet raised an unhandled fault.
    Faulted,
}

impl SandboxState {
    /// Returns `true` for `Completed` and `Faulted`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Faulted)
    }
}

impl std::fmt::Display for SandboxState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prepared => write!(f, "prepared"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Faulted => write!(f, "faulted"),
        }
    }
}

/// Returns `true` if moving from `from` to `to` is allowed.
#[must_use]
pub fn can_transition(from: SandboxState, to: SandboxState) -> bool {
    matches!(
        (from, to),
        (SandboxState::Prepared, SandboxState::Running)
            | (SandboxState::Running, SandboxState::Completed)
            | (SandboxState::Running, SandboxState::Faulted)
    )
}

/// Validate a transition, returning an error if it is not allowed.
pub fn validate_transition(from: SandboxState, to: SandboxState) -> Result<(), SandboxError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(SandboxError::InvalidTransition { from, to })
    }
}

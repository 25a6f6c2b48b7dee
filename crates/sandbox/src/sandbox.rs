//! The execution sandbox state machine.

use std::panic::{AssertUnwindSafe, catch_unwind};

use runlet_context::ContextStore;
use runlet_credential::ConnectionSet;

use crate::engine::{Bindings, ScriptEngine};
use crate::error::SandboxError;
use crate::fault::FaultRecord;
use crate::state::{SandboxState, validate_transition};

/// Kind reported when an engine panics instead of returning a fault.
pub const ENGINE_PANIC: &str = "EnginePanic";

/// Result of one sandboxed run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutcome {
    /// Everything the snippet printed.
    pub captured_text: String,
    /// The context as left by the snippet, including writes made before a fault.
    pub context: ContextStore,
    /// Set when the run ended in `Faulted`.
    pub fault: Option<FaultRecord>,
}

impl ExecutionOutcome {
    /// Whether the run completed without a fault.
    pub fn is_success(&self) -> bool {
        self.fault.is_none()
    }
}

/// Runs one snippet against a context and a connection set.
///
/// The sandbox is the single place where snippet faults are caught: an
/// engine's `Err` and an engine panic both end the run in `Faulted` and are
/// reported through [`ExecutionOutcome::fault`]. Cached credentials are torn
/// down on every terminal path.
#[derive(Debug)]
pub struct ExecutionSandbox {
    state: SandboxState,
    context: ContextStore,
    connections: ConnectionSet,
}

impl ExecutionSandbox {
    /// Prepare a sandbox over `context` and `connections`.
    pub fn new(context: ContextStore, connections: ConnectionSet) -> Self {
        Self {
            state: SandboxState::Prepared,
            context,
            connections,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SandboxState {
        self.state
    }

    /// Execute `source` with `engine`.
    ///
    /// Only a prepared sandbox can run; a second call fails with
    /// [`SandboxError::InvalidTransition`] and leaves the sandbox untouched.
    pub fn run(
        &mut self,
        engine: &dyn ScriptEngine,
        source: &str,
    ) -> Result<ExecutionOutcome, SandboxError> {
        self.transition(SandboxState::Running)?;
        tracing::debug!(engine = engine.name(), bytes = source.len(), "executing snippet");

        let mut captured = Vec::new();
        let result = {
            let mut connections = scopeguard::guard(&mut self.connections, |connections| {
                connections.teardown();
            });
            let mut bindings = Bindings::new(&mut self.context, &mut connections);
            catch_unwind(AssertUnwindSafe(|| {
                engine.run(source, &mut bindings, &mut captured)
            }))
        };

        let fault = match result {
            Ok(Ok(())) => None,
            Ok(Err(fault)) => Some(FaultRecord::from(fault)),
            Err(payload) => Some(FaultRecord::new(ENGINE_PANIC, panic_message(payload.as_ref()))),
        };

        let terminal = if fault.is_some() {
            SandboxState::Faulted
        } else {
            SandboxState::Completed
        };
        self.transition(terminal)?;

        match &fault {
            Some(record) => tracing::warn!(
                engine = engine.name(),
                kind = %record.kind,
                line = ?record.source_line,
                "snippet faulted"
            ),
            None => tracing::debug!(
                engine = engine.name(),
                captured = captured.len(),
                "snippet completed"
            ),
        }

        Ok(ExecutionOutcome {
            captured_text: String::from_utf8_lossy(&captured).into_owned(),
            context: std::mem::take(&mut self.context),
            fault,
        })
    }

    fn transition(&mut self, to: SandboxState) -> Result<(), SandboxError> {
        validate_transition(self.state, to)?;
        tracing::trace!(from = %self.state, to = %to, "sandbox transition");
        self.state = to;
        Ok(())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "engine panicked".to_owned()
    }
}

//! The interpreter as a sandbox engine.

use std::io::Write;
use std::sync::Arc;

use runlet_sandbox::{Bindings, ScriptEngine, ScriptFault, TraceFrame};
use serde::{Deserialize, Serialize};

use crate::builtins::BuiltinRegistry;
use crate::error::ScriptError;
use crate::eval::{DEFAULT_MAX_CALL_DEPTH, Evaluator, SNIPPET_FRAME};
use crate::parser::parse;

/// Interpreter limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// Deepest allowed chain of nested user function calls.
    pub max_call_depth: usize,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// Parses and runs snippets.
///
/// Parse errors and runtime errors both come back as a [`ScriptFault`]
/// whose trace ends at the line the error was raised on.
#[derive(Debug, Clone, Default)]
pub struct ScriptInterpreter {
    builtins: Arc<BuiltinRegistry>,
    config: ScriptConfig,
}

impl ScriptInterpreter {
    /// Create an interpreter with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an interpreter with the given limits.
    pub fn with_config(config: ScriptConfig) -> Self {
        Self {
            builtins: Arc::new(BuiltinRegistry::new()),
            config,
        }
    }

    /// Share an existing builtin registry.
    #[must_use]
    pub fn with_builtins(mut self, builtins: Arc<BuiltinRegistry>) -> Self {
        self.builtins = builtins;
        self
    }

    /// Active limits.
    pub fn config(&self) -> &ScriptConfig {
        &self.config
    }

    /// Builtins available to snippets.
    pub fn builtins(&self) -> &BuiltinRegistry {
        &self.builtins
    }
}

impl ScriptEngine for ScriptInterpreter {
    fn name(&self) -> &'static str {
        "script"
    }

    fn run(
        &self,
        source: &str,
        bindings: &mut Bindings<'_>,
        output: &mut dyn Write,
    ) -> Result<(), ScriptFault> {
        let program = parse(source).map_err(|err| {
            let line = match &err {
                ScriptError::Syntax { line, .. } => *line,
                _ => 1,
            };
            tracing::debug!(line, error = %err, "snippet does not parse");
            to_fault(&err, vec![TraceFrame::new(SNIPPET_FRAME, line)])
        })?;
        tracing::trace!(statements = program.body.len(), "snippet parsed");

        Evaluator::new(
            &self.builtins,
            &mut *bindings.context,
            &mut *bindings.connections,
            output,
        )
        .with_max_call_depth(self.config.max_call_depth)
        .run(&program)
        .map_err(|unwind| to_fault(&unwind.error, unwind.trace))
    }
}

fn to_fault(err: &ScriptError, trace: Vec<TraceFrame>) -> ScriptFault {
    ScriptFault::new(err.kind(), err.to_string()).with_trace(trace)
}

//! Faults raised by script engines and their translated records.

use runlet_context::ContextError;
use runlet_credential::CredentialError;
use serde::Serialize;

/// One frame of a fault's propagation trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceFrame {
    /// Function the frame belongs to (`<snippet>` for top-level code).
    pub function: String,
    /// 1-based line within the snippet source.
    pub line: u32,
}

impl TraceFrame {
    /// Create a frame.
    pub fn new(function: impl Into<String>, line: u32) -> Self {
        Self {
            function: function.into(),
            line,
        }
    }
}

/// An unhandled fault raised while an engine runs a snippet.
///
/// `trace` is ordered from the outermost frame to the innermost one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFault {
    /// Error kind, e.g. `KeyNotFound` or `TypeError`.
    pub kind: String,
    /// Human-readable description.
    pub message: String,
    /// Frames from outermost to innermost.
    pub trace: Vec<TraceFrame>,
}

impl ScriptFault {
    /// Create a fault with an empty trace.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            trace: Vec::new(),
        }
    }

    /// Attach a propagation trace.
    pub fn with_trace(mut self, trace: Vec<TraceFrame>) -> Self {
        self.trace = trace;
        self
    }

    /// Line of the deepest frame, i.e. where the fault was raised.
    pub fn innermost_line(&self) -> Option<u32> {
        self.trace.last().map(|frame| frame.line)
    }
}

impl std::fmt::Display for ScriptFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ScriptFault {}

impl From<ContextError> for ScriptFault {
    fn from(err: ContextError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl From<CredentialError> for ScriptFault {
    fn from(err: CredentialError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

/// A fault as reported in the run's outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaultRecord {
    /// Error kind.
    pub kind: String,
    /// Description of the fault.
    pub message: String,
    /// Snippet line where the fault was raised, when known.
    pub source_line: Option<u32>,
}

impl FaultRecord {
    /// Create a record without a source line.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            source_line: None,
        }
    }
}

impl From<ScriptFault> for FaultRecord {
    fn from(fault: ScriptFault) -> Self {
        let source_line = fault.innermost_line();
        Self {
            kind: fault.kind,
            message: fault.message,
            source_line,
        }
    }
}

impl std::fmt::Display for FaultRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(line) = self.source_line {
            write!(f, " (line {line})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_takes_the_deepest_frame() {
        let fault = ScriptFault::new("ValueError", "boom").with_trace(vec![
            TraceFrame::new("<snippet>", 12),
            TraceFrame::new("outer", 4),
            TraceFrame::new("inner", 2),
        ]);

        let record = FaultRecord::from(fault);

        assert_eq!(record.source_line, Some(2));
        assert_eq!(record.to_string(), "ValueError: boom (line 2)");
    }

    #[test]
    fn record_without_trace_has_no_line() {
        let record = FaultRecord::from(ScriptFault::new("EnginePanic", "oops"));
        assert_eq!(record.source_line, None);
        assert_eq!(record.to_string(), "EnginePanic: oops");
    }

    #[test]
    fn context_errors_keep_their_kind() {
        let fault = ScriptFault::from(ContextError::PathTooShort { path: "x".into() });
        assert_eq!(fault.kind, "InvalidRootError");
        assert!(fault.message.contains("'x'"));
    }

    #[test]
    fn credential_errors_collapse_to_one_kind() {
        let fault = ScriptFault::from(CredentialError::UnknownConnection {
            connection: "slack".into(),
        });
        assert_eq!(
            fault.to_string(),
            "CredentialResolutionError: connection 'slack' is not defined"
        );
    }
}

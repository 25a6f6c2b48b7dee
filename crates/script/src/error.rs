//! Errors raised while parsing or running a snippet.

use runlet_context::ContextError;
use runlet_credential::CredentialError;
use thiserror::Error;

/// Result type used throughout the interpreter.
pub type ScriptResult<T> = Result<T, ScriptError>;

/// A parse or runtime error.
///
/// [`kind`](Self::kind) is the name snippet authors see in the output
/// envelope. Context and credential errors keep their own kinds.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    /// The source does not parse.
    #[error("{message}")]
    Syntax {
        /// Parser message.
        message: String,
        /// 1-based line of the offending token.
        line: u32,
    },

    /// A name is neither a local, a global, nor an ambient binding.
    #[error("name '{name}' is not defined")]
    UndefinedName {
        /// Name as written.
        name: String,
    },

    /// A call names neither a user function nor a builtin.
    #[error("function '{name}' is not defined")]
    UndefinedFunction {
        /// Function name as written.
        name: String,
    },

    /// An operand has the wrong type.
    #[error("expected {expected}, found {found}")]
    Type {
        /// What the operation accepts.
        expected: String,
        /// Type name of the value it got.
        found: String,
    },

    /// A function was called with the wrong number or kind of arguments.
    #[error("{function}(): {message}")]
    InvalidArgument {
        /// Called function.
        function: String,
        /// What is wrong with the arguments.
        message: String,
    },

    /// An operand has the right type but an unusable value.
    #[error("{message}")]
    Value {
        /// Description of the bad value.
        message: String,
    },

    /// Division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Array index outside the array.
    #[error("index {index} is out of range for length {length}")]
    IndexOutOfBounds {
        /// Index as written, possibly negative.
        index: i64,
        /// Length of the indexed value.
        length: usize,
    },

    /// Object key that does not exist.
    #[error("key '{key}' not found")]
    MissingKey {
        /// Key that was looked up.
        key: String,
    },

    /// Raised by `raise` or `fail()`.
    #[error("{message}")]
    Raised {
        /// Text given to `raise`.
        message: String,
    },

    /// The call depth limit was hit.
    #[error("maximum call depth ({limit}) exceeded")]
    Recursion {
        /// Configured maximum depth.
        limit: usize,
    },

    /// A context store operation failed.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// A connection could not be resolved.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The output sink refused a write.
    #[error("failed to write output: {message}")]
    Output {
        /// I/O error text.
        message: String,
    },
}

impl ScriptError {
    pub(crate) fn type_error(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::Type {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn invalid_argument(function: &str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            function: function.to_owned(),
            message: message.into(),
        }
    }

    pub(crate) fn value(message: impl Into<String>) -> Self {
        Self::Value {
            message: message.into(),
        }
    }

    /// Error kind as reported to snippet authors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "SyntaxError",
            Self::UndefinedName { .. } | Self::UndefinedFunction { .. } => "NameError",
            Self::Type { .. } | Self::InvalidArgument { .. } => "TypeError",
            Self::Value { .. } => "ValueError",
            Self::DivisionByZero => "ZeroDivisionError",
            Self::IndexOutOfBounds { .. } | Self::MissingKey { .. } => "IndexError",
            Self::Raised { .. } => "RaisedError",
            Self::Recursion { .. } => "RecursionError",
            Self::Context(e) => e.kind(),
            Self::Credential(e) => e.kind(),
            Self::Output { .. } => "OutputError",
        }
    }

    /// Stable error code for categorization.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "SCRIPT:SYNTAX",
            Self::UndefinedName { .. } => "SCRIPT:UNDEFINED_NAME",
            Self::UndefinedFunction { .. } => "SCRIPT:UNDEFINED_FUNCTION",
            Self::Type { .. } => "SCRIPT:TYPE",
            Self::InvalidArgument { .. } => "SCRIPT:INVALID_ARG",
            Self::Value { .. } => "SCRIPT:VALUE",
            Self::DivisionByZero => "SCRIPT:DIV_ZERO",
            Self::IndexOutOfBounds { .. } => "SCRIPT:INDEX_OOB",
            Self::MissingKey { .. } => "SCRIPT:MISSING_KEY",
            Self::Raised { .. } => "SCRIPT:RAISED",
            Self::Recursion { .. } => "SCRIPT:RECURSION",
            Self::Context(e) => e.code(),
            Self::Credential(e) => e.code(),
            Self::Output { .. } => "SCRIPT:OUTPUT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ScriptError::UndefinedName { name: "x".into() }, "NameError", "SCRIPT:UNDEFINED_NAME")]
    #[case(ScriptError::DivisionByZero, "ZeroDivisionError", "SCRIPT:DIV_ZERO")]
    #[case(ScriptError::MissingKey { key: "k".into() }, "IndexError", "SCRIPT:MISSING_KEY")]
    #[case(ScriptError::Recursion { limit: 3 }, "RecursionError", "SCRIPT:RECURSION")]
    #[case(
        ScriptError::invalid_argument("len", "expected 1 argument"),
        "TypeError",
        "SCRIPT:INVALID_ARG"
    )]
    fn kinds_and_codes(#[case] err: ScriptError, #[case] kind: &str, #[case] code: &str) {
        assert_eq!(err.kind(), kind);
        assert_eq!(err.code(), code);
    }

    #[test]
    fn context_errors_pass_through() {
        let err = ScriptError::from(ContextError::KeyNotFound {
            path: "variables.a".into(),
            segment: "a".into(),
        });
        assert_eq!(err.kind(), "KeyNotFound");
        assert_eq!(err.code(), "CONTEXT:KEY_NOT_FOUND");
    }

    #[test]
    fn credential_errors_pass_through() {
        let err = ScriptError::from(CredentialError::UnknownConnection {
            connection: "db".into(),
        });
        assert_eq!(err.kind(), "CredentialResolutionError");
        assert_eq!(err.to_string(), "connection 'db' is not defined");
    }
}

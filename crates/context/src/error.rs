//! Error types for context path operations.

use thiserror::Error;

/// Result type for context operations.
pub type ContextResult<T> = Result<T, ContextError>;

/// Failures raised while reading or mutating a [`ContextStore`](crate::ContextStore).
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// A segment along the path does not exist.
    #[error("key '{segment}' not found while resolving '{path}'")]
    KeyNotFound {
        /// Full path being resolved.
        path: String,
        /// First segment that is missing.
        segment: String,
    },

    /// An intermediate value is not a mapping.
    #[error("cannot descend into '{segment}' of '{path}': found {found}, expected object")]
    TypeMismatch {
        /// Full path being resolved.
        path: String,
        /// Segment whose value is not a mapping.
        segment: String,
        /// Type name of the value found there.
        found: &'static str,
    },

    /// A write or delete path does not start with the reserved root prefix.
    #[error("path '{path}' must start with '{expected}'")]
    InvalidRoot {
        /// Offending path.
        path: String,
        /// Required first segment.
        expected: String,
    },

    /// A write or delete path has fewer than two segments.
    #[error("path '{path}' needs at least two segments to be modified")]
    PathTooShort {
        /// Offending path.
        path: String,
    },

    /// The address string itself is malformed.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// Address as given.
        path: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A write would have to turn an existing scalar or list into a mapping.
    #[error("cannot write '{path}': '{segment}' already holds {found}")]
    StructureConflict {
        /// Path being written.
        path: String,
        /// Segment that already holds a non-mapping.
        segment: String,
        /// Type name of the value it holds.
        found: &'static str,
    },
}

impl ContextError {
    /// Stable error code for categorization.
    pub fn code(&self) -> &'static str {
        match self {
            Self::KeyNotFound { .. } => "CONTEXT:KEY_NOT_FOUND",
            Self::TypeMismatch { .. } => "CONTEXT:TYPE_MISMATCH",
            Self::InvalidRoot { .. } => "CONTEXT:INVALID_ROOT",
            Self::PathTooShort { .. } => "CONTEXT:PATH_TOO_SHORT",
            Self::InvalidPath { .. } => "CONTEXT:INVALID_PATH",
            Self::StructureConflict { .. } => "CONTEXT:STRUCTURE_CONFLICT",
        }
    }

    /// Error kind as reported to snippet authors.
    ///
    /// Root-prefix and depth violations share one kind: both mean the path
    /// does not address the writable namespace.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::KeyNotFound { .. } => "KeyNotFound",
            Self::TypeMismatch { .. } => "TypeMismatch",
            Self::InvalidRoot { .. } | Self::PathTooShort { .. } => "InvalidRootError",
            Self::InvalidPath { .. } => "InvalidPathError",
            Self::StructureConflict { .. } => "StructureConflict",
        }
    }

    /// The address the failing operation was called with.
    pub fn path(&self) -> &str {
        match self {
            Self::KeyNotFound { path, .. }
            | Self::TypeMismatch { path, .. }
            | Self::InvalidRoot { path, .. }
            | Self::PathTooShort { path }
            | Self::InvalidPath { path, .. }
            | Self::StructureConflict { path, .. } => path,
        }
    }
}

//! Dotted context addresses.

use crate::error::{ContextError, ContextResult};

/// Separator between path segments.
pub const SEPARATOR: char = '.';

/// A parsed dotted address such as `variables.user.name`.
///
/// Every segment is non-empty. Parsing never allocates for the segments
/// themselves; they borrow from the address string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextPath<'a> {
    raw: &'a str,
    segments: Vec<&'a str>,
}

impl<'a> ContextPath<'a> {
    /// Parse an address string.
    pub fn parse(raw: &'a str) -> ContextResult<Self> {
        if raw.is_empty() {
            return Err(ContextError::InvalidPath {
                path: String::new(),
                reason: "path is empty",
            });
        }

        let segments: Vec<&str> = raw.split(SEPARATOR).collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(ContextError::InvalidPath {
                path: raw.to_owned(),
                reason: "path contains an empty segment",
            });
        }

        Ok(Self { raw, segments })
    }

    /// The address as given.
    pub fn as_str(&self) -> &'a str {
        self.raw
    }

    /// All segments in order.
    pub fn segments(&self) -> &[&'a str] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false; a parsed path has at least one segment.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// First segment.
    pub fn first(&self) -> &'a str {
        self.segments.first().copied().unwrap_or_default()
    }

    /// Split into the parent segments and the final key.
    pub fn split_last(&self) -> (&[&'a str], &'a str) {
        match self.segments.split_last() {
            Some((last, parents)) => (parents, last),
            None => (&[], ""),
        }
    }
}

impl std::fmt::Display for ContextPath<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.raw)
    }
}

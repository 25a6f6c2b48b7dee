//! Source positions for tokens and statements.

/// A byte range in the snippet source together with its starting line.
///
/// Positions are `u32` to keep tokens small; snippets are far below 4GB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Start byte offset.
    pub start: u32,
    /// End byte offset (exclusive).
    pub end: u32,
    /// 1-based line of `start`.
    pub line: u32,
}

impl Span {
    /// Create a span.
    pub fn new(start: usize, end: usize, line: u32) -> Self {
        Self {
            start: start as u32,
            end: end as u32,
            line,
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) as usize
    }

    /// Whether the span covers nothing.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Extract the covered text from `source`.
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        source
            .get(self.start as usize..self.end as usize)
            .unwrap_or("")
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{} (line {})", self.start, self.end, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_and_len() {
        let source = "let x = 1";
        let span = Span::new(4, 5, 1);
        assert_eq!(span.slice(source), "x");
        assert_eq!(span.len(), 1);
        assert!(!span.is_empty());
    }

    #[test]
    fn out_of_range_slice_is_empty() {
        assert_eq!(Span::new(10, 20, 1).slice("short"), "");
    }
}

//! Source position tracking for diagnostics.
//!
//! A [`FilePos`] names a span of source text by 1-based line and column
//! plus a length in characters. Every token, AST node and error carries
//! one, so a diagnostic can always point at the exact offending text.
//! The file *path* is not duplicated into every position; the compilation
//! driver knows which file it is processing and supplies the path when a
//! diagnostic is rendered.

/// A 1-based (line, column) position with a span length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilePos {
    /// Line number, starting at 1.
    pub line: u32,
    /// Column number, starting at 1.
    pub column: u32,
    /// Number of characters the span covers. 0 means "unknown width"
    /// and renders as a single caret.
    pub length: u32,
}

impl FilePos {
    /// Creates a position with an unknown span width.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column, length: 0 }
    }

    /// Creates a position covering `length` characters.
    pub fn with_length(line: u32, column: u32, length: u32) -> Self {
        Self { line, column, length }
    }

    /// The width used for underlining: at least one caret.
    pub fn underline_width(&self) -> usize {
        self.length.max(1) as usize
    }
}

impl std::fmt::Display for FilePos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_has_zero_length() {
        let pos = FilePos::new(3, 14);
        assert_eq!(pos.line, 3);
        assert_eq!(pos.column, 14);
        assert_eq!(pos.length, 0);
    }

    #[test]
    fn underline_width_is_at_least_one() {
        assert_eq!(FilePos::new(1, 1).underline_width(), 1);
        assert_eq!(FilePos::with_length(1, 1, 4).underline_width(), 4);
    }

    #[test]
    fn display_is_line_colon_column() {
        assert_eq!(FilePos::new(10, 7).to_string(), "10:7");
    }
}

//! Positioned, non-recoverable compile errors.
//!
//! Every error the compiler can produce carries a [`FilePos`] and a kind.
//! Errors are fatal: the first one aborts the compilation by propagating
//! up through `Result` to the driver, which renders it against the source
//! text and exits non-zero. There is no partial output.
//!
//! # Example
//!
//! ```
//! use mica_base::{CompileError, ErrorKind, FilePos, Result};
//!
//! fn check(n: i64) -> Result<i64> {
//!     if n < 0 {
//!         return Err(CompileError::semantic(
//!             "negative array length",
//!             FilePos::new(1, 5),
//!         ));
//!     }
//!     Ok(n)
//! }
//!
//! let err = check(-1).unwrap_err();
//! assert_eq!(err.kind, ErrorKind::Semantic);
//! ```

use crate::pos::FilePos;
use crate::style::Tint;
use std::fmt;

/// Which stage rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source file missing or unreadable.
    Io,
    /// Invalid escape, unterminated literal, invalid identifier character.
    Lex,
    /// Unexpected token, unmatched bracket, statement in the wrong scope.
    Parse,
    /// Undeclared name, duplicate declaration, type mismatch, bad cast.
    Semantic,
    /// A case the compiler itself should have made unreachable.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Io => "io",
            ErrorKind::Lex => "lex",
            ErrorKind::Parse => "parse",
            ErrorKind::Semantic => "semantic",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// An error annotated with its source position.
#[derive(Debug, Clone)]
pub struct CompileError {
    pub kind: ErrorKind,
    /// Human-readable reason, shown next to the underlined span.
    pub message: String,
    /// Where in the source the error occurred.
    pub pos: FilePos,
}

impl CompileError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, pos: FilePos) -> Self {
        Self { kind, message: message.into(), pos }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message, FilePos::default())
    }

    pub fn lex(message: impl Into<String>, pos: FilePos) -> Self {
        Self::new(ErrorKind::Lex, message, pos)
    }

    pub fn parse(message: impl Into<String>, pos: FilePos) -> Self {
        Self::new(ErrorKind::Parse, message, pos)
    }

    pub fn semantic(message: impl Into<String>, pos: FilePos) -> Self {
        Self::new(ErrorKind::Semantic, message, pos)
    }

    pub fn internal(message: impl Into<String>, pos: FilePos) -> Self {
        Self::new(ErrorKind::Internal, message, pos)
    }

    /// Renders the error as a contextual snippet of `source`.
    ///
    /// Output shape:
    ///
    /// ```text
    /// --> demo.mica:3:9:
    ///     1 | fn main() -> i32 {
    ///     2 |     let x: i32 = 1;
    ///     3 |     let x: i32 = 2;
    ///       |         ^  <--  variable 'x' is already defined
    ///     4 |     return x;
    ///     5 | }
    /// ```
    ///
    /// Up to two lines of context are shown on each side; the offending
    /// span is printed in bold red and underlined with carets.
    pub fn render_in_source(&self, path: &str, source: &str) -> String {
        let line = self.pos.line.max(1) as usize;
        let column = self.pos.column.max(1) as usize;
        let width = self.pos.underline_width();

        let mut out = String::new();
        out.push_str(&Tint::Frame.paint(&format!("--> {}:", path)));
        out.push_str(&Tint::Anchor.paint(&format!("{}:{}:", line, column)));
        out.push('\n');

        let first = line.saturating_sub(2).max(1);
        let last = line + 2;

        for (idx, text) in source.lines().enumerate() {
            let lineno = idx + 1;
            if lineno < first {
                continue;
            }
            if lineno > last {
                break;
            }

            out.push_str(&gutter(Some(lineno)));
            if lineno == line {
                push_highlighted(&mut out, text, column, width);
            } else {
                out.push_str(text);
            }
            out.push('\n');

            if lineno == line {
                out.push_str(&gutter(None));
                out.push_str(Tint::Alert.open());
                for _ in 0..column.saturating_sub(1) {
                    out.push(' ');
                }
                for _ in 0..width {
                    out.push('^');
                }
                out.push_str("  <--  ");
                out.push_str(&self.message);
                out.push_str(Tint::RESET);
                out.push('\n');
            }
        }

        out
    }
}

/// Right-aligned line-number gutter, `None` for the underline row.
fn gutter(lineno: Option<usize>) -> String {
    match lineno {
        Some(n) => Tint::Frame.paint(&format!("{:>5} | ", n)),
        None => Tint::Frame.paint(&format!("{:>5} | ", "")),
    }
}

/// Writes `text` with the span `[column, column + width)` marked as the
/// alert.
fn push_highlighted(out: &mut String, text: &str, column: usize, width: usize) {
    for (i, c) in text.chars().enumerate() {
        let col = i + 1;
        if col >= column && col < column + width {
            out.push_str(Tint::Alert.open());
            out.push(c);
            out.push_str(Tint::RESET);
        } else {
            out.push(c);
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {} at {}", self.kind, self.message, self.pos)
    }
}

impl std::error::Error for CompileError {}

/// Alias for `std::result::Result<T, CompileError>`.
pub type Result<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_message_and_position() {
        let err = CompileError::parse("unexpected token", FilePos::new(4, 2));
        let s = err.to_string();
        assert!(s.contains("parse"));
        assert!(s.contains("unexpected token"));
        assert!(s.contains("4:2"));
    }

    #[test]
    fn render_points_at_the_offending_line() {
        let source = "fn main() -> i32 {\n    return 0;\n}\n";
        let err = CompileError::semantic("bad return", FilePos::with_length(2, 5, 6));
        let rendered = err.render_in_source("demo.mica", source);
        assert!(rendered.contains("--> demo.mica:"));
        assert!(rendered.contains("2:5:"));
        assert!(rendered.contains("^^^^^^"));
        assert!(rendered.contains("bad return"));
    }

    #[test]
    fn render_limits_context_to_two_lines() {
        let source = "a\nb\nc\nd\ne\nf\ng\n";
        let err = CompileError::lex("boom", FilePos::new(4, 1));
        let rendered = err.render_in_source("f", source);
        // Lines 2..=6 appear, 1 and 7 do not.
        assert!(rendered.contains("2 | "));
        assert!(rendered.contains("6 | "));
        assert!(!rendered.contains("1 | a"));
        assert!(!rendered.contains("7 | g"));
    }

    #[test]
    fn render_survives_positions_past_the_end() {
        let source = "x\n";
        let err = CompileError::parse("eof", FilePos::new(9, 1));
        // Nothing to show, but it must not panic.
        let rendered = err.render_in_source("f", source);
        assert!(rendered.contains("--> f:"));
    }

    #[test]
    fn io_errors_have_no_position() {
        let err = CompileError::io("could not open file");
        assert_eq!(err.pos, FilePos::default());
        assert_eq!(err.kind, ErrorKind::Io);
    }
}

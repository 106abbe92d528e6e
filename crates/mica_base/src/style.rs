//! Terminal styling for diagnostics.
//!
//! Rendered diagnostics distinguish three visual roles rather than raw
//! colors: the *frame* (file path and line-number gutter), the *anchor*
//! (the line:column the reader should jump to) and the *alert* (the
//! offending span, its underline and the reason). Keying the escape
//! codes by role keeps the renderer readable and the color scheme in
//! one place.

/// A visual role in rendered diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tint {
    /// File path and line-number gutter.
    Frame,
    /// The `line:column` anchor in the diagnostic header.
    Anchor,
    /// The offending span, its underline and the reason text.
    Alert,
}

impl Tint {
    /// Escape sequence that ends any styled run.
    pub const RESET: &'static str = "\x1b[0m";

    /// Escape sequence opening this role's styled run.
    pub fn open(self) -> &'static str {
        match self {
            Tint::Frame => "\x1b[36m",
            Tint::Anchor => "\x1b[1m\x1b[36m",
            Tint::Alert => "\x1b[1m\x1b[31m",
        }
    }

    /// Wraps `text` in this role's styling, resetting at the end.
    pub fn paint(self, text: &str) -> String {
        format!("{}{}{}", self.open(), text, Self::RESET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_opens_and_resets() {
        let s = Tint::Frame.paint("gutter");
        assert!(s.starts_with(Tint::Frame.open()));
        assert!(s.contains("gutter"));
        assert!(s.ends_with(Tint::RESET));
    }

    #[test]
    fn roles_have_distinct_sequences() {
        assert_ne!(Tint::Frame.open(), Tint::Anchor.open());
        assert_ne!(Tint::Anchor.open(), Tint::Alert.open());
    }

    #[test]
    fn alert_is_bold() {
        assert!(Tint::Alert.open().starts_with("\x1b[1m"));
        assert!(Tint::Anchor.open().starts_with("\x1b[1m"));
        assert!(!Tint::Frame.open().contains("\x1b[1m"));
    }
}

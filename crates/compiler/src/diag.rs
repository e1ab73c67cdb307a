//! Source positions, spans, and diagnostic rendering.
//!
//! Positions are 1-based (line, column) pairs. Spans are half-open
//! `[start, end)` ranges. Diagnostic rendering is pure: the same inputs
//! always produce byte-identical output, which the golden tests rely on.

use std::fmt;

/// A 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        debug_assert!(line >= 1 && column >= 1, "positions are 1-based");
        Position { line, column }
    }

    /// The column after a tab at this position.
    ///
    /// Tab stops sit at columns 1, 9, 17, …: `next = ((col-1)/8 + 1)*8 + 1`.
    pub fn next_tab_stop(self) -> u32 {
        ((self.column - 1) / 8 + 1) * 8 + 1
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::new(1, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open `[start, end)` range of positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        debug_assert!(end >= start, "span end must not precede start");
        Span { start, end }
    }

    /// A zero-width span at a single position.
    pub fn at(pos: Position) -> Self {
        Span {
            start: pos,
            end: pos,
        }
    }

    /// Smallest span enclosing both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// True if `other` lies entirely within `self`.
    pub fn contains(self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Width in columns when the span stays on one line, else 1.
    pub fn width(self) -> u32 {
        if self.start.line == self.end.line && self.end.column > self.start.column {
            self.end.column - self.start.column
        } else {
            1
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Span::at(Position::default())
    }
}

/// Diagnostic severity, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A rendered compiler message pointing at a span of source.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub file: String,
    pub severity: Severity,
    /// Optional category tag, e.g. `lex` or `parse`.
    pub category: Option<String>,
    pub message: String,
    pub hint: Option<String>,
    pub span: Span,
    /// The full source line the span starts on, without its newline.
    pub source_line: String,
    /// 1-based column the caret points at.
    pub caret_column: u32,
}

impl Diagnostic {
    /// Build an error diagnostic, selecting a hint from the message text.
    pub fn error(
        file: impl Into<String>,
        category: impl Into<String>,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        let message = message.into();
        let hint = Some(hint_for(&message).to_string());
        Diagnostic {
            file: file.into(),
            severity: Severity::Error,
            category: Some(category.into()),
            message,
            hint,
            span,
            source_line: source_line.into(),
            caret_column: span.start.column,
        }
    }
}

impl fmt::Display for Diagnostic {
    /// Canonical text form:
    ///
    /// ```text
    /// file:line:col: severity[category]: message
    ///   <source line>
    ///   <indent>^~~ hint: <hint>
    /// ```
    ///
    /// The marker is `^` for a one-column span, otherwise `^` followed by
    /// tildes out to the span width.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.file, self.span.start.line, self.span.start.column, self.severity
        )?;
        if let Some(cat) = &self.category {
            write!(f, "[{}]", cat)?;
        }
        writeln!(f, ": {}", self.message)?;
        writeln!(f, "  {}", self.source_line)?;
        let indent = " ".repeat(self.caret_column.saturating_sub(1) as usize);
        let width = self.span.width() as usize;
        let marker = if width > 1 {
            format!("^{}", "~".repeat(width - 1))
        } else {
            "^".to_string()
        };
        write!(f, "  {}{}", indent, marker)?;
        if let Some(hint) = &self.hint {
            write!(f, " hint: {}", hint)?;
        }
        Ok(())
    }
}

/// Pick a hint by inspecting the message text.
pub fn hint_for(message: &str) -> &'static str {
    if message.contains("unterminated") {
        "check for missing closing delimiter"
    } else if message.contains("escape") {
        "check escape sequence syntax"
    } else if message.contains("underscore") {
        "underscores in numeric literals must be between digits"
    } else if message.contains("exponent") {
        "exponent must be followed by at least one digit"
    } else {
        "check the token around this location"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_stops() {
        assert_eq!(Position::new(1, 1).next_tab_stop(), 9);
        assert_eq!(Position::new(1, 8).next_tab_stop(), 9);
        assert_eq!(Position::new(1, 9).next_tab_stop(), 17);
        assert_eq!(Position::new(1, 12).next_tab_stop(), 17);
    }

    #[test]
    fn test_span_ordering_and_containment() {
        let outer = Span::new(Position::new(1, 1), Position::new(3, 1));
        let inner = Span::new(Position::new(1, 5), Position::new(2, 2));
        assert!(outer.contains(inner));
        assert!(!inner.contains(outer));
    }

    #[test]
    fn test_render_single_column() {
        let diag = Diagnostic::error(
            "demo.omni",
            "lex",
            "unrecognized character",
            Span::new(Position::new(2, 5), Position::new(2, 6)),
            "let @ = 1",
        );
        assert_eq!(
            diag.to_string(),
            "demo.omni:2:5: error[lex]: unrecognized character\n  let @ = 1\n      ^ hint: check the token around this location"
        );
    }

    #[test]
    fn test_render_tilde_run_matches_span_width() {
        let diag = Diagnostic::error(
            "demo.omni",
            "lex",
            "unterminated string literal",
            Span::new(Position::new(1, 5), Position::new(1, 9)),
            "x = \"abc",
        );
        let rendered = diag.to_string();
        assert!(rendered.contains("    ^~~~ hint: check for missing closing delimiter"));
    }

    #[test]
    fn test_hint_selection() {
        assert_eq!(hint_for("bad escape sequence"), "check escape sequence syntax");
        assert_eq!(
            hint_for("trailing underscore in literal"),
            "underscores in numeric literals must be between digits"
        );
        assert_eq!(
            hint_for("exponent has no digits"),
            "exponent must be followed by at least one digit"
        );
        assert_eq!(
            hint_for("unterminated block comment"),
            "check for missing closing delimiter"
        );
    }

    #[test]
    fn test_rendering_is_stable() {
        let diag = Diagnostic::error(
            "a.omni",
            "parse",
            "unexpected token RBRACE",
            Span::new(Position::new(1, 1), Position::new(1, 2)),
            "}",
        );
        assert_eq!(diag.to_string(), diag.to_string());
    }
}

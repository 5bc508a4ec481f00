//! Human-readable rendering of parse errors against their source text.
//!
//! Errors on the same line share one excerpt:
//!
//! ```text
//! Devcmdfile:3:7: syntax error: expected ':' after command name 'build'
//!   |
//! 3 | build echo hi
//!   |       ^~~~
//!   = help: write 'build: <command>'
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::error::ParseError;

/// Renders [`ParseError`]s with source excerpts and caret markers.
#[derive(Debug, Clone, Copy)]
pub struct Diagnostics<'s> {
    source: &'s str,
    origin: Option<&'s str>,
}

impl<'s> Diagnostics<'s> {
    #[must_use]
    pub const fn new(source: &'s str) -> Self {
        Self {
            source,
            origin: None,
        }
    }

    /// File name printed in front of each location.
    #[must_use]
    pub const fn with_origin(mut self, origin: &'s str) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Render all errors, grouped by line in ascending order.
    #[must_use]
    pub fn render(&self, errors: &[ParseError]) -> String {
        let lines: Vec<&str> = self.source.lines().collect();
        let mut by_line: BTreeMap<usize, Vec<&ParseError>> = BTreeMap::new();
        for error in errors {
            by_line.entry(error.token.line).or_default().push(error);
        }

        let mut out = String::new();
        for (line_no, group) in by_line {
            let text = line_no
                .checked_sub(1)
                .and_then(|i| lines.get(i))
                .copied()
                .unwrap_or_default();
            let gutter = line_no.to_string().len();

            for error in &group {
                let _ = writeln!(
                    out,
                    "{}{}:{}: {}: {}",
                    self.prefix(),
                    line_no,
                    error.token.column,
                    error.kind,
                    error.message
                );
            }
            let _ = writeln!(out, "{:gutter$} |", "");
            let _ = writeln!(out, "{line_no} | {text}");
            for error in &group {
                let _ = writeln!(out, "{:gutter$} | {}", "", caret_line(text, error));
                if let Some(help) = help_for(error) {
                    let _ = writeln!(out, "{:gutter$} = help: {help}", "");
                }
                if let Some(context) = &error.context {
                    let _ = writeln!(out, "{:gutter$} = note: {context}", "");
                }
                for related in &error.related {
                    let _ = writeln!(
                        out,
                        "{:gutter$} = note: {} ({})",
                        "", related.message, related.position
                    );
                }
            }
        }
        out
    }

    fn prefix(&self) -> String {
        self.origin.map(|o| format!("{o}:")).unwrap_or_default()
    }
}

/// Caret marker under the error's token. Tabs before the column are
/// copied so the marker lines up in any tab width.
fn caret_line(text: &str, error: &ParseError) -> String {
    let column = error.token.column.max(1);
    let mut marker: String = text
        .chars()
        .take(column - 1)
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();

    let remaining = text.chars().count().saturating_sub(column - 1);
    let width = if error.token.end_line() == error.token.line {
        error.token.end_column.saturating_sub(column)
    } else {
        remaining
    };
    let width = width.min(remaining).max(1);

    marker.push('^');
    for _ in 1..width {
        marker.push('~');
    }
    marker
}

fn help_for(error: &ParseError) -> Option<String> {
    error
        .hint
        .clone()
        .or_else(|| suggest(&error.message).map(str::to_string))
}

/// Fallback fix-it text for an error message, by category.
#[must_use]
pub fn suggest(message: &str) -> Option<&'static str> {
    let message = message.to_ascii_lowercase();
    let hint = if message.contains("expected ':'") || message.contains("missing ':'") {
        "add ':' between the name and its command"
    } else if message.contains("expected '='") || message.contains("missing '='") {
        "variables are declared as 'var NAME = value'"
    } else if message.contains("missing '}'") {
        "add the matching '}'"
    } else if message.contains("missing ')'") {
        "add the matching ')'"
    } else if message.contains("undefined variable") {
        "declare the variable with 'var NAME = value' before using it"
    } else if message.contains("unknown decorator") || message.contains("invalid decorator") {
        "check the decorator name against the registered decorators"
    } else {
        return None;
    };
    Some(hint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Position, Span, Token, TokenKind};

    fn error_at(line: usize, column: usize, raw: &str, message: &str) -> ParseError {
        let token = Token::new(
            TokenKind::Identifier,
            raw,
            raw,
            Position { line, column },
            Span::default(),
        );
        ParseError::syntax(&token, message)
    }

    #[test]
    fn caret_covers_token() {
        let source = "build echo hi\n";
        let error = error_at(1, 1, "build", "expected ':' after command name 'build'");
        let out = Diagnostics::new(source).with_origin("Devcmdfile").render(&[error]);
        assert_eq!(
            out,
            concat!(
                "Devcmdfile:1:1: syntax error: expected ':' after command name 'build'\n",
                "  |\n",
                "1 | build echo hi\n",
                "  | ^~~~~\n",
                "  = help: add ':' between the name and its command\n",
            )
        );
    }

    #[test]
    fn tabs_are_preserved_before_caret() {
        let source = "x: {\n\t\techo @bad\n}\n";
        let error = error_at(2, 8, "@bad", "unknown decorator '@bad'");
        let out = Diagnostics::new(source).render(&[error]);
        assert!(out.contains("  | \t\t     ^~~~\n"), "{out}");
    }

    #[test]
    fn errors_on_one_line_share_excerpt() {
        let source = "a b c\n";
        let errors = [
            error_at(1, 1, "a", "first"),
            error_at(1, 5, "c", "second"),
        ];
        let out = Diagnostics::new(source).render(&errors);
        assert_eq!(out.matches("1 | a b c").count(), 1);
        assert!(out.contains("  | ^\n"));
        assert!(out.contains("  |     ^\n"));
    }

    #[test]
    fn explicit_hint_and_notes() {
        let source = "build: a\nbuild: b\n";
        let error = error_at(2, 1, "build", "duplicate command 'build'")
            .with_hint("rename one of the commands")
            .with_context("in file scope")
            .with_related(Position { line: 1, column: 1 }, "'build' first defined here");
        let out = Diagnostics::new(source).render(&[error]);
        assert!(out.contains("= help: rename one of the commands"));
        assert!(out.contains("= note: in file scope"));
        assert!(out.contains("= note: 'build' first defined here (line 1, column 1)"));
    }

    #[test]
    fn caret_clamped_to_line() {
        let source = "x: \"open\nstill open\"\n";
        let token = Token::new(
            TokenKind::String,
            "open\nstill open",
            "\"open\nstill open\"",
            Position { line: 1, column: 4 },
            Span::default(),
        );
        let out = Diagnostics::new(source).render(&[ParseError::semantic(&token, "odd")]);
        assert!(out.contains("  |    ^~~~~\n"), "{out}");
    }
}

use std::fmt;

use crate::token::{Position, Token};

/// Broad category of a parse diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed construct: missing colon, `=`, brace or paren, bad name.
    Syntax,
    /// Well-formed but mis-shaped, e.g. a block decorator with no block.
    Semantic,
    /// Name collision within a uniqueness scope.
    Duplicate,
    /// Undefined variable or unknown decorator.
    Reference,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Syntax => "syntax error",
            Self::Semantic => "semantic error",
            Self::Duplicate => "duplicate error",
            Self::Reference => "reference error",
        };
        f.write_str(label)
    }
}

/// Secondary location attached to an error, e.g. the first declaration
/// of a duplicated name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInfo {
    pub position: Position,
    pub message: String,
}

/// A single located diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}: {message}", token.line, token.column)]
pub struct ParseError {
    pub kind: ErrorKind,
    /// Offending token; its position anchors the caret.
    pub token: Token,
    pub message: String,
    /// Enclosing construct, when it helps to locate the error.
    pub context: Option<String>,
    /// Suggested fix.
    pub hint: Option<String>,
    pub related: Vec<RelatedInfo>,
}

impl ParseError {
    #[must_use]
    pub fn new(kind: ErrorKind, token: &Token, message: impl Into<String>) -> Self {
        Self {
            kind,
            token: token.clone(),
            message: message.into(),
            context: None,
            hint: None,
            related: Vec::new(),
        }
    }

    #[must_use]
    pub fn syntax(token: &Token, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, token, message)
    }

    #[must_use]
    pub fn semantic(token: &Token, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Semantic, token, message)
    }

    #[must_use]
    pub fn duplicate(token: &Token, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Duplicate, token, message)
    }

    #[must_use]
    pub fn reference(token: &Token, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Reference, token, message)
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[must_use]
    pub fn with_related(mut self, position: Position, message: impl Into<String>) -> Self {
        self.related.push(RelatedInfo {
            position,
            message: message.into(),
        });
        self
    }

    #[must_use]
    pub const fn position(&self) -> Position {
        self.token.position()
    }
}

/// All diagnostics from one parse, in source order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", summarize(.0))]
pub struct ParseErrors(pub Vec<ParseError>);

impl ParseErrors {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParseError> {
        self.0.iter()
    }
}

fn summarize(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Error accumulator with an optional budget.
///
/// Once the budget is spent further errors are dropped; callers check
/// [`ErrorSink::is_full`] to stop scanning.
#[derive(Debug)]
pub(crate) struct ErrorSink {
    errors: Vec<ParseError>,
    limit: Option<usize>,
    exhausted: bool,
}

impl ErrorSink {
    pub(crate) const fn new(limit: Option<usize>) -> Self {
        Self {
            errors: Vec::new(),
            limit,
            exhausted: false,
        }
    }

    /// Record an error. Returns `false` if it was dropped.
    pub(crate) fn push(&mut self, error: ParseError) -> bool {
        if self.is_full() {
            if !self.exhausted {
                self.exhausted = true;
                tracing::warn!(
                    limit = self.limit.unwrap_or_default(),
                    dropped = %error,
                    "error limit reached, further errors are dropped"
                );
            }
            return false;
        }
        self.errors.push(error);
        true
    }

    pub(crate) fn is_full(&self) -> bool {
        self.limit.is_some_and(|limit| self.errors.len() >= limit)
    }

    pub(crate) fn len(&self) -> usize {
        self.errors.len()
    }

    pub(crate) fn into_vec(self) -> Vec<ParseError> {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn token() -> Token {
        Token::simple(
            TokenKind::Identifier,
            "build",
            Position { line: 3, column: 5 },
            20,
        )
    }

    #[test]
    fn display_includes_location() {
        let err = ParseError::syntax(&token(), "expected ':' after command name 'build'");
        assert_eq!(
            err.to_string(),
            "syntax error at line 3, column 5: expected ':' after command name 'build'"
        );
    }

    #[test]
    fn builder_methods() {
        let err = ParseError::duplicate(&token(), "duplicate command 'build'")
            .with_hint("rename one of them")
            .with_context("in command 'build'")
            .with_related(Position { line: 1, column: 1 }, "first defined here");
        assert_eq!(err.kind, ErrorKind::Duplicate);
        assert_eq!(err.hint.as_deref(), Some("rename one of them"));
        assert_eq!(err.related[0].position.line, 1);
        assert_eq!(err.position(), Position { line: 3, column: 5 });
    }

    #[test]
    fn sink_respects_budget() {
        let mut sink = ErrorSink::new(Some(2));
        assert!(sink.push(ParseError::syntax(&token(), "one")));
        assert!(!sink.is_full());
        assert!(sink.push(ParseError::syntax(&token(), "two")));
        assert!(sink.is_full());
        assert!(!sink.push(ParseError::syntax(&token(), "three")));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.into_vec().len(), 2);
    }

    #[test]
    fn sink_without_limit_never_fills() {
        let mut sink = ErrorSink::new(None);
        for _ in 0..100 {
            sink.push(ParseError::syntax(&token(), "x"));
        }
        assert!(!sink.is_full());
    }

    #[test]
    fn error_list_display() {
        let errors = ParseErrors(vec![
            ParseError::syntax(&token(), "first"),
            ParseError::reference(&token(), "second"),
        ]);
        let text = errors.to_string();
        assert!(text.contains("syntax error at line 3, column 5: first"));
        assert!(text.contains("reference error at line 3, column 5: second"));
        assert_eq!(errors.len(), 2);
    }
}

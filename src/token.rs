use std::fmt;

use serde::Serialize;

/// Byte range in the source text, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Source location for error reporting. Both fields are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Token kinds consumed by the preprocessor and AST builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `var` keyword.
    Var,
    /// `watch` keyword.
    Watch,
    /// `stop` keyword.
    Stop,
    /// Bare word: names, paths, flags, shell words.
    Identifier,
    Colon,
    Equals,
    Semicolon,
    Comma,
    LBrace,
    RBrace,
    LParen,
    RParen,
    At,
    /// Line continuation `\` directly before a line break.
    Backslash,
    /// Quoted string (`"..."`, `'...'` or `` `...` ``).
    String,
    Number,
    Duration,
    /// Comment (`# ...`).
    Comment,
    Newline,
    /// Run of spaces and tabs.
    Whitespace,
    /// End of input.
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Var => "'var'",
            Self::Watch => "'watch'",
            Self::Stop => "'stop'",
            Self::Identifier => "identifier",
            Self::Colon => "':'",
            Self::Equals => "'='",
            Self::Semicolon => "';'",
            Self::Comma => "','",
            Self::LBrace => "'{'",
            Self::RBrace => "'}'",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::At => "'@'",
            Self::Backslash => "'\\'",
            Self::String => "string",
            Self::Number => "number",
            Self::Duration => "duration",
            Self::Comment => "comment",
            Self::Newline => "newline",
            Self::Whitespace => "whitespace",
            Self::Eof => "end of input",
        };
        f.write_str(label)
    }
}

/// A single token with its kind, text, and source location.
///
/// `value` is the semantic text (string contents without quotes);
/// `raw` is exactly what appeared in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub raw: String,
    pub line: usize,
    pub column: usize,
    /// Column just past the last character, on the token's last line.
    pub end_column: usize,
    pub span: Span,
}

impl Token {
    /// Create a token whose `end_column` is derived from `raw`.
    #[must_use]
    pub fn new(
        kind: TokenKind,
        value: impl Into<String>,
        raw: impl Into<String>,
        position: Position,
        span: Span,
    ) -> Self {
        let raw = raw.into();
        let end_column = match raw.rfind('\n') {
            Some(idx) => raw[idx + 1..].chars().count() + 1,
            None => position.column + raw.chars().count(),
        };
        Self {
            kind,
            value: value.into(),
            raw,
            line: position.line,
            column: position.column,
            end_column,
            span,
        }
    }

    /// Token whose value and raw text are the same.
    #[must_use]
    pub fn simple(kind: TokenKind, text: &str, position: Position, offset: usize) -> Self {
        Self::new(
            kind,
            text,
            text,
            position,
            Span::new(offset, offset + text.len()),
        )
    }

    #[must_use]
    pub const fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    /// Line on which the token ends (strings may span lines).
    #[must_use]
    pub fn end_line(&self) -> usize {
        self.line + self.raw.matches('\n').count()
    }

    /// Whitespace and comments: never significant for structure.
    #[must_use]
    pub const fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Comment)
    }

    #[must_use]
    pub const fn is_keyword(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Var | TokenKind::Watch | TokenKind::Stop
        )
    }

    /// Identifiers and keywords; anything that may name a decorator.
    #[must_use]
    pub const fn is_name_like(&self) -> bool {
        matches!(self.kind, TokenKind::Identifier) || self.is_keyword()
    }

    /// Whether `next` starts exactly where this token ends.
    #[must_use]
    pub fn is_adjacent_to(&self, next: &Self) -> bool {
        self.end_line() == next.line && self.end_column == next.column
    }
}

/// Base-10 integer, optionally signed.
#[must_use]
pub fn is_integer_literal(text: &str) -> bool {
    let digits = text
        .strip_prefix('-')
        .or_else(|| text.strip_prefix('+'))
        .unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Unsigned decimal: `digits` or `digits.digits`.
#[must_use]
pub fn is_number_literal(text: &str) -> bool {
    match text.split_once('.') {
        Some((int, frac)) => is_digits(int) && is_digits(frac),
        None => is_digits(text),
    }
}

/// Units accepted on duration literals, longest suffix first.
pub const DURATION_UNITS: [&str; 6] = ["ns", "us", "ms", "s", "m", "h"];

/// `<float><unit>` where unit is one of [`DURATION_UNITS`].
#[must_use]
pub fn is_duration_literal(text: &str) -> bool {
    DURATION_UNITS
        .iter()
        .any(|unit| text.strip_suffix(unit).is_some_and(is_number_literal))
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

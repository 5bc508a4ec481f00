//! Decorator span resolution.
//!
//! Turns an `@name` occurrence into a [`DecoratorSpan`]: parenthesized
//! arguments, an optional trailing block, and the per-argument ranges.

use std::fmt;

use crate::error::ParseError;
use crate::scan::{find_matching, kind_at, next_significant, trim};
use crate::structure::{ArgumentSpan, DecoratorSpan, TokenRange};
use crate::token::{Token, TokenKind};

/// Why an `@name` occurrence could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveErrorKind {
    /// `(` without a matching `)`.
    UnclosedArguments,
    /// `{` without a matching `}`.
    UnclosedBlock,
    /// Empty slot between commas, or a keyword argument without a value.
    EmptyArgument,
}

impl fmt::Display for ResolveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnclosedArguments => f.write_str("unclosed decorator arguments: missing ')'"),
            Self::UnclosedBlock => f.write_str("unclosed block: missing '}'"),
            Self::EmptyArgument => f.write_str("empty decorator argument"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveError {
    pub kind: ResolveErrorKind,
    /// Token the error is anchored on.
    pub token: usize,
}

impl ResolveError {
    /// Convert into a located syntax error against `tokens`.
    #[must_use]
    pub fn to_parse_error(self, tokens: &[Token], name: &str) -> Option<ParseError> {
        let token = tokens.get(self.token)?;
        let error = match self.kind {
            ResolveErrorKind::UnclosedArguments => {
                ParseError::syntax(
                    token,
                    format!("unclosed decorator arguments for '@{name}': missing ')'"),
                )
                .with_hint("add the closing ')' after the last argument")
            }
            ResolveErrorKind::UnclosedBlock => {
                ParseError::syntax(token, format!("unclosed block for '@{name}': missing '}}'"))
                    .with_hint("add the closing '}' after the last statement")
            }
            ResolveErrorKind::EmptyArgument => {
                ParseError::syntax(token, format!("empty argument in '@{name}(...)'"))
                    .with_hint("remove the extra ',' or supply a value")
            }
        };
        Some(error)
    }
}

/// `@` immediately followed by a name-like token.
#[must_use]
pub fn is_decorator_start(tokens: &[Token], at: usize) -> bool {
    match (tokens.get(at), tokens.get(at + 1)) {
        (Some(sign), Some(name)) => {
            sign.kind == TokenKind::At && name.is_name_like() && sign.is_adjacent_to(name)
        }
        _ => false,
    }
}

/// Resolve the decorator starting at `at`.
///
/// Returns `Ok(None)` when `at` does not start a decorator.
///
/// # Errors
///
/// Fails when the argument list or the block is never closed, or an
/// argument slot is empty.
pub fn resolve_decorator(
    tokens: &[Token],
    at: usize,
) -> Result<Option<DecoratorSpan>, ResolveError> {
    if !is_decorator_start(tokens, at) {
        return Ok(None);
    }
    let name = at + 1;
    let mut span = DecoratorSpan {
        at,
        name,
        args: None,
        block: None,
        arguments: Vec::new(),
    };

    // arguments must hug the name: `@name(`
    let mut after = name + 1;
    if kind_at(tokens, after) == Some(TokenKind::LParen) {
        let close = find_matching(tokens, after).ok_or(ResolveError {
            kind: ResolveErrorKind::UnclosedArguments,
            token: after,
        })?;
        let args = TokenRange::new(after, close);
        span.arguments = split_arguments(tokens, args.inner())?;
        span.args = Some(args);
        after = close + 1;
    }

    let open = next_significant(tokens, after);
    if kind_at(tokens, open) == Some(TokenKind::LBrace) {
        let close = find_matching(tokens, open).ok_or(ResolveError {
            kind: ResolveErrorKind::UnclosedBlock,
            token: open,
        })?;
        span.block = Some(TokenRange::new(open, close));
    }

    Ok(Some(span))
}

/// Split the interior of a decorator's parentheses at top-level commas.
///
/// `NAME = value` pieces become keyword arguments.
///
/// # Errors
///
/// Fails on an empty slot (`@f(a,,b)`, `@f(a,)`) or a keyword argument
/// with no value.
pub fn split_arguments(
    tokens: &[Token],
    inner: TokenRange,
) -> Result<Vec<ArgumentSpan>, ResolveError> {
    let mut arguments = Vec::new();
    if trim(tokens, inner).is_empty() {
        return Ok(arguments);
    }

    let mut depth = 0usize;
    let mut start = inner.start;
    for (i, token) in tokens.iter().enumerate().take(inner.end + 1).skip(inner.start) {
        match token.kind {
            TokenKind::LParen | TokenKind::LBrace => depth += 1,
            TokenKind::RParen | TokenKind::RBrace => depth = depth.saturating_sub(1),
            TokenKind::Comma if depth == 0 => {
                arguments.push(argument(tokens, start, i)?);
                start = i + 1;
            }
            _ => {}
        }
    }
    arguments.push(argument(tokens, start, inner.end + 1)?);
    Ok(arguments)
}

fn argument(
    tokens: &[Token],
    start: usize,
    separator: usize,
) -> Result<ArgumentSpan, ResolveError> {
    let empty = ResolveError {
        kind: ResolveErrorKind::EmptyArgument,
        token: separator.min(tokens.len().saturating_sub(1)),
    };
    if separator <= start {
        return Err(empty);
    }
    let piece = trim(tokens, TokenRange::new(start, separator - 1));
    if piece.is_empty() {
        return Err(empty);
    }

    let first = &tokens[piece.start];
    let eq = next_significant(tokens, piece.start + 1);
    if first.is_name_like() && eq <= piece.end && tokens[eq].kind == TokenKind::Equals {
        let value = trim(tokens, TokenRange::new(eq + 1, piece.end));
        if value.is_empty() {
            return Err(ResolveError {
                kind: ResolveErrorKind::EmptyArgument,
                token: eq,
            });
        }
        return Ok(ArgumentSpan {
            name: Some(piece.start),
            value,
        });
    }

    Ok(ArgumentSpan {
        name: None,
        value: piece,
    })
}

//! Function decorators written inside quoted shell strings.
//!
//! The lexer turns `"deploy to @var(HOST)"` into a single string token, so
//! the token-level decorator table never sees the call. This scan walks the
//! raw text instead, using the same rules as the token path: `@` starts a
//! call only at a word boundary, the name must be a registered function
//! decorator, and arguments are split at top-level commas.

use crate::ast::{Argument, Expression, FunctionDecorator, StringLiteral};
use crate::ast_builder::classify_literal;
use crate::lexer::is_word_delimiter;
use crate::registry::{DecoratorKind, DecoratorRegistry};
use crate::scan::is_valid_identifier;
use crate::token::{Position, Span, Token};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineSegment<'t> {
    Text(&'t str),
    Call(FunctionDecorator),
}

/// Whether the raw text of `token` is scanned for inline calls.
///
/// Single-quoted strings are literal.
#[must_use]
pub fn interpolates(token: &Token) -> bool {
    (token.raw.starts_with('"') || token.raw.starts_with('`')) && token.raw.contains('@')
}

/// Split the raw text of `token` into plain text and decorator calls.
#[must_use]
pub fn scan_inline<'t>(
    token: &'t Token,
    registry: &dyn DecoratorRegistry,
) -> Vec<InlineSegment<'t>> {
    let text = token.raw.as_str();
    let mut segments = Vec::new();
    let mut last = 0;
    let mut i = 0;

    while let Some(rel) = text[i..].find('@') {
        let at = i + rel;
        if at_boundary(text, at) {
            if let Some((call, end)) = call_at(token, at, registry) {
                if at > last {
                    segments.push(InlineSegment::Text(&text[last..at]));
                }
                segments.push(InlineSegment::Call(call));
                last = end;
                i = end;
                continue;
            }
        }
        i = at + 1;
    }
    if last < text.len() {
        segments.push(InlineSegment::Text(&text[last..]));
    }
    segments
}

fn at_boundary(text: &str, at: usize) -> bool {
    text[..at].chars().next_back().is_none_or(is_word_delimiter)
}

/// Parse a call at byte `at`; returns it with the byte index just past it.
fn call_at(
    token: &Token,
    at: usize,
    registry: &dyn DecoratorRegistry,
) -> Option<(FunctionDecorator, usize)> {
    let text = token.raw.as_str();
    let name_start = at + 1;
    let name_len = text[name_start..]
        .find(|c: char| is_word_delimiter(c) || c == '@' || c == '\\')
        .unwrap_or(text.len() - name_start);
    let name = &text[name_start..name_start + name_len];
    if !is_valid_identifier(name) || registry.classify(name) != Some(DecoratorKind::Function) {
        return None;
    }

    let mut end = name_start + name_len;
    let mut args = Vec::new();
    if text[end..].starts_with('(') {
        let close = matching_paren(text, end)?;
        args = arguments(token, end + 1, close, registry)?;
        end = close + 1;
    }

    let call = FunctionDecorator {
        name: name.to_string(),
        args,
        pos: position_within(token, at),
        span: Span::new(token.span.start + at, token.span.start + end),
    };
    Some((call, end))
}

/// Byte index of the `)` matching the `(` at `open`, skipping quoted text.
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in text[open..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'' | '`') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Arguments between byte `start` and the closing paren at `close`.
fn arguments(
    token: &Token,
    start: usize,
    close: usize,
    registry: &dyn DecoratorRegistry,
) -> Option<Vec<Argument>> {
    let text = token.raw.as_str();
    if text[start..close].trim().is_empty() {
        return Some(Vec::new());
    }

    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut piece_start = start;
    for (i, c) in text[start..close].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'' | '`') => quote = Some(c),
            (None, '(' | '{') => depth += 1,
            (None, ')' | '}') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                pieces.push((piece_start, start + i));
                piece_start = start + i + 1;
            }
            _ => {}
        }
    }
    pieces.push((piece_start, close));

    pieces
        .into_iter()
        .map(|(from, to)| argument(token, from, to, registry))
        .collect()
}

fn argument(
    token: &Token,
    from: usize,
    to: usize,
    registry: &dyn DecoratorRegistry,
) -> Option<Argument> {
    let text = token.raw.as_str();
    let piece = &text[from..to];
    let lead = piece.len() - piece.trim_start().len();
    let piece = piece.trim();
    if piece.is_empty() {
        return None;
    }
    let offset = from + lead;

    if let Some((name, rest)) = piece.split_once('=') {
        let name = name.trim_end();
        if is_valid_identifier(name) && !name.contains(char::is_whitespace) {
            let value_lead = rest.len() - rest.trim_start().len();
            let value_offset = offset + piece.len() - rest.len() + value_lead;
            let value = rest.trim();
            if value.is_empty() {
                return None;
            }
            return Some(Argument {
                name: Some(name.to_string()),
                value: expression(token, value, value_offset, registry),
            });
        }
    }

    Some(Argument {
        name: None,
        value: expression(token, piece, offset, registry),
    })
}

fn expression(
    token: &Token,
    piece: &str,
    offset: usize,
    registry: &dyn DecoratorRegistry,
) -> Expression {
    if piece.starts_with('@') {
        if let Some((call, end)) = call_at(token, offset, registry) {
            if end == offset + piece.len() {
                return Expression::Decorator(call);
            }
        }
    }
    if let Some(literal) = quoted(piece) {
        return Expression::String(literal);
    }
    if piece.contains(char::is_whitespace) {
        return Expression::String(StringLiteral {
            value: piece.to_string(),
            raw: piece.to_string(),
        });
    }
    classify_literal(piece)
}

fn quoted(piece: &str) -> Option<StringLiteral> {
    let quote = piece.chars().next()?;
    if !matches!(quote, '"' | '\'' | '`') || piece.len() < 2 || !piece.ends_with(quote) {
        return None;
    }
    let inner = &piece[1..piece.len() - 1];
    let value = if quote == '"' {
        unescape(inner)
    } else {
        inner.to_string()
    };
    Some(StringLiteral {
        value,
        raw: piece.to_string(),
    })
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Source position of byte `offset` within the raw text of `token`.
fn position_within(token: &Token, offset: usize) -> Position {
    let prefix = &token.raw[..offset];
    match prefix.rfind('\n') {
        Some(nl) => Position {
            line: token.line + prefix.matches('\n').count(),
            column: prefix[nl + 1..].chars().count() + 1,
        },
        None => Position {
            line: token.line,
            column: token.column + prefix.chars().count(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StandardDecorators;
    use crate::token::TokenKind;

    fn string_token(raw: &str) -> Token {
        Token::new(
            TokenKind::String,
            &raw[1..raw.len() - 1],
            raw,
            Position { line: 2, column: 10 },
            Span::new(100, 100 + raw.len()),
        )
    }

    fn calls(raw: &str) -> Vec<FunctionDecorator> {
        let token = string_token(raw);
        scan_inline(&token, &StandardDecorators)
            .into_iter()
            .filter_map(|s| match s {
                InlineSegment::Call(call) => Some(call),
                InlineSegment::Text(_) => None,
            })
            .collect()
    }

    #[test]
    fn finds_variable_reference() {
        let token = string_token("\"deploy to @var(HOST) now\"");
        let segments = scan_inline(&token, &StandardDecorators);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], InlineSegment::Text("\"deploy to "));
        let InlineSegment::Call(call) = &segments[1] else {
            panic!("expected call, got {:?}", segments[1]);
        };
        assert_eq!(call.name, "var");
        assert_eq!(call.args[0].value, Expression::Identifier("HOST".into()));
        assert_eq!(call.pos, Position { line: 2, column: 21 });
        assert_eq!(call.span, Span::new(111, 121));
        assert_eq!(segments[2], InlineSegment::Text(" now\""));
    }

    #[test]
    fn ignores_mid_word_and_unknown_names() {
        assert!(calls("\"mail user@var(X)\"").is_empty());
        assert!(calls("\"ping @everyone\"").is_empty());
        assert!(calls("\"@timeout(5s)\"").is_empty());
    }

    #[test]
    fn unbalanced_call_stays_text() {
        let token = string_token("\"echo @var(X\"");
        let segments = scan_inline(&token, &StandardDecorators);
        assert_eq!(segments, vec![InlineSegment::Text("\"echo @var(X\"")]);
    }

    #[test]
    fn nested_and_keyword_arguments() {
        let found = calls("`run @sh(cmd = @var(CMD), 30s, \"a, b\")`");
        assert_eq!(found.len(), 1);
        let args = &found[0].args;
        assert_eq!(args.len(), 3);
        assert_eq!(args[0].name.as_deref(), Some("cmd"));
        let Expression::Decorator(inner) = &args[0].value else {
            panic!("expected nested decorator, got {:?}", args[0].value);
        };
        assert_eq!(inner.name, "var");
        assert_eq!(args[1].value, Expression::Duration("30s".into()));
        assert_eq!(
            args[2].value,
            Expression::String(StringLiteral {
                value: "a, b".into(),
                raw: "\"a, b\"".into(),
            })
        );
    }

    #[test]
    fn bare_function_name() {
        let found = calls("\"@env\"");
        assert_eq!(found.len(), 1);
        assert!(found[0].args.is_empty());
    }

    #[test]
    fn multi_line_position() {
        let token = string_token("\"line one\n  @var(X)\"");
        let found: Vec<_> = scan_inline(&token, &StandardDecorators)
            .into_iter()
            .filter_map(|s| match s {
                InlineSegment::Call(call) => Some(call),
                InlineSegment::Text(_) => None,
            })
            .collect();
        assert_eq!(found[0].pos, Position { line: 3, column: 3 });
    }

    #[test]
    fn single_quotes_do_not_interpolate() {
        let token = string_token("'@var(X)'");
        assert!(!interpolates(&token));
        assert!(interpolates(&string_token("\"@var(X)\"")));
    }
}

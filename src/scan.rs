//! Token-range helpers shared by both passes.
//!
//! Strings are single tokens, so delimiter matching here never sees a
//! brace or paren that was written inside quotes.

use crate::structure::TokenRange;
use crate::token::{Token, TokenKind};

pub(crate) fn kind_at(tokens: &[Token], index: usize) -> Option<TokenKind> {
    tokens.get(index).map(|t| t.kind)
}

/// First index at or after `from` that is not whitespace or a comment.
/// Returns `tokens.len()` when there is none.
pub(crate) fn next_significant(tokens: &[Token], from: usize) -> usize {
    let mut i = from;
    while tokens.get(i).is_some_and(Token::is_trivia) {
        i += 1;
    }
    i
}

/// Like [`next_significant`] but also skips line breaks.
pub(crate) fn skip_blank(tokens: &[Token], from: usize) -> usize {
    let mut i = from;
    while tokens
        .get(i)
        .is_some_and(|t| t.is_trivia() || t.kind == TokenKind::Newline)
    {
        i += 1;
    }
    i
}

/// Index of the delimiter closing the one at `open`.
///
/// Only the delimiter pair that `open` starts is counted, so a stray `)`
/// inside braces does not affect brace matching.
pub(crate) fn find_matching(tokens: &[Token], open: usize) -> Option<usize> {
    let close_kind = match kind_at(tokens, open)? {
        TokenKind::LBrace => TokenKind::RBrace,
        TokenKind::LParen => TokenKind::RParen,
        _ => return None,
    };
    let open_kind = tokens[open].kind;
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        if token.kind == open_kind {
            depth += 1;
        } else if token.kind == close_kind {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// `\` followed (after optional spaces) by a line break.
pub(crate) fn is_continuation_backslash(tokens: &[Token], index: usize) -> bool {
    if kind_at(tokens, index) != Some(TokenKind::Backslash) {
        return false;
    }
    let mut i = index + 1;
    while kind_at(tokens, i) == Some(TokenKind::Whitespace) {
        i += 1;
    }
    kind_at(tokens, i) == Some(TokenKind::Newline)
}

/// Newline that ends a `\` continuation rather than a statement.
pub(crate) fn is_line_continuation(tokens: &[Token], newline: usize) -> bool {
    if kind_at(tokens, newline) != Some(TokenKind::Newline) {
        return false;
    }
    let mut i = newline;
    while i > 0 {
        i -= 1;
        match tokens[i].kind {
            TokenKind::Whitespace => {}
            TokenKind::Backslash => return true,
            _ => return false,
        }
    }
    false
}

/// Whether `index` is the first non-whitespace token on its line.
pub(crate) fn at_line_start(tokens: &[Token], index: usize) -> bool {
    let mut i = index;
    while i > 0 {
        i -= 1;
        match tokens[i].kind {
            TokenKind::Whitespace => {}
            TokenKind::Newline => return true,
            _ => return false,
        }
    }
    true
}

/// Index of the line break (or end of input) that ends the line containing
/// `from`, honoring `\` continuations.
pub(crate) fn line_end(tokens: &[Token], from: usize) -> usize {
    let mut i = from;
    while let Some(token) = tokens.get(i) {
        match token.kind {
            TokenKind::Eof => return i,
            TokenKind::Newline if !is_line_continuation(tokens, i) => return i,
            _ => i += 1,
        }
    }
    i
}

/// Narrow `range` by dropping trivia, line breaks, dangling continuations
/// and the end-of-input marker from both ends.
pub(crate) fn trim(tokens: &[Token], range: TokenRange) -> TokenRange {
    let droppable = |i: usize| {
        tokens.get(i).is_none_or(|t| {
            t.is_trivia()
                || matches!(
                    t.kind,
                    TokenKind::Newline | TokenKind::Backslash | TokenKind::Eof
                )
        })
    };
    let mut start = range.start;
    let mut end = range.end;
    while start <= end && droppable(start) {
        start += 1;
    }
    while end >= start && droppable(end) {
        if end == 0 {
            return TokenRange::empty_after(range.end);
        }
        end -= 1;
    }
    if start > end {
        TokenRange::empty_after(range.end)
    } else {
        TokenRange::new(start, end)
    }
}

/// Split a block interior into statements at top-level `;` and line
/// breaks. Separators inside braces or parens do not split; empty
/// statements are dropped.
pub(crate) fn split_statements(tokens: &[Token], range: TokenRange) -> Vec<TokenRange> {
    let mut statements = Vec::new();
    if range.is_empty() {
        return statements;
    }
    let last = range.end.min(tokens.len().saturating_sub(1));
    let mut braces = 0usize;
    let mut parens = 0usize;
    let mut start = range.start;

    for (i, token) in tokens.iter().enumerate().take(last + 1).skip(range.start) {
        match token.kind {
            TokenKind::LBrace => braces += 1,
            TokenKind::RBrace => braces = braces.saturating_sub(1),
            TokenKind::LParen => parens += 1,
            TokenKind::RParen => parens = parens.saturating_sub(1),
            TokenKind::Semicolon | TokenKind::Newline
                if braces == 0 && parens == 0 && !is_line_continuation(tokens, i) =>
            {
                push_statement(tokens, &mut statements, start, i);
                start = i + 1;
            }
            _ => {}
        }
    }
    push_statement(tokens, &mut statements, start, last + 1);
    statements
}

fn push_statement(tokens: &[Token], out: &mut Vec<TokenRange>, start: usize, separator: usize) {
    if separator <= start {
        return;
    }
    let statement = trim(tokens, TokenRange::new(start, separator - 1));
    if !statement.is_empty() {
        out.push(statement);
    }
}

/// `[A-Za-z_][A-Za-z0-9_-]*`
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Recovery point after an error at `pos`: the next line break, or the
/// next keyword that starts a line. Always strictly after `pos`.
pub(crate) fn synchronize(tokens: &[Token], pos: usize) -> usize {
    let mut i = pos + 1;
    while let Some(token) = tokens.get(i) {
        match token.kind {
            TokenKind::Newline | TokenKind::Eof => return i,
            _ if token.is_keyword() && at_line_start(tokens, i) => return i,
            _ => i += 1,
        }
    }
    i
}

/// Recovery point after an unclosed `{` at `open`: the first later line
/// whose first token sits in column 1 and starts a top-level construct.
pub(crate) fn recover_unclosed(tokens: &[Token], open: usize) -> usize {
    let mut i = open + 1;
    while let Some(token) = tokens.get(i) {
        if token.kind == TokenKind::Eof {
            return i;
        }
        if token.kind == TokenKind::Newline {
            let first = next_significant(tokens, i + 1);
            if starts_top_level(tokens, first) {
                return first;
            }
        }
        i += 1;
    }
    i
}

fn starts_top_level(tokens: &[Token], index: usize) -> bool {
    let Some(token) = tokens.get(index) else {
        return false;
    };
    if token.column != 1 {
        return false;
    }
    token.is_keyword()
        || (token.is_name_like()
            && kind_at(tokens, next_significant(tokens, index + 1)) == Some(TokenKind::Colon))
}

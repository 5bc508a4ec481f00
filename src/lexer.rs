use std::fmt;

use crate::token::{
    Position, Span, Token, TokenKind, is_duration_literal, is_number_literal,
};

/// Classifies a lexer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Quoted string never closed; carries the opening quote.
    UnterminatedString { quote: char },
    /// Control character that cannot start any token.
    UnexpectedCharacter(char),
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedString { quote } => {
                write!(f, "unterminated string, expected closing {quote}")
            }
            Self::UnexpectedCharacter(ch) => {
                write!(f, "unexpected character: {}", ch.escape_default())
            }
        }
    }
}

/// Error produced during lexing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", position.line, position.column)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub position: Position,
}

/// Characters that end a word and stand on their own.
///
/// The inline decorator scan over string contents uses the same set so
/// that `@` starts a call in exactly the places the lexer would split.
#[must_use]
pub const fn is_word_delimiter(ch: char) -> bool {
    matches!(
        ch,
        '{' | '}' | '(' | ')' | ':' | '=' | ';' | ',' | '"' | '\'' | '`'
    ) || ch.is_ascii_whitespace()
}

/// Tokenize devcmd source text into a sequence of tokens.
///
/// The sequence always ends with a single [`TokenKind::Eof`] token.
///
/// # Errors
///
/// Returns `LexError` on unterminated strings or stray control
/// characters.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(input).tokenize()
}

struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        let bytes = input.as_bytes();
        let start = if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
            3
        } else {
            0
        };
        Self {
            input: bytes,
            pos: start,
            line: 1,
            col: 1,
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while self.pos < self.input.len() {
            let ch = self.input[self.pos];

            let token = match ch {
                b'\n' => self.read_newline(1),
                b'\r' if self.peek_at(1) == Some(b'\n') => self.read_newline(2),
                b' ' | b'\t' => self.read_whitespace(),
                b'#' => self.read_comment(),
                b'{' => self.read_punct(TokenKind::LBrace),
                b'}' => self.read_punct(TokenKind::RBrace),
                b'(' => self.read_punct(TokenKind::LParen),
                b')' => self.read_punct(TokenKind::RParen),
                b':' => self.read_punct(TokenKind::Colon),
                b'=' => self.read_punct(TokenKind::Equals),
                b';' => self.read_punct(TokenKind::Semicolon),
                b',' => self.read_punct(TokenKind::Comma),
                b'@' => self.read_punct(TokenKind::At),
                b'"' | b'\'' | b'`' => self.read_string(ch)?,
                b'\\' if self.continuation_follows() => self.read_punct(TokenKind::Backslash),
                b'\r' => {
                    // lone carriage return
                    self.advance();
                    continue;
                }
                c if c.is_ascii_control() && c != b'\t' => {
                    return Err(LexError {
                        kind: LexErrorKind::UnexpectedCharacter(char::from(c)),
                        position: self.position(),
                    });
                }
                _ => self.read_word(),
            };
            tokens.push(token);
        }

        tokens.push(Token::new(
            TokenKind::Eof,
            "",
            "",
            self.position(),
            Span::new(self.input.len(), self.input.len()),
        ));
        Ok(tokens)
    }

    const fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.col,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn continuation_follows(&self) -> bool {
        match self.peek_at(1) {
            Some(b'\n') => true,
            Some(b'\r') => self.peek_at(2) == Some(b'\n'),
            _ => false,
        }
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            let byte = self.input[self.pos];
            if byte == b'\n' {
                self.line += 1;
                self.col = 1;
            } else if byte & 0xC0 != 0x80 {
                // count characters, not UTF-8 continuation bytes
                self.col += 1;
            }
            self.pos += 1;
        }
    }

    fn text(&self, start: usize) -> String {
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    fn finish(&self, kind: TokenKind, value: String, start: usize, at: Position) -> Token {
        Token::new(kind, value, self.text(start), at, Span::new(start, self.pos))
    }

    fn read_newline(&mut self, len: usize) -> Token {
        let at = self.position();
        let start = self.pos;
        for _ in 0..len {
            self.advance();
        }
        self.finish(TokenKind::Newline, "\n".to_string(), start, at)
    }

    fn read_whitespace(&mut self) -> Token {
        let at = self.position();
        let start = self.pos;
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.advance();
        }
        let text = self.text(start);
        self.finish(TokenKind::Whitespace, text, start, at)
    }

    fn read_punct(&mut self, kind: TokenKind) -> Token {
        let at = self.position();
        let start = self.pos;
        self.advance();
        let text = self.text(start);
        self.finish(kind, text, start, at)
    }

    fn read_comment(&mut self) -> Token {
        let at = self.position();
        let start = self.pos;

        while let Some(b) = self.peek() {
            if b == b'\n' || (b == b'\r' && self.peek_at(1) == Some(b'\n')) {
                break;
            }
            self.advance();
        }

        let text = self.text(start);
        self.finish(TokenKind::Comment, text, start, at)
    }

    fn read_string(&mut self, quote: u8) -> Result<Token, LexError> {
        let at = self.position();
        let start = self.pos;
        self.advance(); // skip opening quote

        let mut value = Vec::new();
        loop {
            match self.peek() {
                None => {
                    return Err(LexError {
                        kind: LexErrorKind::UnterminatedString {
                            quote: char::from(quote),
                        },
                        position: at,
                    });
                }
                Some(b'\\') if quote == b'"' => {
                    self.advance();
                    match self.peek() {
                        Some(b'n') => value.push(b'\n'),
                        Some(b't') => value.push(b'\t'),
                        Some(b'r') => value.push(b'\r'),
                        Some(b'"') => value.push(b'"'),
                        Some(b'\\') => value.push(b'\\'),
                        Some(c) => {
                            value.push(b'\\');
                            value.push(c);
                        }
                        None => {
                            value.push(b'\\');
                            continue;
                        }
                    }
                    self.advance();
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        let value = String::from_utf8_lossy(&value).into_owned();
        Ok(self.finish(TokenKind::String, value, start, at))
    }

    fn read_word(&mut self) -> Token {
        let at = self.position();
        let start = self.pos;

        while let Some(b) = self.peek() {
            if b < 0x80 && is_word_delimiter(char::from(b)) {
                break;
            }
            if b == b'\\' {
                if self.continuation_follows() {
                    break;
                }
                // escaped character stays part of the word
                self.advance();
                if self.peek().is_some() {
                    self.advance();
                }
                continue;
            }
            if b.is_ascii_control() {
                break;
            }
            self.advance();
        }

        let text = self.text(start);
        let kind = classify_word(&text);
        self.finish(kind, text, start, at)
    }
}

fn classify_word(word: &str) -> TokenKind {
    match word {
        "var" => TokenKind::Var,
        "watch" => TokenKind::Watch,
        "stop" => TokenKind::Stop,
        _ if is_number_literal(word) => TokenKind::Number,
        _ if is_duration_literal(word) => TokenKind::Duration,
        _ => TokenKind::Identifier,
    }
}

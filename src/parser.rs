//! Two-pass parse: structural preprocessing, then AST construction, then
//! optional variable reference validation.

use std::borrow::Cow;

use tracing::debug;

use crate::ast::Program;
use crate::ast_builder::build_with_limit;
use crate::config::ParserConfig;
use crate::error::{ParseError, ParseErrors};
use crate::lexer::{LexError, tokenize};
use crate::preprocess::preprocess;
use crate::registry::{DecoratorRegistry, StandardDecorators};
use crate::token::{Position, Span, Token, TokenKind};
use crate::validate::check_variable_references;

static STANDARD: StandardDecorators = StandardDecorators;

/// Result of one parse: the (possibly partial) program and every error
/// found, sorted by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutput {
    pub program: Program,
    pub errors: Vec<ParseError>,
}

impl ParseOutput {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The program, or every error if there was at least one.
    pub fn into_result(self) -> Result<Program, ParseErrors> {
        if self.errors.is_empty() {
            Ok(self.program)
        } else {
            Err(ParseErrors(self.errors))
        }
    }
}

/// Parser bound to a decorator registry and a configuration.
///
/// Holds no per-input state; one parser can be reused for many inputs.
pub struct Parser<'r> {
    registry: &'r dyn DecoratorRegistry,
    config: ParserConfig,
}

impl Default for Parser<'static> {
    fn default() -> Self {
        Self::new(&STANDARD, ParserConfig::default())
    }
}

impl std::fmt::Debug for Parser<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<'r> Parser<'r> {
    #[must_use]
    pub fn new(registry: &'r dyn DecoratorRegistry, config: ParserConfig) -> Self {
        Self { registry, config }
    }

    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse a token stream. A stream missing its trailing end-of-input
    /// token is treated as ending after its last token.
    #[must_use]
    pub fn parse(&self, tokens: &[Token]) -> ParseOutput {
        let tokens = with_eof(tokens);
        let limit = self.config.error_limit();

        let (map, mut errors) = preprocess(&tokens, &self.config);
        let remaining = limit.map(|l| l.saturating_sub(errors.len()));
        let (program, build_errors) =
            build_with_limit(&tokens, &map, self.registry, &self.config, remaining);
        errors.extend(build_errors);

        if !self.config.allow_undefined_variables {
            let checked = check_variable_references(&program, self.registry);
            let room = limit.map_or(checked.len(), |l| l.saturating_sub(errors.len()));
            errors.extend(checked.into_iter().take(room));
        }

        errors.sort_by_key(ParseError::position);
        debug!(
            variables = program.all_variables().count(),
            commands = program.commands.len(),
            errors = errors.len(),
            "parse finished"
        );
        ParseOutput { program, errors }
    }

    /// Tokenize and parse `input`. Only lexing failures are returned as
    /// `Err`; parse errors are collected in the output.
    pub fn parse_str(&self, input: &str) -> Result<ParseOutput, LexError> {
        let tokens = tokenize(input)?;
        Ok(self.parse(&tokens))
    }
}

/// Parse `tokens` with the standard decorators and default configuration.
pub fn parse(tokens: &[Token]) -> Result<Program, ParseErrors> {
    Parser::default().parse(tokens).into_result()
}

fn with_eof(tokens: &[Token]) -> Cow<'_, [Token]> {
    match tokens.last() {
        Some(last) if last.kind == TokenKind::Eof => Cow::Borrowed(tokens),
        last => {
            let (position, offset) = last.map_or((Position::default(), 0), |t| {
                (
                    Position {
                        line: t.end_line(),
                        column: t.end_column,
                    },
                    t.span.end,
                )
            });
            let mut owned = tokens.to_vec();
            owned.push(Token::new(
                TokenKind::Eof,
                "",
                "",
                position,
                Span::new(offset, offset),
            ));
            Cow::Owned(owned)
        }
    }
}

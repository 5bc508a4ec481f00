//! Parser for the devcmd command-definition language.
//!
//! A devcmd file declares variables and named shell commands, optionally
//! wrapped in `@decorators`. Parsing runs in two passes over a token
//! stream: a structural preprocessor locates every declaration, decorator
//! and block by token index, then an AST builder turns those ranges into a
//! typed [`Program`]. Both passes recover from malformed input and report
//! every independent error in one run.
//!
//! # Quick start
//!
//! ## Parse and re-format a devcmd file
//!
//! ```
//! use devcmd_rs::{format, parse_str};
//!
//! let input = "var PORT = 8080\n\nserve: npm start --port @var(PORT)\n";
//! let program = parse_str(input).unwrap();
//! assert_eq!(program.commands[0].name, "serve");
//! assert_eq!(format(&program), input);
//! ```
//!
//! ## Collect every error
//!
//! ```
//! use devcmd_rs::{Diagnostics, Parser};
//!
//! let source = "build echo hi\ntest: { go test\n";
//! let output = Parser::default().parse_str(source).unwrap();
//! assert_eq!(output.errors.len(), 2);
//! let report = Diagnostics::new(source).with_origin("commands.cli").render(&output.errors);
//! assert!(report.contains("commands.cli:1:7: syntax error"));
//! ```
//!
//! ## Build a program
//!
//! ```
//! use devcmd_rs::{CommandDecl, Decorator, Expression, Program, format};
//!
//! let program = Program::new()
//!     .variable("SRC", "./src")
//!     .command(CommandDecl::new(
//!         "deploy",
//!         Decorator::new("timeout").arg(Expression::duration("30s")).wrap("npm run build"),
//!     ));
//!
//! let output = format(&program);
//! assert!(output.contains("deploy: @timeout(30s) {"));
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod ast;
pub mod ast_builder;
pub mod builder;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod formatter;
pub mod inline;
pub mod lexer;
pub mod parser;
pub mod preprocess;
pub mod registry;
pub mod resolve;
mod scan;
pub mod structure;
pub mod token;
pub mod validate;

pub use ast::{
    Argument, CommandBody, CommandContent, CommandDecl, CommandType, DecoratedContent, Decorator,
    Expression, FunctionDecorator, Pattern, PatternBranch, PatternContent, Program, ShellContent,
    ShellPart, StringLiteral, TextPart, VarGroup, VariableDecl,
};
pub use ast_builder::{build, classify_literal};
pub use config::{ConfigError, ParserConfig};
pub use diagnostics::Diagnostics;
pub use error::{ErrorKind, ParseError, ParseErrors, RelatedInfo};
pub use formatter::format;
pub use lexer::{LexError, LexErrorKind, tokenize};
pub use parser::{ParseOutput, Parser, parse};
pub use preprocess::preprocess;
pub use registry::{DecoratorKind, DecoratorRegistry, DecoratorSet, StandardDecorators};
pub use scan::is_valid_identifier;
pub use structure::{StructureMap, TokenRange};
pub use token::{Position, Span, Token, TokenKind};
pub use validate::check_variable_references;

/// Unified error type covering both lexing and parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A lexer error.
    #[error("{0}")]
    Lex(#[from] LexError),
    /// One or more parse errors.
    #[error("{0}")]
    Parse(#[from] ParseErrors),
}

/// Tokenize and parse a devcmd source string in one step, with the
/// standard decorators and default configuration.
pub fn parse_str(input: &str) -> Result<Program, Error> {
    let tokens = tokenize(input)?;
    Ok(parse(&tokens)?)
}

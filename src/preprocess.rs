//! Pass 1: one forward scan over the token stream that locates every
//! variable, command, decorator and block without building AST nodes.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::ast::CommandType;
use crate::config::ParserConfig;
use crate::error::{ErrorSink, ParseError};
use crate::resolve::{ResolveError, ResolveErrorKind, is_decorator_start, resolve_decorator};
use crate::scan::{
    find_matching, is_line_continuation, is_valid_identifier, kind_at, line_end, next_significant,
    recover_unclosed, skip_blank, split_statements, synchronize, trim,
};
use crate::structure::{
    BlockRange, CommandSpan, StatementSpan, StructureMap, TokenRange, VariableSpan,
};
use crate::token::{Token, TokenKind};

const TOP_LEVEL_HINT: &str =
    "expected a command ('name: ...') or a variable ('var NAME = value')";

const NAME_HINT: &str =
    "names start with a letter or '_' and contain only letters, digits, '_' and '-'";

/// Scan `tokens` into a [`StructureMap`].
///
/// Never fails: malformed constructs are reported and skipped. Duplicate
/// declarations are reported and left out of the map.
#[must_use]
pub fn preprocess(tokens: &[Token], config: &ParserConfig) -> (StructureMap, Vec<ParseError>) {
    let mut pre = Preprocessor::new(tokens, config.error_limit());
    pre.run();
    pre.finish()
}

struct Preprocessor<'a> {
    tokens: &'a [Token],
    pos: usize,
    map: StructureMap,
    decorator_at: HashMap<usize, usize>,
    failed: HashSet<usize>,
    errors: ErrorSink,
}

impl<'a> Preprocessor<'a> {
    fn new(tokens: &'a [Token], limit: Option<usize>) -> Self {
        Self {
            tokens,
            pos: 0,
            map: StructureMap::default(),
            decorator_at: HashMap::new(),
            failed: HashSet::new(),
            errors: ErrorSink::new(limit),
        }
    }

    fn run(&mut self) {
        while !self.errors.is_full() {
            let tokens = self.tokens;
            let pos = skip_blank(tokens, self.pos);
            let Some(token) = tokens.get(pos) else {
                break;
            };
            let next = match token.kind {
                TokenKind::Eof => break,
                TokenKind::Var => self.variable(pos),
                TokenKind::Watch | TokenKind::Stop
                    if kind_at(tokens, next_significant(tokens, pos + 1))
                        == Some(TokenKind::Colon) =>
                {
                    self.plain_command(pos)
                }
                TokenKind::Watch | TokenKind::Stop => self.typed_command(pos),
                TokenKind::Identifier | TokenKind::Number | TokenKind::Duration => {
                    self.plain_command(pos)
                }
                kind => {
                    self.error(
                        ParseError::syntax(token, format!("unexpected {kind} at top level"))
                            .with_hint(TOP_LEVEL_HINT),
                    );
                    synchronize(tokens, pos)
                }
            };
            self.pos = next.max(pos + 1);
        }
    }

    fn finish(mut self) -> (StructureMap, Vec<ParseError>) {
        self.check_duplicate_variables();
        self.check_duplicate_commands();
        debug!(
            variables = self.map.variables.len(),
            commands = self.map.commands.len(),
            decorators = self.map.decorators.len(),
            blocks = self.map.blocks.len(),
            errors = self.errors.len(),
            "preprocessed token stream"
        );
        (self.map, self.errors.into_vec())
    }

    fn error(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    fn token(&self, index: usize) -> &'a Token {
        let tokens = self.tokens;
        tokens.get(index).unwrap_or_else(|| &tokens[tokens.len() - 1])
    }

    // -----------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------

    fn plain_command(&mut self, name: usize) -> usize {
        let colon = next_significant(self.tokens, name + 1);
        if kind_at(self.tokens, colon) == Some(TokenKind::Colon) {
            return self.command(None, name, colon);
        }
        let token = self.token(name);
        self.error(
            ParseError::syntax(
                self.token(colon),
                format!("expected ':' after command name '{}'", token.value),
            )
            .with_hint(format!("write '{}: <command>'", token.value)),
        );
        synchronize(self.tokens, name)
    }

    fn typed_command(&mut self, keyword: usize) -> usize {
        let kw = self.token(keyword);
        let name = next_significant(self.tokens, keyword + 1);
        let candidate = self
            .tokens
            .get(name)
            .is_some_and(|t| {
                t.is_name_like() || matches!(t.kind, TokenKind::Number | TokenKind::Duration)
            });
        if !candidate {
            self.error(
                ParseError::syntax(
                    self.token(name),
                    format!("expected command name after '{}'", kw.value),
                )
                .with_hint(format!("write '{} NAME: <command>'", kw.value)),
            );
            return synchronize(self.tokens, keyword);
        }
        let colon = next_significant(self.tokens, name + 1);
        if kind_at(self.tokens, colon) != Some(TokenKind::Colon) {
            let value = &self.token(name).value;
            self.error(
                ParseError::syntax(
                    self.token(colon),
                    format!("expected ':' after command name '{value}'"),
                )
                .with_hint(format!("write '{} {value}: <command>'", kw.value)),
            );
            return synchronize(self.tokens, name);
        }
        self.command(Some(keyword), name, colon)
    }

    fn command(&mut self, kind_token: Option<usize>, name: usize, colon: usize) -> usize {
        let name_token = self.token(name);
        let valid = is_valid_identifier(&name_token.value);
        if !valid {
            self.error(
                ParseError::syntax(name_token, format!("invalid command name '{}'", name_token.raw))
                    .with_hint(NAME_HINT),
            );
        }

        let start = next_significant(self.tokens, colon + 1);
        let (span, next) = match kind_at(self.tokens, start) {
            None | Some(TokenKind::Newline | TokenKind::Eof) => {
                self.error(
                    ParseError::syntax(
                        self.token(start),
                        format!("missing body for command '{}'", name_token.value),
                    )
                    .with_hint("put the shell command after the ':' or open a '{' block"),
                );
                return start;
            }
            Some(TokenKind::LBrace) => match self.explicit_block(start) {
                Some(result) => result,
                None => return recover_unclosed(self.tokens, start),
            },
            Some(TokenKind::At) if is_decorator_start(self.tokens, start) => {
                match self.decorated_body(start) {
                    Ok(result) => result,
                    Err(resume) => return resume,
                }
            }
            Some(_) => self.simple_body(start, Vec::new()),
        };

        if valid {
            self.map.commands.push(CommandSpan {
                kind_token,
                name,
                colon,
                body: span.0,
                is_block: span.1,
                decorators: span.2,
            });
        }
        next
    }

    /// `{ ... }` body. `None` when the brace is never closed.
    fn explicit_block(&mut self, open: usize) -> Option<(BodySpan, usize)> {
        let Some(close) = find_matching(self.tokens, open) else {
            self.unclosed_block(open);
            return None;
        };
        self.record_block(open, close);
        let next = self.expect_line_end(close + 1);
        Some(((TokenRange::new(open, close), true, Vec::new()), next))
    }

    /// Body starting with a decorator: either a chain ending in a block
    /// (the implicit block) or a simple body with leading decorators.
    /// `Err` carries the index to resume scanning at.
    fn decorated_body(&mut self, first: usize) -> Result<(BodySpan, usize), usize> {
        let mut chain = Vec::new();
        let mut at = first;
        loop {
            let Some(idx) = self.resolve(at) else {
                return Err(self.resume_after(at));
            };
            let span = &self.map.decorators[idx];
            if let Some(block) = span.block {
                trace!(at = first, end = block.end, "implicit block body");
                let next = self.expect_line_end(block.end + 1);
                return Ok(((TokenRange::new(first, block.end), true, Vec::new()), next));
            }
            chain.push(idx);
            let following = next_significant(self.tokens, span.end() + 1);
            if is_decorator_start(self.tokens, following) {
                at = following;
            } else {
                break;
            }
        }
        Ok(self.simple_body(first, chain))
    }

    /// Recovery point after the decorator at `at` failed to resolve. An
    /// unclosed block skips to the next top-level line like `{` does.
    fn resume_after(&self, at: usize) -> usize {
        match resolve_decorator(self.tokens, at) {
            Err(ResolveError {
                kind: ResolveErrorKind::UnclosedBlock,
                token: open,
            }) => {
                trace!(open, "unclosed decorator block, resuming at next top-level line");
                recover_unclosed(self.tokens, open)
            }
            _ => synchronize(self.tokens, at),
        }
    }

    fn simple_body(&mut self, start: usize, decorators: Vec<usize>) -> (BodySpan, usize) {
        let end = line_end(self.tokens, start);
        let body = trim(self.tokens, TokenRange::new(start, end.saturating_sub(1)));
        self.discover(body);
        ((body, false, decorators), end)
    }

    /// After a closing brace only a comment may follow on the same line.
    fn expect_line_end(&mut self, from: usize) -> usize {
        let next = next_significant(self.tokens, from);
        match kind_at(self.tokens, next) {
            None | Some(TokenKind::Newline | TokenKind::Eof) => next,
            Some(kind) => {
                self.error(
                    ParseError::syntax(
                        self.token(next),
                        format!("unexpected {kind} after closing '}}'"),
                    )
                    .with_hint("start the next command on a new line"),
                );
                synchronize(self.tokens, next)
            }
        }
    }

    fn unclosed_block(&mut self, open: usize) {
        trace!(open, "unclosed block, resuming at next top-level line");
        self.error(
            ParseError::syntax(self.token(open), "unclosed block: missing '}'")
                .with_hint("add a closing '}' to end the block"),
        );
    }

    // -----------------------------------------------------------------
    // Variables
    // -----------------------------------------------------------------

    fn variable(&mut self, keyword: usize) -> usize {
        let next = next_significant(self.tokens, keyword + 1);
        match self.tokens.get(next) {
            Some(t) if t.kind == TokenKind::LParen => self.variable_group(next),
            Some(t) if is_name_candidate(t) => {
                let end = self.variable_entry(next, None);
                end.max(next + 1)
            }
            _ => {
                self.error(
                    ParseError::syntax(self.token(next), "expected variable name after 'var'")
                        .with_hint("write 'var NAME = value' or 'var ( NAME = value )'"),
                );
                synchronize(self.tokens, keyword)
            }
        }
    }

    fn variable_group(&mut self, open: usize) -> usize {
        let close = find_matching(self.tokens, open);
        let group_end = close.unwrap_or_else(|| self.tokens.len().saturating_sub(1));
        let group = TokenRange::new(open, group_end);
        if close.is_none() {
            self.error(
                ParseError::syntax(self.token(open), "unclosed variable group: missing ')'")
                    .with_hint("add a closing ')' after the last variable"),
            );
        }

        let mut i = open + 1;
        while !self.errors.is_full() {
            i = self.skip_separators(i);
            if i >= group_end {
                break;
            }
            let token = self.token(i);
            if !is_name_candidate(token) {
                if close.is_none() {
                    break;
                }
                self.error(
                    ParseError::syntax(
                        token,
                        format!("expected variable name in group, found {}", token.kind),
                    )
                    .with_context(self.group_context(open)),
                );
                i = line_end(self.tokens, i).max(i + 1);
                continue;
            }
            if close.is_none()
                && kind_at(self.tokens, next_significant(self.tokens, i + 1))
                    != Some(TokenKind::Equals)
            {
                // unclosed group ends at the first line that is not an entry
                break;
            }
            i = self.variable_entry(i, Some(group)).max(i + 1);
        }

        match close {
            Some(close) => self.expect_group_end(close + 1),
            None => i,
        }
    }

    fn skip_separators(&self, from: usize) -> usize {
        let mut i = skip_blank(self.tokens, from);
        while kind_at(self.tokens, i) == Some(TokenKind::Semicolon) {
            i = skip_blank(self.tokens, i + 1);
        }
        i
    }

    fn expect_group_end(&mut self, from: usize) -> usize {
        let next = next_significant(self.tokens, from);
        match kind_at(self.tokens, next) {
            None | Some(TokenKind::Newline | TokenKind::Eof) => next,
            Some(kind) => {
                self.error(
                    ParseError::syntax(
                        self.token(next),
                        format!("unexpected {kind} after variable group"),
                    )
                    .with_hint("start the next declaration on a new line"),
                );
                synchronize(self.tokens, next)
            }
        }
    }

    fn group_context(&self, open: usize) -> String {
        format!("in variable group opened at {}", self.token(open).position())
    }

    /// Parse `NAME = VALUE` starting at `name`; returns the index of the
    /// token that ended the value.
    fn variable_entry(&mut self, name: usize, group: Option<TokenRange>) -> usize {
        let name_token = self.token(name);
        let context = group.map(|g| self.group_context(g.start));
        let eq = next_significant(self.tokens, name + 1);
        if kind_at(self.tokens, eq) != Some(TokenKind::Equals) {
            let mut error = ParseError::syntax(
                self.token(eq),
                format!("expected '=' after variable name '{}'", name_token.value),
            )
            .with_hint(format!("write '{} = value'", name_token.value));
            if let Some(context) = context {
                error = error.with_context(context);
            }
            self.error(error);
            return synchronize(self.tokens, name);
        }

        let end = self.value_end(eq + 1, group.is_some());
        let value = trim(self.tokens, TokenRange::new(eq + 1, end.saturating_sub(1)));
        let problem = if value.is_empty() {
            Some(
                ParseError::syntax(
                    self.token(eq),
                    format!("missing value for variable '{}'", name_token.value),
                )
                .with_hint(format!("write '{} = value'", name_token.value)),
            )
        } else if !is_valid_identifier(&name_token.value) {
            Some(
                ParseError::syntax(
                    name_token,
                    format!("invalid variable name '{}'", name_token.raw),
                )
                .with_hint(NAME_HINT),
            )
        } else {
            None
        };

        match problem {
            Some(mut error) => {
                if let Some(context) = context {
                    error = error.with_context(context);
                }
                self.error(error);
            }
            None => {
                self.discover(value);
                self.map.variables.push(VariableSpan {
                    name,
                    value,
                    grouped: group.is_some(),
                    group,
                });
            }
        }
        end
    }

    /// Index of the token ending a variable value: a line break, end of
    /// input, or inside a group a top-level `;` or the closing `)`.
    fn value_end(&self, from: usize, grouped: bool) -> usize {
        let mut depth = 0usize;
        let mut i = from;
        while let Some(token) = self.tokens.get(i) {
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Newline if !is_line_continuation(self.tokens, i) => break,
                TokenKind::Semicolon | TokenKind::RParen if grouped && depth == 0 => break,
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth = depth.saturating_sub(1),
                _ => {}
            }
            i += 1;
        }
        i
    }

    // -----------------------------------------------------------------
    // Decorators and blocks
    // -----------------------------------------------------------------

    /// Record every decorator occurring in `range`.
    fn discover(&mut self, range: TokenRange) {
        if range.is_empty() {
            return;
        }
        let end = range.end.min(self.tokens.len().saturating_sub(1));
        for i in range.start..=end {
            if self.errors.is_full() {
                return;
            }
            if is_decorator_start(self.tokens, i) {
                self.resolve(i);
            }
        }
    }

    /// Resolve the decorator at `at` once; later calls return the same
    /// index. Nested decorators in its arguments and block are recorded
    /// too.
    fn resolve(&mut self, at: usize) -> Option<usize> {
        if let Some(&idx) = self.decorator_at.get(&at) {
            return Some(idx);
        }
        if self.failed.contains(&at) {
            return None;
        }
        match resolve_decorator(self.tokens, at) {
            Ok(Some(span)) => {
                let idx = self.map.decorators.len();
                let args = span.args;
                let block = span.block;
                self.map.decorators.push(span);
                self.decorator_at.insert(at, idx);
                if let Some(args) = args {
                    self.discover(args.inner());
                }
                if let Some(block) = block {
                    self.record_block(block.start, block.end);
                }
                Some(idx)
            }
            Ok(None) => None,
            Err(err) => {
                self.failed.insert(at);
                let name = self.token(at + 1).value.clone();
                if let Some(error) = err.to_parse_error(self.tokens, &name) {
                    self.error(error);
                }
                None
            }
        }
    }

    /// Record the block `{ .. }` and its statements, resolving decorators
    /// inside it.
    fn record_block(&mut self, open: usize, close: usize) {
        if self.map.block_at(open).is_some() {
            return;
        }
        let range = TokenRange::new(open, close);
        let slot = self.map.blocks.len();
        self.map.blocks.push(BlockRange {
            open,
            close,
            range,
            statements: Vec::new(),
        });

        let mut statements = Vec::new();
        for statement in split_statements(self.tokens, range.inner()) {
            let decorator = if is_decorator_start(self.tokens, statement.start) {
                self.resolve(statement.start)
            } else {
                None
            };
            self.discover(statement);
            statements.push(StatementSpan {
                range: statement,
                decorator,
            });
        }
        self.map.blocks[slot].statements = statements;
    }

    // -----------------------------------------------------------------
    // Duplicate validation
    // -----------------------------------------------------------------

    fn check_duplicate_variables(&mut self) {
        let tokens = self.tokens;
        let mut first: HashMap<&str, usize> = HashMap::new();
        let mut kept = Vec::with_capacity(self.map.variables.len());
        for var in std::mem::take(&mut self.map.variables) {
            let token = &tokens[var.name];
            if let Some(&earlier) = first.get(token.value.as_str()) {
                let earlier = &tokens[earlier];
                self.errors.push(
                    ParseError::duplicate(token, format!("duplicate variable '{}'", token.value))
                        .with_related(
                            earlier.position(),
                            format!("'{}' first declared here", earlier.value),
                        )
                        .with_hint("variable names must be unique across the file"),
                );
                continue;
            }
            first.insert(token.value.as_str(), var.name);
            kept.push(var);
        }
        self.map.variables = kept;
    }

    fn check_duplicate_commands(&mut self) {
        let tokens = self.tokens;
        let mut first: HashMap<(&str, CommandType), usize> = HashMap::new();
        let mut kept = Vec::with_capacity(self.map.commands.len());
        for cmd in std::mem::take(&mut self.map.commands) {
            let kind = command_type(tokens, cmd.kind_token);
            let token = &tokens[cmd.name];
            let key = (token.value.as_str(), kind);
            if let Some(&earlier) = first.get(&key) {
                let earlier = &tokens[earlier];
                let label = match kind {
                    CommandType::Plain => "command".to_string(),
                    other => format!("{} command", other.keyword()),
                };
                self.errors.push(
                    ParseError::duplicate(token, format!("duplicate {label} '{}'", token.value))
                        .with_related(
                            earlier.position(),
                            format!("'{}' first defined here", earlier.value),
                        )
                        .with_hint("rename one of the commands"),
                );
                continue;
            }
            first.insert(key, cmd.name);
            kept.push(cmd);
        }
        self.map.commands = kept;
    }
}

/// Body range, is-block flag and leading decorator indices.
type BodySpan = (TokenRange, bool, Vec<usize>);

fn is_name_candidate(token: &Token) -> bool {
    token.is_name_like() || matches!(token.kind, TokenKind::Number | TokenKind::Duration)
}

/// Command type from the optional `watch`/`stop` keyword token.
pub(crate) fn command_type(tokens: &[Token], kind_token: Option<usize>) -> CommandType {
    match kind_token.and_then(|i| tokens.get(i)).map(|t| t.kind) {
        Some(TokenKind::Watch) => CommandType::Watch,
        Some(TokenKind::Stop) => CommandType::Stop,
        _ => CommandType::Plain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::lexer::tokenize;

    fn run(input: &str) -> (Vec<Token>, StructureMap, Vec<ParseError>) {
        let tokens = tokenize(input).expect("should tokenize");
        let (map, errors) = preprocess(&tokens, &ParserConfig::unlimited());
        (tokens, map, errors)
    }

    fn text(tokens: &[Token], range: TokenRange) -> String {
        tokens[range.start..=range.end]
            .iter()
            .map(|t| t.raw.as_str())
            .collect()
    }

    #[test]
    fn simple_command() {
        let (tokens, map, errors) = run("build: echo hello\n");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(map.commands.len(), 1);
        let cmd = &map.commands[0];
        assert_eq!(tokens[cmd.name].value, "build");
        assert!(!cmd.is_block);
        assert_eq!(text(&tokens, cmd.body), "echo hello");
    }

    #[test]
    fn explicit_block_records_statements() {
        let (tokens, map, errors) = run("test: {\n  cargo fmt\n  cargo test; cargo doc\n}\n");
        assert!(errors.is_empty(), "{errors:?}");
        let cmd = &map.commands[0];
        assert!(cmd.is_block);
        assert_eq!(tokens[cmd.body.start].kind, TokenKind::LBrace);
        let block = map.block_at(cmd.body.start).expect("block recorded");
        let statements: Vec<_> = block
            .statements
            .iter()
            .map(|s| text(&tokens, s.range))
            .collect();
        assert_eq!(statements, vec!["cargo fmt", "cargo test", "cargo doc"]);
    }

    #[test]
    fn implicit_block_has_no_leading_decorators() {
        let (tokens, map, errors) = run("deploy: @timeout(30s) { npm run build }");
        assert!(errors.is_empty(), "{errors:?}");
        let cmd = &map.commands[0];
        assert!(cmd.is_block);
        assert!(cmd.decorators.is_empty());
        assert_eq!(tokens[cmd.body.start].kind, TokenKind::At);
        assert_eq!(tokens[cmd.body.end].kind, TokenKind::RBrace);
        assert_eq!(map.decorators.len(), 1);
        assert_eq!(map.blocks.len(), 1);
    }

    #[test]
    fn chained_decorators_fold_into_implicit_block() {
        let (_, map, errors) = run("ci: @retry(3) @timeout(1m) {\n  make\n}\n");
        assert!(errors.is_empty(), "{errors:?}");
        let cmd = &map.commands[0];
        assert!(cmd.is_block);
        assert!(cmd.decorators.is_empty());
        assert_eq!(map.decorators.len(), 2);
    }

    #[test]
    fn leading_function_decorator_on_simple_body() {
        let (tokens, map, errors) = run("sh: @sh(\"make all\") --quiet\n");
        assert!(errors.is_empty(), "{errors:?}");
        let cmd = &map.commands[0];
        assert!(!cmd.is_block);
        assert_eq!(cmd.decorators.len(), 1);
        let deco = &map.decorators[cmd.decorators[0]];
        assert_eq!(tokens[deco.name].value, "sh");
    }

    #[test]
    fn nested_decorators_recorded_once() {
        let (tokens, map, errors) =
            run("build: @cwd(@var(DIR)) {\n  echo @var(DIR)\n}\nother: echo @var(DIR)\n");
        assert!(errors.is_empty(), "{errors:?}");
        let names: Vec<_> = map
            .decorators
            .iter()
            .map(|d| tokens[d.name].value.as_str())
            .collect();
        assert_eq!(names, vec!["cwd", "var", "var", "var"]);
        let mut ats: Vec<_> = map.decorators.iter().map(|d| d.at).collect();
        ats.sort_unstable();
        ats.dedup();
        assert_eq!(ats.len(), 4);
    }

    #[test]
    fn variables_and_groups() {
        let (tokens, map, errors) =
            run("var SRC = ./src\nvar (\n  A = 1\n  B = hello world; C = 3\n)\n");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(map.variables.len(), 4);
        assert!(!map.variables[0].grouped);
        assert_eq!(text(&tokens, map.variables[0].value), "./src");
        assert!(map.variables[1..].iter().all(|v| v.grouped && v.group.is_some()));
        assert_eq!(text(&tokens, map.variables[2].value), "hello world");
        assert_eq!(tokens[map.variables[3].name].value, "C");
    }

    #[test]
    fn single_line_group() {
        let (tokens, map, errors) = run("var ( A = 1; B = 2 )\nb: x\n");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(map.variables.len(), 2);
        assert_eq!(text(&tokens, map.variables[1].value), "2");
        assert_eq!(map.commands.len(), 1);
    }

    #[test]
    fn missing_colon_recovers() {
        let (_, map, errors) = run("build echo hi\ntest: cargo test\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Syntax);
        assert!(errors[0].message.contains("expected ':'"));
        assert_eq!(map.commands.len(), 1);
    }

    #[test]
    fn variable_errors_are_localized() {
        let (_, map, errors) = run("var\nvar X 1\nvar Y =\nvar 9Z = 3\nvar OK = 1\n");
        let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "expected variable name after 'var'",
                "expected '=' after variable name 'X'",
                "missing value for variable 'Y'",
                "invalid variable name '9Z'",
            ]
        );
        assert_eq!(map.variables.len(), 1);
    }

    #[test]
    fn unclosed_block_then_next_command() {
        let (tokens, map, errors) = run("test: { echo hello\nnext: echo ok\n");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("unclosed block"));
        assert_eq!(errors[0].token.kind, TokenKind::LBrace);
        assert_eq!(map.commands.len(), 1);
        assert_eq!(tokens[map.commands[0].name].value, "next");
    }

    #[test]
    fn unclosed_decorator_block_then_next_command() {
        let (tokens, map, errors) =
            run("build: @timeout(5s) {\n  npm run build\n  npm test\nnext: echo ok\n");
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(errors[0].message.contains("unclosed block"));
        assert_eq!(map.commands.len(), 1);
        assert_eq!(tokens[map.commands[0].name].value, "next");
    }

    #[test]
    fn duplicates_dropped_with_related() {
        let (_, map, errors) =
            run("build: a\nbuild: b\nwatch s: x\nstop s: y\nvar V = 1\nvar V = 2\n");
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.kind == ErrorKind::Duplicate));
        let cmd_err = errors
            .iter()
            .find(|e| e.message.contains("command"))
            .expect("command duplicate");
        assert_eq!(cmd_err.token.line, 2);
        assert_eq!(cmd_err.related[0].position.line, 1);
        assert_eq!(map.commands.len(), 3);
        assert_eq!(map.variables.len(), 1);
    }

    #[test]
    fn budget_stops_scan() {
        let tokens = tokenize("a\nb\nc\nd\ne\n").expect("should tokenize");
        let config = ParserConfig::default().max_errors(2);
        let (_, errors) = preprocess(&tokens, &config);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn stray_brace_at_top_level() {
        let (_, map, errors) = run("}\nok: yes\n");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("unexpected '}'"));
        assert_eq!(map.commands.len(), 1);
    }

    #[test]
    fn unclosed_decorator_arguments() {
        let (_, map, errors) = run("build: @timeout(30s { make }\nok: yes\n");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("missing ')'"));
        assert_eq!(map.commands.len(), 1);
    }

    #[test]
    fn keyword_as_plain_command_name() {
        let (tokens, map, errors) = run("watch: cargo watch
stop server: pkill x
");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(map.commands.len(), 2);
        assert_eq!(map.commands[0].kind_token, None);
        assert_eq!(tokens[map.commands[0].name].value, "watch");
        assert!(map.commands[1].kind_token.is_some());
    }
}

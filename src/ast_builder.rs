//! Pass 2: materialize a [`Program`] from the token stream and the
//! structure map.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::ast::{
    Argument, CommandBody, CommandContent, CommandDecl, DecoratedContent, Decorator, Expression,
    FunctionDecorator, Pattern, PatternBranch, PatternContent, Program, ShellContent, ShellPart,
    StringLiteral, TextPart, VarGroup, VariableDecl,
};
use crate::config::ParserConfig;
use crate::error::{ErrorSink, ParseError};
use crate::inline::{InlineSegment, interpolates, scan_inline};
use crate::preprocess::command_type;
use crate::registry::{DecoratorKind, DecoratorRegistry};
use crate::resolve::{is_decorator_start, resolve_decorator};
use crate::scan::{
    find_matching, is_continuation_backslash, is_valid_identifier, kind_at, next_significant,
    split_statements, trim,
};
use crate::structure::{CommandSpan, DecoratorSpan, StructureMap, TokenRange};
use crate::token::{
    Position, Span, Token, TokenKind, is_duration_literal, is_integer_literal, is_number_literal,
};

/// Classify a bare word: integers and decimals are numbers, `<n><unit>`
/// is a duration, anything else stays an identifier.
#[must_use]
pub fn classify_literal(text: &str) -> Expression {
    if is_integer_literal(text) || is_number_literal(text) {
        Expression::Number(text.to_string())
    } else if is_duration_literal(text) {
        Expression::Duration(text.to_string())
    } else {
        Expression::Identifier(text.to_string())
    }
}

/// Build a [`Program`] from `tokens` and the map the preprocessor
/// produced for them. Neither input is modified.
#[must_use]
pub fn build(
    tokens: &[Token],
    map: &StructureMap,
    registry: &dyn DecoratorRegistry,
    config: &ParserConfig,
) -> (Program, Vec<ParseError>) {
    build_with_limit(tokens, map, registry, config, config.error_limit())
}

pub(crate) fn build_with_limit(
    tokens: &[Token],
    map: &StructureMap,
    registry: &dyn DecoratorRegistry,
    config: &ParserConfig,
    limit: Option<usize>,
) -> (Program, Vec<ParseError>) {
    let mut builder = AstBuilder {
        tokens,
        map,
        registry,
        strict: config.strict_mode,
        decorator_at: map.decorator_index(),
        discovered: HashMap::new(),
        errors: ErrorSink::new(limit),
    };
    let program = builder.program();
    debug!(
        variables = program.variables.len(),
        groups = program.var_groups.len(),
        commands = program.commands.len(),
        errors = builder.errors.len(),
        "built program"
    );
    (program, builder.errors.into_vec())
}

struct AstBuilder<'a> {
    tokens: &'a [Token],
    map: &'a StructureMap,
    registry: &'a dyn DecoratorRegistry,
    strict: bool,
    decorator_at: HashMap<usize, usize>,
    /// Spans resolved during the build for `@` tokens the map lacks.
    discovered: HashMap<usize, DecoratorSpan>,
    errors: ErrorSink,
}

impl AstBuilder<'_> {
    fn program(&mut self) -> Program {
        let mut program = Program::default();
        let tokens = self.tokens;
        let map = self.map;

        let mut current_group: Option<TokenRange> = None;
        for var in &map.variables {
            let Some(name) = tokens.get(var.name) else {
                continue;
            };
            let decl = VariableDecl {
                name: name.value.clone(),
                value: self.expression(var.value),
                pos: name.position(),
                span: name.span.merge(self.span_of(var.value)),
            };
            match var.group {
                Some(group) => {
                    if current_group != Some(group) {
                        current_group = Some(group);
                        program.var_groups.push(VarGroup {
                            variables: Vec::new(),
                            pos: tokens[group.start].position(),
                            span: self.span_of(group),
                        });
                    }
                    if let Some(last) = program.var_groups.last_mut() {
                        last.variables.push(decl);
                    }
                }
                None => {
                    current_group = None;
                    program.variables.push(decl);
                }
            }
        }

        for cmd in &map.commands {
            if let Some(decl) = self.command(cmd) {
                program.commands.push(decl);
            }
        }
        program
    }

    fn command(&mut self, cmd: &CommandSpan) -> Option<CommandDecl> {
        let tokens = self.tokens;
        let name = tokens.get(cmd.name)?;
        let first = cmd.kind_token.unwrap_or(cmd.name);
        let body = if !cmd.is_block {
            self.simple_body(cmd.body)
        } else if kind_at(tokens, cmd.body.start) == Some(TokenKind::LBrace) {
            self.explicit_block_body(cmd.body)
        } else {
            self.implicit_block_body(cmd.body)
        };
        trace!(name = %name.value, is_block = body.is_block, "built command");
        Some(CommandDecl {
            name: name.value.clone(),
            kind: command_type(tokens, cmd.kind_token),
            body,
            pos: tokens[first].position(),
            span: tokens[first].span.merge(self.span_of(cmd.body)),
        })
    }

    fn explicit_block_body(&mut self, range: TokenRange) -> CommandBody {
        CommandBody {
            is_block: true,
            content: self.block_content(range.inner()),
        }
    }

    /// `@deco(args) { ... }` directly after the colon: the decorator chain
    /// is the single statement of an implied block.
    fn implicit_block_body(&mut self, range: TokenRange) -> CommandBody {
        CommandBody {
            is_block: true,
            content: self.statement_content(range),
        }
    }

    fn simple_body(&mut self, range: TokenRange) -> CommandBody {
        CommandBody {
            is_block: false,
            content: self.statement_content(range),
        }
    }

    // -----------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------

    fn block_content(&mut self, inner: TokenRange) -> CommandContent {
        let statements = split_statements(self.tokens, inner);
        let mut items: Vec<_> = statements
            .into_iter()
            .map(|statement| self.statement_content(statement))
            .collect();
        if items.len() > 1 {
            return CommandContent::Sequence { items };
        }
        items
            .pop()
            .unwrap_or_else(|| CommandContent::Shell(ShellContent::default()))
    }

    fn statement_content(&mut self, range: TokenRange) -> CommandContent {
        let range = trim(self.tokens, range);
        if range.is_empty() {
            return CommandContent::Shell(ShellContent::default());
        }
        if matches!(
            self.decorator_kind(range.start),
            Some(DecoratorKind::Block | DecoratorKind::Pattern)
        ) {
            return self.decorated_content(range);
        }
        CommandContent::Shell(self.shell_content(range))
    }

    /// Kind of the decorator starting at `at`, if one does and its name is
    /// registered.
    fn decorator_kind(&mut self, at: usize) -> Option<DecoratorKind> {
        let span = self.lookup(at)?;
        self.registry.classify(&self.tokens[span.name].value)
    }

    /// Leading chain of block decorators, optionally ending in a pattern
    /// decorator, followed by the content they wrap.
    fn decorated_content(&mut self, range: TokenRange) -> CommandContent {
        let tokens = self.tokens;
        let mut decorators = Vec::new();
        let mut at = range.start;

        let (content, after) = loop {
            let Some(span) = self.lookup(at) else {
                break (self.shell(TokenRange::new(at, range.end)), range.end + 1);
            };
            let name = tokens[span.name].value.clone();
            match self.registry.classify(&name) {
                Some(DecoratorKind::Pattern) => {
                    // without a block the rest of the statement is not trailing junk
                    let after = span.block.map_or(range.end + 1, |block| block.end + 1);
                    let content = CommandContent::Pattern(self.pattern_content(&span));
                    break (content, after);
                }
                Some(DecoratorKind::Block) => {
                    decorators.push(self.decorator(&span));
                    if let Some(block) = span.block {
                        break (self.block_content(block.inner()), block.end + 1);
                    }
                    let next = next_significant(tokens, span.end() + 1);
                    if next <= range.end
                        && matches!(
                            self.decorator_kind(next),
                            Some(DecoratorKind::Block | DecoratorKind::Pattern)
                        )
                    {
                        at = next;
                        continue;
                    }
                    self.errors.push(
                        ParseError::semantic(
                            &tokens[span.at],
                            format!("decorator '@{name}' requires a block"),
                        )
                        .with_hint(format!("wrap the commands in braces: @{name}(...) {{ ... }}")),
                    );
                    break (self.shell(TokenRange::new(next, range.end)), range.end + 1);
                }
                _ => break (self.shell(TokenRange::new(at, range.end)), range.end + 1),
            }
        };

        let trailing = trim(tokens, TokenRange::new(after, range.end));
        if !trailing.is_empty() {
            let token = &tokens[trailing.start];
            self.errors.push(
                ParseError::syntax(
                    token,
                    format!("unexpected {} after decorator block", token.kind),
                )
                .with_hint("put the next statement on its own line"),
            );
        }

        if decorators.is_empty() {
            content
        } else {
            CommandContent::Decorated(DecoratedContent {
                decorators,
                content: Box::new(content),
            })
        }
    }

    fn shell(&mut self, range: TokenRange) -> CommandContent {
        CommandContent::Shell(self.shell_content(range))
    }

    fn pattern_content(&mut self, span: &DecoratorSpan) -> PatternContent {
        let decorator = self.decorator(span);
        let Some(block) = span.block else {
            self.errors.push(
                ParseError::semantic(
                    &self.tokens[span.at],
                    format!("pattern decorator '@{}' requires a block of branches", decorator.name),
                )
                .with_hint(format!("write @{}(...) {{ pattern: command }}", decorator.name)),
            );
            return PatternContent {
                decorator,
                branches: Vec::new(),
            };
        };

        let branches = split_statements(self.tokens, block.inner())
            .into_iter()
            .filter_map(|statement| self.pattern_branch(statement))
            .collect();
        PatternContent {
            decorator,
            branches,
        }
    }

    fn pattern_branch(&mut self, statement: TokenRange) -> Option<PatternBranch> {
        let tokens = self.tokens;
        let token = &tokens[statement.start];
        let pattern = if token.kind == TokenKind::Identifier && token.value == "*" {
            Pattern::Wildcard
        } else if token.is_name_like() && is_valid_identifier(&token.value) {
            Pattern::Identifier(token.value.clone())
        } else {
            self.errors.push(
                ParseError::syntax(token, format!("invalid pattern '{}'", token.raw))
                    .with_hint("patterns are identifiers or the wildcard '*'"),
            );
            return None;
        };

        let colon = next_significant(tokens, statement.start + 1);
        if colon > statement.end || kind_at(tokens, colon) != Some(TokenKind::Colon) {
            let found = tokens.get(colon.min(statement.end + 1)).unwrap_or(token);
            self.errors.push(
                ParseError::syntax(found, format!("expected ':' after pattern '{}'", token.raw))
                    .with_hint(format!("write '{}: <command>'", token.raw)),
            );
            return None;
        }

        let body = trim(tokens, TokenRange::new(colon + 1, statement.end));
        let content = if kind_at(tokens, body.start) == Some(TokenKind::LBrace)
            && find_matching(tokens, body.start) == Some(body.end)
        {
            self.block_content(body.inner())
        } else {
            self.statement_content(body)
        };
        Some(PatternBranch { pattern, content })
    }

    // -----------------------------------------------------------------
    // Shell text
    // -----------------------------------------------------------------

    /// Walk `range` once, turning resolved function decorators into
    /// decorator parts and everything else into text with the original
    /// spacing.
    fn shell_content(&mut self, range: TokenRange) -> ShellContent {
        let tokens = self.tokens;
        let mut parts = Vec::new();
        let mut text = String::new();
        let mut spacing = Spacing::default();
        let last = range.end.min(tokens.len().saturating_sub(1));

        let mut i = range.start;
        while i <= last {
            let token = &tokens[i];
            match token.kind {
                TokenKind::Whitespace => {
                    spacing.whitespace = Some(i);
                    i += 1;
                    continue;
                }
                TokenKind::Comment => {
                    i += 1;
                    continue;
                }
                TokenKind::Newline => {
                    spacing.wrapped = true;
                    i += 1;
                    continue;
                }
                TokenKind::Backslash if is_continuation_backslash(tokens, i) => {
                    spacing.wrapped = true;
                    i += 1;
                    continue;
                }
                TokenKind::Eof => break,
                _ => {}
            }

            if token.kind == TokenKind::At {
                if let Some((call, end)) = self.inline_call(i, last) {
                    text.push_str(&spacing.before(tokens, i));
                    flush_text(&mut parts, &mut text);
                    parts.push(ShellPart::Decorator(call));
                    spacing.prev = Some(end);
                    i = end + 1;
                    continue;
                }
            }

            text.push_str(&spacing.before(tokens, i));
            if token.kind == TokenKind::String && interpolates(token) {
                for segment in scan_inline(token, self.registry) {
                    match segment {
                        InlineSegment::Text(s) => text.push_str(s),
                        InlineSegment::Call(call) => {
                            flush_text(&mut parts, &mut text);
                            parts.push(ShellPart::Decorator(call));
                        }
                    }
                }
            } else {
                text.push_str(&token.raw);
            }
            spacing.prev = Some(i);
            i += 1;
        }

        flush_text(&mut parts, &mut text);
        ShellContent { parts }
    }

    /// Function decorator starting at `at` and ending no later than
    /// `limit`, with the index of its last token.
    fn inline_call(&mut self, at: usize, limit: usize) -> Option<(FunctionDecorator, usize)> {
        let span = self.lookup(at)?;
        if span.end() > limit {
            return None;
        }
        let tokens = self.tokens;
        let name = &tokens[span.name].value;
        match self.registry.classify(name) {
            Some(DecoratorKind::Function) => {
                let call = self.function_decorator(&span);
                if span.block.is_some() {
                    self.block_on_function(&span);
                    // the block stays in the statement as shell text
                    return Some((call, head_end(&span)));
                }
                Some((call, span.end()))
            }
            Some(kind) => {
                self.errors.push(
                    ParseError::semantic(
                        &tokens[at],
                        format!(
                            "{} decorator '@{name}' cannot be used inline in shell text",
                            kind_label(kind)
                        ),
                    )
                    .with_hint("block and pattern decorators must start a statement"),
                );
                None
            }
            None => {
                self.unknown_decorator(at, name);
                None
            }
        }
    }

    fn block_on_function(&mut self, span: &DecoratorSpan) {
        let tokens = self.tokens;
        let name = &tokens[span.name].value;
        self.errors.push(
            ParseError::semantic(
                &tokens[span.at],
                format!("function decorator '@{name}' cannot own a block"),
            )
            .with_hint("put the block on its own line or use a block decorator"),
        );
    }

    fn unknown_decorator(&mut self, at: usize, name: &str) {
        trace!(at, name, "unknown decorator kept as text");
        if self.strict {
            self.errors.push(
                ParseError::reference(&self.tokens[at], format!("unknown decorator '@{name}'"))
                    .with_hint("check the decorator name or register it"),
            );
        }
    }

    // -----------------------------------------------------------------
    // Decorators and expressions
    // -----------------------------------------------------------------

    /// Span of the decorator at `at`: from the map when it was recorded,
    /// otherwise resolved on the spot.
    fn lookup(&mut self, at: usize) -> Option<DecoratorSpan> {
        if !is_decorator_start(self.tokens, at) {
            return None;
        }
        if let Some(span) = self
            .decorator_at
            .get(&at)
            .and_then(|&idx| self.map.decorators.get(idx))
        {
            return Some(span.clone());
        }
        if let Some(span) = self.discovered.get(&at) {
            return Some(span.clone());
        }
        // resolution failures were reported by the preprocessor
        let span = resolve_decorator(self.tokens, at).ok().flatten()?;
        trace!(at, "resolved decorator missing from structure map");
        self.discovered.insert(at, span.clone());
        Some(span)
    }

    fn arguments(&mut self, span: &DecoratorSpan) -> Vec<Argument> {
        span.arguments
            .iter()
            .map(|arg| Argument {
                name: arg
                    .name
                    .and_then(|i| self.tokens.get(i))
                    .map(|t| t.value.clone()),
                value: self.expression(arg.value),
            })
            .collect()
    }

    fn decorator(&mut self, span: &DecoratorSpan) -> Decorator {
        let (name, pos, source) = self.decorator_head(span);
        Decorator {
            name,
            args: self.arguments(span),
            pos,
            span: source,
        }
    }

    fn function_decorator(&mut self, span: &DecoratorSpan) -> FunctionDecorator {
        let (name, pos, source) = self.decorator_head(span);
        FunctionDecorator {
            name,
            args: self.arguments(span),
            pos,
            span: source,
        }
    }

    /// Name, position and source span up to the closing paren; a trailing
    /// block belongs to the enclosing content.
    fn decorator_head(&self, span: &DecoratorSpan) -> (String, Position, Span) {
        let at = &self.tokens[span.at];
        let last = head_end(span);
        (
            self.tokens[span.name].value.clone(),
            at.position(),
            at.span.merge(self.tokens[last].span),
        )
    }

    fn expression(&mut self, range: TokenRange) -> Expression {
        let tokens = self.tokens;
        let range = trim(tokens, range);
        if range.is_empty() {
            return Expression::String(StringLiteral::default());
        }
        if range.start == range.end {
            return literal(&tokens[range.start]);
        }

        if let Some(span) = self.lookup(range.start) {
            if span.end() == range.end {
                let name = tokens[span.name].value.clone();
                match self.registry.classify(&name) {
                    Some(DecoratorKind::Function) if span.block.is_some() => {
                        self.block_on_function(&span);
                    }
                    Some(DecoratorKind::Function) => {
                        return Expression::Decorator(self.function_decorator(&span));
                    }
                    Some(kind) => {
                        self.errors.push(
                            ParseError::semantic(
                                &tokens[span.at],
                                format!(
                                    "{} decorator '@{name}' cannot be used as a value",
                                    kind_label(kind)
                                ),
                            )
                            .with_hint("only function decorators such as @var(...) produce values"),
                        );
                    }
                    None => self.unknown_decorator(span.at, &name),
                }
            }
        }

        let text = self.raw_text(range);
        if text.contains(char::is_whitespace) {
            Expression::String(StringLiteral {
                value: text.clone(),
                raw: text,
            })
        } else {
            Expression::Identifier(text)
        }
    }

    /// Source text of `range` with comments dropped and spacing
    /// reconstructed.
    fn raw_text(&self, range: TokenRange) -> String {
        let tokens = self.tokens;
        let mut out = String::new();
        let mut spacing = Spacing::default();
        let last = range.end.min(tokens.len().saturating_sub(1));
        for (i, token) in tokens.iter().enumerate().take(last + 1).skip(range.start) {
            match token.kind {
                TokenKind::Whitespace => spacing.whitespace = Some(i),
                TokenKind::Newline => spacing.wrapped = true,
                TokenKind::Backslash if is_continuation_backslash(tokens, i) => {
                    spacing.wrapped = true;
                }
                TokenKind::Comment | TokenKind::Eof => {}
                _ => {
                    out.push_str(&spacing.before(tokens, i));
                    out.push_str(&token.raw);
                    spacing.prev = Some(i);
                }
            }
        }
        out
    }

    fn span_of(&self, range: TokenRange) -> Span {
        let tokens = self.tokens;
        match (tokens.get(range.start), tokens.get(range.end)) {
            (Some(first), Some(last)) if !range.is_empty() => first.span.merge(last.span),
            (Some(first), _) => first.span,
            _ => Span::default(),
        }
    }
}

/// Expression for a single token.
fn literal(token: &Token) -> Expression {
    match token.kind {
        TokenKind::String => Expression::String(StringLiteral {
            value: token.value.clone(),
            raw: token.raw.clone(),
        }),
        TokenKind::Number => Expression::Number(token.value.clone()),
        TokenKind::Duration => Expression::Duration(token.value.clone()),
        _ if token.is_name_like() => classify_literal(&token.value),
        _ => Expression::Identifier(token.raw.clone()),
    }
}

const fn kind_label(kind: DecoratorKind) -> &'static str {
    match kind {
        DecoratorKind::Block => "block",
        DecoratorKind::Function => "function",
        DecoratorKind::Pattern => "pattern",
    }
}

fn flush_text(parts: &mut Vec<ShellPart>, text: &mut String) {
    if !text.is_empty() {
        parts.push(ShellPart::Text(TextPart {
            text: std::mem::take(text),
        }));
    }
}

/// Gap reconstruction between consecutive emitted tokens.
#[derive(Debug, Default)]
struct Spacing {
    prev: Option<usize>,
    whitespace: Option<usize>,
    wrapped: bool,
}

impl Spacing {
    /// Text to insert before token `next`, resetting pending state.
    fn before(&mut self, tokens: &[Token], next: usize) -> String {
        let gap = match self.prev {
            None => String::new(),
            Some(_) if self.wrapped => " ".to_string(),
            Some(_) if self.whitespace.is_some() => self
                .whitespace
                .and_then(|i| tokens.get(i))
                .map(|t| t.raw.clone())
                .unwrap_or_default(),
            Some(prev) => column_gap(&tokens[prev], &tokens[next]),
        };
        self.whitespace = None;
        self.wrapped = false;
        gap
    }
}

fn column_gap(prev: &Token, next: &Token) -> String {
    if prev.end_line() == next.line {
        " ".repeat(next.column.saturating_sub(prev.end_column))
    } else {
        " ".to_string()
    }
}

/// Last token of `@name(args)`, ignoring any block.
fn head_end(span: &DecoratorSpan) -> usize {
    span.args.map_or(span.name, |args| args.end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::preprocess::preprocess;
    use crate::registry::StandardDecorators;

    fn build_str(input: &str) -> (Program, Vec<ParseError>) {
        let tokens = tokenize(input).expect("should tokenize");
        let config = ParserConfig::unlimited();
        let (map, mut errors) = preprocess(&tokens, &config);
        let (program, more) = build(&tokens, &map, &StandardDecorators, &config);
        errors.extend(more);
        (program, errors)
    }

    fn shell_text(content: &CommandContent) -> String {
        match content {
            CommandContent::Shell(shell) => shell.plain_text(),
            other => panic!("expected shell content, got {other:?}"),
        }
    }

    #[test]
    fn literal_classification() {
        assert_eq!(classify_literal("8080"), Expression::Number("8080".into()));
        assert_eq!(classify_literal("-1"), Expression::Number("-1".into()));
        assert_eq!(classify_literal("30s"), Expression::Duration("30s".into()));
        assert_eq!(classify_literal("2.5s"), Expression::Duration("2.5s".into()));
        assert_eq!(classify_literal("true"), Expression::Identifier("true".into()));
        assert_eq!(classify_literal("./src"), Expression::Identifier("./src".into()));
    }

    #[test]
    fn simple_command_text() {
        let (program, errors) = build_str("build: echo hello\n");
        assert!(errors.is_empty(), "{errors:?}");
        let cmd = &program.commands[0];
        assert!(!cmd.body.is_block);
        let CommandContent::Shell(shell) = &cmd.body.content else {
            panic!("expected shell content");
        };
        assert_eq!(
            shell.parts,
            vec![ShellPart::Text(TextPart {
                text: "echo hello".into()
            })]
        );
        assert_eq!(cmd.pos, Position { line: 1, column: 1 });
    }

    #[test]
    fn spacing_is_preserved() {
        let (program, _) = build_str("fmt: printf  \"%s\"\t-x   y\n");
        assert_eq!(
            shell_text(&program.commands[0].body.content),
            "printf  \"%s\"\t-x   y"
        );
    }

    #[test]
    fn continuation_becomes_single_space() {
        let (program, _) = build_str("long: cargo build \\\n    --release\n");
        assert_eq!(
            shell_text(&program.commands[0].body.content),
            "cargo build --release"
        );
    }

    #[test]
    fn inline_function_decorator() {
        let (program, errors) = build_str("var DIR = out\nls: ls @var(DIR) -la\n");
        assert!(errors.is_empty(), "{errors:?}");
        let CommandContent::Shell(shell) = &program.commands[0].body.content else {
            panic!("expected shell content");
        };
        assert_eq!(shell.parts.len(), 3);
        assert_eq!(
            shell.parts[0],
            ShellPart::Text(TextPart { text: "ls ".into() })
        );
        let ShellPart::Decorator(call) = &shell.parts[1] else {
            panic!("expected decorator part");
        };
        assert_eq!(call.name, "var");
        assert_eq!(call.args[0].value, Expression::Identifier("DIR".into()));
        assert_eq!(
            shell.parts[2],
            ShellPart::Text(TextPart { text: " -la".into() })
        );
    }

    #[test]
    fn block_sequence() {
        let (program, errors) = build_str("test: {\n  cargo fmt\n  cargo test\n}\n");
        assert!(errors.is_empty(), "{errors:?}");
        let CommandContent::Sequence { items } = &program.commands[0].body.content else {
            panic!("expected sequence");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(shell_text(&items[1]), "cargo test");
    }

    #[test]
    fn empty_block() {
        let (program, errors) = build_str("noop: { }\n");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(
            program.commands[0].body.content,
            CommandContent::Shell(ShellContent::default())
        );
    }

    #[test]
    fn nested_decorators_wrap_right() {
        let (program, errors) = build_str("ci: @retry(3) @timeout(1m) {\n  make\n}\n");
        assert!(errors.is_empty(), "{errors:?}");
        let CommandContent::Decorated(decorated) = &program.commands[0].body.content else {
            panic!("expected decorated content");
        };
        let names: Vec<_> = decorated.decorators.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["retry", "timeout"]);
        assert_eq!(shell_text(&decorated.content), "make");
    }

    #[test]
    fn decorator_argument_recursion() {
        let (program, errors) = build_str("b: @cwd(@var(DIR)) { make }\n");
        assert!(errors.is_empty(), "{errors:?}");
        let CommandContent::Decorated(decorated) = &program.commands[0].body.content else {
            panic!("expected decorated content");
        };
        let Expression::Decorator(inner) = &decorated.decorators[0].args[0].value else {
            panic!("expected nested function decorator");
        };
        assert_eq!(inner.name, "var");
        assert_eq!(inner.args[0].value, Expression::Identifier("DIR".into()));
    }

    #[test]
    fn block_decorator_without_block() {
        let (program, errors) = build_str("t: @timeout(5s) make\n");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("requires a block"));
        let CommandContent::Decorated(decorated) = &program.commands[0].body.content else {
            panic!("expected decorated content");
        };
        assert_eq!(shell_text(&decorated.content), "make");
    }

    #[test]
    fn pattern_branches() {
        let (program, errors) = build_str(
            concat!(
                "deploy: @when(ENV) {\n",
                "  prod: kubectl apply\n",
                "  dev: { echo a; echo b }\n",
                "  *: echo skip\n",
                "}\n",
            ),
        );
        assert!(errors.is_empty(), "{errors:?}");
        let CommandContent::Pattern(pattern) = &program.commands[0].body.content else {
            panic!("expected pattern content");
        };
        assert_eq!(pattern.decorator.name, "when");
        assert_eq!(pattern.branches.len(), 3);
        assert_eq!(pattern.branches[0].pattern, Pattern::Identifier("prod".into()));
        assert!(matches!(
            pattern.branches[1].content,
            CommandContent::Sequence { .. }
        ));
        assert_eq!(pattern.branches[2].pattern, Pattern::Wildcard);
        assert_eq!(shell_text(&pattern.branches[2].content), "echo skip");
    }

    #[test]
    fn block_decorator_inline_is_error() {
        let (program, errors) = build_str("x: echo @timeout(5s) hi\n");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("cannot be used inline"));
        assert_eq!(
            shell_text(&program.commands[0].body.content),
            "echo @timeout(5s) hi"
        );
    }

    #[test]
    fn unknown_decorator_is_text() {
        let (program, errors) = build_str("x: echo @nope(1)\n");
        assert!(errors.is_empty());
        assert_eq!(
            shell_text(&program.commands[0].body.content),
            "echo @nope(1)"
        );
    }

    #[test]
    fn variable_expressions() {
        let (program, errors) = build_str(
            concat!(
                "var PORT = 8080\n",
                "var WAIT = 2.5s\n",
                "var MSG = \"hi there\"\n",
                "var CMD = go run .\n",
                "var REF = @var(PORT)\n",
            ),
        );
        assert!(errors.is_empty(), "{errors:?}");
        let values: Vec<_> = program.variables.iter().map(|v| v.value.clone()).collect();
        assert_eq!(values[0], Expression::Number("8080".into()));
        assert_eq!(values[1], Expression::Duration("2.5s".into()));
        assert_eq!(
            values[2],
            Expression::String(StringLiteral {
                value: "hi there".into(),
                raw: "\"hi there\"".into(),
            })
        );
        assert_eq!(
            values[3],
            Expression::String(StringLiteral {
                value: "go run .".into(),
                raw: "go run .".into(),
            })
        );
        assert!(matches!(values[4], Expression::Decorator(_)));
    }

    #[test]
    fn groups_are_kept_together() {
        let (program, errors) = build_str("var A = 1\nvar (\n  B = 2\n  C = 3\n)\nvar ( D = 4 )\n");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(program.variables.len(), 1);
        assert_eq!(program.var_groups.len(), 2);
        assert_eq!(program.var_groups[0].variables.len(), 2);
        assert_eq!(program.var_groups[0].pos.line, 2);
        assert_eq!(program.var_groups[1].variables[0].name, "D");
    }

    #[test]
    fn quoted_inline_reference() {
        let (program, errors) = build_str("var HOST = x\nssh: echo \"to @var(HOST)\"\n");
        assert!(errors.is_empty(), "{errors:?}");
        let CommandContent::Shell(shell) = &program.commands[0].body.content else {
            panic!("expected shell content");
        };
        assert_eq!(shell.parts.len(), 3);
        assert!(matches!(&shell.parts[1], ShellPart::Decorator(d) if d.name == "var"));
        assert_eq!(shell.plain_text(), "echo \"to \"");
    }
}

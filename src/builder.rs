use crate::ast::{
    Argument, CommandBody, CommandContent, CommandDecl, CommandType, DecoratedContent, Decorator,
    Expression, FunctionDecorator, Pattern, PatternBranch, PatternContent, Program, ShellContent,
    ShellPart, StringLiteral, TextPart, VarGroup, VariableDecl,
};
use crate::token::{Position, Span};

impl Program {
    /// Create a new empty program.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            variables: Vec::new(),
            var_groups: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Add a top-level `var NAME = value`.
    #[must_use]
    pub fn variable(mut self, name: &str, value: impl Into<Expression>) -> Self {
        self.variables.push(VariableDecl::new(name, value));
        self
    }

    /// Add a `var ( ... )` group.
    #[must_use]
    pub fn group(mut self, group: VarGroup) -> Self {
        self.var_groups.push(group);
        self
    }

    /// Add a command.
    #[must_use]
    pub fn command(mut self, cmd: CommandDecl) -> Self {
        self.commands.push(cmd);
        self
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableDecl {
    #[must_use]
    pub fn new(name: &str, value: impl Into<Expression>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            pos: Position::default(),
            span: Span::default(),
        }
    }
}

impl VarGroup {
    /// Create an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self {
            variables: Vec::new(),
            pos: Position::default(),
            span: Span::default(),
        }
    }

    /// Add `NAME = value` to the group.
    #[must_use]
    pub fn variable(mut self, name: &str, value: impl Into<Expression>) -> Self {
        self.variables.push(VariableDecl::new(name, value));
        self
    }
}

impl Default for VarGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandDecl {
    /// Create a plain command with a one-line body.
    #[must_use]
    pub fn new(name: &str, content: impl Into<CommandContent>) -> Self {
        Self {
            name: name.to_string(),
            kind: CommandType::Plain,
            body: CommandBody {
                is_block: false,
                content: content.into(),
            },
            pos: Position::default(),
            span: Span::default(),
        }
    }

    /// Make this a `watch` command.
    #[must_use]
    pub const fn watch(mut self) -> Self {
        self.kind = CommandType::Watch;
        self
    }

    /// Make this a `stop` command.
    #[must_use]
    pub const fn stop(mut self) -> Self {
        self.kind = CommandType::Stop;
        self
    }

    /// Write the body inside braces.
    #[must_use]
    pub const fn block(mut self) -> Self {
        self.body.is_block = true;
        self
    }
}

impl CommandContent {
    /// Plain shell text with no decorators.
    #[must_use]
    pub fn shell(text: &str) -> Self {
        Self::Shell(ShellContent::new().text(text))
    }

    /// Several statements run in order.
    #[must_use]
    pub const fn sequence(items: Vec<Self>) -> Self {
        Self::Sequence { items }
    }
}

impl From<ShellContent> for CommandContent {
    fn from(shell: ShellContent) -> Self {
        Self::Shell(shell)
    }
}

impl From<&str> for CommandContent {
    fn from(text: &str) -> Self {
        Self::shell(text)
    }
}

impl From<DecoratedContent> for CommandContent {
    fn from(content: DecoratedContent) -> Self {
        Self::Decorated(content)
    }
}

impl From<PatternContent> for CommandContent {
    fn from(content: PatternContent) -> Self {
        Self::Pattern(content)
    }
}

impl ShellContent {
    #[must_use]
    pub const fn new() -> Self {
        Self { parts: Vec::new() }
    }

    /// Append literal shell text.
    #[must_use]
    pub fn text(mut self, text: &str) -> Self {
        self.parts.push(ShellPart::Text(TextPart {
            text: text.to_string(),
        }));
        self
    }

    /// Append an inline decorator call.
    #[must_use]
    pub fn call(mut self, call: FunctionDecorator) -> Self {
        self.parts.push(ShellPart::Decorator(call));
        self
    }
}

impl Decorator {
    /// Create a decorator with no arguments.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            args: Vec::new(),
            pos: Position::default(),
            span: Span::default(),
        }
    }

    /// Add a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Expression>) -> Self {
        self.args.push(Argument {
            name: None,
            value: value.into(),
        });
        self
    }

    /// Add a `name = value` argument.
    #[must_use]
    pub fn named_arg(mut self, name: &str, value: impl Into<Expression>) -> Self {
        self.args.push(Argument {
            name: Some(name.to_string()),
            value: value.into(),
        });
        self
    }

    /// Wrap `content` in this block decorator. Wrapping content that is
    /// already decorated adds this decorator as the outermost one.
    #[must_use]
    pub fn wrap(self, content: impl Into<CommandContent>) -> DecoratedContent {
        match content.into() {
            CommandContent::Decorated(mut inner) => {
                inner.decorators.insert(0, self);
                inner
            }
            other => DecoratedContent {
                decorators: vec![self],
                content: Box::new(other),
            },
        }
    }

    /// Start a pattern block with this decorator.
    #[must_use]
    pub const fn branches(self) -> PatternContent {
        PatternContent {
            decorator: self,
            branches: Vec::new(),
        }
    }
}

impl PatternContent {
    /// Add a `name: content` branch.
    #[must_use]
    pub fn branch(mut self, pattern: &str, content: impl Into<CommandContent>) -> Self {
        self.branches.push(PatternBranch {
            pattern: Pattern::Identifier(pattern.to_string()),
            content: content.into(),
        });
        self
    }

    /// Add the `*: content` branch.
    #[must_use]
    pub fn otherwise(mut self, content: impl Into<CommandContent>) -> Self {
        self.branches.push(PatternBranch {
            pattern: Pattern::Wildcard,
            content: content.into(),
        });
        self
    }
}

impl FunctionDecorator {
    /// Create a call with no arguments.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            args: Vec::new(),
            pos: Position::default(),
            span: Span::default(),
        }
    }

    /// Add a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Expression>) -> Self {
        self.args.push(Argument {
            name: None,
            value: value.into(),
        });
        self
    }

    /// Add a `name = value` argument.
    #[must_use]
    pub fn named_arg(mut self, name: &str, value: impl Into<Expression>) -> Self {
        self.args.push(Argument {
            name: Some(name.to_string()),
            value: value.into(),
        });
        self
    }
}

impl Expression {
    /// A double-quoted string; the formatter escapes it.
    #[must_use]
    pub fn string(value: &str) -> Self {
        Self::String(StringLiteral {
            value: value.to_string(),
            raw: String::new(),
        })
    }

    #[must_use]
    pub fn number(text: &str) -> Self {
        Self::Number(text.to_string())
    }

    #[must_use]
    pub fn duration(text: &str) -> Self {
        Self::Duration(text.to_string())
    }

    #[must_use]
    pub fn identifier(text: &str) -> Self {
        Self::Identifier(text.to_string())
    }

    /// `@var(NAME)`.
    #[must_use]
    pub fn variable(name: &str) -> Self {
        Self::Decorator(FunctionDecorator::new("var").arg(Self::identifier(name)))
    }
}

impl From<FunctionDecorator> for Expression {
    fn from(call: FunctionDecorator) -> Self {
        Self::Decorator(call)
    }
}

impl From<&str> for Expression {
    /// Bare word, classified like an unquoted source value.
    fn from(text: &str) -> Self {
        crate::ast_builder::classify_literal(text)
    }
}

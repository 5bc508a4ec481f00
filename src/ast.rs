use serde::Serialize;

use crate::token::{Position, Span};

/// Complete devcmd program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Program {
    /// Top-level `var NAME = VALUE` declarations.
    pub variables: Vec<VariableDecl>,
    /// `var ( ... )` groups, each owning its declarations.
    pub var_groups: Vec<VarGroup>,
    pub commands: Vec<CommandDecl>,
}

impl Program {
    /// Every declared variable, top-level first, then grouped.
    pub fn all_variables(&self) -> impl Iterator<Item = &VariableDecl> {
        self.variables
            .iter()
            .chain(self.var_groups.iter().flat_map(|g| g.variables.iter()))
    }

    #[must_use]
    pub fn find_variable(&self, name: &str) -> Option<&VariableDecl> {
        self.all_variables().find(|v| v.name == name)
    }

    /// Command named `name` with the given type.
    #[must_use]
    pub fn find_command(&self, name: &str, kind: CommandType) -> Option<&CommandDecl> {
        self.commands
            .iter()
            .find(|c| c.name == name && c.kind == kind)
    }
}

/// `var NAME = VALUE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableDecl {
    pub name: String,
    pub value: Expression,
    pub pos: Position,
    pub span: Span,
}

/// `var ( NAME = VALUE ... )`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VarGroup {
    pub variables: Vec<VariableDecl>,
    pub pos: Position,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    Plain,
    /// Starts a long-running process.
    Watch,
    /// Stops the process started by the `watch` of the same name.
    Stop,
}

impl CommandType {
    /// Source keyword, empty for plain commands.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Plain => "",
            Self::Watch => "watch",
            Self::Stop => "stop",
        }
    }
}

/// `[watch|stop] NAME: BODY`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDecl {
    pub name: String,
    pub kind: CommandType,
    pub body: CommandBody,
    pub pos: Position,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandBody {
    /// Written with braces, or as a decorator owning a block.
    pub is_block: bool,
    pub content: CommandContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandContent {
    Shell(ShellContent),
    Decorated(DecoratedContent),
    Pattern(PatternContent),
    /// Statements of a block, in order.
    Sequence { items: Vec<CommandContent> },
}

/// Shell text with inline function decorators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShellContent {
    pub parts: Vec<ShellPart>,
}

impl ShellContent {
    /// Text parts concatenated, decorators omitted.
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ShellPart::Text(text) => Some(text.text.as_str()),
                ShellPart::Decorator(_) => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShellPart {
    Text(TextPart),
    Decorator(FunctionDecorator),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextPart {
    pub text: String,
}

/// Block decorators wrapping content, outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecoratedContent {
    pub decorators: Vec<Decorator>,
    pub content: Box<CommandContent>,
}

/// `@when(..) { pattern: content ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternContent {
    pub decorator: Decorator,
    pub branches: Vec<PatternBranch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternBranch {
    pub pattern: Pattern,
    pub content: CommandContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum Pattern {
    Identifier(String),
    /// `*`
    Wildcard,
}

/// Block or pattern decorator; its block lives in the enclosing content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decorator {
    pub name: String,
    pub args: Vec<Argument>,
    pub pos: Position,
    pub span: Span,
}

/// Expression-valued decorator call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDecorator {
    pub name: String,
    pub args: Vec<Argument>,
    pub pos: Position,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Argument {
    /// Set for `name = value` arguments.
    pub name: Option<String>,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Expression {
    String(StringLiteral),
    Number(String),
    Duration(String),
    Identifier(String),
    Decorator(FunctionDecorator),
}

/// String value plus the text it was written as.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StringLiteral {
    pub value: String,
    /// Original source text, quotes included when quoted.
    pub raw: String,
}

//! Index-based structure map produced by the preprocessor.
//!
//! Every span is a pair of indices into the token slice the map was built
//! from; nothing here owns token text. The map is only meaningful next to
//! that slice.

use std::collections::HashMap;

/// Closed interval `[start, end]` over token indices.
///
/// `start > end` encodes an empty range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenRange {
    pub start: usize,
    pub end: usize,
}

impl TokenRange {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Empty range positioned just after `index`.
    #[must_use]
    pub const fn empty_after(index: usize) -> Self {
        Self {
            start: index + 1,
            end: index,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start > self.end
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.end - self.start + 1
        }
    }

    #[must_use]
    pub const fn contains(&self, index: usize) -> bool {
        index >= self.start && index <= self.end
    }

    /// Range strictly inside a delimiter pair at `start` and `end`.
    #[must_use]
    pub const fn inner(&self) -> Self {
        Self {
            start: self.start + 1,
            end: self.end.saturating_sub(1),
        }
    }
}

/// A `NAME = VALUE` declaration, top-level or inside `var ( ... )`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSpan {
    pub name: usize,
    pub value: TokenRange,
    pub grouped: bool,
    /// `(` .. `)` of the enclosing group, when grouped.
    pub group: Option<TokenRange>,
}

/// A command declaration: `[watch|stop] NAME: BODY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpan {
    /// `watch`/`stop` keyword; `None` for a plain command.
    pub kind_token: Option<usize>,
    pub name: usize,
    pub colon: usize,
    pub body: TokenRange,
    pub is_block: bool,
    /// Decorator indices leading a simple body.
    pub decorators: Vec<usize>,
}

/// One argument inside a decorator's parentheses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSpan {
    /// Name token for `name = value` arguments.
    pub name: Option<usize>,
    pub value: TokenRange,
}

/// An `@name` occurrence with its optional arguments and block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratorSpan {
    pub at: usize,
    pub name: usize,
    /// `(` .. `)` inclusive.
    pub args: Option<TokenRange>,
    /// `{` .. `}` inclusive.
    pub block: Option<TokenRange>,
    pub arguments: Vec<ArgumentSpan>,
}

impl DecoratorSpan {
    /// Index of the last token belonging to this decorator.
    #[must_use]
    pub fn end(&self) -> usize {
        self.block
            .or(self.args)
            .map_or(self.name, |range| range.end)
    }

    /// Whole extent, from `@` to the last token.
    #[must_use]
    pub fn extent(&self) -> TokenRange {
        TokenRange::new(self.at, self.end())
    }
}

/// A brace-delimited block and the statements inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRange {
    pub open: usize,
    pub close: usize,
    pub range: TokenRange,
    pub statements: Vec<StatementSpan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementSpan {
    pub range: TokenRange,
    /// Decorator the statement begins with, if any.
    pub decorator: Option<usize>,
}

/// Pass-1 output: where every construct begins and ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureMap {
    pub variables: Vec<VariableSpan>,
    pub commands: Vec<CommandSpan>,
    pub decorators: Vec<DecoratorSpan>,
    pub blocks: Vec<BlockRange>,
}

impl StructureMap {
    /// Lookup from `@` token index to decorator index.
    #[must_use]
    pub fn decorator_index(&self) -> HashMap<usize, usize> {
        self.decorators
            .iter()
            .enumerate()
            .map(|(idx, span)| (span.at, idx))
            .collect()
    }

    /// Block whose opening brace is at `open`.
    #[must_use]
    pub fn block_at(&self, open: usize) -> Option<&BlockRange> {
        self.blocks.iter().find(|block| block.open == open)
    }
}

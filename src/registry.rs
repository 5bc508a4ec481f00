//! Decorator name classification.
//!
//! The parser never hardcodes which names are block, function or pattern
//! decorators; it asks a [`DecoratorRegistry`].

use std::collections::BTreeSet;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecoratorKind {
    /// Wraps a `{ ... }` block: `@timeout`, `@retry`, `@parallel`.
    Block,
    /// Expression-valued call: `@var`, `@sh`.
    Function,
    /// Branches on patterns: `@when`, `@try`.
    Pattern,
}

/// Capability the parser consults to classify `@name` occurrences.
pub trait DecoratorRegistry {
    fn is_block_decorator(&self, name: &str) -> bool;
    fn is_function_decorator(&self, name: &str) -> bool;
    fn is_pattern_decorator(&self, name: &str) -> bool;

    /// Function decorator that references a declared variable.
    fn variable_decorator(&self) -> &str {
        "var"
    }

    /// Kind of `name`, or `None` for an unknown decorator.
    ///
    /// A name registered under several kinds resolves as pattern, then
    /// block, then function.
    fn classify(&self, name: &str) -> Option<DecoratorKind> {
        if self.is_pattern_decorator(name) {
            Some(DecoratorKind::Pattern)
        } else if self.is_block_decorator(name) {
            Some(DecoratorKind::Block)
        } else if self.is_function_decorator(name) {
            Some(DecoratorKind::Function)
        } else {
            None
        }
    }
}

const STANDARD_BLOCK: &[&str] = &["timeout", "retry", "parallel", "cwd", "confirm", "debounce"];
const STANDARD_FUNCTION: &[&str] = &["var", "sh", "env"];
const STANDARD_PATTERN: &[&str] = &["when", "try"];

/// The built-in decorator catalogue.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDecorators;

impl DecoratorRegistry for StandardDecorators {
    fn is_block_decorator(&self, name: &str) -> bool {
        STANDARD_BLOCK.contains(&name)
    }

    fn is_function_decorator(&self, name: &str) -> bool {
        STANDARD_FUNCTION.contains(&name)
    }

    fn is_pattern_decorator(&self, name: &str) -> bool {
        STANDARD_PATTERN.contains(&name)
    }
}

/// Registry assembled at runtime.
///
/// ```
/// use devcmd_rs::{DecoratorKind, DecoratorRegistry, DecoratorSet};
///
/// let set = DecoratorSet::new().block("timeout").function("var");
/// assert_eq!(set.classify("timeout"), Some(DecoratorKind::Block));
/// assert_eq!(set.classify("when"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratorSet {
    block: BTreeSet<String>,
    function: BTreeSet<String>,
    pattern: BTreeSet<String>,
    variable: String,
}

impl Default for DecoratorSet {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoratorSet {
    /// Empty set; the variable decorator is `var`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            block: BTreeSet::new(),
            function: BTreeSet::new(),
            pattern: BTreeSet::new(),
            variable: "var".to_string(),
        }
    }

    /// The standard catalogue, ready to be extended.
    #[must_use]
    pub fn standard() -> Self {
        let set = Self::new();
        let set = STANDARD_BLOCK.iter().fold(set, |s, name| s.block(*name));
        let set = STANDARD_FUNCTION.iter().fold(set, |s, name| s.function(*name));
        STANDARD_PATTERN.iter().fold(set, |s, name| s.pattern(*name))
    }

    #[must_use]
    pub fn block(mut self, name: impl Into<String>) -> Self {
        self.block.insert(name.into());
        self
    }

    #[must_use]
    pub fn function(mut self, name: impl Into<String>) -> Self {
        self.function.insert(name.into());
        self
    }

    #[must_use]
    pub fn pattern(mut self, name: impl Into<String>) -> Self {
        self.pattern.insert(name.into());
        self
    }

    /// Use `name` as the variable-reference decorator. It is also
    /// registered as a function decorator.
    #[must_use]
    pub fn variable(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.function.insert(name.clone());
        self.variable = name;
        self
    }
}

impl DecoratorRegistry for DecoratorSet {
    fn is_block_decorator(&self, name: &str) -> bool {
        self.block.contains(name)
    }

    fn is_function_decorator(&self, name: &str) -> bool {
        self.function.contains(name)
    }

    fn is_pattern_decorator(&self, name: &str) -> bool {
        self.pattern.contains(name)
    }

    fn variable_decorator(&self) -> &str {
        &self.variable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalogue() {
        let std = StandardDecorators;
        assert_eq!(std.classify("timeout"), Some(DecoratorKind::Block));
        assert_eq!(std.classify("parallel"), Some(DecoratorKind::Block));
        assert_eq!(std.classify("var"), Some(DecoratorKind::Function));
        assert_eq!(std.classify("sh"), Some(DecoratorKind::Function));
        assert_eq!(std.classify("when"), Some(DecoratorKind::Pattern));
        assert_eq!(std.classify("try"), Some(DecoratorKind::Pattern));
        assert_eq!(std.classify("bogus"), None);
        assert_eq!(std.variable_decorator(), "var");
    }

    #[test]
    fn set_matches_standard() {
        let set = DecoratorSet::standard();
        for name in ["timeout", "retry", "var", "sh", "when", "try", "nope"] {
            assert_eq!(set.classify(name), StandardDecorators.classify(name), "{name}");
        }
    }

    #[test]
    fn pattern_wins_over_block() {
        let set = DecoratorSet::new().block("x").pattern("x").function("x");
        assert_eq!(set.classify("x"), Some(DecoratorKind::Pattern));
    }

    #[test]
    fn custom_variable_decorator() {
        let set = DecoratorSet::new().variable("ref");
        assert_eq!(set.variable_decorator(), "ref");
        assert_eq!(set.classify("ref"), Some(DecoratorKind::Function));
    }
}

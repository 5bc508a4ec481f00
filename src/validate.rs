//! Post-build check that every variable reference names a declared
//! variable. Values are never resolved.

use std::collections::HashSet;

use crate::ast::{Argument, CommandContent, Expression, FunctionDecorator, Program, ShellPart};
use crate::error::ParseError;
use crate::registry::DecoratorRegistry;
use crate::token::{Token, TokenKind};

/// Report variable-decorator calls whose first argument names no
/// declared variable.
#[must_use]
pub fn check_variable_references(
    program: &Program,
    registry: &dyn DecoratorRegistry,
) -> Vec<ParseError> {
    let declared: HashSet<&str> = program.all_variables().map(|v| v.name.as_str()).collect();
    let mut checker = ReferenceChecker {
        declared,
        variable: registry.variable_decorator(),
        errors: Vec::new(),
    };

    for var in program.all_variables() {
        checker.expression(&var.value);
    }
    for cmd in &program.commands {
        checker.content(&cmd.body.content);
    }
    tracing::debug!(errors = checker.errors.len(), "checked variable references");
    checker.errors
}

struct ReferenceChecker<'p> {
    declared: HashSet<&'p str>,
    variable: &'p str,
    errors: Vec<ParseError>,
}

impl ReferenceChecker<'_> {
    fn content(&mut self, content: &CommandContent) {
        match content {
            CommandContent::Shell(shell) => {
                for part in &shell.parts {
                    if let ShellPart::Decorator(call) = part {
                        self.call(call);
                    }
                }
            }
            CommandContent::Decorated(decorated) => {
                for decorator in &decorated.decorators {
                    self.arguments(&decorator.args);
                }
                self.content(&decorated.content);
            }
            CommandContent::Pattern(pattern) => {
                self.arguments(&pattern.decorator.args);
                for branch in &pattern.branches {
                    self.content(&branch.content);
                }
            }
            CommandContent::Sequence { items } => {
                for item in items {
                    self.content(item);
                }
            }
        }
    }

    fn arguments(&mut self, args: &[Argument]) {
        for arg in args {
            self.expression(&arg.value);
        }
    }

    fn expression(&mut self, expr: &Expression) {
        if let Expression::Decorator(call) = expr {
            self.call(call);
        }
    }

    fn call(&mut self, call: &FunctionDecorator) {
        if call.name == self.variable {
            let token = Token::new(TokenKind::At, "@", call.to_string(), call.pos, call.span);
            match call.args.first().map(|a| &a.value) {
                Some(Expression::Identifier(name)) => {
                    if !self.declared.contains(name.as_str()) {
                        self.errors.push(
                            ParseError::reference(&token, format!("undefined variable '{name}'"))
                                .with_hint(format!("declare it with 'var {name} = ...'")),
                        );
                    }
                }
                _ => self.errors.push(
                    ParseError::semantic(
                        &token,
                        format!("'@{}' expects a variable name", call.name),
                    )
                    .with_hint(format!("write @{}(NAME)", call.name)),
                ),
            }
        }
        self.arguments(&call.args);
    }
}

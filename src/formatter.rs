//! Pretty-printer that serializes a devcmd AST back into canonical text.
//!
//! Produces tab-indented output. Bodies that are a single decorated or
//! pattern statement use the implicit-block form `name: @deco(...) {`.

use std::fmt::{self, Write as _};

use crate::ast::{
    Argument, CommandContent, CommandDecl, CommandType, DecoratedContent, Decorator, Expression,
    FunctionDecorator, Pattern, PatternContent, Program, ShellContent, ShellPart, StringLiteral,
    VarGroup,
};

/// Format a `Program` into devcmd source text.
///
/// Variables come first, then variable groups, then commands, with a blank
/// line between sections and between commands.
#[must_use]
pub fn format(program: &Program) -> String {
    let mut out = String::new();

    for var in &program.variables {
        let _ = writeln!(out, "var {} = {}", var.name, var.value);
    }

    for group in &program.var_groups {
        if !out.is_empty() {
            out.push('\n');
        }
        format_group(&mut out, group);
    }

    for cmd in &program.commands {
        if !out.is_empty() {
            out.push('\n');
        }
        format_command(&mut out, cmd);
    }

    out
}

fn format_group(out: &mut String, group: &VarGroup) {
    out.push_str("var (\n");
    for var in &group.variables {
        let _ = writeln!(out, "\t{} = {}", var.name, var.value);
    }
    out.push_str(")\n");
}

fn format_command(out: &mut String, cmd: &CommandDecl) {
    if cmd.kind != CommandType::Plain {
        out.push_str(cmd.kind.keyword());
        out.push(' ');
    }
    out.push_str(&cmd.name);
    out.push_str(": ");

    match &cmd.body.content {
        CommandContent::Decorated(_) | CommandContent::Pattern(_) => {
            format_statement(out, &cmd.body.content, 0);
        }
        content if cmd.body.is_block => {
            out.push_str("{\n");
            format_block_items(out, content, 1);
            out.push_str("}\n");
        }
        content => format_statement(out, content, 0),
    }
}

/// Write one statement at the current position; the caller has already
/// written the indentation. Always ends with a newline.
fn format_statement(out: &mut String, content: &CommandContent, indent: usize) {
    match content {
        CommandContent::Shell(shell) => {
            let _ = writeln!(out, "{shell}");
        }
        CommandContent::Decorated(decorated) => format_decorated(out, decorated, indent),
        CommandContent::Pattern(pattern) => format_pattern(out, pattern, indent),
        CommandContent::Sequence { items } => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    push_indent(out, indent);
                }
                format_statement(out, item, indent);
            }
        }
    }
}

/// Write the statements of a block body, one per line.
fn format_block_items(out: &mut String, content: &CommandContent, indent: usize) {
    match content {
        CommandContent::Sequence { items } => {
            for item in items {
                push_indent(out, indent);
                format_statement(out, item, indent);
            }
        }
        CommandContent::Shell(shell) if shell.parts.is_empty() => {}
        other => {
            push_indent(out, indent);
            format_statement(out, other, indent);
        }
    }
}

fn format_decorated(out: &mut String, decorated: &DecoratedContent, indent: usize) {
    for (i, decorator) in decorated.decorators.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{decorator}");
    }

    if let CommandContent::Pattern(pattern) = decorated.content.as_ref() {
        out.push(' ');
        format_pattern(out, pattern, indent);
        return;
    }

    out.push_str(" {\n");
    format_block_items(out, &decorated.content, indent + 1);
    push_indent(out, indent);
    out.push_str("}\n");
}

fn format_pattern(out: &mut String, pattern: &PatternContent, indent: usize) {
    let _ = writeln!(out, "{} {{", pattern.decorator);
    for branch in &pattern.branches {
        push_indent(out, indent + 1);
        let _ = write!(out, "{}: ", branch.pattern);
        let braced = match &branch.content {
            CommandContent::Sequence { .. } => true,
            CommandContent::Shell(shell) => shell.parts.is_empty(),
            _ => false,
        };
        if braced {
            out.push_str("{\n");
            format_block_items(out, &branch.content, indent + 2);
            push_indent(out, indent + 1);
            out.push_str("}\n");
        } else {
            format_statement(out, &branch.content, indent + 1);
        }
    }
    push_indent(out, indent);
    out.push_str("}\n");
}

fn push_indent(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push('\t');
    }
}

fn write_call(f: &mut fmt::Formatter<'_>, name: &str, args: &[Argument]) -> fmt::Result {
    write!(f, "@{name}")?;
    if args.is_empty() {
        return Ok(());
    }
    f.write_str("(")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{arg}")?;
    }
    f.write_str(")")
}

impl fmt::Display for Decorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_call(f, &self.name, &self.args)
    }
}

impl fmt::Display for FunctionDecorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_call(f, &self.name, &self.args)
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{name} = ")?;
        }
        write!(f, "{}", self.value)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(literal) => write!(f, "{literal}"),
            Self::Number(text) | Self::Duration(text) | Self::Identifier(text) => f.write_str(text),
            Self::Decorator(call) => write!(f, "{call}"),
        }
    }
}

impl fmt::Display for StringLiteral {
    /// The original source text when known, otherwise a double-quoted
    /// escaped form of the value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.raw.is_empty() {
            return f.write_str(&self.raw);
        }
        f.write_str("\"")?;
        for c in self.value.chars() {
            match c {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\t' => f.write_str("\\t")?,
                '\r' => f.write_str("\\r")?,
                c => f.write_char(c)?,
            }
        }
        f.write_str("\"")
    }
}

impl fmt::Display for ShellContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            match part {
                ShellPart::Text(text) => f.write_str(&text.text)?,
                ShellPart::Decorator(call) => write!(f, "{call}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(name) => f.write_str(name),
            Self::Wildcard => f.write_str("*"),
        }
    }
}

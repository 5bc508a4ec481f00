#![allow(dead_code)]

use devcmd_rs::{
    CommandContent, ParseOutput, Parser, ParserConfig, Program, StandardDecorators, format,
    parse_str,
};

/// Parse `input`, failing the test on any error.
pub fn parse_ok(input: &str) -> Program {
    parse_str(input).unwrap_or_else(|e| panic!("parse failed: {e}\n--- input ---\n{input}"))
}

/// Parse `input` collecting every error, with no error budget.
pub fn parse_all(input: &str) -> ParseOutput {
    parse_with(input, ParserConfig::unlimited())
}

pub fn parse_with(input: &str, config: ParserConfig) -> ParseOutput {
    let registry = StandardDecorators;
    Parser::new(&registry, config)
        .parse_str(input)
        .expect("tokenize failed")
}

/// Error messages in source order.
pub fn messages(output: &ParseOutput) -> Vec<String> {
    output.errors.iter().map(|e| e.message.clone()).collect()
}

/// Concatenated text of a shell statement.
pub fn shell_text(content: &CommandContent) -> String {
    match content {
        CommandContent::Shell(shell) => shell.plain_text(),
        other => panic!("expected shell content, got {other:?}"),
    }
}

/// Assert `input` is already in canonical form.
pub fn roundtrip(input: &str) {
    let output = format(&parse_ok(input));
    assert_eq!(
        output, input,
        "round-trip mismatch:\n--- expected ---\n{input}\n--- got ---\n{output}"
    );
}

/// Format, re-parse, and assert formatting is stable.
pub fn assert_idempotent(program: &Program) {
    let formatted = format(program);
    let reparsed = parse_str(&formatted).unwrap_or_else(|e| {
        panic!(
            "failed to re-parse formatted output: {e}\n\
             --- formatted ---\n{formatted}"
        )
    });
    assert_eq!(
        format(&reparsed),
        formatted,
        "formatting is not stable\n--- formatted ---\n{formatted}"
    );
}

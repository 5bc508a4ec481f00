//! Running the two passes by hand through the public API.

use devcmd_rs::{
    CommandContent, DecoratorSet, ParserConfig, StandardDecorators, TokenKind, TokenRange, build,
    preprocess, tokenize,
};

fn text(tokens: &[devcmd_rs::Token], range: TokenRange) -> String {
    tokens[range.start..=range.end]
        .iter()
        .map(|t| t.raw.as_str())
        .collect()
}

#[test]
fn structure_map_indexes_into_tokens() {
    let input = "var DIR = out\nbuild: @cwd(@var(DIR)) {\n  make\n  make install\n}\n";
    let tokens = tokenize(input).expect("tokenize");
    let (map, errors) = preprocess(&tokens, &ParserConfig::default());
    assert!(errors.is_empty(), "{errors:?}");

    assert_eq!(map.variables.len(), 1);
    assert_eq!(tokens[map.variables[0].name].value, "DIR");
    assert_eq!(text(&tokens, map.variables[0].value), "out");

    let cmd = &map.commands[0];
    assert_eq!(tokens[cmd.name].value, "build");
    assert_eq!(tokens[cmd.colon].kind, TokenKind::Colon);
    assert_eq!(tokens[cmd.body.start].kind, TokenKind::At);
    assert_eq!(tokens[cmd.body.end].kind, TokenKind::RBrace);

    let cwd = &map.decorators[map.decorator_index()[&cmd.body.start]];
    assert_eq!(tokens[cwd.name].value, "cwd");
    assert_eq!(cwd.arguments.len(), 1);
    assert_eq!(text(&tokens, cwd.arguments[0].value), "@var(DIR)");
    let block = cwd.block.expect("cwd block");
    let recorded = map.block_at(block.start).expect("block recorded");
    assert_eq!(recorded.statements.len(), 2);
    assert_eq!(text(&tokens, recorded.statements[1].range), "make install");
}

#[test]
fn passes_share_nothing_but_the_map() {
    let input = "test: {\n  go vet\n  go test ./...\n}\n";
    let tokens = tokenize(input).expect("tokenize");
    let config = ParserConfig::default();
    let (map, _) = preprocess(&tokens, &config);
    let before = map.clone();

    let (first, errors) = build(&tokens, &map, &StandardDecorators, &config);
    assert!(errors.is_empty(), "{errors:?}");
    let (second, _) = build(&tokens, &map, &StandardDecorators, &config);
    assert_eq!(first, second);
    assert_eq!(map, before);
    assert!(matches!(
        first.commands[0].body.content,
        CommandContent::Sequence { ref items } if items.len() == 2
    ));
}

#[test]
fn registry_decides_decorator_kind() {
    let input = "x: @guard { make }\n";
    let tokens = tokenize(input).expect("tokenize");
    let config = ParserConfig::default();
    let (map, errors) = preprocess(&tokens, &config);
    assert!(errors.is_empty(), "{errors:?}");

    let (standard, _) = build(&tokens, &map, &StandardDecorators, &config);
    assert!(matches!(
        standard.commands[0].body.content,
        CommandContent::Shell(_)
    ));

    let custom = DecoratorSet::standard().block("guard");
    let (program, errors) = build(&tokens, &map, &custom, &config);
    assert!(errors.is_empty(), "{errors:?}");
    let CommandContent::Decorated(decorated) = &program.commands[0].body.content else {
        panic!("expected decorated content");
    };
    assert_eq!(decorated.decorators[0].name, "guard");
}

#[test]
fn recovery_always_terminates() {
    let input = "}}}\n@@@ : : :\nvar ( = )\nwatch\n{ ( ) }\nok: yes\n";
    let tokens = tokenize(input).expect("tokenize");
    let (map, errors) = preprocess(&tokens, &ParserConfig::unlimited());
    assert!(!errors.is_empty());
    assert_eq!(map.commands.len(), 1);
    assert_eq!(tokens[map.commands[0].name].value, "ok");
}

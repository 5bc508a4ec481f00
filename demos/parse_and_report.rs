//! Parse a devcmd file with several mistakes and print every error.

use devcmd_rs::{Diagnostics, Parser, ParserConfig, StandardDecorators};

fn main() {
    let source = "\
var PORT = 8080
var HOST localhost

build: cargo build --release
test {
    cargo test
}
serve: @timeout(30s) cargo run -- --port @var(PORT)
deploy: scp target/app @var(TARGET):/srv
build: echo again
";

    let registry = StandardDecorators;
    let config = ParserConfig::unlimited().allow_undefined_variables(false);
    let output = match Parser::new(&registry, config).parse_str(source) {
        Ok(output) => output,
        Err(e) => {
            println!("Lex error: {e}");
            return;
        }
    };

    println!(
        "Recovered {} variable(s) and {} command(s)",
        output.program.all_variables().count(),
        output.program.commands.len()
    );
    for cmd in &output.program.commands {
        println!("  Command: {}", cmd.name);
    }

    let report = Diagnostics::new(source)
        .with_origin("commands.cli")
        .render(&output.errors);
    println!("\n{report}");
    println!("{} error(s)", output.errors.len());
}

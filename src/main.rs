//! CLI tool to validate, inspect and format devcmd files.

use std::fs;
use std::process::ExitCode;

use devcmd_rs::{Diagnostics, Parser, ParserConfig, StandardDecorators};

fn usage() -> ExitCode {
    eprintln!("Usage: devcmd <command> [--config FILE] [files...]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  validate  Check devcmd file(s) and report every error");
    eprintln!("  ast       Print the parsed program as JSON");
    eprintln!("  fmt       Format devcmd file(s) and print to stdout");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config FILE  Parser settings (TOML)");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  devcmd validate commands.cli");
    eprintln!("  devcmd fmt --config devcmd.toml commands.cli");
    ExitCode::from(2)
}

fn setup_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    setup_logging();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        return usage();
    }

    let command = args[1].as_str();
    if !matches!(command, "validate" | "ast" | "fmt") {
        eprintln!("Unknown command: {command}");
        return ExitCode::from(2);
    }

    let mut config = ParserConfig::default();
    let mut files = Vec::new();
    let mut rest = args[2..].iter();
    while let Some(arg) = rest.next() {
        if arg == "--config" {
            let Some(path) = rest.next() else {
                eprintln!("Error: --config needs a file");
                return ExitCode::from(2);
            };
            config = match ParserConfig::load(path) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("{path}: {e}");
                    return ExitCode::from(2);
                }
            };
        } else {
            files.push(arg);
        }
    }

    if files.is_empty() {
        eprintln!("Error: no files specified");
        return ExitCode::from(2);
    }

    let registry = StandardDecorators;
    let parser = Parser::new(&registry, config);
    let mut had_error = false;

    for path in files {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{path}: {e}");
                had_error = true;
                continue;
            }
        };

        let output = match parser.parse_str(&content) {
            Ok(output) => output,
            Err(e) => {
                eprintln!("{path}: {e}");
                had_error = true;
                continue;
            }
        };

        if output.has_errors() {
            eprint!(
                "{}",
                Diagnostics::new(&content)
                    .with_origin(path)
                    .render(&output.errors)
            );
            eprintln!("{path}: {} error(s)", output.errors.len());
            had_error = true;
            continue;
        }

        let program = output.program;
        match command {
            "validate" => {
                let variables = program.all_variables().count();
                let commands = program.commands.len();
                eprintln!("{path}: valid ({variables} variable(s), {commands} command(s))");
            }
            "ast" => match serde_json::to_string_pretty(&program) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("{path}: {e}");
                    had_error = true;
                }
            },
            _ => print!("{}", devcmd_rs::format(&program)),
        }
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

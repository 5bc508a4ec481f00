//! Build a devcmd program with the builder API and print it.

use devcmd_rs::{
    CommandContent, CommandDecl, Decorator, Expression, FunctionDecorator, Program, ShellContent,
    VarGroup,
};

fn main() {
    let program = Program::new()
        .variable("PORT", "8080")
        .group(
            VarGroup::new()
                .variable("SRC", "./src")
                .variable("GREETING", Expression::string("hello world")),
        )
        .command(CommandDecl::new("build", "cargo build --release"))
        .command(
            CommandDecl::new(
                "check",
                CommandContent::sequence(vec!["cargo fmt --check".into(), "cargo test".into()]),
            )
            .block(),
        )
        .command(
            CommandDecl::new(
                "dev",
                Decorator::new("cwd").arg(Expression::variable("SRC")).wrap(
                    ShellContent::new()
                        .text("npm start --port ")
                        .call(FunctionDecorator::new("var").arg("PORT")),
                ),
            )
            .watch(),
        )
        .command(CommandDecl::new("dev", "pkill -f node").stop())
        .command(CommandDecl::new(
            "deploy",
            Decorator::new("when")
                .arg("ENV")
                .branches()
                .branch("prod", "kubectl apply -f prod.yaml")
                .otherwise("echo skipped"),
        ));

    let output = devcmd_rs::format(&program);
    println!("{output}");
}

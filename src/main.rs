use std::collections::HashMap;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use scrolls::builtins::{base_config, random_expansions, stdio_commands};
use scrolls::interpreter::Interpreter;

#[derive(Parser)]
#[command(name = "scrolls")]
#[command(about = "A basic interpreter for scrolls")]
#[command(version)]
struct Cli {
    /// The file to interpret
    file: String,

    /// Print the parsed tree instead of executing
    #[arg(long = "dump-ast")]
    dump_ast: bool,

    /// Log everything the interpreter does to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("trace")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let script = match std::fs::read_to_string(&cli.file) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("error: cannot read {}: {}", cli.file, e);
            std::process::exit(2);
        }
    };

    if cli.dump_ast {
        match Interpreter::test_parse(&script, HashMap::new()) {
            Ok(tree) => println!("{}", tree),
            Err(e) => {
                eprintln!("error:\n{}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let mut interpreter = Interpreter::new();
    base_config().configure(&mut interpreter);
    interpreter
        .command_handlers_mut()
        .add("stdio", stdio_commands());
    interpreter
        .expansion_handlers_mut()
        .add("random", random_expansions());

    if let Err(e) = interpreter.run(&script) {
        eprintln!("error:\n{}", e);
        std::process::exit(1);
    }
}

//! minic CLI: compile a syntax tree and run it on the stack machine.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Input, JSON, or usage error
//! - 2: Compile error
//! - 3: Runtime error

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "minic")]
#[command(about = "Compile minic syntax trees to bytecode and run them", long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile and execute a function
    Run(RunArgs),
    /// Compile and print the bytecode listing
    Disasm {
        /// Syntax tree as JSON (array of function definitions)
        input: PathBuf,
    },
    /// Compile only and report program size
    Check {
        /// Syntax tree as JSON (array of function definitions)
        input: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Syntax tree as JSON (array of function definitions)
    input: PathBuf,

    /// Integer arguments passed to the entry function
    #[arg(allow_negative_numbers = true)]
    args: Vec<i16>,

    /// Function to call
    #[arg(long, default_value = "main")]
    entry: String,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version go to stdout and succeed.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    init_logging();

    let result = match &cli.command {
        Command::Run(args) => commands::run(args),
        Command::Disasm { input } => commands::disasm(input),
        Command::Check { input } => commands::check(input),
    };

    if let Err(code) = result {
        process::exit(code);
    }
}

/// Log to stderr; `RUST_LOG` selects the level, default `warn`.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

//! CLI command implementations.

use crate::RunArgs;
use minic_codegen::ast::FunctionDefinition;
use minic_common::Program;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Compile `args.input` and call the entry function.
///
/// Printed values go to stdout one per line, followed by `result: N` when
/// the entry returns a value.
pub fn run(args: &RunArgs) -> Result<(), i32> {
    let program = compile_file(&args.input)?;

    let Some(entry) = program.entry(&args.entry) else {
        eprintln!("error: entry function '{}' not found", args.entry);
        return Err(1);
    };
    if entry.arity != args.args.len() {
        eprintln!(
            "error: entry function '{}' requires {} arguments, but received {}",
            entry.name,
            entry.arity,
            args.args.len()
        );
        return Err(1);
    }

    info!(entry = %entry.name, offset = entry.offset, "executing");
    match minic_vm::run(&program, &args.entry, &args.args) {
        Ok(Some(value)) => {
            println!("result: {value}");
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => {
            eprintln!("runtime error: {e}");
            Err(3)
        }
    }
}

/// Compile and print the listing.
pub fn disasm(input: &Path) -> Result<(), i32> {
    let program = compile_file(input)?;
    print!("{}", minic_common::disassemble(&program));
    Ok(())
}

/// Compile only.
pub fn check(input: &Path) -> Result<(), i32> {
    let program = compile_file(input)?;
    println!(
        "OK: {} functions, {} instructions",
        program.functions.len(),
        program.len()
    );
    Ok(())
}

// --- Helpers ---

/// Read a JSON syntax tree.
fn read_ast(path: &Path) -> Result<Vec<FunctionDefinition>, i32> {
    let text = fs::read_to_string(path).map_err(|e| {
        eprintln!("error: cannot read '{}': {e}", path.display());
        1
    })?;

    serde_json::from_str(&text).map_err(|e| {
        eprintln!("error: invalid syntax tree in '{}': {e}", path.display());
        1
    })
}

/// Read and compile a JSON syntax tree.
fn compile_file(path: &Path) -> Result<Program, i32> {
    let functions = read_ast(path)?;
    debug!(path = %path.display(), functions = functions.len(), "loaded syntax tree");

    minic_codegen::compile(&functions).map_err(|e| {
        eprintln!("compile error: {e}");
        2
    })
}

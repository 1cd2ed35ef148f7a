//! minic virtual machine: executes code produced by `minic-codegen`.
//!
//! The VM is a stack-based machine with:
//! - An operand stack of 16-bit signed integers, the only data store
//! - A return-address stack, bottomed by a "no caller" sentinel
//! - A base index that anchors base-relative addressing for the current frame
//!
//! # Usage
//!
//! ```
//! use minic_common::{FunctionEntry, FunctionTable, Instruction, Program};
//! use minic_vm::run_with_sink;
//!
//! let mut functions = FunctionTable::new();
//! functions.insert(FunctionEntry {
//!     name: "answer".to_string(),
//!     offset: 0,
//!     arity: 0,
//!     returns_value: true,
//! });
//! let program = Program::new(
//!     vec![
//!         Instruction::push_int(42),
//!         Instruction::store_bp_rel(-2),
//!         Instruction::ret(),
//!     ],
//!     functions,
//! );
//!
//! let mut printed: Vec<i16> = Vec::new();
//! let result = run_with_sink(&program, "answer", &[], &mut printed).unwrap();
//! assert_eq!(result, Some(42));
//! assert!(printed.is_empty());
//! ```

pub mod error;
pub mod execute;
pub mod machine;
pub mod sink;

pub use error::RuntimeError;
pub use machine::{Machine, MAX_STACK_DEPTH};
pub use sink::{PrintSink, StdoutSink};

use minic_common::Program;

/// Call function `name` of `program` with `args`, printing to stdout.
///
/// A result is requested exactly when the function returns a value.
///
/// # Errors
///
/// Returns [`RuntimeError`] if the function does not exist, the argument
/// count does not match its arity, or execution faults.
pub fn run(program: &Program, name: &str, args: &[i16]) -> Result<Option<i16>, RuntimeError> {
    run_with_sink(program, name, args, StdoutSink)
}

/// Like [`run`], sending PRINT_INT output to `sink`.
pub fn run_with_sink<S: PrintSink>(
    program: &Program,
    name: &str,
    args: &[i16],
    sink: S,
) -> Result<Option<i16>, RuntimeError> {
    let entry = program
        .entry(name)
        .ok_or_else(|| RuntimeError::UnknownEntry {
            name: name.to_string(),
        })?;

    if entry.arity != args.len() {
        return Err(RuntimeError::EntryArityMismatch {
            name: name.to_string(),
            expected: entry.arity,
            received: args.len(),
        });
    }

    let mut vm = Machine::new(&program.instructions, sink);
    vm.run(entry.offset, args, entry.returns_value)
}

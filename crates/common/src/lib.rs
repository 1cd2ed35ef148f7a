//! minic common types.
//!
//! This crate provides the data structures shared by the code generator
//! and the virtual machine:
//!
//! - [`Opcode`]: the 14 operations of the instruction set
//! - [`Instruction`]: opcode plus a reserved and a signed 16-bit operand
//! - [`FunctionTable`]: function name to entry offset, arity, return flag
//! - [`Program`]: instruction stream plus its function table
//! - [`disassemble`]: program listing for debugging
//!
//! # Dependencies
//!
//! None outside the standard library.

pub mod disassembler;
pub mod function;
pub mod instruction;
pub mod opcode;
pub mod program;

// Re-export commonly used types at the crate root.
pub use disassembler::disassemble;
pub use function::{FunctionEntry, FunctionTable};
pub use instruction::Instruction;
pub use opcode::Opcode;
pub use program::Program;

//! The compiled artifact handed from the code generator to the VM.

use crate::function::{FunctionEntry, FunctionTable};
use crate::instruction::Instruction;

/// A flat instruction stream plus the table of functions it contains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    /// The instruction stream.
    pub instructions: Vec<Instruction>,
    /// Entry points into `instructions`.
    pub functions: FunctionTable,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>, functions: FunctionTable) -> Self {
        Self {
            instructions,
            functions,
        }
    }

    /// Look up a callable entry point by function name.
    pub fn entry(&self, name: &str) -> Option<&FunctionEntry> {
        self.functions.get(name)
    }

    /// Number of instructions in the program.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

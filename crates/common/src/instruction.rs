//! The fixed-size instruction word.
//!
//! ```text
//! opcode : Opcode
//! p1     : u16   reserved, always 0 in generated code
//! p2     : i16   immediate, absolute slot, or relative offset
//! ```

use crate::opcode::Opcode;
use std::fmt;

/// A single minic instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// The operation to perform.
    pub opcode: Opcode,
    /// Reserved operand. Never read by the VM.
    pub p1: u16,
    /// Signed operand. Meaning depends on opcode.
    pub p2: i16,
}

impl Instruction {
    /// Create a new instruction.
    pub fn new(opcode: Opcode, p1: u16, p2: i16) -> Self {
        Self { opcode, p1, p2 }
    }

    /// Instruction with no operand.
    pub fn bare(opcode: Opcode) -> Self {
        Self::new(opcode, 0, 0)
    }

    pub fn exit() -> Self {
        Self::bare(Opcode::Exit)
    }

    pub fn add_int() -> Self {
        Self::bare(Opcode::AddInt)
    }

    pub fn push_int(value: i16) -> Self {
        Self::new(Opcode::PushInt, 0, value)
    }

    pub fn pop_int() -> Self {
        Self::bare(Opcode::PopInt)
    }

    pub fn print_int() -> Self {
        Self::bare(Opcode::PrintInt)
    }

    pub fn compare_int_less() -> Self {
        Self::bare(Opcode::CompareIntLess)
    }

    pub fn load_int(slot: i16) -> Self {
        Self::new(Opcode::LoadInt, 0, slot)
    }

    pub fn store_int(slot: i16) -> Self {
        Self::new(Opcode::StoreInt, 0, slot)
    }

    pub fn jump_by_if_zero(offset: i16) -> Self {
        Self::new(Opcode::JumpByIfZero, 0, offset)
    }

    pub fn jump_by(offset: i16) -> Self {
        Self::new(Opcode::JumpBy, 0, offset)
    }

    pub fn load_bp_rel(offset: i16) -> Self {
        Self::new(Opcode::LoadIntBasePointerRelative, 0, offset)
    }

    pub fn store_bp_rel(offset: i16) -> Self {
        Self::new(Opcode::StoreIntBasePointerRelative, 0, offset)
    }

    pub fn call(offset: i16) -> Self {
        Self::new(Opcode::Call, 0, offset)
    }

    pub fn ret() -> Self {
        Self::bare(Opcode::Return)
    }

    /// Absolute target of a relative jump or call located at `index`.
    ///
    /// Returns `None` for other opcodes, or when the target would fall
    /// below index 0.
    pub fn jump_target(&self, index: usize) -> Option<usize> {
        if !self.opcode.is_relative_jump() {
            return None;
        }
        index.checked_add_signed(self.p2 as isize)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.opcode.uses_operand() {
            write!(f, "{} {}", self.opcode, self.p2)
        } else {
            write!(f, "{}", self.opcode)
        }
    }
}

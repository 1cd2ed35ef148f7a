//! Opcode definitions for the minic instruction set.

use std::fmt;

/// Identifies the operation to perform.
///
/// The discriminants are stable and dense (0..=13) so an opcode can index a
/// per-opcode table.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Stop the run immediately.
    Exit = 0,
    /// Pop rhs, pop lhs, push `lhs + rhs` (wrapping).
    AddInt = 1,
    /// Push the immediate `p2`.
    PushInt = 2,
    /// Discard the top of stack.
    PopInt = 3,
    /// Pop the top of stack and emit it as output.
    PrintInt = 4,
    /// Pop rhs, pop lhs, push 1 if `lhs < rhs` else 0.
    CompareIntLess = 5,
    /// Push the value at absolute stack index `p2`.
    LoadInt = 6,
    /// Pop the top of stack into absolute stack index `p2`.
    StoreInt = 7,
    /// Pop a condition; jump by `p2` if it is zero, else fall through.
    JumpByIfZero = 8,
    /// Jump by `p2` unconditionally.
    JumpBy = 9,
    /// Push the value at `base + p2`.
    LoadIntBasePointerRelative = 10,
    /// Pop the top of stack into `base + p2`.
    StoreIntBasePointerRelative = 11,
    /// Save the base index, push the return address, jump by `p2`.
    Call = 12,
    /// Restore the caller's base index and instruction pointer.
    Return = 13,
}

/// Number of opcodes in the instruction set.
pub const NUM_OPCODES: usize = 14;

/// All opcodes, in discriminant order.
pub const ALL_OPCODES: [Opcode; NUM_OPCODES] = [
    Opcode::Exit,
    Opcode::AddInt,
    Opcode::PushInt,
    Opcode::PopInt,
    Opcode::PrintInt,
    Opcode::CompareIntLess,
    Opcode::LoadInt,
    Opcode::StoreInt,
    Opcode::JumpByIfZero,
    Opcode::JumpBy,
    Opcode::LoadIntBasePointerRelative,
    Opcode::StoreIntBasePointerRelative,
    Opcode::Call,
    Opcode::Return,
];

impl Opcode {
    /// Returns the listing mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Exit => "EXIT",
            Opcode::AddInt => "ADD_INT",
            Opcode::PushInt => "PUSH_INT",
            Opcode::PopInt => "POP_INT",
            Opcode::PrintInt => "PRINT_INT",
            Opcode::CompareIntLess => "COMP_INT_LT",
            Opcode::LoadInt => "LOAD_INT",
            Opcode::StoreInt => "STORE_INT",
            Opcode::JumpByIfZero => "JUMP_BY_IF_ZERO",
            Opcode::JumpBy => "JUMP_BY",
            Opcode::LoadIntBasePointerRelative => "LOAD_INT_BP_REL",
            Opcode::StoreIntBasePointerRelative => "STORE_INT_BP_REL",
            Opcode::Call => "CALL",
            Opcode::Return => "RETURN",
        }
    }

    /// Whether `p2` carries an operand for this opcode.
    pub fn uses_operand(&self) -> bool {
        matches!(
            self,
            Opcode::PushInt
                | Opcode::LoadInt
                | Opcode::StoreInt
                | Opcode::JumpByIfZero
                | Opcode::JumpBy
                | Opcode::LoadIntBasePointerRelative
                | Opcode::StoreIntBasePointerRelative
                | Opcode::Call
        )
    }

    /// Whether `p2` is an offset relative to the instruction's own index.
    pub fn is_relative_jump(&self) -> bool {
        matches!(self, Opcode::JumpByIfZero | Opcode::JumpBy | Opcode::Call)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminants_are_dense() {
        for (i, &opcode) in ALL_OPCODES.iter().enumerate() {
            assert_eq!(opcode as usize, i, "{opcode:?} out of order");
        }
    }

    #[test]
    fn mnemonics_are_unique_and_uppercase() {
        let mut seen = std::collections::HashSet::new();
        for &opcode in &ALL_OPCODES {
            let m = opcode.mnemonic();
            assert!(!m.is_empty(), "empty mnemonic for {opcode:?}");
            assert_eq!(m, m.to_uppercase(), "mnemonic should be uppercase: {m}");
            assert!(seen.insert(m), "duplicate mnemonic {m}");
        }
    }

    #[test]
    fn relative_jumps_use_operand() {
        for &opcode in &ALL_OPCODES {
            if opcode.is_relative_jump() {
                assert!(opcode.uses_operand(), "{opcode:?}");
            }
        }
    }

    #[test]
    fn no_operand_opcodes() {
        for opcode in [
            Opcode::Exit,
            Opcode::AddInt,
            Opcode::PopInt,
            Opcode::PrintInt,
            Opcode::CompareIntLess,
            Opcode::Return,
        ] {
            assert!(!opcode.uses_operand(), "{opcode:?}");
        }
    }

    #[test]
    fn display_is_mnemonic() {
        assert_eq!(Opcode::StoreIntBasePointerRelative.to_string(), "STORE_INT_BP_REL");
    }
}

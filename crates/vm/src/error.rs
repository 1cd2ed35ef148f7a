//! Runtime faults for the minic VM.
//!
//! The VM only ever runs code produced by the code generator, so every
//! fault here means the bytecode is corrupt. None of them is recoverable:
//! the run stops at the first one. Each bytecode fault carries the index
//! of the instruction that raised it (`at`).

use thiserror::Error;

/// Errors that stop a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Pop on an empty operand stack.
    #[error("corrupted bytecode: stack underflow at instruction {at}")]
    StackUnderflow { at: usize },

    /// Operand stack grew past [`MAX_STACK_DEPTH`](crate::machine::MAX_STACK_DEPTH).
    #[error("corrupted bytecode: stack overflow at instruction {at}")]
    StackOverflow { at: usize },

    /// Absolute or base-relative slot outside the live stack.
    #[error("corrupted bytecode: slot {slot} out of range (depth {depth}) at instruction {at}")]
    AddressOutOfRange { at: usize, slot: isize, depth: usize },

    /// A relative jump or call lands before the first instruction.
    #[error("corrupted bytecode: jump by {offset} out of range at instruction {at}")]
    JumpOutOfRange { at: usize, offset: i16 },

    /// The instruction pointer ran past the last instruction.
    #[error("corrupted bytecode: unexpected end of code at instruction {at}")]
    UnexpectedEndOfCode { at: usize },

    /// RETURN with an empty return-address stack.
    #[error("corrupted bytecode: return with no caller at instruction {at}")]
    ReturnStackUnderflow { at: usize },

    /// RETURN popped a saved base index that is not a live stack position.
    #[error("corrupted bytecode: saved base index {value} invalid at instruction {at}")]
    CorruptBaseIndex { at: usize, value: i16 },

    /// The stack left after the run is too shallow for the caller's frame.
    #[error("corrupted bytecode: unbalanced frame (expected at least {expected} slots, found {depth})")]
    UnbalancedFrame { expected: usize, depth: usize },

    /// `run` was given an entry index outside the code.
    #[error("entry instruction {entry} out of range (program has {len} instructions)")]
    EntryOutOfRange { entry: usize, len: usize },

    /// No function with the requested name exists.
    #[error("entry function '{name}' not found")]
    UnknownEntry { name: String },

    /// The entry function was given the wrong number of arguments.
    #[error("entry function '{name}' requires {expected} arguments, but received {received}")]
    EntryArityMismatch {
        name: String,
        expected: usize,
        received: usize,
    },
}

impl RuntimeError {
    /// Whether this error is a bytecode fault rather than a bad entry request.
    pub fn is_corrupted_bytecode(&self) -> bool {
        !matches!(
            self,
            RuntimeError::EntryOutOfRange { .. }
                | RuntimeError::UnknownEntry { .. }
                | RuntimeError::EntryArityMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats() {
        assert_eq!(
            RuntimeError::StackUnderflow { at: 5 }.to_string(),
            "corrupted bytecode: stack underflow at instruction 5"
        );
        assert_eq!(
            RuntimeError::AddressOutOfRange {
                at: 2,
                slot: -1,
                depth: 3
            }
            .to_string(),
            "corrupted bytecode: slot -1 out of range (depth 3) at instruction 2"
        );
        assert_eq!(
            RuntimeError::UnknownEntry {
                name: "main".to_string()
            }
            .to_string(),
            "entry function 'main' not found"
        );
        assert_eq!(
            RuntimeError::EntryArityMismatch {
                name: "f".to_string(),
                expected: 1,
                received: 0
            }
            .to_string(),
            "entry function 'f' requires 1 arguments, but received 0"
        );
    }

    #[test]
    fn fault_category() {
        assert!(RuntimeError::ReturnStackUnderflow { at: 0 }.is_corrupted_bytecode());
        assert!(RuntimeError::JumpOutOfRange { at: 0, offset: -3 }.is_corrupted_bytecode());
        assert!(!RuntimeError::UnknownEntry {
            name: "main".to_string()
        }
        .is_corrupted_bytecode());
        assert!(!RuntimeError::EntryOutOfRange { entry: 4, len: 2 }.is_corrupted_bytecode());
    }
}

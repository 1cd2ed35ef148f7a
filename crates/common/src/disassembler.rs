//! Human-readable program listing.
//!
//! One line per instruction, prefixed with its index. A label line
//! precedes the first instruction of every function. Relative jumps and
//! calls carry their absolute target as a trailing note.

use crate::opcode::Opcode;
use crate::program::Program;
use std::fmt::Write;

/// Render a program as listing text.
pub fn disassemble(program: &Program) -> String {
    let mut out = String::new();

    for (index, instr) in program.instructions.iter().enumerate() {
        if let Some(func) = program.functions.at_offset(index) {
            let _ = write!(out, "{}/{}", func.name, func.arity);
            if func.returns_value {
                out.push_str(" -> int");
            }
            out.push_str(":\n");
        }

        let _ = write!(out, "{index:>4}: {instr}");
        if let Some(target) = instr.jump_target(index) {
            let _ = write!(out, " ; -> {target}");
            if instr.opcode == Opcode::Call {
                if let Some(callee) = program.functions.at_offset(target) {
                    let _ = write!(out, " ({})", callee.name);
                }
            }
        }
        out.push('\n');
    }

    out
}

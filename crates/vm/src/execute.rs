//! Main execution loop and opcode dispatch for the minic VM.

use crate::error::RuntimeError;
use crate::machine::Machine;
use crate::sink::PrintSink;
use minic_common::{Instruction, Opcode};
use tracing::trace;

impl<'a, S: PrintSink> Machine<'a, S> {
    /// Execute until the instruction pointer is cleared or a fault occurs.
    pub(crate) fn execute(&mut self) -> Result<(), RuntimeError> {
        while let Some(ip) = self.ip {
            self.at = ip;
            let instr = self.fetch(ip)?;
            trace!(
                at = ip,
                op = %instr.opcode,
                p2 = instr.p2,
                depth = self.stack.len(),
                base = self.base,
                "exec"
            );

            match instr.opcode {
                Opcode::Exit => self.exec_exit(),
                Opcode::AddInt => self.exec_add_int()?,
                Opcode::PushInt => self.exec_push_int(&instr)?,
                Opcode::PopInt => self.exec_pop_int()?,
                Opcode::PrintInt => self.exec_print_int()?,
                Opcode::CompareIntLess => self.exec_compare_int_less()?,
                Opcode::LoadInt => self.exec_load_int(&instr)?,
                Opcode::StoreInt => self.exec_store_int(&instr)?,
                Opcode::JumpByIfZero => self.exec_jump_by_if_zero(&instr)?,
                Opcode::JumpBy => self.jump_by(instr.p2)?,
                Opcode::LoadIntBasePointerRelative => self.exec_load_bp_rel(&instr)?,
                Opcode::StoreIntBasePointerRelative => self.exec_store_bp_rel(&instr)?,
                Opcode::Call => self.exec_call(&instr)?,
                Opcode::Return => self.exec_return()?,
            }
        }
        Ok(())
    }

    fn exec_exit(&mut self) {
        self.ip = None;
    }

    /// Pop rhs then lhs, returning `(lhs, rhs)`.
    fn pop_operands(&mut self) -> Result<(i16, i16), RuntimeError> {
        let rhs = self.pop()?;
        let lhs = self.pop()?;
        Ok((lhs, rhs))
    }

    fn exec_add_int(&mut self) -> Result<(), RuntimeError> {
        let (lhs, rhs) = self.pop_operands()?;
        self.push(lhs.wrapping_add(rhs))?;
        self.advance();
        Ok(())
    }

    fn exec_push_int(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        self.push(instr.p2)?;
        self.advance();
        Ok(())
    }

    fn exec_pop_int(&mut self) -> Result<(), RuntimeError> {
        self.pop()?;
        self.advance();
        Ok(())
    }

    fn exec_print_int(&mut self) -> Result<(), RuntimeError> {
        let value = self.pop()?;
        self.sink.print(value);
        self.advance();
        Ok(())
    }

    fn exec_compare_int_less(&mut self) -> Result<(), RuntimeError> {
        let (lhs, rhs) = self.pop_operands()?;
        self.push(i16::from(lhs < rhs))?;
        self.advance();
        Ok(())
    }

    fn exec_load_int(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let slot = self.slot(instr.p2 as isize)?;
        self.push(self.stack[slot])?;
        self.advance();
        Ok(())
    }

    fn exec_store_int(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let value = self.pop()?;
        let slot = self.slot(instr.p2 as isize)?;
        self.stack[slot] = value;
        self.advance();
        Ok(())
    }

    fn exec_jump_by_if_zero(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let condition = self.pop()?;
        if condition == 0 {
            self.jump_by(instr.p2)
        } else {
            self.advance();
            Ok(())
        }
    }

    fn exec_load_bp_rel(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let slot = self.relative_slot(instr.p2)?;
        self.push(self.stack[slot])?;
        self.advance();
        Ok(())
    }

    fn exec_store_bp_rel(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let value = self.pop()?;
        let slot = self.relative_slot(instr.p2)?;
        self.stack[slot] = value;
        self.advance();
        Ok(())
    }

    fn exec_call(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let saved_base =
            i16::try_from(self.base).map_err(|_| RuntimeError::StackOverflow { at: self.at })?;
        self.push(saved_base)?;
        self.return_addresses.push(Some(self.at + 1));
        self.base = self.stack.len();
        self.jump_by(instr.p2)
    }

    fn exec_return(&mut self) -> Result<(), RuntimeError> {
        let return_address = self
            .return_addresses
            .pop()
            .ok_or(RuntimeError::ReturnStackUnderflow { at: self.at })?;
        let saved = self.pop()?;
        self.base = usize::try_from(saved)
            .ok()
            .filter(|&b| b <= self.stack.len())
            .ok_or(RuntimeError::CorruptBaseIndex {
                at: self.at,
                value: saved,
            })?;
        self.ip = return_address;
        Ok(())
    }
}

//! VM state management: registers, stacks, frame setup and teardown.

use crate::error::RuntimeError;
use crate::sink::PrintSink;
use minic_common::Instruction;
use tracing::debug;

/// Maximum operand stack depth.
///
/// CALL saves the base index as a 16-bit stack value, so no stack position
/// may exceed `i16::MAX`.
pub const MAX_STACK_DEPTH: usize = i16::MAX as usize;

/// The minic virtual machine.
///
/// A machine borrows one instruction stream and owns the register state of
/// a single run at a time. `run` resets the registers, so a machine can be
/// reused for several sequential runs over the same code.
pub struct Machine<'a, S> {
    /// The code being executed.
    pub(crate) code: &'a [Instruction],
    /// Where PRINT_INT output goes.
    pub(crate) sink: S,
    /// Operand stack. The only runtime data store.
    pub(crate) stack: Vec<i16>,
    /// Saved instruction pointers. `None` marks the outermost caller.
    pub(crate) return_addresses: Vec<Option<usize>>,
    /// Next instruction to execute. `None` once the run has terminated.
    pub(crate) ip: Option<usize>,
    /// Start of the current frame in `stack`.
    pub(crate) base: usize,
    /// Index of the instruction currently executing, for fault reports.
    pub(crate) at: usize,
}

impl<'a, S: PrintSink> Machine<'a, S> {
    /// Create a machine over `code` that prints into `sink`.
    pub fn new(code: &'a [Instruction], sink: S) -> Self {
        Self {
            code,
            sink,
            stack: Vec::new(),
            return_addresses: Vec::new(),
            ip: None,
            base: 0,
            at: 0,
        }
    }

    /// Call the function starting at instruction `entry` with `args`.
    ///
    /// When `want_result` is set a zeroed return-value slot is reserved
    /// below the arguments and its final value is returned. The stack
    /// above that slot is unwound before returning.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] on the first bytecode fault. There is no
    /// partial result.
    pub fn run(
        &mut self,
        entry: usize,
        args: &[i16],
        want_result: bool,
    ) -> Result<Option<i16>, RuntimeError> {
        if entry >= self.code.len() {
            return Err(RuntimeError::EntryOutOfRange {
                entry,
                len: self.code.len(),
            });
        }

        self.reset();
        self.at = entry;

        if want_result {
            self.push(0)?;
        }
        for &arg in args {
            self.push(arg)?;
        }
        // Saved-base placeholder for the outermost frame.
        self.push(0)?;
        self.return_addresses.push(None);
        self.base = self.stack.len();
        self.ip = Some(entry);

        debug!(entry, ?args, want_result, "run start");
        self.execute()?;

        let expected = args.len() + usize::from(want_result);
        if self.stack.len() < expected {
            return Err(RuntimeError::UnbalancedFrame {
                expected,
                depth: self.stack.len(),
            });
        }
        self.stack.truncate(self.stack.len() - args.len());

        let result = want_result.then(|| self.stack[0]);
        debug!(?result, depth = self.stack.len(), "run finished");
        Ok(result)
    }

    /// The operand stack as left by the last run.
    pub fn stack(&self) -> &[i16] {
        &self.stack
    }

    /// The print sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the machine, returning its print sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn reset(&mut self) {
        self.stack.clear();
        self.return_addresses.clear();
        self.ip = None;
        self.base = 0;
    }

    /// Push a value onto the stack, checking for overflow.
    pub(crate) fn push(&mut self, value: i16) -> Result<(), RuntimeError> {
        if self.stack.len() >= MAX_STACK_DEPTH {
            return Err(RuntimeError::StackOverflow { at: self.at });
        }
        self.stack.push(value);
        Ok(())
    }

    /// Pop a value from the stack.
    pub(crate) fn pop(&mut self) -> Result<i16, RuntimeError> {
        self.stack
            .pop()
            .ok_or(RuntimeError::StackUnderflow { at: self.at })
    }

    /// Resolve a stack position, checking that it is live.
    pub(crate) fn slot(&self, index: isize) -> Result<usize, RuntimeError> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.stack.len())
            .ok_or(RuntimeError::AddressOutOfRange {
                at: self.at,
                slot: index,
                depth: self.stack.len(),
            })
    }

    /// Stack position `offset` slots away from the current base.
    pub(crate) fn relative_slot(&self, offset: i16) -> Result<usize, RuntimeError> {
        self.slot(self.base as isize + offset as isize)
    }

    /// Fetch the instruction at `ip`.
    pub(crate) fn fetch(&self, ip: usize) -> Result<Instruction, RuntimeError> {
        self.code
            .get(ip)
            .copied()
            .ok_or(RuntimeError::UnexpectedEndOfCode { at: ip })
    }

    /// Continue with the instruction after the current one.
    pub(crate) fn advance(&mut self) {
        self.ip = Some(self.at + 1);
    }

    /// Continue `offset` instructions away from the current one.
    pub(crate) fn jump_by(&mut self, offset: i16) -> Result<(), RuntimeError> {
        let target = self
            .at
            .checked_add_signed(offset as isize)
            .ok_or(RuntimeError::JumpOutOfRange {
                at: self.at,
                offset,
            })?;
        self.ip = Some(target);
        Ok(())
    }
}

//! Whole-program compilation: signature registration, function bodies,
//! and call-site resolution.

use crate::ast::FunctionDefinition;
use crate::error::CompileError;
use crate::frame::Frame;
use crate::lower::FunctionCompiler;
use minic_common::{FunctionEntry, FunctionTable, Instruction, Program};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Names the code generator handles itself.
pub const BUILTINS: [&str; 2] = ["return", "printNum"];

/// What a call site needs to know about its callee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Signature {
    pub(crate) arity: usize,
    pub(crate) returns_value: bool,
}

impl Signature {
    fn of(def: &FunctionDefinition) -> Self {
        Self {
            arity: def.parameters.len(),
            returns_value: def.returns_value,
        }
    }
}

/// A CALL emitted before its callee's entry offset was known.
#[derive(Debug)]
struct PendingCall {
    at: usize,
    caller: String,
    callee: String,
}

/// Two-phase code generator.
///
/// [`declare`](Compiler::declare) every function first, then
/// [`compile_function`](Compiler::compile_function) each body, then
/// [`finish`](Compiler::finish). Calls may target any declared function,
/// including ones whose bodies come later.
#[derive(Debug, Default)]
pub struct Compiler {
    pub(crate) signatures: HashMap<String, Signature>,
    pub(crate) code: Vec<Instruction>,
    pub(crate) functions: FunctionTable,
    pending_calls: Vec<PendingCall>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the signature of `def` so calls to it can be compiled.
    pub fn declare(&mut self, def: &FunctionDefinition) -> Result<(), CompileError> {
        if BUILTINS.contains(&def.name.as_str()) {
            return Err(CompileError::ReservedName {
                name: def.name.clone(),
            });
        }
        if self
            .signatures
            .insert(def.name.clone(), Signature::of(def))
            .is_some()
        {
            return Err(CompileError::DuplicateFunction {
                name: def.name.clone(),
            });
        }
        Ok(())
    }

    /// Emit the body of `def`, declaring it first if needed.
    ///
    /// The function's entry offset is registered before its body is
    /// compiled, so recursive calls resolve directly.
    pub fn compile_function(&mut self, def: &FunctionDefinition) -> Result<(), CompileError> {
        match self.signatures.get(&def.name) {
            None => self.declare(def)?,
            Some(&sig) if sig != Signature::of(def) => {
                return Err(CompileError::DuplicateFunction {
                    name: def.name.clone(),
                })
            }
            Some(_) => {}
        }

        let entry = self.code.len();
        let registered = self.functions.insert(FunctionEntry {
            name: def.name.clone(),
            offset: entry,
            arity: def.parameters.len(),
            returns_value: def.returns_value,
        });
        if !registered {
            return Err(CompileError::DuplicateFunction {
                name: def.name.clone(),
            });
        }

        let frame = Frame::new(def)?;
        FunctionCompiler::new(self, frame, def.returns_value).compile_body(&def.statements)?;

        debug!(
            function = %def.name,
            entry,
            len = self.code.len() - entry,
            "compiled function"
        );
        Ok(())
    }

    /// Resolve outstanding calls and return the finished program.
    pub fn finish(mut self) -> Result<Program, CompileError> {
        for call in std::mem::take(&mut self.pending_calls) {
            let target = self
                .functions
                .get(&call.callee)
                .map(|f| f.offset)
                .ok_or_else(|| CompileError::UnknownFunction {
                    name: call.callee.clone(),
                })?;
            let offset = relative_offset(target, call.at, &call.caller)?;
            trace!(at = call.at, callee = %call.callee, offset, "patched call");
            self.code[call.at].p2 = offset;
        }
        Ok(Program::new(self.code, self.functions))
    }

    /// Append an instruction, returning its index.
    pub(crate) fn emit(&mut self, instr: Instruction) -> usize {
        self.code.push(instr);
        self.code.len() - 1
    }

    /// Emit a CALL to `callee` from inside `caller`.
    pub(crate) fn emit_call(&mut self, caller: &str, callee: &str) -> Result<(), CompileError> {
        let at = self.code.len();
        match self.functions.get(callee) {
            Some(entry) => {
                let offset = relative_offset(entry.offset, at, caller)?;
                self.emit(Instruction::call(offset));
            }
            None => {
                self.emit(Instruction::call(0));
                self.pending_calls.push(PendingCall {
                    at,
                    caller: caller.to_string(),
                    callee: callee.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Point the jump at `at` to `target`.
    pub(crate) fn patch_jump(
        &mut self,
        at: usize,
        target: usize,
        function: &str,
    ) -> Result<(), CompileError> {
        self.code[at].p2 = relative_offset(target, at, function)?;
        Ok(())
    }
}

/// Offset from instruction `from` to instruction `to`.
pub(crate) fn relative_offset(to: usize, from: usize, function: &str) -> Result<i16, CompileError> {
    i16::try_from(to as i64 - from as i64).map_err(|_| CompileError::OffsetOutOfRange {
        function: function.to_string(),
    })
}

/// Compile a whole program.
///
/// All signatures are registered before any body is compiled, so functions
/// may call each other in any order.
pub fn compile(functions: &[FunctionDefinition]) -> Result<Program, CompileError> {
    let mut compiler = Compiler::new();
    for def in functions {
        compiler.declare(def)?;
    }
    for def in functions {
        compiler.compile_function(def)?;
    }
    compiler.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Statement;

    #[test]
    fn relative_offset_both_directions() {
        assert_eq!(relative_offset(0, 22, "f"), Ok(-22));
        assert_eq!(relative_offset(14, 4, "f"), Ok(10));
        assert_eq!(
            relative_offset(40_000, 0, "f"),
            Err(CompileError::OffsetOutOfRange {
                function: "f".to_string()
            })
        );
    }

    #[test]
    fn declare_rejects_duplicates() {
        let mut c = Compiler::new();
        let f = FunctionDefinition::new("f", &[], false, vec![]);
        c.declare(&f).unwrap();
        assert_eq!(
            c.declare(&f),
            Err(CompileError::DuplicateFunction {
                name: "f".to_string()
            })
        );
    }

    #[test]
    fn declare_rejects_builtin_names() {
        let mut c = Compiler::new();
        let f = FunctionDefinition::new("printNum", &["x"], false, vec![]);
        assert_eq!(
            c.declare(&f),
            Err(CompileError::ReservedName {
                name: "printNum".to_string()
            })
        );
    }

    #[test]
    fn compile_function_declares_implicitly() {
        let mut c = Compiler::new();
        let f = FunctionDefinition::new("f", &[], false, vec![]);
        c.compile_function(&f).unwrap();
        let program = c.finish().unwrap();
        assert_eq!(program.instructions, [Instruction::ret()]);
        assert_eq!(program.entry("f").map(|e| e.offset), Some(0));
    }

    #[test]
    fn compiling_a_body_twice_is_duplicate() {
        let mut c = Compiler::new();
        let f = FunctionDefinition::new("f", &[], false, vec![]);
        c.compile_function(&f).unwrap();
        assert!(matches!(
            c.compile_function(&f),
            Err(CompileError::DuplicateFunction { .. })
        ));
    }

    #[test]
    fn body_must_match_declared_signature() {
        let mut c = Compiler::new();
        c.declare(&FunctionDefinition::new("f", &["a"], false, vec![]))
            .unwrap();
        assert!(matches!(
            c.compile_function(&FunctionDefinition::new("f", &[], false, vec![])),
            Err(CompileError::DuplicateFunction { .. })
        ));
    }

    #[test]
    fn forward_call_is_patched_in_finish() {
        let mut c = Compiler::new();
        let caller = FunctionDefinition::new("a", &[], false, vec![Statement::call("b", vec![])]);
        let callee = FunctionDefinition::new("b", &[], false, vec![]);
        c.declare(&caller).unwrap();
        c.declare(&callee).unwrap();
        c.compile_function(&caller).unwrap();
        assert_eq!(c.code[0], Instruction::call(0));
        c.compile_function(&callee).unwrap();
        let program = c.finish().unwrap();
        // a: CALL, RETURN; b: RETURN at 2
        assert_eq!(program.instructions[0], Instruction::call(2));
    }

    #[test]
    fn declared_but_never_compiled_callee() {
        let mut c = Compiler::new();
        let caller = FunctionDefinition::new("a", &[], false, vec![Statement::call("b", vec![])]);
        c.declare(&FunctionDefinition::new("b", &[], false, vec![]))
            .unwrap();
        c.compile_function(&caller).unwrap();
        assert_eq!(
            c.finish().unwrap_err(),
            CompileError::UnknownFunction {
                name: "b".to_string()
            }
        );
    }
}

//! Lowering of one function body to instructions.

use crate::ast::{Statement, Type};
use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::frame::Frame;
use minic_common::Instruction;

/// Per-function compilation state.
pub(crate) struct FunctionCompiler<'c, 'ast> {
    compiler: &'c mut Compiler,
    frame: Frame<'ast>,
    returns_value: bool,
    /// `JUMP_BY` placeholders emitted by `return`, patched to the epilogue.
    pending_returns: Vec<usize>,
    loop_depth: usize,
}

impl<'c, 'ast> FunctionCompiler<'c, 'ast> {
    pub(crate) fn new(compiler: &'c mut Compiler, frame: Frame<'ast>, returns_value: bool) -> Self {
        Self {
            compiler,
            frame,
            returns_value,
            pending_returns: Vec::new(),
            loop_depth: 0,
        }
    }

    /// Prologue, statements, epilogue.
    pub(crate) fn compile_body(mut self, statements: &'ast [Statement]) -> Result<(), CompileError> {
        self.declare_locals(statements, false)?;

        for stmt in statements {
            self.compile_statement(stmt)?;
        }

        let epilogue = self.compiler.code.len();
        for at in std::mem::take(&mut self.pending_returns) {
            self.compiler.patch_jump(at, epilogue, self.frame.function())?;
        }
        for _ in 0..self.frame.local_count() {
            self.emit(Instruction::pop_int());
        }
        self.emit(Instruction::ret());
        Ok(())
    }

    fn emit(&mut self, instr: Instruction) -> usize {
        self.compiler.emit(instr)
    }

    /// Reserve a slot for every local, including those declared inside loop
    /// bodies. Top-level literal initializers are pushed directly.
    fn declare_locals(&mut self, statements: &'ast [Statement], nested: bool) -> Result<(), CompileError> {
        for stmt in statements {
            match stmt {
                Statement::VariableDeclaration {
                    name,
                    ty,
                    initializer,
                } => {
                    if *ty != Type::Int32 {
                        return Err(CompileError::UnsupportedType {
                            subject: format!("variable \"{name}\""),
                            ty: *ty,
                        });
                    }
                    self.frame.declare_local(name)?;
                    let initial = match initializer.as_deref() {
                        Some(Statement::Literal { ty, value }) if !nested => parse_literal(*ty, value)?,
                        _ => 0,
                    };
                    self.emit(Instruction::push_int(initial));
                }
                Statement::WhileLoop { body, .. } => self.declare_locals(body, true)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Lower a statement, discarding any value it leaves behind.
    fn compile_statement(&mut self, stmt: &'ast Statement) -> Result<(), CompileError> {
        if self.lower(stmt)? {
            self.emit(Instruction::pop_int());
        }
        Ok(())
    }

    /// Lower an operand, which must leave exactly one value.
    fn compile_expression(&mut self, stmt: &'ast Statement) -> Result<(), CompileError> {
        let produced = match stmt {
            Statement::VariableDeclaration { .. } | Statement::WhileLoop { .. } => false,
            _ => self.lower(stmt)?,
        };
        if produced {
            Ok(())
        } else {
            Err(CompileError::NotAValue {
                construct: stmt.describe(),
            })
        }
    }

    /// Returns whether the lowered code pushed a value.
    fn lower(&mut self, stmt: &'ast Statement) -> Result<bool, CompileError> {
        match stmt {
            Statement::VariableDeclaration {
                name, initializer, ..
            } => {
                self.lower_declaration(name, initializer.as_deref())?;
                Ok(false)
            }
            Statement::FunctionCall { name, arguments } => match name.as_str() {
                "return" => {
                    self.lower_return(arguments)?;
                    Ok(false)
                }
                "printNum" => {
                    self.lower_print(arguments)?;
                    Ok(false)
                }
                _ => self.lower_call(name, arguments),
            },
            Statement::Literal { ty, value } => {
                let value = parse_literal(*ty, value)?;
                self.emit(Instruction::push_int(value));
                Ok(true)
            }
            Statement::OperatorCall { operator, operands } => self.lower_operator(operator, operands),
            Statement::VariableName { name } => {
                self.lower_load(name)?;
                Ok(true)
            }
            Statement::WhileLoop { condition, body } => {
                self.lower_while(condition, body)?;
                Ok(false)
            }
        }
    }

    fn lower_declaration(
        &mut self,
        name: &str,
        initializer: Option<&'ast Statement>,
    ) -> Result<(), CompileError> {
        let offset = self.frame.local(name).ok_or_else(|| self.unknown_variable(name))?;
        let nested = self.loop_depth > 0;
        match initializer {
            // Top-level literal initializers were pushed by the prologue.
            Some(init) if nested || !init.is_literal() => {
                self.compile_expression(init)?;
                self.emit(Instruction::store_bp_rel(offset));
            }
            None if nested => {
                self.emit(Instruction::push_int(0));
                self.emit(Instruction::store_bp_rel(offset));
            }
            _ => {}
        }
        Ok(())
    }

    fn expect_single_argument(name: &str, arguments: &[Statement]) -> Result<(), CompileError> {
        if arguments.len() != 1 {
            return Err(CompileError::ArgumentCount {
                name: name.to_string(),
                expected: 1,
                received: arguments.len(),
            });
        }
        Ok(())
    }

    fn lower_return(&mut self, arguments: &'ast [Statement]) -> Result<(), CompileError> {
        Self::expect_single_argument("return", arguments)?;
        if !self.returns_value {
            return Err(CompileError::ReturnWithoutValueSlot {
                function: self.frame.function().to_string(),
            });
        }
        self.compile_expression(&arguments[0])?;
        self.emit(Instruction::store_bp_rel(self.frame.return_slot()));
        let jump = self.emit(Instruction::jump_by(0));
        self.pending_returns.push(jump);
        Ok(())
    }

    fn lower_print(&mut self, arguments: &'ast [Statement]) -> Result<(), CompileError> {
        Self::expect_single_argument("printNum", arguments)?;
        self.compile_expression(&arguments[0])?;
        self.emit(Instruction::print_int());
        Ok(())
    }

    /// Caller reserves the result slot, pushes arguments, and pops the
    /// arguments after the call. The result slot stays for the use site.
    fn lower_call(&mut self, name: &str, arguments: &'ast [Statement]) -> Result<bool, CompileError> {
        let signature = *self
            .compiler
            .signatures
            .get(name)
            .ok_or_else(|| CompileError::UnknownFunction {
                name: name.to_string(),
            })?;
        if signature.arity != arguments.len() {
            return Err(CompileError::ArgumentCount {
                name: name.to_string(),
                expected: signature.arity,
                received: arguments.len(),
            });
        }

        if signature.returns_value {
            self.emit(Instruction::push_int(0));
        }
        for arg in arguments {
            self.compile_expression(arg)?;
        }
        self.compiler.emit_call(self.frame.function(), name)?;
        for _ in arguments {
            self.emit(Instruction::pop_int());
        }
        Ok(signature.returns_value)
    }

    fn lower_operator(&mut self, operator: &str, operands: &'ast [Statement]) -> Result<bool, CompileError> {
        if !matches!(operator, "+" | "<" | "=") {
            return Err(CompileError::UnknownOperator {
                operator: operator.to_string(),
            });
        }
        let [lhs, rhs] = operands else {
            return Err(CompileError::OperatorArity {
                operator: operator.to_string(),
                received: operands.len(),
            });
        };

        if operator == "=" {
            self.lower_assignment(lhs, rhs)?;
            return Ok(false);
        }
        self.compile_expression(lhs)?;
        self.compile_expression(rhs)?;
        if operator == "+" {
            self.emit(Instruction::add_int());
        } else {
            self.emit(Instruction::compare_int_less());
        }
        Ok(true)
    }

    fn lower_assignment(&mut self, target: &'ast Statement, value: &'ast Statement) -> Result<(), CompileError> {
        let Statement::VariableName { name } = target else {
            return Err(CompileError::InvalidAssignmentTarget {
                found: target.describe(),
            });
        };
        let offset = match self.frame.local(name) {
            Some(offset) => offset,
            None if self.frame.is_parameter(name) => {
                return Err(CompileError::AssignToParameter {
                    function: self.frame.function().to_string(),
                    name: name.clone(),
                })
            }
            None => return Err(self.unknown_variable(name)),
        };
        self.compile_expression(value)?;
        self.emit(Instruction::store_bp_rel(offset));
        Ok(())
    }

    fn lower_load(&mut self, name: &str) -> Result<(), CompileError> {
        let offset = self
            .frame
            .local(name)
            .or_else(|| self.frame.parameter(name))
            .ok_or_else(|| self.unknown_variable(name))?;
        self.emit(Instruction::load_bp_rel(offset));
        Ok(())
    }

    /// ```text
    /// cond:  <condition>
    ///        JUMP_BY_IF_ZERO end
    ///        <body>
    ///        JUMP_BY cond
    /// end:
    /// ```
    fn lower_while(&mut self, condition: &'ast Statement, body: &'ast [Statement]) -> Result<(), CompileError> {
        let function = self.frame.function();
        let condition_at = self.compiler.code.len();
        self.compile_expression(condition)?;
        let exit_jump = self.emit(Instruction::jump_by_if_zero(0));

        self.loop_depth += 1;
        for stmt in body {
            self.compile_statement(stmt)?;
        }
        self.loop_depth -= 1;

        let back_jump = self.emit(Instruction::jump_by(0));
        self.compiler.patch_jump(back_jump, condition_at, function)?;
        let end = self.compiler.code.len();
        self.compiler.patch_jump(exit_jump, end, function)?;
        Ok(())
    }

    fn unknown_variable(&self, name: &str) -> CompileError {
        CompileError::UnknownVariable {
            function: self.frame.function().to_string(),
            name: name.to_string(),
        }
    }
}

/// Parse an `int32` literal into the VM's 16-bit integer.
fn parse_literal(ty: Type, value: &str) -> Result<i16, CompileError> {
    if ty != Type::Int32 {
        return Err(CompileError::UnsupportedType {
            subject: format!("literal {value}"),
            ty,
        });
    }
    value
        .trim()
        .parse::<i16>()
        .map_err(|_| CompileError::InvalidLiteral {
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FunctionDefinition;
    use pretty_assertions::assert_eq;

    fn compile_one(def: &FunctionDefinition) -> Result<Vec<Instruction>, CompileError> {
        let mut compiler = Compiler::new();
        compiler.compile_function(def)?;
        Ok(compiler.finish()?.instructions)
    }

    #[test]
    fn parse_literal_range() {
        assert_eq!(parse_literal(Type::Int32, "42"), Ok(42));
        assert_eq!(parse_literal(Type::Int32, "-1"), Ok(-1));
        assert_eq!(parse_literal(Type::Int32, " 7 "), Ok(7));
        assert_eq!(parse_literal(Type::Int32, "32767"), Ok(i16::MAX));
        assert_eq!(
            parse_literal(Type::Int32, "32768"),
            Err(CompileError::InvalidLiteral {
                value: "32768".to_string()
            })
        );
        assert!(parse_literal(Type::Int32, "4x").is_err());
    }

    #[test]
    fn parse_literal_rejects_other_types() {
        assert_eq!(
            parse_literal(Type::Double, "1.5"),
            Err(CompileError::UnsupportedType {
                subject: "literal 1.5".to_string(),
                ty: Type::Double
            })
        );
    }

    #[test]
    fn empty_void_function_is_just_return() {
        let def = FunctionDefinition::new("f", &[], false, vec![]);
        assert_eq!(compile_one(&def).unwrap(), [Instruction::ret()]);
    }

    #[test]
    fn top_level_literal_declaration_only_in_prologue() {
        let def = FunctionDefinition::new(
            "f",
            &[],
            false,
            vec![Statement::declare("x", Some(Statement::literal(5)))],
        );
        assert_eq!(
            compile_one(&def).unwrap(),
            [Instruction::push_int(5), Instruction::pop_int(), Instruction::ret()]
        );
    }

    #[test]
    fn computed_declaration_stores_after_prologue() {
        let def = FunctionDefinition::new(
            "f",
            &["n"],
            false,
            vec![Statement::declare(
                "x",
                Some(Statement::operator("+", Statement::var("n"), Statement::literal(1))),
            )],
        );
        assert_eq!(
            compile_one(&def).unwrap(),
            [
                Instruction::push_int(0),
                Instruction::load_bp_rel(-2),
                Instruction::push_int(1),
                Instruction::add_int(),
                Instruction::store_bp_rel(0),
                Instruction::pop_int(),
                Instruction::ret(),
            ]
        );
    }

    #[test]
    fn declaration_in_loop_reinitialises() {
        let def = FunctionDefinition::new(
            "f",
            &[],
            false,
            vec![Statement::while_loop(
                Statement::literal(0),
                vec![Statement::declare("t", Some(Statement::literal(3)))],
            )],
        );
        assert_eq!(
            compile_one(&def).unwrap(),
            [
                Instruction::push_int(0),         // t, hoisted
                Instruction::push_int(0),         // condition
                Instruction::jump_by_if_zero(4),  // -> 6
                Instruction::push_int(3),
                Instruction::store_bp_rel(0),
                Instruction::jump_by(-4),         // -> 1
                Instruction::pop_int(),
                Instruction::ret(),
            ]
        );
    }

    #[test]
    fn value_in_statement_position_is_discarded() {
        let def = FunctionDefinition::new(
            "f",
            &["n"],
            false,
            vec![Statement::operator("<", Statement::var("n"), Statement::literal(2))],
        );
        assert_eq!(
            compile_one(&def).unwrap(),
            [
                Instruction::load_bp_rel(-2),
                Instruction::push_int(2),
                Instruction::compare_int_less(),
                Instruction::pop_int(),
                Instruction::ret(),
            ]
        );
    }

    #[test]
    fn multiple_returns_patch_to_epilogue() {
        let def = FunctionDefinition::new(
            "f",
            &[],
            true,
            vec![
                Statement::ret(Statement::literal(1)),
                Statement::ret(Statement::literal(2)),
            ],
        );
        assert_eq!(
            compile_one(&def).unwrap(),
            [
                Instruction::push_int(1),
                Instruction::store_bp_rel(-2),
                Instruction::jump_by(4), // -> 6
                Instruction::push_int(2),
                Instruction::store_bp_rel(-2),
                Instruction::jump_by(1), // -> 6
                Instruction::ret(),
            ]
        );
    }

    #[test]
    fn unknown_function_emits_nothing_for_call_site() {
        let def = FunctionDefinition::new(
            "f",
            &[],
            false,
            vec![
                Statement::print(Statement::literal(1)),
                Statement::call("nope", vec![Statement::literal(2)]),
            ],
        );
        let mut compiler = Compiler::new();
        let err = compiler.compile_function(&def).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnknownFunction {
                name: "nope".to_string()
            }
        );
        // Only the printNum statement was emitted.
        assert_eq!(
            compiler.code,
            [Instruction::push_int(1), Instruction::print_int()]
        );
    }

    #[test]
    fn assignment_to_parameter_rejected() {
        let def = FunctionDefinition::new(
            "f",
            &["p"],
            false,
            vec![Statement::assign("p", Statement::literal(1))],
        );
        assert_eq!(
            compile_one(&def).unwrap_err(),
            CompileError::AssignToParameter {
                function: "f".to_string(),
                name: "p".to_string()
            }
        );
    }

    #[test]
    fn assignment_target_must_be_name() {
        let def = FunctionDefinition::new(
            "f",
            &[],
            false,
            vec![Statement::operator("=", Statement::literal(1), Statement::literal(2))],
        );
        assert_eq!(
            compile_one(&def).unwrap_err(),
            CompileError::InvalidAssignmentTarget {
                found: "literal 1".to_string()
            }
        );
    }

    #[test]
    fn return_needs_value_slot() {
        let def = FunctionDefinition::new("f", &[], false, vec![Statement::ret(Statement::literal(1))]);
        assert_eq!(
            compile_one(&def).unwrap_err(),
            CompileError::ReturnWithoutValueSlot {
                function: "f".to_string()
            }
        );
    }

    #[test]
    fn print_requires_one_argument() {
        let def = FunctionDefinition::new("f", &[], false, vec![Statement::call("printNum", vec![])]);
        assert_eq!(
            compile_one(&def).unwrap_err(),
            CompileError::ArgumentCount {
                name: "printNum".to_string(),
                expected: 1,
                received: 0
            }
        );
    }

    #[test]
    fn assignment_is_not_a_value() {
        let def = FunctionDefinition::new(
            "f",
            &[],
            false,
            vec![
                Statement::declare("x", None),
                Statement::print(Statement::assign("x", Statement::literal(1))),
            ],
        );
        assert_eq!(
            compile_one(&def).unwrap_err(),
            CompileError::NotAValue {
                construct: "operator \"=\"".to_string()
            }
        );
    }

    #[test]
    fn declaration_is_not_a_value() {
        let def = FunctionDefinition::new(
            "f",
            &[],
            false,
            vec![Statement::print(Statement::declare("x", None))],
        );
        assert_eq!(
            compile_one(&def).unwrap_err(),
            CompileError::NotAValue {
                construct: "declaration of \"x\"".to_string()
            }
        );
    }
}

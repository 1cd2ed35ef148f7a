//! Compile errors for the minic code generator.

use crate::ast::Type;
use thiserror::Error;

/// Errors that abort code generation.
///
/// Compilation stops at the first error; no partial program is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A name that is neither a local nor a parameter of the function.
    #[error("unknown variable \"{name}\" in function \"{function}\"")]
    UnknownVariable { function: String, name: String },

    /// A call to a function that was never defined.
    #[error("unknown function \"{name}\" called")]
    UnknownFunction { name: String },

    /// A call with the wrong number of arguments.
    #[error("function {name} requires {expected} arguments, but received {received}")]
    ArgumentCount {
        name: String,
        expected: usize,
        received: usize,
    },

    /// An operator applied to other than two operands.
    #[error("wrong number of operands passed to operator \"{operator}\" (expected 2, received {received})")]
    OperatorArity { operator: String, received: usize },

    /// An operator other than `+`, `<`, `=`.
    #[error("unknown operator \"{operator}\"")]
    UnknownOperator { operator: String },

    /// The left side of `=` is not a variable name.
    #[error("left side of \"=\" must be a variable, found {found}")]
    InvalidAssignmentTarget { found: String },

    /// `=` targeting a parameter; only locals are assignable.
    #[error("cannot assign to parameter \"{name}\" in function \"{function}\"")]
    AssignToParameter { function: String, name: String },

    /// Two functions with the same name.
    #[error("function \"{name}\" defined more than once")]
    DuplicateFunction { name: String },

    /// A user function named like a built-in.
    #[error("\"{name}\" is reserved and cannot name a function")]
    ReservedName { name: String },

    /// Two locals (or two parameters) with the same name in one function.
    #[error("variable \"{name}\" declared more than once in function \"{function}\"")]
    DuplicateVariable { function: String, name: String },

    /// A literal that is not an integer in 16-bit range.
    #[error("invalid integer literal \"{value}\"")]
    InvalidLiteral { value: String },

    /// A type other than `int32`.
    #[error("unsupported type {ty} for {subject}")]
    UnsupportedType { subject: String, ty: Type },

    /// `return` inside a function that has no return-value slot.
    #[error("function \"{function}\" does not return a value")]
    ReturnWithoutValueSlot { function: String },

    /// A construct without a value used where one is needed.
    #[error("{construct} does not produce a value")]
    NotAValue { construct: String },

    /// A jump, call, or frame offset that does not fit in 16 bits.
    #[error("offset out of 16-bit range in function \"{function}\"")]
    OffsetOutOfRange { function: String },
}

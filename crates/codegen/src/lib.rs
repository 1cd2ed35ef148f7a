//! minic code generator: lowers function definitions to VM bytecode.
//!
//! Input is the syntax tree delivered by an external parser
//! ([`ast`]). Output is a [`Program`](minic_common::Program): one flat
//! instruction stream holding every function, plus the function table
//! giving each entry offset, arity, and return flag.
//!
//! # Usage
//!
//! ```
//! use minic_codegen::ast::{FunctionDefinition, Statement};
//! use minic_codegen::compile;
//!
//! let main = FunctionDefinition::new(
//!     "main",
//!     &[],
//!     true,
//!     vec![Statement::ret(Statement::operator(
//!         "+",
//!         Statement::literal(40),
//!         Statement::literal(2),
//!     ))],
//! );
//! let program = compile(&[main]).unwrap();
//! assert_eq!(program.entry("main").unwrap().offset, 0);
//! ```
//!
//! # Calling convention
//!
//! The caller reserves a zeroed result slot (value-returning callees only),
//! pushes the arguments left to right, and executes `CALL`, which saves the
//! base index. The callee addresses everything relative to its base; see
//! the layout in `frame.rs`. After the call returns, the caller pops its
//! arguments; the result slot is left for the expression that used the call.

pub mod ast;
pub mod compiler;
pub mod error;

mod frame;
mod lower;

pub use compiler::{compile, Compiler, BUILTINS};
pub use error::CompileError;

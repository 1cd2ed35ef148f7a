//! Syntax tree consumed by the code generator.
//!
//! The tree is produced by an external parser. Every node derives serde's
//! `Serialize`/`Deserialize` so a parser in any language can hand it over
//! as JSON. Statements are internally tagged by `kind`:
//!
//! ```json
//! { "kind": "operator_call", "operator": "+",
//!   "operands": [ { "kind": "variable_name", "name": "x" },
//!                 { "kind": "literal", "value": "1" } ] }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a variable, parameter, or literal.
///
/// Only [`Type::Int32`] can be compiled; it is stored as a 16-bit value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Void,
    Int8,
    UInt8,
    #[default]
    Int32,
    UInt32,
    Double,
    Struct,
}

impl Type {
    /// Name as written in source.
    pub fn name(&self) -> &'static str {
        match self {
            Type::Void => "void",
            Type::Int8 => "int8",
            Type::UInt8 => "uint8",
            Type::Int32 => "int32",
            Type::UInt32 => "uint32",
            Type::Double => "double",
            Type::Struct => "struct",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One node of a function body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    /// `int32 name = initializer;`
    VariableDeclaration {
        name: String,
        #[serde(rename = "type", default)]
        ty: Type,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        initializer: Option<Box<Statement>>,
    },
    /// `name(arguments...)`. `return` and `printNum` are spelled this way too.
    FunctionCall {
        name: String,
        #[serde(default)]
        arguments: Vec<Statement>,
    },
    /// Integer literal, kept as source text.
    Literal {
        #[serde(rename = "type", default)]
        ty: Type,
        value: String,
    },
    /// `lhs op rhs` for `+`, `<`, and `=`.
    OperatorCall {
        operator: String,
        operands: Vec<Statement>,
    },
    /// Reference to a local or parameter.
    VariableName { name: String },
    /// `while (condition) { body }`
    WhileLoop {
        condition: Box<Statement>,
        body: Vec<Statement>,
    },
}

impl Statement {
    pub fn declare(name: &str, initializer: Option<Statement>) -> Self {
        Statement::VariableDeclaration {
            name: name.to_string(),
            ty: Type::Int32,
            initializer: initializer.map(Box::new),
        }
    }

    pub fn call(name: &str, arguments: Vec<Statement>) -> Self {
        Statement::FunctionCall {
            name: name.to_string(),
            arguments,
        }
    }

    pub fn literal(value: i64) -> Self {
        Statement::Literal {
            ty: Type::Int32,
            value: value.to_string(),
        }
    }

    pub fn operator(operator: &str, lhs: Statement, rhs: Statement) -> Self {
        Statement::OperatorCall {
            operator: operator.to_string(),
            operands: vec![lhs, rhs],
        }
    }

    pub fn assign(name: &str, value: Statement) -> Self {
        Self::operator("=", Self::var(name), value)
    }

    pub fn var(name: &str) -> Self {
        Statement::VariableName {
            name: name.to_string(),
        }
    }

    pub fn while_loop(condition: Statement, body: Vec<Statement>) -> Self {
        Statement::WhileLoop {
            condition: Box::new(condition),
            body,
        }
    }

    /// `return(value)`
    pub fn ret(value: Statement) -> Self {
        Self::call("return", vec![value])
    }

    /// `printNum(value)`
    pub fn print(value: Statement) -> Self {
        Self::call("printNum", vec![value])
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Statement::Literal { .. })
    }

    /// Short description for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Statement::VariableDeclaration { name, .. } => format!("declaration of \"{name}\""),
            Statement::FunctionCall { name, .. } => format!("call to \"{name}\""),
            Statement::Literal { value, .. } => format!("literal {value}"),
            Statement::OperatorCall { operator, .. } => format!("operator \"{operator}\""),
            Statement::VariableName { name } => format!("variable \"{name}\""),
            Statement::WhileLoop { .. } => "while loop".to_string(),
        }
    }
}

/// A named, typed parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: Type,
}

impl ParameterDefinition {
    pub fn int(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ty: Type::Int32,
        }
    }
}

/// A function as delivered by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDefinition>,
    #[serde(default)]
    pub returns_value: bool,
    #[serde(default)]
    pub statements: Vec<Statement>,
}

impl FunctionDefinition {
    /// Function with `int32` parameters named `parameters`.
    pub fn new(
        name: &str,
        parameters: &[&str],
        returns_value: bool,
        statements: Vec<Statement>,
    ) -> Self {
        Self {
            name: name.to_string(),
            parameters: parameters.iter().map(|p| ParameterDefinition::int(p)).collect(),
            returns_value,
            statements,
        }
    }
}

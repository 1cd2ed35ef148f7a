//! Stack layout of one function's frame.
//!
//! For a function with `N` parameters, relative to the base index:
//!
//! ```text
//! -2 - N        return-value slot (value-returning functions only)
//! -1 - N + i    parameter i
//! -1            caller's saved base index
//!  0 ..         locals, in declaration order
//! ```

use crate::ast::{FunctionDefinition, Type};
use crate::error::CompileError;
use std::collections::HashMap;

/// Local-variable offsets and parameter indices for one function.
#[derive(Debug)]
pub(crate) struct Frame<'ast> {
    function: &'ast str,
    locals: HashMap<&'ast str, i16>,
    parameters: HashMap<&'ast str, usize>,
    param_count: usize,
}

impl<'ast> Frame<'ast> {
    /// Build the parameter map of `def`. No locals are declared yet.
    pub(crate) fn new(def: &'ast FunctionDefinition) -> Result<Self, CompileError> {
        let mut parameters = HashMap::new();
        for (index, param) in def.parameters.iter().enumerate() {
            if param.ty != Type::Int32 {
                return Err(CompileError::UnsupportedType {
                    subject: format!("parameter \"{}\"", param.name),
                    ty: param.ty,
                });
            }
            if parameters.insert(param.name.as_str(), index).is_some() {
                return Err(CompileError::DuplicateVariable {
                    function: def.name.clone(),
                    name: param.name.clone(),
                });
            }
        }

        let frame = Self {
            function: &def.name,
            locals: HashMap::new(),
            parameters,
            param_count: def.parameters.len(),
        };
        // The deepest slot must be addressable.
        frame.offset(-2 - frame.param_count as i64)?;
        Ok(frame)
    }

    /// Give `name` the next local slot and return its offset.
    pub(crate) fn declare_local(&mut self, name: &'ast str) -> Result<i16, CompileError> {
        let offset = self.offset(self.locals.len() as i64)?;
        if self.locals.insert(name, offset).is_some() {
            return Err(CompileError::DuplicateVariable {
                function: self.function.to_string(),
                name: name.to_string(),
            });
        }
        Ok(offset)
    }

    pub(crate) fn local(&self, name: &str) -> Option<i16> {
        self.locals.get(name).copied()
    }

    pub(crate) fn is_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    /// Base-relative offset of parameter `name`.
    pub(crate) fn parameter(&self, name: &str) -> Option<i16> {
        let index = *self.parameters.get(name)?;
        // In range: `new` checked the deepest slot.
        Some((-1 - self.param_count as i64 + index as i64) as i16)
    }

    /// Base-relative offset of the return-value slot.
    pub(crate) fn return_slot(&self) -> i16 {
        (-2 - self.param_count as i64) as i16
    }

    pub(crate) fn local_count(&self) -> usize {
        self.locals.len()
    }

    pub(crate) fn function(&self) -> &'ast str {
        self.function
    }

    fn offset(&self, value: i64) -> Result<i16, CompileError> {
        i16::try_from(value).map_err(|_| CompileError::OffsetOutOfRange {
            function: self.function.to_string(),
        })
    }
}

//! Function symbol table: name to entry offset and calling metadata.

use std::collections::HashMap;

/// Calling metadata for one compiled function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionEntry {
    /// Function name as written in the source.
    pub name: String,
    /// Index of the function's first instruction.
    pub offset: usize,
    /// Number of parameters.
    pub arity: usize,
    /// Whether callers reserve a return-value slot.
    pub returns_value: bool,
}

/// All functions of a program, kept in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionTable {
    entries: Vec<FunctionEntry>,
    by_name: HashMap<String, usize>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function. Returns `false` (and leaves the table unchanged)
    /// if a function with the same name is already present.
    pub fn insert(&mut self, entry: FunctionEntry) -> bool {
        if self.by_name.contains_key(&entry.name) {
            return false;
        }
        self.by_name.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
        true
    }

    /// Look up a function by name.
    pub fn get(&self, name: &str) -> Option<&FunctionEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    /// The function whose first instruction is at `offset`, if any.
    pub fn at_offset(&self, offset: usize) -> Option<&FunctionEntry> {
        self.entries.iter().find(|e| e.offset == offset)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

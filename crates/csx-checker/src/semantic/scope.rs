use std::collections::HashMap;

use csx_common::Position;
use log::trace;

use super::symbols::{SymbolDetail, SymbolInfo};

/// Failures of the symbol table itself.
///
/// `Duplicate` is expected during checking and is turned into a diagnostic
/// by the caller; the other variants mean the traversal opened and closed
/// scopes out of order.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SymbolTableError {
    #[error("no scope is open")]
    NoOpenScope,
    #[error("`{name}` is already declared in this scope")]
    Duplicate { name: String, previous: Position },
    #[error("no binding for `{name}` at scope level {level}")]
    MissingBinding { name: String, level: usize },
}

/// A single nested binding set.
pub type Scope = HashMap<String, SymbolInfo>;

/// Stack of lexical scopes. Only the innermost scope accepts insertions.
#[derive(Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    /// Create a table with no scope open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new empty scope and make it current.
    pub fn open_scope(&mut self) {
        self.scopes.push(Scope::new());
        trace!("opened scope level {}", self.scopes.len() - 1);
    }

    /// Pop the current scope.
    pub fn close_scope(&mut self) -> Result<(), SymbolTableError> {
        self.scopes.pop().ok_or(SymbolTableError::NoOpenScope)?;
        trace!("closed scope level {}", self.scopes.len());
        Ok(())
    }

    /// Number of open scopes.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Bind a symbol in the current scope.
    pub fn insert(&mut self, info: SymbolInfo) -> Result<(), SymbolTableError> {
        let scope = self
            .scopes
            .last_mut()
            .ok_or(SymbolTableError::NoOpenScope)?;
        if let Some(existing) = scope.get(&info.name) {
            return Err(SymbolTableError::Duplicate {
                name: info.name.clone(),
                previous: existing.defined_at,
            });
        }
        trace!("bound {}", info);
        scope.insert(info.name.clone(), info);
        Ok(())
    }

    /// Look up a name in the current scope only.
    pub fn local_lookup(&self, name: &str) -> Option<&SymbolInfo> {
        self.scopes.last().and_then(|scope| scope.get(name))
    }

    /// Look up a name from the current scope outward; the innermost binding wins.
    pub fn global_lookup(&self, name: &str) -> Option<&SymbolInfo> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Mark a label bound in the current scope as no longer visible.
    ///
    /// Returns `false` if the current scope has no label by that name.
    pub fn hide_label(&mut self, name: &str) -> bool {
        match self
            .scopes
            .last_mut()
            .and_then(|scope| scope.get_mut(name))
            .map(|info| &mut info.detail)
        {
            Some(SymbolDetail::Label { visible }) => {
                *visible = false;
                true
            }
            _ => false,
        }
    }

    /// Record the parameter list of a method bound at scope `level`
    /// (as reported by [`depth`](Self::depth) before its own scope opened).
    pub fn commit_params(
        &mut self,
        level: usize,
        name: &str,
        params: Vec<SymbolInfo>,
    ) -> Result<(), SymbolTableError> {
        let missing = || SymbolTableError::MissingBinding {
            name: name.to_string(),
            level,
        };
        let info = level
            .checked_sub(1)
            .and_then(|idx| self.scopes.get_mut(idx))
            .and_then(|scope| scope.get_mut(name))
            .ok_or_else(missing)?;
        match &mut info.detail {
            SymbolDetail::Method(sig) => {
                sig.params = params;
                Ok(())
            }
            _ => Err(missing()),
        }
    }
}

impl std::fmt::Display for SymbolTable {
    /// Innermost scope first, one line per scope, names sorted.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for scope in self.scopes.iter().rev() {
            let mut names: Vec<_> = scope.values().map(|info| info.to_string()).collect();
            names.sort();
            writeln!(f, "{{{}}}", names.join(", "))?;
        }
        Ok(())
    }
}

//! Scoped symbol table
//!
//! A stack of scope frames. Frame 0 is the global scope; every block
//! pushes a frame on entry and pops it on exit, which drops exactly the
//! symbols declared inside that block.

use std::collections::HashMap;

use log::debug;

use crate::frontend::ast::Type;
use crate::utils::{Error, Result, Span};

/// A declared variable
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
    /// Nesting depth at declaration (0 = global)
    pub scope_level: usize,
    pub line_declared: usize,
    pub is_initialized: bool,
}

/// One scope frame. Symbols keep declaration order; `index` maps a name
/// to its slot.
#[derive(Debug, Default)]
struct Scope {
    symbols: Vec<Symbol>,
    index: HashMap<String, usize>,
}

impl Scope {
    fn get(&self, name: &str) -> Option<&Symbol> {
        self.index.get(name).map(|&slot| &self.symbols[slot])
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        let slot = *self.index.get(name)?;
        self.symbols.get_mut(slot)
    }
}

/// Symbol table with nested scopes
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    /// Current nesting depth (0 = global)
    pub fn current_level(&self) -> usize {
        self.scopes.len() - 1
    }

    fn current(&self) -> &Scope {
        &self.scopes[self.scopes.len() - 1]
    }

    /// Enter a new scope
    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::default());
        debug!("enter scope {}", self.current_level());
    }

    /// Exit the current scope, discarding everything declared in it.
    /// Every `exit_scope` pairs with an `enter_scope`; the global scope
    /// is never popped.
    pub fn exit_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "exit_scope called on the global scope");
        if self.scopes.len() == 1 {
            return;
        }
        let level = self.current_level();
        if let Some(scope) = self.scopes.pop() {
            debug!("exit scope {} ({} symbols dropped)", level, scope.symbols.len());
        }
    }

    /// Declare `name` in the current scope. Shadowing an outer declaration
    /// is allowed; a second declaration in the same scope is rejected and
    /// the first binding is kept.
    pub fn declare(&mut self, name: &str, ty: Type, span: Span) -> Result<&Symbol> {
        if let Some(existing) = self.lookup_in_current_scope(name) {
            return Err(Error::RedeclaredVariable {
                name: name.to_string(),
                previous_line: existing.line_declared,
                span,
            });
        }

        let scope_level = self.current_level();
        let symbol = Symbol {
            name: name.to_string(),
            ty,
            scope_level,
            line_declared: span.line,
            is_initialized: false,
        };
        debug!("declare '{}' at scope {}", name, scope_level);

        let last = self.scopes.len() - 1;
        let scope = &mut self.scopes[last];
        let slot = scope.symbols.len();
        scope.index.insert(symbol.name.clone(), slot);
        scope.symbols.push(symbol);
        Ok(&scope.symbols[slot])
    }

    /// Look up a symbol, searching from the innermost scope outward
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.scopes.iter_mut().rev().find_map(|scope| scope.get_mut(name))
    }

    /// Look up a symbol only in the current scope
    pub fn lookup_in_current_scope(&self, name: &str) -> Option<&Symbol> {
        self.current().get(name)
    }

    /// Global symbols in declaration order
    pub fn globals(&self) -> &[Symbol] {
        &self.scopes[0].symbols
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_line(line: usize) -> Span {
        Span::new(0, 1, line, 1)
    }

    #[test]
    fn test_declare_and_lookup() {
        let mut table = SymbolTable::new();
        let symbol = table.declare("x", Type::Int, at_line(3)).unwrap();
        assert_eq!(symbol.scope_level, 0);
        assert_eq!(symbol.line_declared, 3);
        assert!(!symbol.is_initialized);
        assert!(table.lookup("x").is_some());
        assert!(table.lookup("y").is_none());
    }

    #[test]
    fn test_redeclaration_keeps_first_binding() {
        let mut table = SymbolTable::new();
        table.declare("x", Type::Int, at_line(1)).unwrap();
        let err = table.declare("x", Type::Int, at_line(2)).unwrap_err();
        assert!(matches!(err, Error::RedeclaredVariable { previous_line: 1, .. }));
        assert_eq!(table.lookup("x").unwrap().line_declared, 1);
        assert_eq!(table.globals().len(), 1);
    }

    #[test]
    fn test_shadowing() {
        let mut table = SymbolTable::new();
        table.declare("x", Type::Int, at_line(1)).unwrap();
        table.enter_scope();
        assert!(table.lookup_in_current_scope("x").is_none());
        table.declare("x", Type::Int, at_line(2)).unwrap();
        assert_eq!(table.lookup("x").unwrap().scope_level, 1);

        table.exit_scope();
        assert_eq!(table.lookup("x").unwrap().scope_level, 0);
    }

    #[test]
    fn test_exit_scope_purges_only_that_scope() {
        let mut table = SymbolTable::new();
        table.declare("a", Type::Int, at_line(1)).unwrap();
        table.enter_scope();
        table.declare("b", Type::Int, at_line(2)).unwrap();
        table.enter_scope();
        table.declare("c", Type::Int, at_line(3)).unwrap();
        table.declare("d", Type::Int, at_line(4)).unwrap();

        table.exit_scope();
        assert!(table.lookup("c").is_none());
        assert!(table.lookup("d").is_none());
        assert!(table.lookup("b").is_some());

        table.exit_scope();
        assert!(table.lookup("b").is_none());
        assert!(table.lookup("a").is_some());
        assert_eq!(table.current_level(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "global scope")]
    fn test_exit_global_scope_is_a_bug() {
        let mut table = SymbolTable::new();
        table.exit_scope();
    }

    #[test]
    fn test_lookup_mut_marks_innermost() {
        let mut table = SymbolTable::new();
        table.declare("x", Type::Int, at_line(1)).unwrap();
        table.enter_scope();
        table.declare("x", Type::Int, at_line(2)).unwrap();
        table.lookup_mut("x").unwrap().is_initialized = true;
        table.exit_scope();
        assert!(!table.lookup("x").unwrap().is_initialized);
    }

    #[test]
    fn test_globals_in_declaration_order() {
        let mut table = SymbolTable::new();
        for (line, name) in ["z", "a", "m"].iter().enumerate() {
            table.declare(name, Type::Int, at_line(line + 1)).unwrap();
        }
        let names: Vec<_> = table.globals().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }
}

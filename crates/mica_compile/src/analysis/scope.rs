//! Lexically scoped symbol tables.
//!
//! The analyzer keeps three independent name spaces: functions and
//! structs live in flat global maps, variables live in a stack of
//! scopes. Lookup walks from the innermost scope to the root;
//! declaration checks only the current scope, so an inner scope may
//! shadow an outer name but a name can never be declared twice in the
//! same scope.
//!
//! Tables store [`NodeRef`]s back into the AST — lookups, not ownership.

use std::collections::HashMap;

use mica_base::Symbol;
use mica_language::NodeRef;

/// A stack of variable scopes with parent-chained lookup.
pub struct ScopeStack {
    scopes: Vec<HashMap<Symbol, NodeRef>>,
}

impl ScopeStack {
    /// Creates the stack with a single root scope.
    pub fn new() -> Self {
        Self { scopes: vec![HashMap::new()] }
    }

    pub fn push(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        debug_assert!(self.scopes.len() > 1, "cannot pop the root scope");
        self.scopes.pop();
    }

    /// Declares `name` in the current scope. Returns `false` if the
    /// current scope already has it.
    pub fn declare(&mut self, name: Symbol, decl: NodeRef) -> bool {
        let scope = self.scopes.last_mut().expect("scope stack is never empty");
        if scope.contains_key(&name) {
            return false;
        }
        scope.insert(name, decl);
        true
    }

    /// `true` if the current scope itself already declares `name`.
    pub fn declared_in_current(&self, name: Symbol) -> bool {
        self.scopes
            .last()
            .expect("scope stack is never empty")
            .contains_key(&name)
    }

    /// Resolves `name`, walking from the innermost scope to the root.
    pub fn lookup(&self, name: Symbol) -> Option<NodeRef> {
        for scope in self.scopes.iter().rev() {
            if let Some(&decl) = scope.get(&name) {
                return Some(decl);
            }
        }
        None
    }

}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

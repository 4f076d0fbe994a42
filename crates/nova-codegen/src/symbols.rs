//! Per-function symbol table
//!
//! Maps a statement's result binding name to the IR value it produced. One
//! table exists per function's lowering and is discarded with it; bindings
//! never cross function boundaries. The lowered AST is SSA-shaped, so a
//! name binds at most once; a second binding of the same name is an error
//! rather than a silent overwrite.

use cranelift_codegen::ir;
use rustc_hash::FxHashMap;

use crate::error::CodegenError;

/// Binding-name → IR value map, scoped to one function.
#[derive(Debug, Default)]
pub struct SymbolTable {
    bindings: FxHashMap<String, ir::Value>,
}

impl SymbolTable {
    /// Create an empty table.
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Bind `name` to `value`.
    ///
    /// Rebinding an existing name fails with
    /// [`CodegenError::DuplicateBinding`].
    pub fn bind(&mut self, name: &str, value: ir::Value) -> Result<(), CodegenError> {
        if self.bindings.contains_key(name) {
            return Err(CodegenError::DuplicateBinding(name.to_string()));
        }
        self.bindings.insert(name.to_string(), value);
        Ok(())
    }

    /// Look up a binding by name.
    pub fn lookup(&self, name: &str) -> Option<ir::Value> {
        self.bindings.get(name).copied()
    }

    /// Number of live bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the table holds no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranelift_codegen::entity::EntityRef;

    #[test]
    fn binds_and_looks_up() {
        let mut table = SymbolTable::new();
        assert!(table.is_empty());

        let v0 = ir::Value::new(0);
        table.bind("sum", v0).unwrap();
        assert_eq!(table.lookup("sum"), Some(v0));
        assert_eq!(table.lookup("other"), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn rebinding_is_an_error() {
        let mut table = SymbolTable::new();
        table.bind("x", ir::Value::new(0)).unwrap();
        let err = table.bind("x", ir::Value::new(1)).unwrap_err();
        assert!(matches!(err, CodegenError::DuplicateBinding(name) if name == "x"));
        // The original binding survives
        assert_eq!(table.lookup("x"), Some(ir::Value::new(0)));
    }
}

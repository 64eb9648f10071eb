//! Function registry and built-in functions

pub mod lookup;
pub mod text;

use crate::error::ExprResult;
use crate::evaluator::{EvaluationContext, Value};
use ahash::AHashMap;
use once_cell::sync::Lazy;
use std::collections::BTreeSet;

/// Function implementation signature
///
/// Receives evaluated positional arguments, evaluated keyword arguments in
/// call order, and the evaluation context (variables, lookup tables).
pub type FunctionImpl =
    fn(&[Value], &[(String, Value)], &EvaluationContext) -> ExprResult<Value>;

/// Function definition
pub struct FunctionDef {
    /// Function name as written in expressions
    pub name: &'static str,
    /// Minimum positional arguments
    pub min_args: usize,
    /// Maximum positional arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
    /// Result carries an `output` field that downstream consumers read
    /// instead of the call result itself
    pub resolvable: bool,
}

/// Function registry
#[derive(Default)]
pub struct FunctionRegistry {
    functions: AHashMap<String, FunctionDef>,
}

static BUILTINS: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::with_builtins);

/// Shared registry holding the built-in functions
pub fn builtin_registry() -> &'static FunctionRegistry {
    &BUILTINS
}

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with all built-in functions
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_text_functions();
        registry.register_lookup_functions();
        registry
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name)
    }

    /// Check whether a function is registered
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Register a function, replacing any previous definition of the same name
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_string(), def);
    }

    /// Names of the functions whose calls get an `.output` accessor
    pub fn known_functions(&self) -> BTreeSet<String> {
        self.functions
            .values()
            .filter(|def| def.resolvable)
            .map(|def| def.name.to_string())
            .collect()
    }

    fn register_text_functions(&mut self) {
        self.register(FunctionDef {
            name: "CONCAT",
            min_args: 1,
            max_args: None,
            implementation: text::fn_concat,
            resolvable: false,
        });

        self.register(FunctionDef {
            name: "JOIN",
            min_args: 1,
            max_args: None,
            implementation: text::fn_join,
            resolvable: false,
        });

        self.register(FunctionDef {
            name: "UPPER",
            min_args: 1,
            max_args: Some(1),
            implementation: text::fn_upper,
            resolvable: false,
        });

        self.register(FunctionDef {
            name: "LOWER",
            min_args: 1,
            max_args: Some(1),
            implementation: text::fn_lower,
            resolvable: false,
        });

        self.register(FunctionDef {
            name: "TRIM",
            min_args: 1,
            max_args: Some(1),
            implementation: text::fn_trim,
            resolvable: false,
        });

        self.register(FunctionDef {
            name: "LEN",
            min_args: 1,
            max_args: Some(1),
            implementation: text::fn_len,
            resolvable: false,
        });
    }

    fn register_lookup_functions(&mut self) {
        self.register(FunctionDef {
            name: "LOOKUP",
            min_args: 2,
            max_args: Some(2),
            implementation: lookup::fn_lookup,
            resolvable: true,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fn_const(
        _args: &[Value],
        _kwargs: &[(String, Value)],
        _ctx: &EvaluationContext,
    ) -> ExprResult<Value> {
        Ok(Value::from("const"))
    }

    #[test]
    fn test_builtins_registered() {
        let registry = builtin_registry();
        assert!(registry.contains("CONCAT"));
        assert!(registry.contains("LOOKUP"));
        assert!(registry.get("concat").is_none());
    }

    #[test]
    fn test_known_functions_are_resolvable_only() {
        let known = builtin_registry().known_functions();
        assert!(known.contains("LOOKUP"));
        assert!(!known.contains("UPPER"));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = FunctionRegistry::with_builtins();
        registry.register(FunctionDef {
            name: "UPPER",
            min_args: 0,
            max_args: None,
            implementation: fn_const,
            resolvable: true,
        });
        assert_eq!(registry.get("UPPER").map(|d| d.min_args), Some(0));
        assert!(registry.known_functions().contains("UPPER"));
    }
}

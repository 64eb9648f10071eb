//! # lookup-chain-expr
//!
//! Expression layer for lookup-chain.
//!
//! This crate provides:
//! - Expression parsing (text → AST), including `target = expr` statements
//! - Canonical re-serialization of an AST (the assembler)
//! - A tree-walking evaluator driven by an explicit function registry
//! - Built-in text and lookup functions
//!
//! ## Example
//!
//! ```rust
//! use lookup_chain_expr::{assemble, evaluate, parse_expression, EvaluationContext, Value};
//!
//! let ast = parse_expression("UPPER('abc')").unwrap();
//! assert_eq!(assemble(&ast).unwrap(), "UPPER('abc')");
//!
//! let ctx = EvaluationContext::new();
//! assert_eq!(evaluate(&ast, &ctx).unwrap(), Value::String("ABC".into()));
//! ```

pub mod assembler;
pub mod ast;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;

pub use assembler::assemble;
pub use ast::{BoolOperator, Expr, Keyword, Statement, UnaryOperator};
pub use error::{ExprError, ExprResult};
pub use evaluator::{evaluate, evaluate_text, EvaluationContext, Value};
pub use functions::{FunctionDef, FunctionRegistry};
pub use parser::{parse_expression, parse_statement};

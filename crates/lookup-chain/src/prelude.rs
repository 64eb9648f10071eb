//! Common imports
//!
//! ```rust
//! use lookup_chain::prelude::*;
//! ```

pub use crate::{
    build_tree, extract_first_key, ChainError, ChainResult, ResolveStrategy, Resolver,
    SeriesTable, SeriesType, StatementReducer, StatementStore, Tree,
};
pub use lookup_chain_expr::{EvaluationContext, FunctionRegistry, Value};

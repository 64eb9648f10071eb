//! # lookup-chain
//!
//! Nested call-expression trees and statement chaining.
//!
//! - [`tree`] splits text such as `F(G(a,b),c)` into one level per call
//! - [`resolver`] evaluates those levels bottom-up and splices each result
//!   into its parent's text
//! - [`statement`] collapses `x = a if c else b` chains to the live branch
//!   and records the result in the [`store`]
//! - [`series`] computes follow-on time-series column headers
//!
//! ## Example
//!
//! ```rust
//! use lookup_chain::prelude::*;
//!
//! let ctx = EvaluationContext::new();
//! let tree = build_tree("JOIN(CONCAT(ab,cd),ef)");
//! let resolved = Resolver::new(&ctx).resolve(&tree).unwrap();
//! assert_eq!(resolved.resolved_text(), "abcd,ef");
//! ```

pub mod error;
pub mod prelude;
pub mod resolver;
pub mod series;
pub mod statement;
pub mod store;
pub mod tree;

pub use error::{ChainError, ChainResult};
pub use resolver::{resolve, resolve_text, ResolveStrategy, Resolver};
pub use series::{
    append_blank_rows, append_columns, first_column, is_column_valid, next_headers, SeriesTable,
    SeriesType,
};
pub use statement::{reduce, reduce_conditional, StatementReducer, OUTPUT_ACCESSOR};
pub use store::{extract_first_key, PersistedStatement, StatementStore, DEFAULT_STORE_FILE};
pub use tree::{build_tree, Child, FrontierEntry, LevelMetadata, Node, NodeId, Tree};

// Expression layer
pub use lookup_chain_expr as expr;

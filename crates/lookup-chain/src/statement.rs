//! Statement-level conditional reduction
//!
//! Collapses `target = a if cond else b if cond2 else c` to the single live
//! branch, re-serializes it, records the plain statement in the
//! [`StatementStore`], and marks calls to resolvable functions with an
//! `.output` accessor in the returned text.

use crate::error::ChainResult;
use crate::store::StatementStore;
use lookup_chain_expr::{
    assemble, evaluate, evaluate_text, parse_statement, EvaluationContext, Expr, ExprError,
};
use std::collections::BTreeSet;

/// Field appended to calls of resolvable functions
pub const OUTPUT_ACCESSOR: &str = "output";

/// Reduces statements against a context, a known-function set and a store
pub struct StatementReducer<'a, 'r> {
    ctx: &'a EvaluationContext<'r>,
    store: &'a StatementStore,
    known_functions: BTreeSet<String>,
}

impl<'a, 'r> StatementReducer<'a, 'r> {
    /// Create a reducer whose known functions are the registry's resolvable ones
    pub fn new(ctx: &'a EvaluationContext<'r>, store: &'a StatementStore) -> Self {
        Self {
            ctx,
            store,
            known_functions: ctx.registry.known_functions(),
        }
    }

    /// Replace the known-function set
    pub fn with_known_functions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_functions = names.into_iter().map(Into::into).collect();
        self
    }

    /// Names treated as resolvable
    pub fn known_functions(&self) -> &BTreeSet<String> {
        &self.known_functions
    }

    /// Reduce one statement
    ///
    /// Returns `target=value` (or bare `value`), with `.output` appended when
    /// the value is a direct call to a known function and literals given by
    /// their value rather than their quoted form. The store receives the
    /// assembled statement, and only once reduction has succeeded.
    pub fn reduce(&self, statement: &str) -> ChainResult<String> {
        let parsed = parse_statement(statement)?;

        let live = reduce_conditional(&parsed.value, self.ctx)?;
        let value = assemble(live)?;
        let target = parsed.target.as_ref().map(assemble).transpose()?;

        let decorated = if self.is_resolvable_call(live) {
            tracing::debug!(value = %value, "decorating resolvable call");
            format!("{}.{}", value, OUTPUT_ACCESSOR)
        } else if is_literal(live) {
            evaluate_text(&value, self.ctx)?.as_text()
        } else {
            value.clone()
        };

        // Nothing below may fail once the store has been written
        self.store.update(&join_assignment(target.as_deref(), &value))?;

        Ok(join_assignment(target.as_deref(), &decorated))
    }

    fn is_resolvable_call(&self, expr: &Expr) -> bool {
        expr.call_name()
            .map_or(false, |name| self.known_functions.contains(&name))
    }
}

/// Reduce a statement with an explicit known-function set
pub fn reduce(
    statement: &str,
    known_functions: &BTreeSet<String>,
    store: &StatementStore,
    ctx: &EvaluationContext,
) -> ChainResult<String> {
    StatementReducer::new(ctx, store)
        .with_known_functions(known_functions.iter().cloned())
        .reduce(statement)
}

/// Follow an if/else chain down to its live branch
///
/// Each condition must evaluate to a boolean.
pub fn reduce_conditional<'e>(expr: &'e Expr, ctx: &EvaluationContext) -> ChainResult<&'e Expr> {
    match expr {
        Expr::Conditional { test, body, orelse } => {
            let taken = evaluate(test, ctx)?.as_bool().ok_or_else(|| {
                let text = assemble(test).unwrap_or_else(|_| format!("{:?}", test));
                ExprError::Evaluation(format!("condition '{}' is not a boolean", text))
            })?;
            tracing::trace!(taken, "reduced conditional");

            if taken {
                reduce_conditional(body, ctx)
            } else {
                reduce_conditional(orelse, ctx)
            }
        }
        other => Ok(other),
    }
}

/// Literal values, including signed ones
fn is_literal(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::String(_) | Expr::Number(_) | Expr::Boolean(_) | Expr::None | Expr::UnaryOp { .. }
    )
}

fn join_assignment(target: Option<&str>, value: &str) -> String {
    match target {
        Some(target) => format!("{}={}", target, value),
        None => value.to_string(),
    }
}

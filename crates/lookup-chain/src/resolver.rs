//! Bottom-up resolution of expression trees
//!
//! Resolution never rebuilds the tree structurally. Each call level is reduced
//! by substituting the already-resolved text of the level below into the
//! level's matched call text, evaluating that text, and splicing the result
//! back into the level's processed string. The level-0 processed string is
//! the final result.
//!
//! Substitutions replace the first occurrence only.

use crate::error::{ChainError, ChainResult};
use crate::tree::{build_tree, split_arguments, Tree};
use lookup_chain_expr::{evaluate_text, EvaluationContext};
use std::fmt;
use std::str::FromStr;

/// How leaf-list levels are seeded and results propagated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveStrategy {
    /// Re-quote every multi-argument level before substituting it into the
    /// parent call, so argument tokens reach functions as string literals.
    #[default]
    Cascade,
    /// Quote only the frontier leaves; evaluated results are spliced into the
    /// enclosing text verbatim and propagated to every ancestor.
    LeafFrontier,
}

impl FromStr for ResolveStrategy {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cascade" => Ok(ResolveStrategy::Cascade),
            "leaf-frontier" | "leaf_frontier" | "frontier" => Ok(ResolveStrategy::LeafFrontier),
            other => Err(ChainError::InvalidStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for ResolveStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveStrategy::Cascade => f.write_str("cascade"),
            ResolveStrategy::LeafFrontier => f.write_str("leaf-frontier"),
        }
    }
}

/// Resolves trees against an evaluation context
pub struct Resolver<'c, 'r> {
    ctx: &'c EvaluationContext<'r>,
    strategy: ResolveStrategy,
}

impl<'c, 'r> Resolver<'c, 'r> {
    /// Create a resolver using the default strategy
    pub fn new(ctx: &'c EvaluationContext<'r>) -> Self {
        Self {
            ctx,
            strategy: ResolveStrategy::default(),
        }
    }

    /// Select the resolution strategy
    pub fn with_strategy(mut self, strategy: ResolveStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Resolve a tree, returning a resolved copy
    ///
    /// The input tree is not modified. On failure no partial result is
    /// returned.
    pub fn resolve(&self, tree: &Tree) -> ChainResult<Tree> {
        let mut resolved = tree.clone();
        // Only a hand-built `Tree::default()` has no levels
        if resolved.depth() == 0 {
            return Ok(resolved);
        }

        match self.strategy {
            ResolveStrategy::Cascade => self.resolve_cascade(&mut resolved)?,
            ResolveStrategy::LeafFrontier => self.resolve_leaf_frontier(&mut resolved)?,
        }

        tracing::debug!(
            strategy = %self.strategy,
            result = resolved.resolved_text(),
            "resolved expression tree"
        );
        Ok(resolved)
    }

    /// Build and resolve in one step, returning the reduced text
    pub fn resolve_text(&self, text: &str) -> ChainResult<String> {
        let tree = build_tree(text);
        Ok(self.resolve(&tree)?.resolved_text().to_string())
    }

    fn evaluate(&self, expression: &str) -> ChainResult<String> {
        let value = evaluate_text(expression, self.ctx)?;
        Ok(value.as_text())
    }

    fn resolve_cascade(&self, tree: &mut Tree) -> ChainResult<()> {
        let depth = tree.depth();

        // The deepest level needs no reduction
        let deepest = &mut tree.metadata[depth - 1];
        deepest.matched_group = Some(deepest.processed_string.clone());

        for i in (0..depth - 1).rev() {
            let child = &tree.metadata[i + 1];
            let child_text = stringify_params(&child.processed_string);
            let child_match = child
                .previous_match
                .clone()
                .or_else(|| child.matched_group.clone())
                .unwrap_or_default();

            let parent = &mut tree.metadata[i];
            let this_matched = parent
                .matched_group
                .clone()
                .ok_or(ChainError::MissingMatch(i))?;
            let this_processed = parent.processed_string.clone();
            parent
                .previous_match
                .get_or_insert_with(|| this_processed.clone());

            let expression = replace_first(&this_matched, &child_match, &child_text);
            parent.matched_group = Some(expression.clone());

            let result = self.evaluate(&expression)?;
            tracing::trace!(level = i, expression = %expression, result = %result, "evaluated level");

            tree.metadata[i].processed_string = replace_first(&this_processed, &this_matched, &result);
        }

        Ok(())
    }

    fn resolve_leaf_frontier(&self, tree: &mut Tree) -> ChainResult<()> {
        let depth = tree.depth();
        let deepest = depth - 1;

        let init = tree.metadata[deepest].processed_string.clone();
        let leaves: Vec<String> = tree.frontier_leaves().map(quote).collect();
        let seed = if leaves.is_empty() {
            init.clone()
        } else {
            leaves.join(",")
        };
        tree.metadata[deepest].processed_string = seed.clone();

        // A leaf-list level has nothing to evaluate: push the quoted leaves
        // into every ancestor instead
        if tree.metadata[deepest].matched_group.is_none() && seed != init {
            propagate(tree, deepest, &init, &seed);
        }

        for i in (0..depth).rev() {
            let matched = match tree.metadata[i].matched_group.clone() {
                Some(matched) => matched,
                None => continue,
            };

            let result = self.evaluate(&matched)?;
            tracing::trace!(level = i, expression = %matched, result = %result, "evaluated level");

            let before = tree.metadata[i].processed_string.clone();
            let after = replace_first(&before, &matched, &result);
            tree.metadata[i].previous_match.get_or_insert_with(|| before.clone());
            tree.metadata[i].processed_string = after.clone();
            propagate(tree, i, &before, &after);
        }

        Ok(())
    }
}

/// Resolve a tree with the default strategy
pub fn resolve(tree: &Tree, ctx: &EvaluationContext) -> ChainResult<Tree> {
    Resolver::new(ctx).resolve(tree)
}

/// Build and resolve nested call text with the given strategy
pub fn resolve_text(
    text: &str,
    ctx: &EvaluationContext,
    strategy: ResolveStrategy,
) -> ChainResult<String> {
    Resolver::new(ctx).with_strategy(strategy).resolve_text(text)
}

/// Replace `from` with `to` in every level above `level`
fn propagate(tree: &mut Tree, level: usize, from: &str, to: &str) {
    for ancestor in tree.metadata[..level].iter_mut() {
        if let Some(matched) = ancestor.matched_group.as_mut() {
            *matched = replace_first(matched, from, to);
        }
        ancestor.processed_string = replace_first(&ancestor.processed_string, from, to);
    }
}

/// Re-quote a multi-argument list so each token becomes a string literal
fn stringify_params(params: &str) -> String {
    match split_arguments(params) {
        Some(tokens) => tokens.iter().map(|t| quote(t)).collect::<Vec<_>>().join(","),
        None => params.to_string(),
    }
}

fn quote(token: &str) -> String {
    format!("'{}'", token)
}

fn replace_first(text: &str, from: &str, to: &str) -> String {
    text.replacen(from, to, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookup_chain_expr::functions::FunctionImpl;
    use lookup_chain_expr::{ExprError, ExprResult, FunctionDef, FunctionRegistry, Value};
    use pretty_assertions::assert_eq;

    fn fn_g(args: &[Value], _: &[(String, Value)], _: &EvaluationContext) -> ExprResult<Value> {
        if args == [Value::from("a"), Value::from("b")] {
            Ok(Value::from("x"))
        } else {
            Ok(Value::from("g?"))
        }
    }

    fn fn_f(args: &[Value], _: &[(String, Value)], _: &EvaluationContext) -> ExprResult<Value> {
        if args == [Value::from("x"), Value::from("c")] {
            Ok(Value::from("y"))
        } else {
            Ok(Value::from("f?"))
        }
    }

    fn registry() -> FunctionRegistry {
        let mut registry = FunctionRegistry::with_builtins();
        for (name, implementation) in [("F", fn_f as FunctionImpl), ("G", fn_g as FunctionImpl)] {
            registry.register(FunctionDef {
                name,
                min_args: 0,
                max_args: None,
                implementation,
                resolvable: false,
            });
        }
        registry
    }

    #[test]
    fn test_cascade_nested_call() {
        let registry = registry();
        let ctx = EvaluationContext::with_registry(&registry);
        let tree = build_tree("F(G(a,b),c)");
        let resolved = resolve(&tree, &ctx).unwrap();

        assert_eq!(resolved.resolved_text(), "y");
        assert_eq!(
            resolved.level(1).unwrap().matched_group.as_deref(),
            Some("G('a','b')")
        );
        assert_eq!(resolved.level(1).unwrap().processed_string, "x,c");
        assert_eq!(
            resolved.level(0).unwrap().matched_group.as_deref(),
            Some("F('x','c')")
        );
    }

    #[test]
    fn test_input_tree_untouched() {
        let registry = registry();
        let ctx = EvaluationContext::with_registry(&registry);
        let tree = build_tree("F(G(a,b),c)");
        let before = tree.clone();
        resolve(&tree, &ctx).unwrap();
        assert_eq!(tree, before);
    }

    #[test]
    fn test_atomic_input_resolves_to_itself() {
        let ctx = EvaluationContext::new();
        for strategy in [ResolveStrategy::Cascade, ResolveStrategy::LeafFrontier] {
            assert_eq!(resolve_text("plain text", &ctx, strategy).unwrap(), "plain text");
        }
    }

    #[test]
    fn test_empty_tree() {
        let ctx = EvaluationContext::new();
        let resolved = resolve(&Tree::default(), &ctx).unwrap();
        assert_eq!(resolved.resolved_text(), "");
    }

    #[test]
    fn test_builtin_chain() {
        let ctx = EvaluationContext::new();
        let text = resolve_text("JOIN(CONCAT(ab,cd),ef)", &ctx, ResolveStrategy::Cascade).unwrap();
        assert_eq!(text, "abcd,ef");
    }

    #[test]
    fn test_empty_call() {
        let registry = registry();
        let ctx = EvaluationContext::with_registry(&registry);
        let text = resolve_text("F()", &ctx, ResolveStrategy::Cascade).unwrap();
        assert_eq!(text, "f?");
    }

    #[test]
    fn test_unresolved_reference() {
        let ctx = EvaluationContext::new();
        let err = resolve_text("MISSING(a,b)", &ctx, ResolveStrategy::Cascade).unwrap_err();
        assert!(matches!(
            err,
            ChainError::Expr(ExprError::UnresolvedReference(ref name)) if name == "MISSING"
        ));

        // A bare single argument stays an identifier
        let err = resolve_text("UPPER(nobody)", &ctx, ResolveStrategy::Cascade).unwrap_err();
        assert!(matches!(
            err,
            ChainError::Expr(ExprError::UnresolvedReference(ref name)) if name == "nobody"
        ));
    }

    #[test]
    fn test_leaf_frontier_single_call() {
        let registry = registry();
        let ctx = EvaluationContext::with_registry(&registry);
        let text = resolve_text("G(a,b)", &ctx, ResolveStrategy::LeafFrontier).unwrap();
        assert_eq!(text, "x");
    }

    #[test]
    fn test_leaf_frontier_nested_call() {
        let registry = registry();
        let mut ctx = EvaluationContext::with_registry(&registry);

        // G('a','b') -> x is spliced bare, so the root evaluates F(x,c)
        let err = resolve_text("F(G(a,b),c)", &ctx, ResolveStrategy::LeafFrontier).unwrap_err();
        assert!(matches!(
            err,
            ChainError::Expr(ExprError::UnresolvedReference(ref name)) if name == "x"
        ));

        ctx.set_variable("x", "x");
        ctx.set_variable("c", "c");
        let tree = build_tree("F(G(a,b),c)");
        let resolved = Resolver::new(&ctx)
            .with_strategy(ResolveStrategy::LeafFrontier)
            .resolve(&tree)
            .unwrap();
        assert_eq!(resolved.resolved_text(), "y");
        assert_eq!(
            resolved.level(0).unwrap().previous_match.as_deref(),
            Some("F(x,c)")
        );
    }

    #[test]
    fn test_leaf_frontier_splices_results_verbatim() {
        let mut ctx = EvaluationContext::new();
        ctx.set_variable("suffix", "!");
        ctx.set_variable("AB", "MiXeD");
        let text = "CONCAT(LOWER(CONCAT(A,B)), suffix)";

        // CONCAT('A','B') -> AB and LOWER(AB) -> mixed are spliced as bare names
        let err = resolve_text(text, &ctx, ResolveStrategy::LeafFrontier).unwrap_err();
        assert!(matches!(
            err,
            ChainError::Expr(ExprError::UnresolvedReference(ref name)) if name == "mixed"
        ));

        ctx.set_variable("mixed", "bound");
        let resolved = resolve_text(text, &ctx, ResolveStrategy::LeafFrontier).unwrap();
        assert_eq!(resolved, "bound!");
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("cascade".parse::<ResolveStrategy>().unwrap(), ResolveStrategy::Cascade);
        assert_eq!(
            "leaf-frontier".parse::<ResolveStrategy>().unwrap(),
            ResolveStrategy::LeafFrontier
        );
        assert!("nope".parse::<ResolveStrategy>().is_err());
    }
}

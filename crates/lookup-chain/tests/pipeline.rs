//! End-to-end tests: build, resolve, reduce and persist

use lookup_chain::prelude::*;
use lookup_chain::expr::functions::FunctionImpl;
use lookup_chain::expr::{ExprResult, FunctionDef};
use lookup_chain::{Child, ChainError};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn fn_g(args: &[Value], _: &[(String, Value)], _: &EvaluationContext) -> ExprResult<Value> {
    match args {
        [Value::String(a), Value::String(b)] if a == "a" && b == "b" => Ok(Value::from("x")),
        _ => Ok(Value::from("unexpected")),
    }
}

fn fn_f(args: &[Value], _: &[(String, Value)], _: &EvaluationContext) -> ExprResult<Value> {
    match args {
        [Value::String(x), Value::String(c)] if x == "x" && c == "c" => Ok(Value::from("y")),
        _ => Ok(Value::from("unexpected")),
    }
}

fn registry() -> FunctionRegistry {
    let mut registry = FunctionRegistry::with_builtins();
    for (name, implementation) in [("F", fn_f as FunctionImpl), ("G", fn_g as FunctionImpl)] {
        registry.register(FunctionDef {
            name,
            min_args: 2,
            max_args: Some(2),
            implementation,
            resolvable: false,
        });
    }
    registry
}

/// Atomic input has no root and resolves to itself
#[test]
fn test_atomic_input() {
    let tree = build_tree("revenue");
    assert!(tree.root().is_none());
    assert_eq!(tree.metadata().len(), 1);
    assert_eq!(tree.level(0).unwrap().processed_string, "revenue");

    let ctx = EvaluationContext::new();
    let resolved = Resolver::new(&ctx).resolve(&tree).unwrap();
    assert_eq!(resolved.resolved_text(), "revenue");
}

/// Tree shape and bottom-up resolution of `F(G(a,b),c)`
#[test]
fn test_nested_call_pipeline() {
    let tree = build_tree("F(G(a,b),c)");
    let root = tree.root().unwrap();
    assert_eq!(root.value, "F");
    assert_eq!(root.children, vec![Child::Node(1), Child::Leaf("c".into())]);
    assert_eq!(
        tree.node(1).unwrap().children,
        vec![Child::Leaf("a".into()), Child::Leaf("b".into())]
    );

    let registry = registry();
    let ctx = EvaluationContext::with_registry(&registry);
    let resolved = Resolver::new(&ctx).resolve(&tree).unwrap();
    assert_eq!(resolved.resolved_text(), "y");
}

/// Resolved text feeds a lookup statement, which is reduced and persisted
#[test]
fn test_resolve_then_reduce() {
    let dir = TempDir::new().unwrap();
    let store = StatementStore::in_dir(dir.path());

    let mut ctx = EvaluationContext::new();
    ctx.set_table_entry("rates", "eu-west", 1.25);
    ctx.set_variable("use_rates", true);

    let key = Resolver::new(&ctx)
        .resolve_text("JOIN(CONCAT(eu,-west),x)")
        .unwrap();
    assert_eq!(key, "eu-west,x");
    let region = key.split(',').next().unwrap();

    let statement = format!(
        "df.at['{}','rate'] = LOOKUP('rates', '{}') if use_rates else 0",
        region, region
    );
    let reduced = StatementReducer::new(&ctx, &store).reduce(&statement).unwrap();
    assert_eq!(
        reduced,
        "df.at['eu-west','rate']=LOOKUP('rates','eu-west').output"
    );
    assert_eq!(
        store.current().unwrap().as_deref(),
        Some("df.at['eu-west','rate']=LOOKUP('rates','eu-west')")
    );
    assert_eq!(store.first_key().unwrap().as_deref(), Some("eu-west"));

    // The decorated value evaluates to the looked-up rate
    let value_text = reduced.split_once('=').unwrap().1;
    let value = lookup_chain::expr::evaluate_text(value_text, &ctx).unwrap();
    assert_eq!(value, Value::Number(1.25));
}

/// Each reduction replaces the stored statement
#[test]
fn test_store_keeps_latest_statement() {
    let dir = TempDir::new().unwrap();
    let store = StatementStore::in_dir(dir.path());
    let mut ctx = EvaluationContext::new();
    ctx.set_variable("cond", false);

    let reducer = StatementReducer::new(&ctx, &store);
    assert_eq!(reducer.reduce("x = 1 if cond else 2").unwrap(), "x=2");
    assert_eq!(reducer.reduce("x['k'] = 'v'").unwrap(), "x['k']=v");

    assert_eq!(store.current().unwrap().as_deref(), Some("x['k']='v'"));
    assert_eq!(store.first_key().unwrap().as_deref(), Some("k"));
}

#[test]
fn test_failed_resolution_is_reported() {
    let ctx = EvaluationContext::new();
    let err = Resolver::new(&ctx)
        .with_strategy(ResolveStrategy::LeafFrontier)
        .resolve_text("NOPE(a,b)")
        .unwrap_err();
    assert!(matches!(err, ChainError::Expr(_)));
}

#[test]
fn test_series_shift() {
    let mut table = SeriesTable::new(vec!["Item".into(), "2020-11".into()]);
    table.rows.push(vec!["units".into(), "7".into()]);

    let series: SeriesType = "Monthly".parse().unwrap();
    table.append_columns(series, 2);
    assert_eq!(table.headers, vec!["Item", "2020-11", "2020-12", "2021-01"]);
    assert_eq!(table.first_column(series), Some(1));
    assert_eq!(table.rows[0], vec!["units", "7", "", ""]);
}

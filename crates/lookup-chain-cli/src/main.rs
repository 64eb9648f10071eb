//! lookup-chain CLI - resolve nested lookups and chain statements

mod logging;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lookup_chain::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lchain")]
#[command(
    author,
    version,
    about = "Resolve nested call expressions and chain lookup statements"
)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Also write logs to a per-minute file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the expression tree as JSON
    Tree {
        /// Nested call text, e.g. "F(G(a,b),c)"
        expr: String,
    },

    /// Resolve nested call text bottom-up
    Resolve {
        expr: String,

        #[arg(short, long, value_enum, default_value_t = Strategy::Cascade)]
        strategy: Strategy,

        #[command(flatten)]
        bindings: Bindings,
    },

    /// Reduce a conditional statement and record it as the current one
    Reduce {
        /// Statement, e.g. "x = LOOKUP(t, k) if flag else 0"
        statement: String,

        #[command(flatten)]
        bindings: Bindings,

        /// Store file (default: ./variable.json)
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Show the current statement
    Current {
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Show the first subscript key of the current statement's target
    FirstKey {
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Print a header row extended with the next series headers
    Series {
        /// Annual, Quarterly or Monthly
        series: String,

        /// Existing headers; the last one is extended
        #[arg(required = true)]
        headers: Vec<String>,

        /// Number of headers to add
        #[arg(short, long, default_value = "1")]
        count: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    Cascade,
    LeafFrontier,
}

impl From<Strategy> for ResolveStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Cascade => ResolveStrategy::Cascade,
            Strategy::LeafFrontier => ResolveStrategy::LeafFrontier,
        }
    }
}

#[derive(clap::Args)]
struct Bindings {
    /// Variable binding NAME=VALUE (repeatable)
    #[arg(long = "var", value_name = "NAME=VALUE")]
    vars: Vec<String>,

    /// Lookup table entry TABLE.KEY=VALUE (repeatable)
    #[arg(long = "entry", value_name = "TABLE.KEY=VALUE")]
    entries: Vec<String>,
}

impl Bindings {
    fn context(&self) -> Result<EvaluationContext<'static>> {
        let mut ctx = EvaluationContext::new();
        for binding in &self.vars {
            let (name, value) = split_binding(binding)?;
            ctx.set_variable(name, parse_value(value));
        }
        for binding in &self.entries {
            let (path, value) = split_binding(binding)?;
            let (table, key) = path
                .split_once('.')
                .with_context(|| format!("Table entry '{}' must be TABLE.KEY=VALUE", binding))?;
            ctx.set_table_entry(table, key, parse_value(value));
        }
        Ok(ctx)
    }
}

fn split_binding(binding: &str) -> Result<(&str, &str)> {
    match binding.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value)),
        _ => bail!("Binding '{}' must have the form NAME=VALUE", binding),
    }
}

/// Booleans and numbers are typed, everything else is a string
fn parse_value(raw: &str) -> Value {
    match raw {
        "True" | "true" => Value::Boolean(true),
        "False" | "false" => Value::Boolean(false),
        "None" => Value::None,
        _ => raw
            .parse::<f64>()
            .map(Value::Number)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
    }
}

fn open_store(path: Option<&Path>) -> Result<StatementStore> {
    match path {
        Some(path) => StatementStore::init(path)
            .with_context(|| format!("Failed to prepare store '{}'", path.display())),
        None => Ok(StatementStore::global().clone()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_dir.as_deref())?;

    match cli.command {
        Commands::Tree { expr } => show_tree(&expr),
        Commands::Resolve {
            expr,
            strategy,
            bindings,
        } => resolve(&expr, strategy.into(), &bindings),
        Commands::Reduce {
            statement,
            bindings,
            store,
        } => reduce(&statement, &bindings, store.as_deref()),
        Commands::Current { store } => show_current(store.as_deref()),
        Commands::FirstKey { store } => show_first_key(store.as_deref()),
        Commands::Series {
            series,
            headers,
            count,
        } => extend_series(&series, headers, count),
    }
}

fn show_tree(expr: &str) -> Result<()> {
    let tree = build_tree(expr);
    let json = serde_json::to_string_pretty(&tree).context("Failed to serialize tree")?;
    println!("{}", json);
    Ok(())
}

fn resolve(expr: &str, strategy: ResolveStrategy, bindings: &Bindings) -> Result<()> {
    let ctx = bindings.context()?;
    let text = Resolver::new(&ctx)
        .with_strategy(strategy)
        .resolve_text(expr)
        .with_context(|| format!("Failed to resolve '{}'", expr))?;
    println!("{}", text);
    Ok(())
}

fn reduce(statement: &str, bindings: &Bindings, store: Option<&Path>) -> Result<()> {
    let ctx = bindings.context()?;
    let store = open_store(store)?;
    let reduced = StatementReducer::new(&ctx, &store)
        .reduce(statement)
        .with_context(|| format!("Failed to reduce '{}'", statement))?;
    println!("{}", reduced);
    Ok(())
}

fn show_current(store: Option<&Path>) -> Result<()> {
    let store = open_store(store)?;
    match store
        .current()
        .with_context(|| format!("Failed to read '{}'", store.path().display()))?
    {
        Some(statement) => println!("{}", statement),
        None => eprintln!("No current statement in '{}'", store.path().display()),
    }
    Ok(())
}

fn show_first_key(store: Option<&Path>) -> Result<()> {
    let store = open_store(store)?;
    match store
        .first_key()
        .with_context(|| format!("Failed to read '{}'", store.path().display()))?
    {
        Some(key) => println!("{}", key),
        None => eprintln!("Current statement has no subscript key"),
    }
    Ok(())
}

fn extend_series(series: &str, headers: Vec<String>, count: usize) -> Result<()> {
    let series: SeriesType = series.parse()?;
    let mut table = SeriesTable::new(headers);
    let added = table.append_columns(series, count);
    if added == 0 {
        eprintln!(
            "Warning: last header is not a {} series header",
            series.to_string().to_lowercase()
        );
    }
    println!("{}", table.headers.join("\t"));
    Ok(())
}

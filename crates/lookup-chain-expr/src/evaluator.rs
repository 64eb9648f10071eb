//! Expression evaluator
//!
//! Walks an expression AST against an explicit [`EvaluationContext`]: variables
//! for bare names, named lookup tables, and the function registry used for
//! calls.

use crate::assembler::format_number;
use crate::ast::{BoolOperator, Expr, UnaryOperator};
use crate::error::{ExprError, ExprResult};
use crate::functions::{builtin_registry, FunctionRegistry};
use crate::parser::parse_expression;
use ahash::AHashMap;
use std::collections::BTreeMap;
use std::fmt;

/// Value types during evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(f64),
    Boolean(bool),
    None,
    List(Vec<Value>),
    /// Named fields, e.g. the result of a resolvable function (`output`, ...)
    Record(BTreeMap<String, Value>),
}

impl Value {
    /// Strict boolean; `None` for every non-boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Truthiness as used by `and`/`or` and conditionals
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::None => false,
            Value::List(items) => !items.is_empty(),
            Value::Record(fields) => !fields.is_empty(),
        }
    }

    /// Convert to number, if possible
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Boolean(true) => Some(1.0),
            Value::Boolean(false) => Some(0.0),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Textual form spliced back into expression text by the resolver
    pub fn as_text(&self) -> String {
        self.to_string()
    }

    /// Field of a record value
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.get(name),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::None => "None",
            Value::List(_) => "list",
            Value::Record(_) => "record",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Boolean(true) => f.write_str("True"),
            Value::Boolean(false) => f.write_str("False"),
            Value::None => f.write_str("None"),
            Value::List(items) => {
                let items: Vec<String> = items.iter().map(Value::to_string).collect();
                write!(f, "[{}]", items.join(","))
            }
            Value::Record(fields) => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect();
                write!(f, "{{{}}}", fields.join(", "))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

/// Context for evaluation
pub struct EvaluationContext<'a> {
    /// Functions callable from expressions
    pub registry: &'a FunctionRegistry,
    /// Values for bare identifiers
    pub variables: AHashMap<String, Value>,
    /// Named key/value tables consulted by `LOOKUP`
    pub tables: AHashMap<String, AHashMap<String, Value>>,
}

impl EvaluationContext<'static> {
    /// Create a context over the built-in functions with no variables
    pub fn new() -> Self {
        Self::with_registry(builtin_registry())
    }
}

impl Default for EvaluationContext<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> EvaluationContext<'a> {
    /// Create a context over a caller-supplied registry
    pub fn with_registry(registry: &'a FunctionRegistry) -> Self {
        Self {
            registry,
            variables: AHashMap::new(),
            tables: AHashMap::new(),
        }
    }

    /// Bind a variable
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Insert one entry into a lookup table, creating the table if needed
    pub fn set_table_entry(
        &mut self,
        table: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) {
        self.tables
            .entry(table.into())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Look up a table entry
    pub fn table_entry(&self, table: &str, key: &str) -> Option<&Value> {
        self.tables.get(table).and_then(|t| t.get(key))
    }

    fn resolve_name(&self, name: &str) -> ExprResult<Value> {
        self.variables
            .get(name)
            .cloned()
            .ok_or_else(|| ExprError::UnresolvedReference(name.to_string()))
    }
}

/// Parse and evaluate expression text
pub fn evaluate_text(text: &str, ctx: &EvaluationContext) -> ExprResult<Value> {
    let ast = parse_expression(text)?;
    evaluate(&ast, ctx)
}

/// Evaluate an expression
pub fn evaluate(expr: &Expr, ctx: &EvaluationContext) -> ExprResult<Value> {
    match expr {
        // === Literals ===
        Expr::String(s) => Ok(Value::String(s.clone())),
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Boolean(b) => Ok(Value::Boolean(*b)),
        Expr::None => Ok(Value::None),

        // === References ===
        Expr::Name(name) => ctx.resolve_name(name),

        Expr::Attribute { value, attr } => {
            let base = evaluate(value, ctx)?;
            base.field(attr).cloned().ok_or_else(|| {
                ExprError::Evaluation(format!("{} has no attribute '{}'", base.type_name(), attr))
            })
        }

        Expr::Subscript { value, keys } => {
            let mut current = evaluate(value, ctx)?;
            for key in keys {
                let key = evaluate(key, ctx)?;
                current = subscript(&current, &key)?;
            }
            Ok(current)
        }

        // === Operators ===
        Expr::BoolOp { op, values } => evaluate_bool_op(*op, values, ctx),

        Expr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand, ctx),

        // === Functions ===
        Expr::Call {
            func,
            args,
            keywords,
        } => {
            let name = func
                .dotted_name()
                .ok_or_else(|| ExprError::Evaluation(format!("{:?} is not callable", func)))?;
            evaluate_call(&name, args, keywords, ctx)
        }

        // === Conditional ===
        Expr::Conditional { test, body, orelse } => {
            if evaluate(test, ctx)?.is_truthy() {
                evaluate(body, ctx)
            } else {
                evaluate(orelse, ctx)
            }
        }
    }
}

/// `and` / `or` return the deciding operand, short-circuiting
fn evaluate_bool_op(
    op: BoolOperator,
    values: &[Expr],
    ctx: &EvaluationContext,
) -> ExprResult<Value> {
    let mut last = Value::None;
    for expr in values {
        last = evaluate(expr, ctx)?;
        let decided = match op {
            BoolOperator::And => !last.is_truthy(),
            BoolOperator::Or => last.is_truthy(),
        };
        if decided {
            break;
        }
    }
    Ok(last)
}

fn evaluate_unary_op(
    op: UnaryOperator,
    operand: &Expr,
    ctx: &EvaluationContext,
) -> ExprResult<Value> {
    let val = evaluate(operand, ctx)?;
    let n = match val {
        Value::Number(n) => n,
        Value::Boolean(b) => f64::from(u8::from(b)),
        other => {
            return Err(ExprError::Evaluation(format!(
                "bad operand type for unary operator: {}",
                other.type_name()
            )))
        }
    };

    match op {
        UnaryOperator::Plus => Ok(Value::Number(n)),
        UnaryOperator::Minus => Ok(Value::Number(-n)),
    }
}

fn subscript(container: &Value, key: &Value) -> ExprResult<Value> {
    match container {
        Value::Record(fields) => {
            let name = key.as_text();
            fields
                .get(&name)
                .cloned()
                .ok_or_else(|| ExprError::UnresolvedReference(name))
        }
        Value::List(items) => {
            let index = key
                .as_number()
                .filter(|n| n.fract() == 0.0)
                .ok_or_else(|| ExprError::Evaluation("list index must be an integer".into()))?;
            let len = items.len() as i64;
            let mut index = index as i64;
            if index < 0 {
                index += len;
            }
            usize::try_from(index)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or_else(|| ExprError::Evaluation(format!("list index {} out of range", index)))
        }
        other => Err(ExprError::Evaluation(format!(
            "{} is not subscriptable",
            other.type_name()
        ))),
    }
}

fn evaluate_call(
    name: &str,
    args: &[Expr],
    keywords: &[crate::ast::Keyword],
    ctx: &EvaluationContext,
) -> ExprResult<Value> {
    let func = ctx
        .registry
        .get(name)
        .ok_or_else(|| ExprError::UnresolvedReference(name.to_string()))?;

    // Check argument count
    if args.len() < func.min_args {
        return Err(ExprError::ArgumentCount {
            function: name.to_string(),
            expected: format!("at least {}", func.min_args),
            actual: args.len(),
        });
    }

    if let Some(max) = func.max_args {
        if args.len() > max {
            return Err(ExprError::ArgumentCount {
                function: name.to_string(),
                expected: format!("at most {}", max),
                actual: args.len(),
            });
        }
    }

    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg in args {
        evaluated_args.push(evaluate(arg, ctx)?);
    }

    let mut evaluated_keywords = Vec::with_capacity(keywords.len());
    for keyword in keywords {
        evaluated_keywords.push((keyword.arg.clone(), evaluate(&keyword.value, ctx)?));
    }

    tracing::trace!(function = name, args = evaluated_args.len(), "calling function");
    (func.implementation)(&evaluated_args, &evaluated_keywords, ctx)
}

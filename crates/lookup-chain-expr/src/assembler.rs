//! Canonical re-serialization of expression ASTs
//!
//! The output is consumed by textual substitution further up the pipeline, so
//! spacing and quoting are fixed: literals single-quoted (numbers included),
//! no spaces after commas, single spaces around `and`/`or`.

use crate::ast::{BoolOperator, Expr, Keyword, UnaryOperator};
use crate::error::{ExprError, ExprResult};
use lazy_regex::regex;

/// Serialize an expression back into canonical text
///
/// # Example
/// ```rust
/// use lookup_chain_expr::{assemble, parse_expression};
///
/// let ast = parse_expression("F(a, 2, mode = \"x\")").unwrap();
/// assert_eq!(assemble(&ast).unwrap(), "F(a,'2',mode='x')");
/// ```
pub fn assemble(expr: &Expr) -> ExprResult<String> {
    match expr {
        Expr::String(s) => Ok(format!("'{}'", s)),
        Expr::Number(n) => Ok(format!("'{}'", format_number(*n))),
        Expr::Boolean(true) => Ok("True".to_string()),
        Expr::Boolean(false) => Ok("False".to_string()),
        Expr::None => Ok("None".to_string()),

        Expr::Name(name) => Ok(name.clone()),

        Expr::Call {
            func,
            args,
            keywords,
        } => {
            let mut parts = args.iter().map(assemble).collect::<ExprResult<Vec<_>>>()?;
            for keyword in keywords {
                parts.push(assemble_keyword(keyword)?);
            }
            Ok(format!("{}({})", assemble(func)?, parts.join(",")))
        }

        Expr::BoolOp { op, values } => {
            let values = values.iter().map(assemble).collect::<ExprResult<Vec<_>>>()?;
            Ok(values.join(bool_op_token(*op)))
        }

        Expr::UnaryOp { op, operand } => {
            let operand = assemble(operand)?;
            let stripped = regex!(r#"['"]"#).replace_all(&operand, "");
            let first = stripped.chars().next().ok_or_else(|| {
                ExprError::Shape(format!("unary operand '{}' is empty", operand))
            })?;
            Ok(format!("'{}{}'", unary_op_token(*op), first))
        }

        Expr::Attribute { value, attr } => Ok(format!("{}.{}", assemble(value)?, attr)),

        Expr::Subscript { value, keys } => {
            let keys = keys.iter().map(assemble).collect::<ExprResult<Vec<_>>>()?;
            Ok(format!("{}[{}]", assemble(value)?, keys.join(",")))
        }

        Expr::Conditional { .. } => Err(ExprError::Shape(
            "conditional expressions must be reduced before assembly".into(),
        )),
    }
}

/// Keyword values are always written as quoted literals
fn assemble_keyword(keyword: &Keyword) -> ExprResult<String> {
    let value = match &keyword.value {
        Expr::String(s) => s.clone(),
        Expr::Number(n) => format_number(*n),
        other => {
            return Err(ExprError::Shape(format!(
                "keyword argument '{}' must be a literal, got {:?}",
                keyword.arg, other
            )))
        }
    };
    Ok(format!("{}='{}'", keyword.arg, value))
}

fn bool_op_token(op: BoolOperator) -> &'static str {
    match op {
        BoolOperator::And => " and ",
        BoolOperator::Or => " or ",
    }
}

fn unary_op_token(op: UnaryOperator) -> &'static str {
    match op {
        UnaryOperator::Plus => "+",
        UnaryOperator::Minus => "-",
    }
}

/// Integral values print without a fractional part
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

//! Text functions

use crate::error::{ExprError, ExprResult};
use crate::evaluator::{EvaluationContext, Value};

fn text_arg(args: &[Value], function: &str) -> ExprResult<String> {
    match args.first() {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(_)) | Some(Value::Boolean(_)) => Ok(args[0].as_text()),
        Some(other) => Err(ExprError::Evaluation(format!(
            "{} expects text, got {}",
            function, other
        ))),
        None => Err(ExprError::ArgumentCount {
            function: function.to_string(),
            expected: "1".into(),
            actual: 0,
        }),
    }
}

/// CONCAT(value, ...)
pub fn fn_concat(
    args: &[Value],
    _kwargs: &[(String, Value)],
    _ctx: &EvaluationContext,
) -> ExprResult<Value> {
    Ok(Value::String(args.iter().map(Value::as_text).collect()))
}

/// JOIN(value, ..., sep=',')
pub fn fn_join(
    args: &[Value],
    kwargs: &[(String, Value)],
    _ctx: &EvaluationContext,
) -> ExprResult<Value> {
    let sep = kwargs
        .iter()
        .find(|(k, _)| k == "sep")
        .map(|(_, v)| v.as_text())
        .unwrap_or_else(|| ",".to_string());
    let parts: Vec<String> = args.iter().map(Value::as_text).collect();
    Ok(Value::String(parts.join(&sep)))
}

/// UPPER(text)
pub fn fn_upper(
    args: &[Value],
    _kwargs: &[(String, Value)],
    _ctx: &EvaluationContext,
) -> ExprResult<Value> {
    Ok(Value::String(text_arg(args, "UPPER")?.to_uppercase()))
}

/// LOWER(text)
pub fn fn_lower(
    args: &[Value],
    _kwargs: &[(String, Value)],
    _ctx: &EvaluationContext,
) -> ExprResult<Value> {
    Ok(Value::String(text_arg(args, "LOWER")?.to_lowercase()))
}

/// TRIM(text)
pub fn fn_trim(
    args: &[Value],
    _kwargs: &[(String, Value)],
    _ctx: &EvaluationContext,
) -> ExprResult<Value> {
    Ok(Value::String(text_arg(args, "TRIM")?.trim().to_string()))
}

/// LEN(text)
pub fn fn_len(
    args: &[Value],
    _kwargs: &[(String, Value)],
    _ctx: &EvaluationContext,
) -> ExprResult<Value> {
    let s = text_arg(args, "LEN")?;
    Ok(Value::Number(s.chars().count() as f64))
}

#[cfg(test)]
mod tests {
    use crate::evaluator::{evaluate_text, EvaluationContext, Value};

    fn eval(text: &str) -> Value {
        evaluate_text(text, &EvaluationContext::new()).unwrap()
    }

    #[test]
    fn test_concat_and_join() {
        assert_eq!(eval("CONCAT('a', 1, True)"), Value::from("a1True"));
        assert_eq!(eval("JOIN('a', 'b')"), Value::from("a,b"));
        assert_eq!(eval("JOIN('a', 'b', sep='-')"), Value::from("a-b"));
    }

    #[test]
    fn test_case_and_trim() {
        assert_eq!(eval("UPPER('abc')"), Value::from("ABC"));
        assert_eq!(eval("LOWER('AbC')"), Value::from("abc"));
        assert_eq!(eval("TRIM('  x ')"), Value::from("x"));
    }

    #[test]
    fn test_len() {
        assert_eq!(eval("LEN('héllo')"), Value::Number(5.0));
        assert_eq!(eval("LEN(123)"), Value::Number(3.0));
    }
}

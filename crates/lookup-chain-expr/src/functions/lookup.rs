//! Lookup functions

use crate::error::{ExprError, ExprResult};
use crate::evaluator::{EvaluationContext, Value};
use std::collections::BTreeMap;

/// LOOKUP(table, key, [default=...])
///
/// Resolvable: returns a record `{output, table, key}` so that callers read
/// `LOOKUP(..).output` for the looked-up value.
pub fn fn_lookup(
    args: &[Value],
    kwargs: &[(String, Value)],
    ctx: &EvaluationContext,
) -> ExprResult<Value> {
    let table = args[0].as_text();
    let key = args[1].as_text();

    let output = match ctx.table_entry(&table, &key) {
        Some(value) => value.clone(),
        None => kwargs
            .iter()
            .find(|(k, _)| k == "default")
            .map(|(_, v)| v.clone())
            .ok_or_else(|| ExprError::UnresolvedReference(format!("{}[{}]", table, key)))?,
    };

    let mut record = BTreeMap::new();
    record.insert("output".to_string(), output);
    record.insert("table".to_string(), Value::String(table));
    record.insert("key".to_string(), Value::String(key));
    Ok(Value::Record(record))
}

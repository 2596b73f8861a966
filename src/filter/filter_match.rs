use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::types::{FilterOp, FilterWhereInfo};

/// Evaluates parsed conditions against an in-memory document with the same
/// semantics the JSONB rendering has in PostgreSQL.
pub struct FilterMatch;

impl FilterMatch {
    pub fn all(conditions: &[FilterWhereInfo], doc: &Map<String, Value>) -> bool {
        conditions.iter().all(|condition| Self::one(condition, doc))
    }

    fn one(condition: &FilterWhereInfo, doc: &Map<String, Value>) -> bool {
        let actual = doc.get(&condition.column).unwrap_or(&Value::Null);
        let expected = &condition.data;
        match condition.operator {
            FilterOp::Eq => values_equal(actual, expected),
            FilterOp::Ne => !values_equal(actual, expected),
            FilterOp::Gt => compare(actual, expected) == Some(Ordering::Greater),
            FilterOp::Gte => matches!(compare(actual, expected), Some(Ordering::Greater | Ordering::Equal)),
            FilterOp::Lt => compare(actual, expected) == Some(Ordering::Less),
            FilterOp::Lte => matches!(compare(actual, expected), Some(Ordering::Less | Ordering::Equal)),
            FilterOp::In => in_list(actual, expected),
            FilterOp::NIn => !in_list(actual, expected),
        }
    }
}

fn in_list(actual: &Value, list: &Value) -> bool {
    list.as_array()
        .map(|values| values.iter().any(|v| values_equal(actual, v)))
        .unwrap_or(false)
}

/// Numbers compare numerically so `3` and `3.0` are the same value.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

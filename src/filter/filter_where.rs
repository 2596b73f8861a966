use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOp, FilterWhereInfo};

/// Renders WHERE conditions against the `doc` JSONB column. Every value is
/// bound as a jsonb parameter so comparisons stay type-aware.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    pub fn parse(where_data: &Value) -> Result<Vec<FilterWhereInfo>, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok(vec![]),
            Value::Object(obj) => obj,
            Value::Array(_) => return Err(FilterError::InvalidWhereClause("an array")),
            _ => return Err(FilterError::InvalidWhereClause("a scalar")),
        };

        let mut conditions = vec![];
        for (field, value) in obj {
            if field.starts_with('$') {
                return Err(FilterError::UnsupportedOperator(field.clone()));
            }
            match value {
                Value::Object(ops) if ops.keys().all(|k| k.starts_with('$')) && !ops.is_empty() => {
                    for (op_key, op_val) in ops {
                        let operator = FilterOp::from_token(op_key)
                            .ok_or_else(|| FilterError::UnsupportedOperator(op_key.clone()))?;
                        if operator.takes_list() && !op_val.is_array() {
                            return Err(FilterError::ExpectedArray(op_key.clone()));
                        }
                        conditions.push(FilterWhereInfo {
                            column: field.clone(),
                            operator,
                            data: op_val.clone(),
                        });
                    }
                }
                // Implicit equality: { field: value }
                _ => conditions.push(FilterWhereInfo {
                    column: field.clone(),
                    operator: FilterOp::Eq,
                    data: value.clone(),
                }),
            }
        }
        Ok(conditions)
    }

    pub fn generate(conditions: &[FilterWhereInfo], starting_param_index: usize) -> (String, Vec<Value>) {
        let mut filter_where = Self::new(starting_param_index);
        let sql_conditions: Vec<String> = conditions
            .iter()
            .map(|condition| filter_where.build_sql_condition(condition))
            .collect();
        let where_clause = if sql_conditions.is_empty() {
            "TRUE".to_string()
        } else {
            sql_conditions.join(" AND ")
        };
        (where_clause, filter_where.param_values)
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> String {
        let field = format!("doc -> '{}'", condition.column);
        match condition.operator {
            FilterOp::Eq if condition.data.is_null() => {
                format!("COALESCE({}, 'null'::jsonb) = 'null'::jsonb", field)
            }
            FilterOp::Eq => format!("{} = {}", field, self.param(condition.data.clone())),
            FilterOp::Ne if condition.data.is_null() => {
                format!("COALESCE({}, 'null'::jsonb) <> 'null'::jsonb", field)
            }
            FilterOp::Ne => format!("{} IS DISTINCT FROM {}", field, self.param(condition.data.clone())),
            FilterOp::Gt => self.ordered(&field, ">", &condition.data),
            FilterOp::Gte => self.ordered(&field, ">=", &condition.data),
            FilterOp::Lt => self.ordered(&field, "<", &condition.data),
            FilterOp::Lte => self.ordered(&field, "<=", &condition.data),
            FilterOp::In => match &condition.data {
                Value::Array(values) if values.is_empty() => "FALSE".to_string(),
                data => format!("{} @> jsonb_build_array({})", self.param(data.clone()), field),
            },
            FilterOp::NIn => match &condition.data {
                Value::Array(values) if values.is_empty() => "TRUE".to_string(),
                data => format!("NOT ({} @> jsonb_build_array({}))", self.param(data.clone()), field),
            },
        }
    }

    // jsonb orders across types; restrict range comparisons to same-typed values
    fn ordered(&mut self, field: &str, op: &str, data: &Value) -> String {
        let p = self.param(data.clone());
        format!("(jsonb_typeof({f}) = jsonb_typeof({p}) AND {f} {op} {p})", f = field, p = p, op = op)
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_operators_and_implicit_equality() {
        let conditions = FilterWhere::parse(&json!({
            "userId": 4,
            "scenarioId": {"$in": [1, 2]},
            "status": {"$ne": "rejected"}
        }))
        .unwrap();
        assert_eq!(conditions.len(), 3);
        assert!(conditions.iter().any(|c| c.column == "scenarioId" && c.operator == FilterOp::In));
    }

    #[test]
    fn object_values_without_operators_are_equality() {
        let conditions = FilterWhere::parse(&json!({"aiModelConfig": {"tone": "calm"}})).unwrap();
        assert_eq!(conditions[0].operator, FilterOp::Eq);
    }

    #[test]
    fn rejects_unknown_operators() {
        let err = FilterWhere::parse(&json!({"score": {"$regex": ".*"}})).unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedOperator(_)));
        let err = FilterWhere::parse(&json!({"score": {"$in": 3}})).unwrap_err();
        assert!(matches!(err, FilterError::ExpectedArray(_)));
    }

    #[test]
    fn renders_in_and_range_conditions() {
        let conditions = FilterWhere::parse(&json!({"scenarioId": {"$in": [3, 5]}})).unwrap();
        let (sql, params) = FilterWhere::generate(&conditions, 1);
        assert_eq!(sql, "$2 @> jsonb_build_array(doc -> 'scenarioId')");
        assert_eq!(params, vec![json!([3, 5])]);

        let conditions = FilterWhere::parse(&json!({"score": {"$gte": 70}})).unwrap();
        let (sql, _) = FilterWhere::generate(&conditions, 0);
        assert_eq!(
            sql,
            "(jsonb_typeof(doc -> 'score') = jsonb_typeof($1) AND doc -> 'score' >= $1)"
        );
    }
}

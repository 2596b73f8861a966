use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::schema::Schema;

/// Raw `?key=value` pairs of a list request.
pub type ListParams = HashMap<String, String>;

/// Builds a list query from `limit`, `offset` and equality filters on the
/// collection's filterable fields. `scope` pins one field regardless of
/// what the caller asked for.
pub fn list_filter(
    schema: &Schema,
    params: &ListParams,
    api: &ApiConfig,
    scope: Option<(&str, i64)>,
) -> Result<FilterData, ApiError> {
    let mut limit = api.default_page_size;
    let mut offset = None;
    let mut clause = Map::new();

    for (key, raw) in params {
        match key.as_str() {
            "limit" => {
                limit = raw
                    .parse::<i64>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| ApiError::bad_request("limit must be a positive integer"))?;
            }
            "offset" => {
                offset = Some(
                    raw.parse::<i64>()
                        .ok()
                        .filter(|n| *n >= 0)
                        .ok_or_else(|| ApiError::bad_request("offset must be a non-negative integer"))?,
                );
            }
            field if schema.is_filterable(field) => {
                clause.insert(field.to_string(), query_value(raw));
            }
            other => return Err(ApiError::bad_request(format!("Cannot filter {} by '{}'", schema.collection, other))),
        }
    }

    if let Some((field, value)) = scope {
        clause.insert(field.to_string(), Value::from(value));
    }

    let where_clause = if clause.is_empty() { None } else { Some(Value::Object(clause)) };
    Ok(FilterData {
        where_clause,
        limit: Some(limit.min(api.max_page_size)),
        offset,
    })
}

/// Query strings are untyped; integers and booleans are read as such.
fn query_value(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        return Value::from(n);
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::schema::{APPLICATIONS, USERS};
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn typed_equality_filters_and_paging() {
        let api = AppConfig::development().api;
        let data = list_filter(
            &APPLICATIONS,
            &params(&[("organizationId", "2"), ("status", "pending"), ("limit", "5000"), ("offset", "10")]),
            &api,
            None,
        )
        .unwrap();
        assert_eq!(data.where_clause, Some(json!({"organizationId": 2, "status": "pending"})));
        assert_eq!(data.limit, Some(api.max_page_size));
        assert_eq!(data.offset, Some(10));
    }

    #[test]
    fn scope_overrides_caller_filters() {
        let api = AppConfig::development().api;
        let data = list_filter(&APPLICATIONS, &params(&[("userId", "9")]), &api, Some(("userId", 3))).unwrap();
        assert_eq!(data.where_clause, Some(json!({"userId": 3})));
        assert_eq!(data.limit, Some(api.default_page_size));
    }

    #[test]
    fn rejects_unknown_fields_and_bad_paging() {
        let api = AppConfig::development().api;
        let err = list_filter(&USERS, &params(&[("passwordHash", "x")]), &api, None).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(list_filter(&USERS, &params(&[("limit", "-1")]), &api, None).is_err());
    }
}

use serde_json::{Map, Value};

use super::error::FilterError;
use super::filter_match::FilterMatch;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterWhereInfo, SqlResult};

/// A parsed, validated query against one collection table.
#[derive(Debug, Clone)]
pub struct Filter {
    table_name: String,
    conditions: Vec<FilterWhereInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            conditions: vec![],
            limit: None,
            offset: None,
        })
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(where_clause) = data.where_clause {
            self.where_clause(&where_clause)?;
        }
        if let Some(limit) = data.limit {
            self.limit(limit, data.offset)?;
        } else if let Some(offset) = data.offset {
            self.offset(offset)?;
        }
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: &Value) -> Result<&mut Self, FilterError> {
        self.conditions = FilterWhere::parse(conditions)?;
        for condition in &self.conditions {
            Self::validate_column(&condition.column)?;
        }
        Ok(self)
    }

    pub fn limit(&mut self, limit: i64, offset: Option<i64>) -> Result<&mut Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::NegativeLimit(limit));
        }
        self.limit = Some(limit);
        if let Some(off) = offset {
            self.offset(off)?;
        }
        Ok(self)
    }

    pub fn offset(&mut self, offset: i64) -> Result<&mut Self, FilterError> {
        if offset < 0 {
            return Err(FilterError::NegativeOffset(offset));
        }
        self.offset = Some(offset);
        Ok(self)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn conditions(&self) -> &[FilterWhereInfo] {
        &self.conditions
    }

    pub fn get_limit(&self) -> Option<i64> {
        self.limit
    }

    pub fn get_offset(&self) -> i64 {
        self.offset.unwrap_or(0)
    }

    /// In-process evaluation of the WHERE conditions against one document.
    pub fn matches(&self, doc: &Map<String, Value>) -> bool {
        FilterMatch::all(&self.conditions, doc)
    }

    pub fn to_sql(&self) -> SqlResult {
        let where_result = self.to_where_sql();
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT id, doc FROM \"{}\"", self.table_name),
            format!("WHERE {}", where_result.query),
            "ORDER BY id".to_string(),
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params: where_result.params }
    }

    pub fn to_where_sql(&self) -> SqlResult {
        let (query, params) = FilterWhere::generate(&self.conditions, 0);
        SqlResult { query, params }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let where_result = self.to_where_sql();
        SqlResult {
            query: format!(
                "SELECT COUNT(*) AS count FROM \"{}\" WHERE {}",
                self.table_name, where_result.query
            ),
            params: where_result.params,
        }
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        if !Self::is_identifier(name) {
            return Err(FilterError::InvalidTableName(name.to_string()));
        }
        Ok(())
    }

    fn validate_column(column: &str) -> Result<(), FilterError> {
        if !Self::is_identifier(column) {
            return Err(FilterError::InvalidColumn(column.to_string()));
        }
        Ok(())
    }

    fn is_identifier(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}

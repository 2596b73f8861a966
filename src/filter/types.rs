use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operators of the where-clause dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NIn,
}

impl FilterOp {
    /// `$neq` is accepted as a spelling of `$ne`.
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "$eq" => Self::Eq,
            "$ne" | "$neq" => Self::Ne,
            "$gt" => Self::Gt,
            "$gte" => Self::Gte,
            "$lt" => Self::Lt,
            "$lte" => Self::Lte,
            "$in" => Self::In,
            "$nin" => Self::NIn,
            _ => return None,
        })
    }

    /// Operands must be arrays.
    pub fn takes_list(&self) -> bool {
        matches!(self, Self::In | Self::NIn)
    }
}

/// Query input in the document-store dialect: `{"organizationId": 3, "status": {"$ne": "rejected"}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterData {
    pub where_clause: Option<Value>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl FilterData {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_where(where_clause: Value) -> Self {
        Self {
            where_clause: Some(where_clause),
            ..Default::default()
        }
    }

    pub fn page(mut self, limit: Option<i64>, offset: Option<i64>) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }
}

/// One parsed `field op value` condition.
#[derive(Debug, Clone)]
pub struct FilterWhereInfo {
    pub column: String,
    pub operator: FilterOp,
    pub data: Value,
}

/// Rendered SQL with its positional `$n` parameters.
#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}

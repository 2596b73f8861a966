use thiserror::Error;

/// Rejections raised while turning a where clause into a query. They reach
/// clients as 400 responses, so each message names the offending input.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("'{0}' is not a valid table name")]
    InvalidTableName(String),

    #[error("'{0}' is not a valid field name")]
    InvalidColumn(String),

    #[error("Filter must be a JSON object, got {0}")]
    InvalidWhereClause(&'static str),

    #[error("Unknown filter operator '{0}'")]
    UnsupportedOperator(String),

    #[error("Operator {0} expects an array")]
    ExpectedArray(String),

    #[error("Page limit must be non-negative, got {0}")]
    NegativeLimit(i64),

    #[error("Page offset must be non-negative, got {0}")]
    NegativeOffset(i64),
}

//! Declarative write contracts for every collection.
//!
//! A [`Schema`] names a collection's storage table, its integer key, the
//! typed fields it requires and the unique indexes the store must enforce.
//! Stores call [`Schema::validate`] on every insert and replace, so a
//! document that breaks the contract never reaches storage regardless of
//! which handler produced it.

pub mod collections;

use std::collections::BTreeMap;

use chrono::DateTime;
use serde_json::{Map, Value};
use thiserror::Error;

pub use collections::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Float,
    Bool,
    String,
    Email,
    /// RFC 3339 timestamp string
    Timestamp,
    /// Any structured JSON payload
    Json,
    IntArray,
}

#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub nullable: bool,
    pub values: &'static [&'static str],
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl FieldSpec {
    /// Must be present and non-null.
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            nullable: false,
            values: &[],
            min: None,
            max: None,
        }
    }

    /// Must be present, may be null.
    pub const fn nullable(name: &'static str, kind: FieldKind) -> Self {
        Self {
            required: true,
            nullable: true,
            ..Self::required(name, kind)
        }
    }

    /// May be absent or null.
    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            required: false,
            nullable: true,
            ..Self::required(name, kind)
        }
    }

    pub const fn one_of(self, values: &'static [&'static str]) -> Self {
        Self { values, ..self }
    }

    pub const fn range(self, min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            ..self
        }
    }

    pub const fn at_least(self, min: f64) -> Self {
        Self { min: Some(min), ..self }
    }

    fn check(&self, value: &Value) -> Result<(), String> {
        let type_ok = match self.kind {
            FieldKind::Int => as_integer(value).is_some(),
            FieldKind::Float => value.is_number(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::String | FieldKind::Email | FieldKind::Timestamp => value.is_string(),
            FieldKind::Json => true,
            FieldKind::IntArray => value
                .as_array()
                .map(|items| items.iter().all(|item| as_integer(item).is_some()))
                .unwrap_or(false),
        };
        if !type_ok {
            return Err(format!("must be of type {}", self.kind.describe()));
        }

        if let Some(s) = value.as_str() {
            match self.kind {
                FieldKind::Email if !is_valid_email(s) => return Err("must be a valid email address".to_string()),
                FieldKind::Timestamp if DateTime::parse_from_rfc3339(s).is_err() => {
                    return Err("must be an RFC 3339 timestamp".to_string())
                }
                _ => {}
            }
            if !self.values.is_empty() && !self.values.contains(&s) {
                return Err(format!("must be one of: {}", self.values.join(", ")));
            }
        }

        if let Some(n) = value.as_f64() {
            if let Some(min) = self.min {
                if n < min {
                    return Err(format!("must be at least {}", min));
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    return Err(format!("must be at most {}", max));
                }
            }
        }
        Ok(())
    }
}

impl FieldKind {
    fn describe(&self) -> &'static str {
        match self {
            FieldKind::Int => "integer",
            FieldKind::Float => "number",
            FieldKind::Bool => "boolean",
            FieldKind::String => "string",
            FieldKind::Email => "email string",
            FieldKind::Timestamp => "timestamp string",
            FieldKind::Json => "json",
            FieldKind::IntArray => "array of integers",
        }
    }
}

/// A uniqueness constraint, optionally restricted to documents where
/// `partial.0 == partial.1` (e.g. only pending applications).
#[derive(Debug)]
pub struct UniqueIndex {
    pub name: &'static str,
    pub fields: &'static [&'static str],
    pub partial: Option<(&'static str, &'static str)>,
    pub message: &'static str,
}

impl UniqueIndex {
    pub fn applies_to(&self, doc: &Map<String, Value>) -> bool {
        match self.partial {
            Some((field, value)) => doc.get(field).and_then(Value::as_str) == Some(value),
            None => true,
        }
    }

    /// The indexed tuple, or `None` when any component is missing or null.
    pub fn key_of(&self, doc: &Map<String, Value>) -> Option<Vec<String>> {
        self.fields
            .iter()
            .map(|field| match doc.get(*field) {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            })
            .collect()
    }
}

#[derive(Debug)]
pub struct Schema {
    pub collection: &'static str,
    pub table: &'static str,
    pub label: &'static str,
    pub key: &'static str,
    /// Whether new ids come from the collection's sequence.
    pub sequenced: bool,
    pub fields: &'static [FieldSpec],
    pub unique: &'static [UniqueIndex],
    /// Fields list endpoints accept as equality filters.
    pub filterable: &'static [&'static str],
    /// Timestamp stamped on every update.
    pub updated_at: Option<&'static str>,
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Document failed validation for {collection}")]
    Invalid {
        collection: &'static str,
        field_errors: BTreeMap<String, String>,
    },
}

impl SchemaError {
    pub fn field_errors(&self) -> &BTreeMap<String, String> {
        match self {
            SchemaError::Invalid { field_errors, .. } => field_errors,
        }
    }
}

impl Schema {
    pub fn validate(&self, doc: &Map<String, Value>) -> Result<(), SchemaError> {
        let mut field_errors = BTreeMap::new();

        match doc.get(self.key) {
            Some(value) if as_integer(value).is_some() => {}
            _ => {
                field_errors.insert(self.key.to_string(), "must be of type integer".to_string());
            }
        }

        for field in self.fields {
            match doc.get(field.name) {
                None if field.required => {
                    field_errors.insert(field.name.to_string(), "is required".to_string());
                }
                None => {}
                Some(Value::Null) if field.nullable => {}
                Some(Value::Null) => {
                    field_errors.insert(field.name.to_string(), "must not be null".to_string());
                }
                Some(value) => {
                    if let Err(reason) = field.check(value) {
                        field_errors.insert(field.name.to_string(), reason);
                    }
                }
            }
        }

        if field_errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::Invalid {
                collection: self.collection,
                field_errors,
            })
        }
    }

    /// Checks one element about to be appended to the array field `field`,
    /// for stores that append in place instead of rewriting the document.
    pub fn validate_element(&self, field: &str, value: &Value) -> Result<(), SchemaError> {
        let reason = match self.fields.iter().find(|spec| spec.name == field) {
            Some(spec) if spec.kind == FieldKind::IntArray => {
                spec.check(&Value::Array(vec![value.clone()])).err()
            }
            Some(_) => Some("is not an array field".to_string()),
            None => Some("is not a declared field".to_string()),
        };
        match reason {
            None => Ok(()),
            Some(reason) => Err(SchemaError::Invalid {
                collection: self.collection,
                field_errors: BTreeMap::from([(field.to_string(), reason)]),
            }),
        }
    }

    pub fn id_of(&self, doc: &Map<String, Value>) -> Option<i64> {
        doc.get(self.key).and_then(as_integer)
    }

    pub fn is_filterable(&self, field: &str) -> bool {
        field == self.key || self.filterable.contains(&field)
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        _ => None,
    }
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };
    match domain.rsplit_once('.') {
        Some((host, tld)) => !local.is_empty() && !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

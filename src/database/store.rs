use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::filter::Filter;
use crate::schema::Schema;

use super::manager::DatabaseError;

/// One stored record: a JSON object whose key field equals its row id.
pub type Document = Map<String, Value>;

/// Collection-oriented storage behind every repository.
///
/// Implementations enforce the schema guard on `insert`, `replace` and
/// `add_to_set`, the unique indexes each [`Schema`] declares, and hand out
/// ids from a per-collection atomic sequence.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn backend(&self) -> &'static str;

    /// Creates tables, indexes and sequences. Safe to call repeatedly.
    async fn prepare(&self, schemas: &[&'static Schema]) -> Result<(), DatabaseError>;

    async fn next_id(&self, schema: &'static Schema) -> Result<i64, DatabaseError>;

    /// Advances the sequence so the next id is greater than `at_least`.
    async fn sync_sequence(&self, schema: &'static Schema, at_least: i64) -> Result<(), DatabaseError>;

    async fn insert(&self, schema: &'static Schema, doc: Document) -> Result<(), DatabaseError>;

    async fn get(&self, schema: &'static Schema, id: i64) -> Result<Option<Document>, DatabaseError>;

    /// Matching documents in id order.
    async fn find(&self, schema: &'static Schema, filter: &Filter) -> Result<Vec<Document>, DatabaseError>;

    async fn count(&self, schema: &'static Schema, filter: &Filter) -> Result<i64, DatabaseError>;

    /// Overwrites the document with the same id. `false` when it does not exist.
    async fn replace(&self, schema: &'static Schema, doc: Document) -> Result<bool, DatabaseError>;

    async fn delete(&self, schema: &'static Schema, id: i64) -> Result<bool, DatabaseError>;

    /// Up to `n` documents chosen at random.
    async fn sample(&self, schema: &'static Schema, n: usize) -> Result<Vec<Document>, DatabaseError>;

    /// Appends `value` to the array `field` of document `id` unless already
    /// present, creating the document when missing. Returns whether anything
    /// changed. Atomic per document.
    async fn add_to_set(
        &self,
        schema: &'static Schema,
        id: i64,
        field: &str,
        value: Value,
    ) -> Result<bool, DatabaseError>;

    /// Removes `value` from the array `field` of document `id`.
    async fn pull(&self, schema: &'static Schema, id: i64, field: &str, value: &Value) -> Result<bool, DatabaseError>;

    /// Removes `value` from the array `field` of every document. Returns the
    /// number of documents changed.
    async fn pull_from_all(&self, schema: &'static Schema, field: &str, value: &Value) -> Result<u64, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

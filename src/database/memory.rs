use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::filter::filter_match::values_equal;
use crate::filter::Filter;
use crate::schema::Schema;

use super::manager::DatabaseError;
use super::store::{Document, DocumentStore};

#[derive(Default)]
struct Collections {
    docs: HashMap<&'static str, BTreeMap<i64, Document>>,
    sequences: HashMap<&'static str, i64>,
}

/// Process-local store with the same contract as the PostgreSQL store.
/// A single lock serializes writers, which makes every operation atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Collections {
    fn table(&mut self, schema: &'static Schema) -> &mut BTreeMap<i64, Document> {
        self.docs.entry(schema.table).or_default()
    }

    fn check_unique(&self, schema: &'static Schema, id: i64, doc: &Document) -> Result<(), DatabaseError> {
        let Some(existing) = self.docs.get(schema.table) else {
            return Ok(());
        };
        for index in schema.unique {
            if !index.applies_to(doc) {
                continue;
            }
            let Some(key) = index.key_of(doc) else {
                continue;
            };
            let clash = existing
                .iter()
                .any(|(other_id, other)| *other_id != id && index.applies_to(other) && index.key_of(other).as_ref() == Some(&key));
            if clash {
                return Err(DatabaseError::Duplicate {
                    collection: schema.collection,
                    index: index.name.to_string(),
                    message: index.message.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn document_id(schema: &'static Schema, doc: &Document) -> Result<i64, DatabaseError> {
    schema.validate(doc)?;
    schema
        .id_of(doc)
        .ok_or_else(|| DatabaseError::QueryError(format!("{} document has no {}", schema.collection, schema.key)))
}

fn primary_key_clash(schema: &'static Schema) -> DatabaseError {
    DatabaseError::Duplicate {
        collection: schema.collection,
        index: format!("{}_pkey", schema.table),
        message: format!("{} with this id already exists", schema.label),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn prepare(&self, schemas: &[&'static Schema]) -> Result<(), DatabaseError> {
        let mut inner = self.inner.write().await;
        for schema in schemas {
            inner.table(schema);
        }
        Ok(())
    }

    async fn next_id(&self, schema: &'static Schema) -> Result<i64, DatabaseError> {
        let mut inner = self.inner.write().await;
        let value = inner.sequences.entry(schema.collection).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn sync_sequence(&self, schema: &'static Schema, at_least: i64) -> Result<(), DatabaseError> {
        let mut inner = self.inner.write().await;
        let value = inner.sequences.entry(schema.collection).or_insert(0);
        *value = (*value).max(at_least);
        Ok(())
    }

    async fn insert(&self, schema: &'static Schema, doc: Document) -> Result<(), DatabaseError> {
        let id = document_id(schema, &doc)?;
        let mut inner = self.inner.write().await;
        if inner.table(schema).contains_key(&id) {
            return Err(primary_key_clash(schema));
        }
        inner.check_unique(schema, id, &doc)?;
        inner.table(schema).insert(id, doc);
        Ok(())
    }

    async fn get(&self, schema: &'static Schema, id: i64) -> Result<Option<Document>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner.docs.get(schema.table).and_then(|docs| docs.get(&id)).cloned())
    }

    async fn find(&self, schema: &'static Schema, filter: &Filter) -> Result<Vec<Document>, DatabaseError> {
        let inner = self.inner.read().await;
        let Some(docs) = inner.docs.get(schema.table) else {
            return Ok(vec![]);
        };
        let limit = filter.get_limit().map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(docs
            .values()
            .filter(|doc| filter.matches(doc))
            .skip(filter.get_offset() as usize)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, schema: &'static Schema, filter: &Filter) -> Result<i64, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner
            .docs
            .get(schema.table)
            .map(|docs| docs.values().filter(|doc| filter.matches(doc)).count() as i64)
            .unwrap_or(0))
    }

    async fn replace(&self, schema: &'static Schema, doc: Document) -> Result<bool, DatabaseError> {
        let id = document_id(schema, &doc)?;
        let mut inner = self.inner.write().await;
        if !inner.table(schema).contains_key(&id) {
            return Ok(false);
        }
        inner.check_unique(schema, id, &doc)?;
        inner.table(schema).insert(id, doc);
        Ok(true)
    }

    async fn delete(&self, schema: &'static Schema, id: i64) -> Result<bool, DatabaseError> {
        let mut inner = self.inner.write().await;
        Ok(inner.table(schema).remove(&id).is_some())
    }

    async fn sample(&self, schema: &'static Schema, n: usize) -> Result<Vec<Document>, DatabaseError> {
        let inner = self.inner.read().await;
        let Some(docs) = inner.docs.get(schema.table) else {
            return Ok(vec![]);
        };
        let all: Vec<&Document> = docs.values().collect();
        let picked = {
            let mut rng = rand::thread_rng();
            all.choose_multiple(&mut rng, n).map(|doc| (*doc).clone()).collect()
        };
        Ok(picked)
    }

    async fn add_to_set(
        &self,
        schema: &'static Schema,
        id: i64,
        field: &str,
        value: Value,
    ) -> Result<bool, DatabaseError> {
        schema.validate_element(field, &value)?;

        let mut inner = self.inner.write().await;
        let mut doc = match inner.table(schema).get(&id) {
            Some(doc) => doc.clone(),
            None => {
                let mut doc = Document::new();
                doc.insert(schema.key.to_string(), Value::from(id));
                doc
            }
        };

        let items = doc
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(vec![]))
            .as_array_mut()
            .ok_or_else(|| DatabaseError::QueryError(format!("{}.{} is not an array", schema.collection, field)))?;
        if items.iter().any(|item| values_equal(item, &value)) {
            return Ok(false);
        }
        items.push(value);

        schema.validate(&doc)?;
        inner.table(schema).insert(id, doc);
        Ok(true)
    }

    async fn pull(&self, schema: &'static Schema, id: i64, field: &str, value: &Value) -> Result<bool, DatabaseError> {
        let mut inner = self.inner.write().await;
        let Some(doc) = inner.table(schema).get_mut(&id) else {
            return Ok(false);
        };
        Ok(remove_from_array(doc, field, value))
    }

    async fn pull_from_all(&self, schema: &'static Schema, field: &str, value: &Value) -> Result<u64, DatabaseError> {
        let mut inner = self.inner.write().await;
        let changed = inner
            .table(schema)
            .values_mut()
            .map(|doc| remove_from_array(doc, field, value))
            .filter(|changed| *changed)
            .count();
        Ok(changed as u64)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

fn remove_from_array(doc: &mut Document, field: &str, value: &Value) -> bool {
    match doc.get_mut(field).and_then(Value::as_array_mut) {
        Some(items) => {
            let before = items.len();
            items.retain(|item| !values_equal(item, value));
            items.len() != before
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{APPLICATIONS, USERS, USER_SCENARIOS};
    use serde_json::json;
    use std::sync::Arc;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn user(id: i64, email: &str, org: i64) -> Document {
        doc(json!({
            "userId": id,
            "organizationId": org,
            "email": email,
            "passwordHash": "$2b$04$hash",
            "userType": "graduate",
            "createdAt": "2024-05-01T09:00:00Z",
            "accountStatus": "active",
            "verificationStatus": true
        }))
    }

    fn application(id: i64, status: &str) -> Document {
        doc(json!({
            "applicationId": id,
            "userId": 4,
            "organizationId": 2,
            "status": status,
            "applicationDate": "2024-05-01T09:00:00Z"
        }))
    }

    #[tokio::test]
    async fn sequences_are_monotonic_and_respect_sync() {
        let store = MemoryStore::new();
        assert_eq!(store.next_id(&USERS).await.unwrap(), 1);
        assert_eq!(store.next_id(&USERS).await.unwrap(), 2);
        store.sync_sequence(&USERS, 10).await.unwrap();
        assert_eq!(store.next_id(&USERS).await.unwrap(), 11);
        store.sync_sequence(&USERS, 3).await.unwrap();
        assert_eq!(store.next_id(&USERS).await.unwrap(), 12);
    }

    #[tokio::test]
    async fn concurrent_allocation_never_repeats() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.next_id(&USERS).await.unwrap() })
            })
            .collect();
        let mut ids = vec![];
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 32);
    }

    #[tokio::test]
    async fn unique_email_is_enforced() {
        let store = MemoryStore::new();
        store.insert(&USERS, user(1, "a@leo.co.jp", 0)).await.unwrap();
        let err = store.insert(&USERS, user(2, "a@leo.co.jp", 0)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Duplicate { ref index, .. } if index == "users_email_key"));

        let err = store.insert(&USERS, user(1, "b@leo.co.jp", 0)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Duplicate { ref index, .. } if index == "users_pkey"));

        // Replacing a document with its own email is not a clash
        assert!(store.replace(&USERS, user(1, "a@leo.co.jp", 3)).await.unwrap());
    }

    #[tokio::test]
    async fn pending_uniqueness_ignores_decided_applications() {
        let store = MemoryStore::new();
        store.insert(&APPLICATIONS, application(1, "rejected")).await.unwrap();
        store.insert(&APPLICATIONS, application(2, "pending")).await.unwrap();
        let err = store.insert(&APPLICATIONS, application(3, "pending")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn schema_guard_rejects_bad_documents() {
        let store = MemoryStore::new();
        let mut bad = user(1, "a@leo.co.jp", 0);
        bad.insert("userType".into(), json!("pirate"));
        let err = store.insert(&USERS, bad).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[tokio::test]
    async fn add_to_set_is_idempotent_and_pull_removes() {
        let store = MemoryStore::new();
        assert!(store.add_to_set(&USER_SCENARIOS, 3, "scenarios", json!(1)).await.unwrap());
        assert!(store.add_to_set(&USER_SCENARIOS, 3, "scenarios", json!(2)).await.unwrap());
        assert!(!store.add_to_set(&USER_SCENARIOS, 3, "scenarios", json!(1)).await.unwrap());
        assert!(store.add_to_set(&USER_SCENARIOS, 4, "scenarios", json!(2)).await.unwrap());

        let list = store.get(&USER_SCENARIOS, 3).await.unwrap().unwrap();
        assert_eq!(list["scenarios"], json!([1, 2]));

        assert_eq!(store.pull_from_all(&USER_SCENARIOS, "scenarios", &json!(2)).await.unwrap(), 2);
        assert!(!store.pull(&USER_SCENARIOS, 3, "scenarios", &json!(2)).await.unwrap());
        assert!(store.pull(&USER_SCENARIOS, 3, "scenarios", &json!(1)).await.unwrap());
    }

    #[tokio::test]
    async fn add_to_set_rejects_elements_of_the_wrong_type() {
        let store = MemoryStore::new();
        let err = store
            .add_to_set(&USER_SCENARIOS, 3, "scenarios", json!("1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)), "{:?}", err);
        assert!(store.get(&USER_SCENARIOS, 3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_filters_and_pages_in_id_order() {
        let store = MemoryStore::new();
        for (id, org) in [(1, 2), (2, 3), (3, 2), (4, 2)] {
            store.insert(&USERS, user(id, &format!("u{}@leo.co.jp", id), org)).await.unwrap();
        }
        let mut filter = Filter::new(USERS.table).unwrap();
        filter.where_clause(&json!({"organizationId": 2})).unwrap();
        assert_eq!(store.count(&USERS, &filter).await.unwrap(), 3);

        filter.limit(2, Some(1)).unwrap();
        let ids: Vec<_> = store
            .find(&USERS, &filter)
            .await
            .unwrap()
            .iter()
            .map(|d| d["userId"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![3, 4]);
    }
}

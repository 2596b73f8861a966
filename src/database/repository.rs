use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::database::manager::DatabaseError;
use crate::database::models::Resource;
use crate::database::store::{Document, DocumentStore};
use crate::filter::{Filter, FilterData};
use crate::schema::Schema;

/// Typed access to one collection. Records go through the store as JSON
/// documents; the store's schema guard checks every write.
pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _phantom: PhantomData<T>,
}

impl<T: Resource> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    fn schema() -> &'static Schema {
        T::SCHEMA
    }

    fn filter(filter_data: FilterData) -> Result<Filter, DatabaseError> {
        let mut filter = Filter::new(Self::schema().table)?;
        filter.assign(filter_data)?;
        Ok(filter)
    }

    fn decode(doc: Document) -> Result<T, DatabaseError> {
        let id = Self::schema().id_of(&doc).unwrap_or_default();
        serde_json::from_value(Value::Object(doc)).map_err(|e| DatabaseError::Corrupt {
            collection: Self::schema().collection,
            id,
            reason: e.to_string(),
        })
    }

    fn encode(record: &T) -> Result<Document, DatabaseError> {
        match serde_json::to_value(record)? {
            Value::Object(doc) => Ok(doc),
            _ => Err(DatabaseError::QueryError(format!(
                "{} record did not serialize to an object",
                Self::schema().collection
            ))),
        }
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        let filter = Self::filter(filter_data)?;
        self.store
            .find(Self::schema(), &filter)
            .await?
            .into_iter()
            .map(Self::decode)
            .collect()
    }

    pub async fn select_one(&self, filter_data: FilterData) -> Result<Option<T>, DatabaseError> {
        let mut filter = Self::filter(filter_data)?;
        filter.limit(1, None)?;
        match self.store.find(Self::schema(), &filter).await?.into_iter().next() {
            Some(doc) => Ok(Some(Self::decode(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn select_id(&self, id: i64) -> Result<Option<T>, DatabaseError> {
        self.store
            .get(Self::schema(), id)
            .await?
            .map(Self::decode)
            .transpose()
    }

    /// Like [`select_id`](Self::select_id) but a missing record is
    /// `NotFound("<Label> not found")`.
    pub async fn select_404(&self, id: i64) -> Result<T, DatabaseError> {
        self.select_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} not found", Self::schema().label)))
    }

    pub async fn select_ids(&self, ids: &[i64]) -> Result<Vec<T>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let mut clause = Document::new();
        clause.insert(Self::schema().key.to_string(), json!({ "$in": ids }));
        self.select_any(FilterData::with_where(Value::Object(clause))).await
    }

    pub async fn count(&self, filter_data: FilterData) -> Result<i64, DatabaseError> {
        let filter = Self::filter(filter_data)?;
        self.store.count(Self::schema(), &filter).await
    }

    /// Stores a new record under the next id from the collection sequence.
    pub async fn create(&self, mut record: T) -> Result<T, DatabaseError> {
        let id = self.store.next_id(Self::schema()).await?;
        record.set_id(id);
        self.store.insert(Self::schema(), Self::encode(&record)?).await?;
        Ok(record)
    }

    /// Stores a record under the id it already carries.
    pub async fn insert(&self, record: T) -> Result<T, DatabaseError> {
        self.store.insert(Self::schema(), Self::encode(&record)?).await?;
        Ok(record)
    }

    /// Merges the serialized `patch` over the stored record, stamps the
    /// collection's updated-at field and writes the result back. The key
    /// field is never overwritten.
    pub async fn update<P: Serialize>(&self, id: i64, patch: &P) -> Result<T, DatabaseError> {
        self.merge(id, patch, true).await
    }

    /// Like [`update`](Self::update) without touching the updated-at field.
    pub async fn patch<P: Serialize>(&self, id: i64, patch: &P) -> Result<T, DatabaseError> {
        self.merge(id, patch, false).await
    }

    async fn merge<P: Serialize>(&self, id: i64, patch: &P, stamp: bool) -> Result<T, DatabaseError> {
        let schema = Self::schema();
        let mut doc = self
            .store
            .get(schema, id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} not found", schema.label)))?;

        if let Value::Object(changes) = serde_json::to_value(patch)? {
            for (field, value) in changes {
                if field != schema.key {
                    doc.insert(field, value);
                }
            }
        }
        if let (true, Some(field)) = (stamp, schema.updated_at) {
            doc.insert(field.to_string(), json!(Utc::now()));
        }

        schema.validate(&doc)?;
        let record = Self::decode(doc.clone())?;
        if !self.store.replace(schema, doc).await? {
            return Err(DatabaseError::NotFound(format!("{} not found", schema.label)));
        }
        Ok(record)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        self.store.delete(Self::schema(), id).await
    }

    /// Deletes the record, or `NotFound` when it does not exist.
    pub async fn delete_404(&self, id: i64) -> Result<(), DatabaseError> {
        if self.delete(id).await? {
            Ok(())
        } else {
            Err(DatabaseError::NotFound(format!("{} not found", Self::schema().label)))
        }
    }

    pub async fn sample(&self, n: usize) -> Result<Vec<T>, DatabaseError> {
        self.store
            .sample(Self::schema(), n)
            .await?
            .into_iter()
            .map(Self::decode)
            .collect()
    }

    pub async fn add_to_set(&self, id: i64, field: &str, value: impl Into<Value>) -> Result<bool, DatabaseError> {
        self.store.add_to_set(Self::schema(), id, field, value.into()).await
    }

    pub async fn pull(&self, id: i64, field: &str, value: impl Into<Value>) -> Result<bool, DatabaseError> {
        self.store.pull(Self::schema(), id, field, &value.into()).await
    }

    pub async fn pull_from_all(&self, field: &str, value: impl Into<Value>) -> Result<u64, DatabaseError> {
        self.store.pull_from_all(Self::schema(), field, &value.into()).await
    }
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _phantom: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use crate::database::models::{Organization, UpdateOrganization};

    fn organization(name: &str) -> Organization {
        serde_json::from_value(json!({
            "organizationId": 0,
            "name": name,
            "industry": "Technology",
            "contactEmail": "hr@leo.co.jp"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let repo = Repository::<Organization>::new(Arc::new(MemoryStore::new()));
        let first = repo.create(organization("Leo/need")).await.unwrap();
        let second = repo.create(organization("MORE MORE JUMP")).await.unwrap();
        assert_eq!(first.organization_id, 1);
        assert_eq!(second.organization_id, 2);
        assert_eq!(repo.count(FilterData::all()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn update_merges_and_keeps_the_key() {
        let repo = Repository::<Organization>::new(Arc::new(MemoryStore::new()));
        let org = repo.create(organization("Leo/need")).await.unwrap();

        let patch = UpdateOrganization {
            industry: Some("Music".into()),
            ..Default::default()
        };
        let updated = repo.update(org.organization_id, &patch).await.unwrap();
        assert_eq!(updated.organization_id, org.organization_id);
        assert_eq!(updated.industry, "Music");
        assert_eq!(updated.name, "Leo/need");
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn missing_records_are_not_found() {
        let repo = Repository::<Organization>::new(Arc::new(MemoryStore::new()));
        let err = repo.select_404(9).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(ref m) if m == "Organization not found"));
        let err = repo.update(9, &UpdateOrganization::default()).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }
}

//! Demo data loaded into empty collections.
//!
//! Fixtures live in `fixtures.json`, keyed by collection name. Each record
//! goes through its typed model, so legacy field names and loose casing are
//! normalized exactly as request bodies are, and the store's schema guard
//! checks every document. Users carry a clear `password` that is hashed at
//! seed time.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

use crate::auth::password::{hash_password, PasswordError};
use crate::database::models::{
    Application, AssessmentResult, Module, Notification, Organization, Resource, Scenario, Skill, TrainingSession,
    User, UserProfile, UserScenarios, UserSkill,
};
use crate::database::{DatabaseError, DocumentStore, Repository};
use crate::filter::FilterData;

const FIXTURES: &str = include_str!("fixtures.json");

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Malformed seed fixtures: {0}")]
    Fixtures(#[source] serde_json::Error),

    #[error("Seed record {index} in {collection} does not decode: {source}")]
    Record {
        collection: &'static str,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// What happened to one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedOutcome {
    pub collection: &'static str,
    pub inserted: usize,
    /// The collection already held data and was left alone.
    pub skipped: bool,
}

/// Seeds every empty collection.
///
/// Users are seeded first and a failure there aborts the run, since every
/// other collection refers to them. Failures in later collections are
/// logged and the remaining collections are still attempted.
pub async fn seed(store: Arc<dyn DocumentStore>, bcrypt_cost: u32) -> Result<Vec<SeedOutcome>, SeedError> {
    let mut fixtures: HashMap<String, Vec<Value>> = serde_json::from_str(FIXTURES).map_err(SeedError::Fixtures)?;
    let mut take = |collection: &str| fixtures.remove(collection).unwrap_or_default();

    let mut outcomes = Vec::new();

    let users = hash_passwords(take("users"), bcrypt_cost).await?;
    outcomes.push(seed_collection::<User>(&store, users).await?);

    macro_rules! seed_rest {
        ($($ty:ty),+ $(,)?) => {
            $(
                let collection = <$ty as Resource>::SCHEMA.collection;
                match seed_collection::<$ty>(&store, take(collection)).await {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(e) => error!(collection = collection, "Seeding failed: {}", e),
                }
            )+
        };
    }

    seed_rest!(
        UserProfile,
        Organization,
        Module,
        Scenario,
        Application,
        TrainingSession,
        AssessmentResult,
        Skill,
        UserSkill,
        Notification,
        UserScenarios,
    );

    let inserted: usize = outcomes.iter().map(|o| o.inserted).sum();
    info!("Seeding finished: {} records inserted", inserted);
    Ok(outcomes)
}

async fn seed_collection<T: Resource>(
    store: &Arc<dyn DocumentStore>,
    docs: Vec<Value>,
) -> Result<SeedOutcome, SeedError> {
    let schema = T::SCHEMA;
    let repo = Repository::<T>::new(store.clone());

    if repo.count(FilterData::all()).await? > 0 {
        info!(collection = schema.collection, "Collection not empty, skipping seed");
        return Ok(SeedOutcome {
            collection: schema.collection,
            inserted: 0,
            skipped: true,
        });
    }

    let mut max_id = 0;
    let mut inserted = 0;
    let loaded: Result<(), SeedError> = async {
        for (index, doc) in docs.into_iter().enumerate() {
            let record: T = serde_json::from_value(doc).map_err(|source| SeedError::Record {
                collection: schema.collection,
                index,
                source,
            })?;
            let id = record.id();
            repo.insert(record).await?;
            max_id = max_id.max(id);
            inserted += 1;
        }
        Ok(())
    }
    .await;

    // Records written before a failure still move the sequence, since a
    // later run skips the now non-empty collection.
    let synced = if schema.sequenced && max_id > 0 {
        store.sync_sequence(schema, max_id).await
    } else {
        Ok(())
    };
    loaded?;
    synced?;

    info!(collection = schema.collection, "Seeded {} records", inserted);
    Ok(SeedOutcome {
        collection: schema.collection,
        inserted,
        skipped: false,
    })
}

/// Replaces each clear `password` with a `passwordHash`. Equal passwords
/// are hashed once.
async fn hash_passwords(mut users: Vec<Value>, cost: u32) -> Result<Vec<Value>, SeedError> {
    let mut hashes: HashMap<String, String> = HashMap::new();

    for user in users.iter_mut() {
        let Some(doc) = user.as_object_mut() else { continue };
        let Some(Value::String(password)) = doc.remove("password") else { continue };

        let hash = match hashes.get(&password) {
            Some(hash) => hash.clone(),
            None => {
                let hash = hash_password(&password, cost).await?;
                hashes.insert(password, hash.clone());
                hash
            }
        };
        doc.insert("passwordHash".to_string(), Value::String(hash));
    }
    Ok(users)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use crate::database::MemoryStore;
    use crate::schema;
    use serde_json::json;

    fn memory() -> Arc<dyn DocumentStore> {
        Arc::new(MemoryStore::new())
    }

    #[tokio::test]
    async fn seeds_every_collection_once() {
        let store = memory();
        let outcomes = seed(store.clone(), 4).await.unwrap();

        assert_eq!(outcomes.len(), schema::ALL.len());
        assert!(outcomes.iter().all(|o| !o.skipped && o.inserted > 0));

        let again = seed(store.clone(), 4).await.unwrap();
        assert!(again.iter().all(|o| o.skipped && o.inserted == 0));
    }

    #[tokio::test]
    async fn seeded_passwords_verify() {
        let store = memory();
        seed(store.clone(), 4).await.unwrap();

        let users = Repository::<User>::new(store);
        let miku = users.select_404(1).await.unwrap();
        assert_eq!(miku.email, "hatsune.miku@vsingers.com");
        assert!(verify_password("password123", &miku.password_hash).await.unwrap());
    }

    #[tokio::test]
    async fn sequences_continue_after_seeded_ids() {
        let store = memory();
        seed(store.clone(), 4).await.unwrap();

        assert_eq!(store.next_id(&schema::SCENARIOS).await.unwrap(), 5);
        assert_eq!(store.next_id(&schema::USERS).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn partial_seed_still_advances_the_sequence() {
        let store = memory();
        let docs = vec![
            json!({"userSkillId": 7, "userId": 3, "skillId": 1, "proficiencyLevel": 3, "lastAssessed": "2024-05-10T14:48:23Z"}),
            json!({"userSkillId": 8, "userId": 4, "skillId": 1, "proficiencyLevel": 9, "lastAssessed": "2024-05-10T14:48:23Z"}),
        ];

        let err = seed_collection::<UserSkill>(&store, docs).await.unwrap_err();
        assert!(matches!(err, SeedError::Database(DatabaseError::Validation(_))), "{:?}", err);
        assert_eq!(store.next_id(&schema::USER_SKILLS).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn normalizes_legacy_field_names() {
        let store = memory();
        seed(store.clone(), 4).await.unwrap();

        let scenario = Repository::<Scenario>::new(store).select_404(1).await.unwrap();
        assert_eq!(scenario.title, "First Day Introductions");
        assert_eq!(scenario.duration, 15);
        assert_eq!(scenario.ai_model_config["responseStyle"], json!("professional"));
    }

    #[tokio::test]
    async fn hashes_each_distinct_password_once() {
        let users = vec![
            json!({"userId": 1, "password": "same"}),
            json!({"userId": 2, "password": "same"}),
            json!({"userId": 3, "passwordHash": "kept"}),
        ];
        let hashed = hash_passwords(users, 4).await.unwrap();

        assert!(hashed[0].get("password").is_none());
        assert_eq!(hashed[0]["passwordHash"], hashed[1]["passwordHash"]);
        assert_eq!(hashed[2]["passwordHash"], json!("kept"));
    }
}

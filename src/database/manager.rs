use std::sync::Arc;
use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::filter::FilterError;
use crate::schema::SchemaError;

use super::memory::MemoryStore;
use super::postgres::PgStore;
use super::store::DocumentStore;

/// Errors raised below the HTTP layer by stores and repositories.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A unique index rejected the write.
    #[error("Duplicate in {collection} ({index}): {message}")]
    Duplicate {
        collection: &'static str,
        index: String,
        message: String,
    },

    #[error("Query error: {0}")]
    QueryError(String),

    /// A stored document no longer decodes into its record type.
    #[error("Corrupt document {collection}/{id}: {reason}")]
    Corrupt {
        collection: &'static str,
        id: i64,
        reason: String,
    },

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Validation(#[from] SchemaError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Opens the configured document store.
pub struct DatabaseManager;

impl DatabaseManager {
    /// Connection pool sized from configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!(
            "Created database pool (max {} connections)",
            config.max_connections
        );
        Ok(pool)
    }

    /// PostgreSQL when `DATABASE_URL` is set, otherwise a process-local
    /// in-memory store.
    pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn DocumentStore>, DatabaseError> {
        match config.url {
            Some(_) => {
                let pool = Self::connect(config).await?;
                Ok(Arc::new(PgStore::new(pool)))
            }
            None => {
                warn!("DATABASE_URL not set, using in-memory store; data is lost on exit");
                Ok(Arc::new(MemoryStore::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_requires_a_url() {
        let config = DatabaseConfig {
            url: None,
            max_connections: 2,
            connection_timeout: 1,
        };
        let err = DatabaseManager::connect(&config).await.unwrap_err();
        assert!(matches!(err, DatabaseError::ConfigMissing("DATABASE_URL")));
    }

    #[tokio::test]
    async fn falls_back_to_memory_store() {
        let config = DatabaseConfig {
            url: None,
            max_connections: 2,
            connection_timeout: 1,
        };
        let store = DatabaseManager::open_store(&config).await.unwrap();
        assert_eq!(store.backend(), "memory");
        assert!(store.health_check().await.is_ok());
    }
}

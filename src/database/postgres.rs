use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgRow, types::Json, PgPool, Row};
use tracing::info;

use crate::filter::Filter;
use crate::schema::Schema;

use super::manager::DatabaseError;
use super::store::{Document, DocumentStore};

const UNIQUE_VIOLATION: &str = "23505";

/// One JSONB document per row: `(id BIGINT PRIMARY KEY, doc JSONB NOT NULL)`.
///
/// Table, index and field names come from static [`Schema`] declarations
/// and validated filters, never from request input.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn create_table_sql(schema: &Schema) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (id BIGINT PRIMARY KEY, doc JSONB NOT NULL)",
            schema.table
        )
    }

    fn create_index_sql(schema: &Schema) -> Vec<String> {
        let mut statements: Vec<String> = schema
            .unique
            .iter()
            .map(|index| {
                let columns = index
                    .fields
                    .iter()
                    .map(|field| format!("(doc ->> '{}')", field))
                    .collect::<Vec<_>>()
                    .join(", ");
                let predicate = index
                    .partial
                    .map(|(field, value)| format!(" WHERE doc ->> '{}' = '{}'", field, value))
                    .unwrap_or_default();
                format!(
                    "CREATE UNIQUE INDEX IF NOT EXISTS \"{}\" ON \"{}\" ({}){}",
                    index.name, schema.table, columns, predicate
                )
            })
            .collect();

        statements.extend(schema.filterable.iter().map(|field| {
            format!(
                "CREATE INDEX IF NOT EXISTS \"{table}_{field}_idx\" ON \"{table}\" ((doc -> '{field}'))",
                table = schema.table,
                field = field
            )
        }));
        statements
    }

    fn document(row: &PgRow) -> Result<Document, DatabaseError> {
        let Json(doc) = row.try_get::<Json<Document>, _>("doc")?;
        Ok(doc)
    }

    /// Maps unique violations onto the index that raised them.
    fn write_error(schema: &'static Schema, err: sqlx::Error) -> DatabaseError {
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let constraint = db.constraint().unwrap_or_default().to_string();
                let message = schema
                    .unique
                    .iter()
                    .find(|index| index.name == constraint)
                    .map(|index| index.message.to_string())
                    .unwrap_or_else(|| format!("{} with this id already exists", schema.label));
                return DatabaseError::Duplicate {
                    collection: schema.collection,
                    index: constraint,
                    message,
                };
            }
        }
        DatabaseError::Sqlx(err)
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn prepare(&self, schemas: &[&'static Schema]) -> Result<(), DatabaseError> {
        sqlx::query("CREATE TABLE IF NOT EXISTS id_sequences (name TEXT PRIMARY KEY, value BIGINT NOT NULL)")
            .execute(&self.pool)
            .await?;

        for schema in schemas {
            sqlx::query(&Self::create_table_sql(schema)).execute(&self.pool).await?;
            for statement in Self::create_index_sql(schema) {
                sqlx::query(&statement).execute(&self.pool).await?;
            }
            info!("Prepared collection {}", schema.collection);
        }
        Ok(())
    }

    async fn next_id(&self, schema: &'static Schema) -> Result<i64, DatabaseError> {
        let value: i64 = sqlx::query_scalar(
            "INSERT INTO id_sequences (name, value) VALUES ($1, 1) \
             ON CONFLICT (name) DO UPDATE SET value = id_sequences.value + 1 \
             RETURNING value",
        )
        .bind(schema.collection)
        .fetch_one(&self.pool)
        .await?;
        Ok(value)
    }

    async fn sync_sequence(&self, schema: &'static Schema, at_least: i64) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO id_sequences (name, value) VALUES ($1, $2) \
             ON CONFLICT (name) DO UPDATE SET value = GREATEST(id_sequences.value, EXCLUDED.value)",
        )
        .bind(schema.collection)
        .bind(at_least)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert(&self, schema: &'static Schema, doc: Document) -> Result<(), DatabaseError> {
        schema.validate(&doc)?;
        let id = schema
            .id_of(&doc)
            .ok_or_else(|| DatabaseError::QueryError(format!("{} document has no {}", schema.collection, schema.key)))?;

        sqlx::query(&format!("INSERT INTO \"{}\" (id, doc) VALUES ($1, $2)", schema.table))
            .bind(id)
            .bind(Json(&doc))
            .execute(&self.pool)
            .await
            .map_err(|e| Self::write_error(schema, e))?;
        Ok(())
    }

    async fn get(&self, schema: &'static Schema, id: i64) -> Result<Option<Document>, DatabaseError> {
        let row = sqlx::query(&format!("SELECT id, doc FROM \"{}\" WHERE id = $1", schema.table))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::document).transpose()
    }

    async fn find(&self, _schema: &'static Schema, filter: &Filter) -> Result<Vec<Document>, DatabaseError> {
        let sql = filter.to_sql();
        let mut query = sqlx::query(&sql.query);
        for param in sql.params {
            query = query.bind(Json(param));
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(Self::document).collect()
    }

    async fn count(&self, _schema: &'static Schema, filter: &Filter) -> Result<i64, DatabaseError> {
        let sql = filter.to_count_sql();
        let mut query = sqlx::query(&sql.query);
        for param in sql.params {
            query = query.bind(Json(param));
        }
        let row = query.fetch_one(&self.pool).await?;
        Ok(row.try_get::<i64, _>("count")?)
    }

    async fn replace(&self, schema: &'static Schema, doc: Document) -> Result<bool, DatabaseError> {
        schema.validate(&doc)?;
        let id = schema
            .id_of(&doc)
            .ok_or_else(|| DatabaseError::QueryError(format!("{} document has no {}", schema.collection, schema.key)))?;

        let result = sqlx::query(&format!("UPDATE \"{}\" SET doc = $2 WHERE id = $1", schema.table))
            .bind(id)
            .bind(Json(&doc))
            .execute(&self.pool)
            .await
            .map_err(|e| Self::write_error(schema, e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, schema: &'static Schema, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query(&format!("DELETE FROM \"{}\" WHERE id = $1", schema.table))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn sample(&self, schema: &'static Schema, n: usize) -> Result<Vec<Document>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "SELECT id, doc FROM \"{}\" ORDER BY random() LIMIT $1",
            schema.table
        ))
        .bind(n as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::document).collect()
    }

    async fn add_to_set(
        &self,
        schema: &'static Schema,
        id: i64,
        field: &str,
        value: Value,
    ) -> Result<bool, DatabaseError> {
        schema.validate_element(field, &value)?;

        // ON CONFLICT re-checks the WHERE against the locked row, so two
        // concurrent adds of the same value append it once.
        let sql = format!(
            "INSERT INTO \"{t}\" AS existing (id, doc) \
             VALUES ($1, jsonb_build_object($2::text, $1::bigint, $3::text, jsonb_build_array($4::jsonb))) \
             ON CONFLICT (id) DO UPDATE \
             SET doc = jsonb_set(existing.doc, ARRAY[$3::text], \
                 COALESCE(existing.doc -> $3::text, '[]'::jsonb) || jsonb_build_array($4::jsonb)) \
             WHERE NOT (COALESCE(existing.doc -> $3::text, '[]'::jsonb) @> jsonb_build_array($4::jsonb)) \
             RETURNING id",
            t = schema.table
        );
        let changed = sqlx::query(&sql)
            .bind(id)
            .bind(schema.key)
            .bind(field)
            .bind(Json(value))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::write_error(schema, e))?;
        Ok(changed.is_some())
    }

    async fn pull(&self, schema: &'static Schema, id: i64, field: &str, value: &Value) -> Result<bool, DatabaseError> {
        let sql = format!("{} AND id = $3", pull_sql(schema));
        let result = sqlx::query(&sql)
            .bind(field)
            .bind(Json(value))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn pull_from_all(&self, schema: &'static Schema, field: &str, value: &Value) -> Result<u64, DatabaseError> {
        let result = sqlx::query(&pull_sql(schema))
            .bind(field)
            .bind(Json(value))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Rewrites array `$1` without element `$2`, keeping order, on rows that
/// contain it.
fn pull_sql(schema: &Schema) -> String {
    format!(
        "UPDATE \"{}\" SET doc = jsonb_set(doc, ARRAY[$1::text], COALESCE(( \
             SELECT jsonb_agg(elem ORDER BY ord) \
             FROM jsonb_array_elements(doc -> $1::text) WITH ORDINALITY AS items(elem, ord) \
             WHERE elem <> $2::jsonb), '[]'::jsonb)) \
         WHERE jsonb_typeof(doc -> $1::text) = 'array' \
           AND (doc -> $1::text) @> jsonb_build_array($2::jsonb)",
        schema.table
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{APPLICATIONS, USERS, USER_SCENARIOS};

    #[test]
    fn renders_partial_unique_index() {
        let statements = PgStore::create_index_sql(&APPLICATIONS);
        assert_eq!(
            statements[0],
            "CREATE UNIQUE INDEX IF NOT EXISTS \"applications_pending_key\" ON \"applications\" \
             ((doc ->> 'userId'), (doc ->> 'organizationId')) WHERE doc ->> 'status' = 'pending'"
        );
        assert!(statements
            .iter()
            .any(|s| s.contains("\"applications_status_idx\"")));
    }

    #[test]
    fn renders_table_ddl() {
        assert_eq!(
            PgStore::create_table_sql(&USERS),
            "CREATE TABLE IF NOT EXISTS \"users\" (id BIGINT PRIMARY KEY, doc JSONB NOT NULL)"
        );
    }

    #[test]
    fn pull_targets_only_rows_holding_the_value() {
        let sql = pull_sql(&USER_SCENARIOS);
        assert!(sql.starts_with("UPDATE \"user_scenarios\""));
        assert!(sql.contains("@> jsonb_build_array($2::jsonb)"));
    }
}

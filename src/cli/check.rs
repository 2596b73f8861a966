use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use super::OutputFormat;
use crate::database::{DatabaseError, DocumentStore};
use crate::filter::Filter;
use crate::schema::{self, Schema};

#[derive(Debug, Serialize)]
pub struct InvalidDocument {
    pub id: Option<i64>,
    pub field_errors: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub collection: &'static str,
    pub documents: usize,
    pub invalid: Vec<InvalidDocument>,
}

/// Runs the write-time schema guard over everything already stored, which
/// catches rows written by older releases or edited by hand.
pub async fn check_store(store: &Arc<dyn DocumentStore>) -> Result<Vec<CheckReport>, DatabaseError> {
    let mut reports = Vec::with_capacity(schema::ALL.len());
    for schema in schema::ALL.iter().copied() {
        reports.push(check_collection(store, schema).await?);
    }
    Ok(reports)
}

async fn check_collection(
    store: &Arc<dyn DocumentStore>,
    schema: &'static Schema,
) -> Result<CheckReport, DatabaseError> {
    let filter = Filter::new(schema.table)?;
    let docs = store.find(schema, &filter).await?;

    let invalid = docs
        .iter()
        .filter_map(|doc| match schema.validate(doc) {
            Ok(()) => None,
            Err(e) => Some(InvalidDocument {
                id: schema.id_of(doc),
                field_errors: e.field_errors().clone(),
            }),
        })
        .collect();

    Ok(CheckReport {
        collection: schema.collection,
        documents: docs.len(),
        invalid,
    })
}

pub fn print(reports: &[CheckReport], format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", json!({ "collections": reports })),
        OutputFormat::Text => {
            for report in reports {
                println!(
                    "{:<20} {:>6} documents, {} invalid",
                    report.collection,
                    report.documents,
                    report.invalid.len()
                );
                for doc in &report.invalid {
                    let id = doc.id.map(|id| id.to_string()).unwrap_or_else(|| "?".to_string());
                    for (field, reason) in &doc.field_errors {
                        println!("    #{} {}: {}", id, field, reason);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    #[tokio::test]
    async fn seeded_store_passes_the_check() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        crate::seed::seed(store.clone(), 4).await.unwrap();

        let reports = check_store(&store).await.unwrap();
        assert_eq!(reports.len(), schema::ALL.len());
        assert!(reports.iter().all(|r| r.documents > 0 && r.invalid.is_empty()));
    }
}

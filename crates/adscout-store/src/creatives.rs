//! Operations on the `creatives` collection.

use adscout_core::{Creative, CreativeAnalysis};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::collections::CREATIVES;
use crate::document::{Direction, DocumentStore, FieldValue, Query, SortKind, WriteBatch};
use crate::StoreError;

fn decode_all(docs: Vec<crate::Document>) -> Result<Vec<Creative>, StoreError> {
    docs.iter().map(|doc| doc.decode(CREATIVES)).collect()
}

/// Returns the creative with the given id.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] when absent, or a backend/decode error.
pub async fn get_creative(store: &dyn DocumentStore, id: &str) -> Result<Creative, StoreError> {
    store
        .get(CREATIVES, id)
        .await?
        .ok_or_else(|| StoreError::NotFound {
            collection: CREATIVES.to_owned(),
            id: id.to_owned(),
        })?
        .decode(CREATIVES)
}

/// Looks up the stored creative carrying `hash`, if any.
///
/// # Errors
///
/// Returns a backend or decode error.
pub async fn find_creative_by_hash(
    store: &dyn DocumentStore,
    hash: &str,
) -> Result<Option<Creative>, StoreError> {
    let query = Query::collection(CREATIVES)
        .where_eq("hash", FieldValue::text(hash))
        .limit(1);
    match store.query(&query).await?.first() {
        Some(doc) => Ok(Some(doc.decode(CREATIVES)?)),
        None => Ok(None),
    }
}

/// Creatives still waiting for enrichment, oldest first.
///
/// # Errors
///
/// Returns a backend or decode error.
pub async fn list_unanalyzed_creatives(
    store: &dyn DocumentStore,
    limit: usize,
) -> Result<Vec<Creative>, StoreError> {
    let query = Query::collection(CREATIVES)
        .where_null("analysis")
        .order_by("createdAt", SortKind::Timestamp, Direction::Asc)
        .limit(limit);
    decode_all(store.query(&query).await?)
}

/// Creatives created after `since`, newest first.
///
/// # Errors
///
/// Returns a backend or decode error.
pub async fn list_recent_creatives(
    store: &dyn DocumentStore,
    since: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<Creative>, StoreError> {
    let query = Query::collection(CREATIVES)
        .where_gt("createdAt", FieldValue::Timestamp(since))
        .order_by("createdAt", SortKind::Timestamp, Direction::Desc)
        .limit(limit);
    decode_all(store.query(&query).await?)
}

/// Stages `analysis` and a refreshed `updatedAt` onto an existing creative.
///
/// # Errors
///
/// Returns [`StoreError::Encode`] if the analysis cannot be serialized.
pub fn stage_analysis_update(
    batch: &mut WriteBatch,
    id: &str,
    analysis: &CreativeAnalysis,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    let mut fields = Map::new();
    fields.insert("analysis".to_owned(), serde_json::to_value(analysis)?);
    fields.insert("updatedAt".to_owned(), serde_json::to_value(now)?);
    batch.update(CREATIVES, id, fields);
    Ok(())
}

/// Serialize a creative into its document body, without the `id` key.
///
/// # Errors
///
/// Returns [`StoreError::Encode`] on serialization failure.
pub fn creative_body(creative: &Creative) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(creative)? {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(map)
        }
        // Creative always serializes to an object.
        _ => Ok(Map::new()),
    }
}

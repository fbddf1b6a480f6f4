//! Operations on the `alert_triggers` collection.
//!
//! Alert evaluation lives outside this workspace; here triggers are only
//! written by tests and pruned by retention cleanup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collections::ALERT_TRIGGERS;
use crate::document::{DocumentStore, FieldValue, Query, WriteBatch};
use crate::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertTrigger {
    pub id: String,
    pub alert_id: String,
    pub creative_id: String,
    pub triggered_at: DateTime<Utc>,
}

/// # Errors
///
/// Returns [`StoreError`] if serialization or the write fails.
pub async fn insert_alert_trigger(
    store: &dyn DocumentStore,
    trigger: &AlertTrigger,
) -> Result<(), StoreError> {
    let mut batch = WriteBatch::new();
    batch.set(ALERT_TRIGGERS, &trigger.id, serde_json::to_value(trigger)?);
    store.commit(batch).await
}

/// Deletes every trigger whose `triggeredAt` is before `cutoff` in one batch.
///
/// # Errors
///
/// Returns a backend error; nothing is deleted in that case.
pub async fn delete_alert_triggers_before(
    store: &dyn DocumentStore,
    cutoff: DateTime<Utc>,
) -> Result<usize, StoreError> {
    let query =
        Query::collection(ALERT_TRIGGERS).where_lt("triggeredAt", FieldValue::Timestamp(cutoff));
    let stale = store.query(&query).await?;
    if stale.is_empty() {
        return Ok(0);
    }

    let mut batch = WriteBatch::new();
    for doc in &stale {
        batch.delete(ALERT_TRIGGERS, &doc.id);
    }
    store.commit(batch).await?;
    Ok(stale.len())
}

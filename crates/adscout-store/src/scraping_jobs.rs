//! Operations on the `scraping_jobs` collection.
//!
//! A job is written once in `running` state and finalized exactly once.
//! Finalizing a job that is not `running` fails with
//! [`StoreError::InvalidJobTransition`] and leaves the record unchanged.

use adscout_core::{JobStatus, ScrapingConfig, ScrapingJob};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::collections::SCRAPING_JOBS;
use crate::document::{
    Direction, DocumentStore, FieldValue, Precondition, Query, SortKind, WriteBatch,
};
use crate::StoreError;

/// Final counters and errors recorded when a job ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobOutcome {
    pub creatives_found: u32,
    pub creatives_processed: u32,
    pub errors: Vec<String>,
    /// Replaces the job's config snapshot when set, e.g. once the crawled
    /// keywords are known.
    pub config: Option<ScrapingConfig>,
}

/// Persists a new job record under its own id.
///
/// # Errors
///
/// Returns [`StoreError`] if serialization or the write fails.
pub async fn insert_scraping_job(
    store: &dyn DocumentStore,
    job: &ScrapingJob,
) -> Result<(), StoreError> {
    let mut batch = WriteBatch::new();
    batch.set(SCRAPING_JOBS, &job.id, serde_json::to_value(job)?);
    store.commit(batch).await
}

async fn finish_scraping_job(
    store: &dyn DocumentStore,
    id: &str,
    status: JobStatus,
    end_time: DateTime<Utc>,
    outcome: &JobOutcome,
) -> Result<(), StoreError> {
    let mut fields = Map::new();
    fields.insert("status".to_owned(), serde_json::to_value(status)?);
    fields.insert("endTime".to_owned(), serde_json::to_value(end_time)?);
    fields.insert(
        "creativesFound".to_owned(),
        Value::from(outcome.creatives_found),
    );
    fields.insert(
        "creativesProcessed".to_owned(),
        Value::from(outcome.creatives_processed),
    );
    fields.insert("errors".to_owned(), serde_json::to_value(&outcome.errors)?);
    if let Some(config) = &outcome.config {
        fields.insert("config".to_owned(), serde_json::to_value(config)?);
    }

    let mut batch = WriteBatch::new();
    batch.update_if(
        SCRAPING_JOBS,
        id,
        fields,
        Precondition {
            field: "status".to_owned(),
            equals: JobStatus::Running.as_str().to_owned(),
        },
    );

    match store.commit(batch).await {
        Err(StoreError::PreconditionFailed { .. }) => Err(StoreError::InvalidJobTransition {
            id: id.to_owned(),
            expected_status: JobStatus::Running.as_str(),
        }),
        other => other,
    }
}

/// Marks a running job `completed` with its final counts.
///
/// # Errors
///
/// Returns [`StoreError::InvalidJobTransition`] if the job is not `running`,
/// [`StoreError::NotFound`] if it does not exist, or a backend error.
pub async fn complete_scraping_job(
    store: &dyn DocumentStore,
    id: &str,
    end_time: DateTime<Utc>,
    outcome: &JobOutcome,
) -> Result<(), StoreError> {
    finish_scraping_job(store, id, JobStatus::Completed, end_time, outcome).await
}

/// Marks a running job `failed`, keeping whatever counts were reached.
///
/// # Errors
///
/// Returns [`StoreError::InvalidJobTransition`] if the job is not `running`,
/// [`StoreError::NotFound`] if it does not exist, or a backend error.
pub async fn fail_scraping_job(
    store: &dyn DocumentStore,
    id: &str,
    end_time: DateTime<Utc>,
    outcome: &JobOutcome,
) -> Result<(), StoreError> {
    finish_scraping_job(store, id, JobStatus::Failed, end_time, outcome).await
}

/// Fetches a single job by id.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] if absent, or a backend/decode error.
pub async fn get_scraping_job(
    store: &dyn DocumentStore,
    id: &str,
) -> Result<ScrapingJob, StoreError> {
    store
        .get(SCRAPING_JOBS, id)
        .await?
        .ok_or_else(|| StoreError::NotFound {
            collection: SCRAPING_JOBS.to_owned(),
            id: id.to_owned(),
        })?
        .decode(SCRAPING_JOBS)
}

/// Returns the most recent `limit` jobs, newest `startTime` first.
///
/// # Errors
///
/// Returns a backend or decode error.
pub async fn list_scraping_jobs(
    store: &dyn DocumentStore,
    limit: usize,
) -> Result<Vec<ScrapingJob>, StoreError> {
    let query = Query::collection(SCRAPING_JOBS)
        .order_by("startTime", SortKind::Timestamp, Direction::Desc)
        .limit(limit);
    store
        .query(&query)
        .await?
        .iter()
        .map(|doc| doc.decode(SCRAPING_JOBS))
        .collect()
}

/// Deletes every job whose `startTime` is before `cutoff` in one batch.
///
/// Returns the number of records deleted.
///
/// # Errors
///
/// Returns a backend error; nothing is deleted in that case.
pub async fn delete_scraping_jobs_before(
    store: &dyn DocumentStore,
    cutoff: DateTime<Utc>,
) -> Result<usize, StoreError> {
    let query =
        Query::collection(SCRAPING_JOBS).where_lt("startTime", FieldValue::Timestamp(cutoff));
    let stale = store.query(&query).await?;
    if stale.is_empty() {
        return Ok(0);
    }

    let mut batch = WriteBatch::new();
    for doc in &stale {
        batch.delete(SCRAPING_JOBS, &doc.id);
    }
    store.commit(batch).await?;
    Ok(stale.len())
}

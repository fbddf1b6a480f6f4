//! Hash-deduplicated persistence of normalized creatives.

use std::collections::HashMap;
use std::sync::Arc;

use adscout_core::{Clock, Creative};
use adscout_enrich::EnrichmentService;
use adscout_store::{collections, creative_body, find_creative_by_hash, DocumentStore, WriteBatch};
use serde_json::Value;

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub inserted: usize,
    pub updated: usize,
}

impl SaveSummary {
    #[must_use]
    pub fn total(self) -> usize {
        self.inserted + self.updated
    }
}

pub struct IngestStore {
    store: Arc<dyn DocumentStore>,
    enrichment: Arc<EnrichmentService>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for IngestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestStore").finish_non_exhaustive()
    }
}

impl IngestStore {
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        enrichment: Arc<EnrichmentService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            enrichment,
            clock,
        }
    }

    /// Persist `creatives`, keyed by content hash.
    ///
    /// New hashes get a fresh id and an enrichment pass. Known hashes keep
    /// their id; every other field is overwritten, `updatedAt` is refreshed
    /// and `analysis` is cleared so the analysis run revisits them. A hash
    /// repeated within one call merges into the record staged for it earlier,
    /// so an insert keeps the analysis it was enriched with. All writes land
    /// in a single atomic batch.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Persistence`] if a lookup or the batch commit
    /// fails; nothing is written in that case.
    pub async fn save(&self, creatives: &[Creative]) -> Result<SaveSummary, PipelineError> {
        let now = self.clock.now();
        let mut summary = SaveSummary::default();
        let mut pending: Vec<Staged> = Vec::new();
        let mut by_hash: HashMap<String, usize> = HashMap::new();

        for creative in creatives {
            if let Some(&slot) = by_hash.get(&creative.hash) {
                let staged = &mut pending[slot];
                let id = staged.record().id.clone();
                let created_at = staged.record().created_at;
                let analysis = match staged {
                    Staged::Insert(record) => record.analysis.take(),
                    Staged::Update(_) => None,
                };
                *staged.record_mut() = Creative {
                    id,
                    created_at,
                    updated_at: now,
                    analysis,
                    ..creative.clone()
                };
                summary.updated += 1;
                continue;
            }

            let existing = find_creative_by_hash(self.store.as_ref(), &creative.hash).await?;
            let staged = match existing {
                Some(found) => {
                    summary.updated += 1;
                    Staged::Update(Creative {
                        id: found.id,
                        updated_at: now,
                        analysis: None,
                        ..creative.clone()
                    })
                }
                None => {
                    let analysis = self.enrichment.classify(creative).await;
                    summary.inserted += 1;
                    Staged::Insert(Creative {
                        id: self.store.new_id(),
                        created_at: now,
                        updated_at: now,
                        analysis: Some(analysis),
                        ..creative.clone()
                    })
                }
            };
            by_hash.insert(creative.hash.clone(), pending.len());
            pending.push(staged);
        }

        let mut batch = WriteBatch::new();
        for staged in &pending {
            match staged {
                Staged::Insert(record) => {
                    batch.set(
                        collections::CREATIVES,
                        &record.id,
                        Value::Object(creative_body(record)?),
                    );
                }
                Staged::Update(record) => {
                    batch.update(collections::CREATIVES, &record.id, creative_body(record)?);
                }
            }
        }

        if batch.is_empty() {
            return Ok(summary);
        }

        self.store.commit(batch).await?;
        tracing::info!(
            inserted = summary.inserted,
            updated = summary.updated,
            "ingest: creatives saved"
        );
        Ok(summary)
    }
}

/// A write staged by [`IngestStore::save`], keyed by hash until commit.
enum Staged {
    Insert(Creative),
    Update(Creative),
}

impl Staged {
    fn record(&self) -> &Creative {
        match self {
            Self::Insert(record) | Self::Update(record) => record,
        }
    }

    fn record_mut(&mut self) -> &mut Creative {
        match self {
            Self::Insert(record) | Self::Update(record) => record,
        }
    }
}

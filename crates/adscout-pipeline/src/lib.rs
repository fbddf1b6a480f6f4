//! Run orchestration: scrape, analysis and retention cleanup, plus the
//! triggers that schedule them.
//!
//! [`Pipeline`] owns the shared handles (store, enrichment, browser launcher,
//! clock) and exposes one method per run. Binaries build it once and share it
//! behind an `Arc`.

pub mod analysis_run;
pub mod cleanup_run;
pub mod error;
pub mod ingest;
pub mod insights;
pub mod keywords;
pub mod schedule;
pub mod scrape_run;

use std::sync::Arc;

use adscout_core::{AppConfig, Clock, SystemClock};
use adscout_enrich::{classifier_from_config, EnrichmentService, EnrichmentSettings};
use adscout_scraper::{BrowserLauncher, ChromiumLauncher, CrawlerSettings};
use adscout_store::DocumentStore;

pub use analysis_run::{AnalysisReport, ANALYSIS_BATCH_LIMIT};
pub use cleanup_run::{CleanupPolicy, CleanupReport};
pub use error::PipelineError;
pub use ingest::{IngestStore, SaveSummary};
pub use keywords::{trending_keywords, FALLBACK_KEYWORDS};
pub use schedule::{
    default_schedule, utc_offset, TriggerSpec, ANALYSIS_JOB, CLEANUP_JOB, SCRAPING_JOB,
};
pub use scrape_run::{ScrapeReport, ScrapeRequest};

pub struct Pipeline {
    store: Arc<dyn DocumentStore>,
    enrichment: Arc<EnrichmentService>,
    ingest: IngestStore,
    launcher: Arc<dyn BrowserLauncher>,
    crawler_settings: CrawlerSettings,
    max_pages: u32,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("crawler_settings", &self.crawler_settings)
            .field("max_pages", &self.max_pages)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        enrichment: Arc<EnrichmentService>,
        launcher: Arc<dyn BrowserLauncher>,
        crawler_settings: CrawlerSettings,
        max_pages: u32,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ingest = IngestStore::new(
            Arc::clone(&store),
            Arc::clone(&enrichment),
            Arc::clone(&clock),
        );
        Self {
            store,
            enrichment,
            ingest,
            launcher,
            crawler_settings,
            max_pages: max_pages.max(1),
            clock,
        }
    }

    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    #[must_use]
    pub fn ingest(&self) -> &IngestStore {
        &self.ingest
    }

    #[must_use]
    pub fn enrichment(&self) -> &EnrichmentService {
        &self.enrichment
    }

    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}

/// Wire a production pipeline from configuration: the configured classifier,
/// a local Chromium launcher and the system clock.
///
/// # Errors
///
/// Returns [`PipelineError::Enrichment`] if the classifier HTTP client cannot
/// be built.
pub fn build_pipeline(
    config: &AppConfig,
    store: Arc<dyn DocumentStore>,
) -> Result<Pipeline, PipelineError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let enrichment = EnrichmentService::new(
        classifier_from_config(config)?,
        EnrichmentSettings::from_app_config(config),
    )
    .with_clock(Arc::clone(&clock));

    Ok(Pipeline::new(
        store,
        Arc::new(enrichment),
        Arc::new(ChromiumLauncher),
        CrawlerSettings::from_app_config(config),
        config.scraper_max_pages,
        clock,
    ))
}

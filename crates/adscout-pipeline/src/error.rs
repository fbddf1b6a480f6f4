use adscout_enrich::EnrichError;
use adscout_scraper::ScraperError;
use adscout_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    #[error(transparent)]
    Scraper(#[from] ScraperError),

    #[error("classifier setup failed: {0}")]
    Enrichment(#[from] EnrichError),

    #[error("retention window of {days} days is out of range")]
    RetentionOutOfRange { days: u32 },
}

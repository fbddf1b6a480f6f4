//! Lifecycle record for one scrape run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Per-run crawl parameters, snapshotted onto the job record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapingConfig {
    pub max_pages: u32,
    /// Delay between result pages, in milliseconds.
    pub delay_between_requests: u64,
    pub use_proxy: bool,
    pub user_agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_niches: Option<Vec<String>>,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            max_pages: 10,
            delay_between_requests: 2000,
            use_proxy: false,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            keywords: None,
            target_niches: None,
        }
    }
}

/// One scrape run as stored in the `scraping_jobs` collection.
///
/// Status only moves `running -> completed` or `running -> failed`, and
/// `end_time` is set exactly when the status is terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapingJob {
    pub id: String,
    pub status: JobStatus,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub creatives_found: u32,
    pub creatives_processed: u32,
    #[serde(default)]
    pub errors: Vec<String>,
    pub config: ScrapingConfig,
}

impl ScrapingJob {
    /// A fresh record in `running` state with zeroed counters.
    #[must_use]
    pub fn start(id: String, start_time: DateTime<Utc>, config: ScrapingConfig) -> Self {
        Self {
            id,
            status: JobStatus::Running,
            start_time,
            end_time: None,
            creatives_found: 0,
            creatives_processed: 0,
            errors: Vec::new(),
            config,
        }
    }
}

use adscout_store::{delete_alert_triggers_before, delete_scraping_jobs_before};
use chrono::{DateTime, Duration, Utc};

use crate::error::PipelineError;
use crate::Pipeline;

/// Retention windows, in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupPolicy {
    pub job_retention_days: u32,
    pub trigger_retention_days: u32,
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self {
            job_retention_days: 30,
            trigger_retention_days: 90,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub jobs_deleted: usize,
    pub triggers_deleted: usize,
}

impl Pipeline {
    /// Delete scraping jobs and alert triggers older than the policy allows.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::RetentionOutOfRange`] if a window reaches past
    /// the representable date range, and [`PipelineError::Persistence`] if
    /// either delete batch fails. Job deletion is committed before triggers
    /// are looked at.
    pub async fn run_cleanup(&self, policy: CleanupPolicy) -> Result<CleanupReport, PipelineError> {
        let now = self.clock.now();
        let job_cutoff = cutoff(now, policy.job_retention_days)?;
        let trigger_cutoff = cutoff(now, policy.trigger_retention_days)?;

        let jobs_deleted = delete_scraping_jobs_before(self.store.as_ref(), job_cutoff).await?;
        let triggers_deleted =
            delete_alert_triggers_before(self.store.as_ref(), trigger_cutoff).await?;

        tracing::info!(jobs_deleted, triggers_deleted, "cleanup: run complete");
        Ok(CleanupReport {
            jobs_deleted,
            triggers_deleted,
        })
    }
}

fn cutoff(now: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>, PipelineError> {
    Duration::try_days(i64::from(days))
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or(PipelineError::RetentionOutOfRange { days })
}

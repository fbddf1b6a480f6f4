//! Background job scheduler.
//!
//! Builds a [`JobRegistry`] at server startup and registers the scrape,
//! analysis and cleanup runs on their default triggers.

mod registry;

use std::sync::Arc;

use adscout_core::Clock;
use adscout_pipeline::{
    default_schedule, CleanupPolicy, Pipeline, ScrapeRequest, ANALYSIS_JOB, CLEANUP_JOB,
    SCRAPING_JOB,
};
use chrono::FixedOffset;
use futures::FutureExt;

pub use registry::{JobRegistry, JobState, RegistryError, RunFn};

/// Builds the registry, registers every pipeline job and starts the timer.
///
/// The returned registry must be kept alive for the lifetime of the process
/// and stopped with [`JobRegistry::stop_all`] on shutdown.
///
/// # Errors
///
/// Returns [`RegistryError`] if the scheduler cannot be created, a job cannot
/// be registered, or the scheduler fails to start.
pub async fn build_registry(
    pipeline: Arc<Pipeline>,
    offset: FixedOffset,
    clock: Arc<dyn Clock>,
) -> Result<JobRegistry, RegistryError> {
    let mut registry = JobRegistry::new(offset, clock).await?;
    for (name, trigger) in default_schedule() {
        registry.register(name, trigger, job_run(name, Arc::clone(&pipeline)))?;
    }
    registry.start_all().await?;
    Ok(registry)
}

fn job_run(name: &'static str, pipeline: Arc<Pipeline>) -> RunFn {
    Arc::new(move || {
        let pipeline = Arc::clone(&pipeline);
        async move { run_job(name, &pipeline).await }.boxed()
    })
}

/// Run one pipeline job to completion. Failures are logged; the scheduler
/// keeps going.
async fn run_job(name: &str, pipeline: &Pipeline) {
    match name {
        SCRAPING_JOB => match pipeline.run_scrape(ScrapeRequest::default()).await {
            Ok(report) => tracing::info!(
                job_id = %report.job_id,
                found = report.outcome.creatives_found,
                processed = report.outcome.creatives_processed,
                errors = report.outcome.errors.len(),
                "scheduler: scraping run complete"
            ),
            Err(e) => tracing::error!(error = %e, "scheduler: scraping run failed"),
        },
        ANALYSIS_JOB => match pipeline.run_analysis().await {
            Ok(report) => tracing::info!(
                analyzed = report.analyzed,
                fallbacks = report.fallbacks,
                "scheduler: analysis run complete"
            ),
            Err(e) => tracing::error!(error = %e, "scheduler: analysis run failed"),
        },
        CLEANUP_JOB => match pipeline.run_cleanup(CleanupPolicy::default()).await {
            Ok(report) => tracing::info!(
                jobs_deleted = report.jobs_deleted,
                triggers_deleted = report.triggers_deleted,
                "scheduler: cleanup run complete"
            ),
            Err(e) => tracing::error!(error = %e, "scheduler: cleanup run failed"),
        },
        other => tracing::warn!(job = %other, "scheduler: no run bound to job"),
    }
}

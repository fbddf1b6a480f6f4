//! Command handlers, called from `main` once config and logging are set up.

use std::sync::Arc;

use adscout_core::AppConfig;
use adscout_pipeline::{
    build_pipeline, default_schedule, utc_offset, CleanupPolicy, Pipeline, ScrapeRequest,
};
use adscout_store::{DocumentStore, MemoryDocumentStore, PgDocumentStore, PoolConfig};
use chrono::Utc;

async fn connect(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool =
        adscout_store::connect_pool(&config.database_url, PoolConfig::from_app_config(config))
            .await?;
    Ok(pool)
}

async fn pipeline(config: &AppConfig) -> anyhow::Result<Pipeline> {
    let store: Arc<dyn DocumentStore> = Arc::new(PgDocumentStore::new(connect(config).await?));
    Ok(build_pipeline(config, store)?)
}

pub(crate) async fn migrate(config: &AppConfig) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    let applied = adscout_store::run_migrations(&pool).await?;
    tracing::info!(applied, "cli: migrate finished");
    println!("migrations applied: {applied}");
    Ok(())
}

pub(crate) async fn scrape(
    config: &AppConfig,
    keywords: Vec<String>,
    max_pages: Option<u32>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let pipeline = if dry_run {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        build_pipeline(config, store)?
    } else {
        pipeline(config).await?
    };

    let request = ScrapeRequest {
        keywords: (!keywords.is_empty()).then_some(keywords),
        max_pages,
    };
    tracing::info!(dry_run, "cli: scrape starting");
    let report = pipeline.run_scrape(request).await?;

    let prefix = if dry_run { "dry-run: " } else { "" };
    println!(
        "{prefix}scrape job {}: {} found, {} processed, {} errors",
        report.job_id,
        report.outcome.creatives_found,
        report.outcome.creatives_processed,
        report.outcome.errors.len()
    );
    for error in &report.outcome.errors {
        println!("  {error}");
    }
    Ok(())
}

pub(crate) async fn analyze(config: &AppConfig) -> anyhow::Result<()> {
    let report = pipeline(config).await?.run_analysis().await?;
    tracing::info!(analyzed = report.analyzed, "cli: analyze finished");
    println!(
        "analyzed {} creatives ({} fell back to the default analysis)",
        report.analyzed, report.fallbacks
    );
    Ok(())
}

pub(crate) async fn cleanup(
    config: &AppConfig,
    job_days: u32,
    trigger_days: u32,
) -> anyhow::Result<()> {
    let policy = CleanupPolicy {
        job_retention_days: job_days,
        trigger_retention_days: trigger_days,
    };
    tracing::info!(job_days, trigger_days, "cli: cleanup starting");
    let report = pipeline(config).await?.run_cleanup(policy).await?;
    println!(
        "deleted {} scraping jobs and {} alert triggers",
        report.jobs_deleted, report.triggers_deleted
    );
    Ok(())
}

pub(crate) fn schedule(config: &AppConfig) -> anyhow::Result<()> {
    let offset = utc_offset(config.scheduler_utc_offset_hours)
        .ok_or_else(|| anyhow::anyhow!("scheduler UTC offset out of range"))?;
    let now = Utc::now();
    for (name, trigger) in default_schedule() {
        let next = trigger.next_fire_after(now, offset).with_timezone(&offset);
        println!(
            "{name:<10} {:<22} next: {}",
            trigger.to_string(),
            next.format("%Y-%m-%d %H:%M %:z")
        );
    }
    Ok(())
}

pub(crate) async fn insights(config: &AppConfig, days: u32) -> anyhow::Result<()> {
    tracing::info!(days, "cli: requesting insights");
    let text = pipeline(config).await?.trending_insights(days).await?;
    println!("{text}");
    Ok(())
}

pub(crate) async fn improve(config: &AppConfig, id: &str) -> anyhow::Result<()> {
    tracing::info!(creative_id = %id, "cli: requesting suggestions");
    let suggestions = pipeline(config).await?.improvement_suggestions(id).await?;
    for (i, suggestion) in suggestions.iter().enumerate() {
        println!("{}. {suggestion}", i + 1);
    }
    Ok(())
}

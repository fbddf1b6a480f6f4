//! The scrape run: job record, keyword loop, finalization.

use std::sync::Arc;

use adscout_core::{Platform, ScrapingConfig, ScrapingJob};
use adscout_scraper::{normalize_ads, CrawlState, PageCrawler};
use adscout_store::{complete_scraping_job, fail_scraping_job, insert_scraping_job, JobOutcome};

use crate::error::PipelineError;
use crate::keywords::trending_keywords;
use crate::Pipeline;

/// Overrides for a single scrape run. Unset fields use the pipeline defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeRequest {
    pub keywords: Option<Vec<String>>,
    pub max_pages: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeReport {
    pub job_id: String,
    pub outcome: JobOutcome,
}

impl Pipeline {
    /// Run one scrape: persist a `running` job, crawl every keyword, then
    /// mark the job `completed`.
    ///
    /// A keyword that fails is recorded in the job's errors and the loop
    /// moves on. A failure outside the loop (browser launch, finalization)
    /// marks the job `failed` with the counts reached so far. The crawler is
    /// always closed.
    ///
    /// # Errors
    ///
    /// Returns the error that failed the run.
    pub async fn run_scrape(&self, request: ScrapeRequest) -> Result<ScrapeReport, PipelineError> {
        let keywords = request
            .keywords
            .map(|ks| {
                ks.into_iter()
                    .map(|k| k.trim().to_owned())
                    .filter(|k| !k.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|ks| !ks.is_empty());
        let max_pages = request.max_pages.unwrap_or(self.max_pages).max(1);

        let job = ScrapingJob::start(
            self.store.new_id(),
            self.clock.now(),
            self.crawler_settings
                .scraping_config(max_pages, keywords.clone()),
        );
        insert_scraping_job(self.store.as_ref(), &job).await?;
        tracing::info!(job_id = %job.id, max_pages, "scrape: run started");

        let mut crawler = PageCrawler::new(
            Arc::clone(&self.launcher),
            self.crawler_settings.clone(),
        );
        let mut outcome = JobOutcome::default();

        let result = self
            .crawl_keywords(&mut crawler, &job.config, keywords, max_pages, &mut outcome)
            .await;
        crawler.close().await;

        let result = match result {
            Ok(()) => complete_scraping_job(self.store.as_ref(), &job.id, self.clock.now(), &outcome)
                .await
                .map_err(PipelineError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                tracing::info!(
                    job_id = %job.id,
                    found = outcome.creatives_found,
                    processed = outcome.creatives_processed,
                    errors = outcome.errors.len(),
                    "scrape: run completed"
                );
                Ok(ScrapeReport {
                    job_id: job.id,
                    outcome,
                })
            }
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "scrape: run failed");
                outcome.errors.push(e.to_string());
                self.fail_job_best_effort(&job.id, &outcome).await;
                Err(e)
            }
        }
    }

    async fn crawl_keywords(
        &self,
        crawler: &mut PageCrawler,
        config: &ScrapingConfig,
        keywords: Option<Vec<String>>,
        max_pages: u32,
        outcome: &mut JobOutcome,
    ) -> Result<(), PipelineError> {
        crawler.initialize().await?;

        let keywords = match keywords {
            Some(keywords) => keywords,
            None => {
                let derived = trending_keywords(self.store.as_ref(), self.clock.now()).await;
                outcome.config = Some(ScrapingConfig {
                    keywords: Some(derived.clone()),
                    ..config.clone()
                });
                derived
            }
        };
        tracing::info!(count = keywords.len(), "scrape: keywords selected");

        for keyword in &keywords {
            match self.scrape_keyword(crawler, keyword, max_pages).await {
                Ok((found, processed)) => {
                    outcome.creatives_found = outcome.creatives_found.saturating_add(found);
                    outcome.creatives_processed =
                        outcome.creatives_processed.saturating_add(processed);
                }
                Err(e) => {
                    tracing::warn!(keyword = %keyword, error = %e, "scrape: keyword failed");
                    outcome
                        .errors
                        .push(format!("error scraping keyword '{keyword}': {e}"));
                }
            }
        }
        Ok(())
    }

    /// Crawl, normalize and save one keyword. Returns `(found, processed)`.
    async fn scrape_keyword(
        &self,
        crawler: &mut PageCrawler,
        keyword: &str,
        max_pages: u32,
    ) -> Result<(u32, u32), PipelineError> {
        // A failed crawl closes the session; the next keyword gets a new one.
        if crawler.state() == CrawlState::Closed {
            crawler.initialize().await?;
        }

        let output = crawler.crawl(Some(keyword), max_pages).await?;
        let creatives = normalize_ads(&output.ads, Platform::Facebook, self.clock.now());
        let summary = self.ingest.save(&creatives).await?;

        let found = u32::try_from(creatives.len()).unwrap_or(u32::MAX);
        let processed = u32::try_from(summary.total()).unwrap_or(u32::MAX);
        tracing::info!(
            keyword = %keyword,
            pages = output.pages,
            found,
            inserted = summary.inserted,
            updated = summary.updated,
            "scrape: keyword done"
        );
        Ok((found, processed))
    }

    async fn fail_job_best_effort(&self, job_id: &str, outcome: &JobOutcome) {
        if let Err(e) =
            fail_scraping_job(self.store.as_ref(), job_id, self.clock.now(), outcome).await
        {
            tracing::error!(job_id = %job_id, error = %e, "scrape: could not mark job failed");
        }
    }
}

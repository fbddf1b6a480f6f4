use adscout_store::{list_unanalyzed_creatives, stage_analysis_update, WriteBatch};

use crate::error::PipelineError;
use crate::Pipeline;

/// Creatives classified per analysis run.
pub const ANALYSIS_BATCH_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisReport {
    pub analyzed: usize,
    /// How many of `analyzed` received the fallback analysis.
    pub fallbacks: usize,
}

impl Pipeline {
    /// Classify the oldest creatives still lacking an analysis and write all
    /// results in one batch.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Persistence`] if the lookup or the batch
    /// commit fails.
    pub async fn run_analysis(&self) -> Result<AnalysisReport, PipelineError> {
        let pending = list_unanalyzed_creatives(self.store.as_ref(), ANALYSIS_BATCH_LIMIT).await?;
        if pending.is_empty() {
            tracing::info!("analysis: nothing to analyze");
            return Ok(AnalysisReport::default());
        }

        tracing::info!(count = pending.len(), "analysis: classifying creatives");
        let analyses = self.enrichment.classify_batch(&pending).await;

        let now = self.clock.now();
        let mut batch = WriteBatch::new();
        let mut report = AnalysisReport::default();
        for (creative, analysis) in pending.iter().zip(&analyses) {
            stage_analysis_update(&mut batch, &creative.id, analysis, now)?;
            report.analyzed += 1;
            if analysis.is_fallback() {
                report.fallbacks += 1;
            }
        }
        self.store.commit(batch).await?;

        tracing::info!(
            analyzed = report.analyzed,
            fallbacks = report.fallbacks,
            "analysis: run complete"
        );
        Ok(report)
    }
}

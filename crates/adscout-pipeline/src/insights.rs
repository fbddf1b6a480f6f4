use adscout_store::{get_creative, list_recent_creatives};
use chrono::Duration;

use crate::error::PipelineError;
use crate::Pipeline;

const INSIGHT_LOOKUP_LIMIT: usize = 100;

impl Pipeline {
    /// Trend insights over creatives created in the last `days` days.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Persistence`] if the creatives cannot be
    /// loaded. Classifier failures yield the fixed fallback text instead.
    pub async fn trending_insights(&self, days: u32) -> Result<String, PipelineError> {
        let since = self.clock.now() - Duration::days(i64::from(days));
        let recent =
            list_recent_creatives(self.store.as_ref(), since, INSIGHT_LOOKUP_LIMIT).await?;
        Ok(self.enrichment.trending_insights(&recent).await)
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::Persistence`] if the creative does not exist
    /// or cannot be loaded.
    pub async fn improvement_suggestions(&self, id: &str) -> Result<Vec<String>, PipelineError> {
        let creative = get_creative(self.store.as_ref(), id).await?;
        Ok(self.enrichment.improvement_suggestions(&creative).await)
    }
}

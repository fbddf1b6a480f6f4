use std::sync::Arc;
use std::time::Duration;

use adscout_core::{AppConfig, Clock, Creative, CreativeAnalysis, SystemClock};

use crate::client::{ChatPrompt, Classifier};
use crate::decode::decode_analysis;
use crate::prompt;

pub const INSIGHTS_UNAVAILABLE: &str = "Trend insights are unavailable right now.";
pub const SUGGESTIONS_UNAVAILABLE: &str = "Improvement suggestions are unavailable right now.";

const INSIGHTS_TEMPERATURE: f32 = 0.7;
const IMPROVEMENT_TEMPERATURE: f32 = 0.5;
const IMPROVEMENT_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentSettings {
    pub max_tokens: u32,
    pub temperature: f32,
    /// Pause between consecutive calls of a batch.
    pub batch_delay: Duration,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            max_tokens: 2000,
            temperature: 0.3,
            batch_delay: Duration::from_millis(1000),
        }
    }
}

impl EnrichmentSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_tokens: config.openai_max_tokens,
            temperature: config.openai_temperature,
            batch_delay: Duration::from_millis(config.enrich_delay_ms),
        }
    }
}

pub struct EnrichmentService {
    classifier: Arc<dyn Classifier>,
    settings: EnrichmentSettings,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for EnrichmentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichmentService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl EnrichmentService {
    #[must_use]
    pub fn new(classifier: Arc<dyn Classifier>, settings: EnrichmentSettings) -> Self {
        Self {
            classifier,
            settings,
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &EnrichmentSettings {
        &self.settings
    }

    /// Classify one creative. Any provider or decoding failure is logged and
    /// yields [`CreativeAnalysis::fallback`].
    pub async fn classify(&self, creative: &Creative) -> CreativeAnalysis {
        let request = ChatPrompt {
            system: prompt::analysis_system_prompt(),
            user: prompt::build_analysis_prompt(creative),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let result = match self.classifier.complete(&request).await {
            Ok(text) => decode_analysis(&text, self.clock.now()),
            Err(e) => Err(e),
        };

        match result {
            Ok(analysis) => {
                tracing::debug!(
                    creative_id = %creative.id,
                    hook_type = %analysis.hook_type,
                    niche = %analysis.niche,
                    "enrich: creative classified"
                );
                analysis
            }
            Err(e) => {
                tracing::warn!(
                    creative_id = %creative.id,
                    error = %e,
                    "enrich: classification failed, using fallback"
                );
                CreativeAnalysis::fallback(self.clock.now())
            }
        }
    }

    /// Classify creatives one after another, pausing
    /// [`EnrichmentSettings::batch_delay`] between calls. Output order matches
    /// input order.
    pub async fn classify_batch(&self, creatives: &[Creative]) -> Vec<CreativeAnalysis> {
        let mut analyses = Vec::with_capacity(creatives.len());
        for (i, creative) in creatives.iter().enumerate() {
            if i > 0 && !self.settings.batch_delay.is_zero() {
                tokio::time::sleep(self.settings.batch_delay).await;
            }
            analyses.push(self.classify(creative).await);
        }
        analyses
    }

    /// Free-text summary of trends across recently analyzed creatives.
    pub async fn trending_insights(&self, creatives: &[Creative]) -> String {
        let request = ChatPrompt {
            system: prompt::INSIGHTS_SYSTEM_PROMPT.to_owned(),
            user: prompt::build_insights_prompt(creatives),
            max_tokens: self.settings.max_tokens,
            temperature: INSIGHTS_TEMPERATURE,
        };
        match self.classifier.complete(&request).await {
            Ok(text) => text.trim().to_owned(),
            Err(e) => {
                tracing::warn!(error = %e, "enrich: trend insights failed");
                INSIGHTS_UNAVAILABLE.to_owned()
            }
        }
    }

    /// Concrete rewrite suggestions for one creative, one per line of the
    /// reply with list numbering removed.
    pub async fn improvement_suggestions(&self, creative: &Creative) -> Vec<String> {
        let request = ChatPrompt {
            system: prompt::IMPROVEMENT_SYSTEM_PROMPT.to_owned(),
            user: prompt::build_improvement_prompt(creative),
            max_tokens: IMPROVEMENT_MAX_TOKENS,
            temperature: IMPROVEMENT_TEMPERATURE,
        };
        match self.classifier.complete(&request).await {
            Ok(text) => split_suggestions(&text),
            Err(e) => {
                tracing::warn!(creative_id = %creative.id, error = %e, "enrich: improvement suggestions failed");
                vec![SUGGESTIONS_UNAVAILABLE.to_owned()]
            }
        }
    }
}

fn split_suggestions(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            let line = line.trim();
            let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            match line[digits..].strip_prefix('.') {
                Some(rest) if digits > 0 => rest.trim(),
                _ => line,
            }
        })
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

//! Prompt text sent to the classifier.

use std::fmt::Write as _;

use adscout_core::{Creative, HookType};

/// Creatives summarized in one trend-insight prompt.
pub const INSIGHT_SAMPLE_SIZE: usize = 50;

#[must_use]
pub fn analysis_system_prompt() -> String {
    let hooks: Vec<&str> = HookType::ALL.iter().map(|h| h.as_str()).collect();
    format!(
        "You are an expert in Facebook and Instagram ad creatives. \
         Classify the creative you are given.\n\n\
         Reply with a single JSON object and nothing else, with exactly these fields:\n\
         - hookType: one of {}\n\
         - niche: the product or service niche\n\
         - tags: array of short categorization tags\n\
         - sentiment: one of positive, negative, neutral\n\
         - urgencyLevel: one of low, medium, high\n\
         - emotionalTriggers: array of emotional triggers used\n\
         - suggestions: array of concrete improvement suggestions\n\
         - confidence: number between 0 and 1\n\n\
         Base the analysis only on the content provided.",
        hooks.join(", ")
    )
}

#[must_use]
pub fn build_analysis_prompt(creative: &Creative) -> String {
    format!(
        "Analyze this ad creative:\n\n\
         HEADLINE: {}\n\
         DESCRIPTION: {}\n\
         CALL TO ACTION: {}\n\
         PAGE: {}\n\
         PLATFORM: {}\n\
         FORMAT: {}\n\
         DESTINATION URL: {}\n\n\
         Identify the main hook, the niche, relevant tags, the overall sentiment, \
         the urgency conveyed, the emotional triggers, improvement suggestions and \
         your confidence in the analysis. Consider Brazilian digital marketing \
         conventions.",
        creative.headline,
        creative.description,
        creative.call_to_action,
        creative.page_name,
        creative.platform.as_str(),
        creative.format.as_str(),
        creative.destination_url,
    )
}

pub const INSIGHTS_SYSTEM_PROMPT: &str =
    "You are an expert in digital marketing trend analysis. Give practical, actionable insights.";

/// Trend prompt over the first [`INSIGHT_SAMPLE_SIZE`] analyzed creatives.
#[must_use]
pub fn build_insights_prompt(creatives: &[Creative]) -> String {
    let mut out = String::from(
        "Based on these recent ad creatives, describe emerging trends:\n",
    );
    for (i, creative) in creatives
        .iter()
        .filter(|c| c.analysis.is_some())
        .take(INSIGHT_SAMPLE_SIZE)
        .enumerate()
    {
        let Some(analysis) = &creative.analysis else {
            continue;
        };
        let _ = write!(
            out,
            "\n{}. Headline: {}\n   Hook: {}\n   Niche: {}\n   Tags: {}\n",
            i + 1,
            creative.headline,
            analysis.hook_type,
            analysis.niche,
            analysis.tags.join(", "),
        );
    }
    out.push_str(
        "\nCover the most used hooks, rising niches, emerging patterns, \
         strategic recommendations and open opportunities. Be specific.",
    );
    out
}

pub const IMPROVEMENT_SYSTEM_PROMPT: &str =
    "You are an expert in optimizing ad creatives. Give practical, specific suggestions.";

#[must_use]
pub fn build_improvement_prompt(creative: &Creative) -> String {
    let (niche, hook) = creative.analysis.as_ref().map_or_else(
        || ("unidentified".to_owned(), "unidentified".to_owned()),
        |a| (a.niche.clone(), a.hook_type.to_string()),
    );
    format!(
        "Suggest specific improvements for this ad creative:\n\n\
         HEADLINE: {}\n\
         DESCRIPTION: {}\n\
         CALL TO ACTION: {}\n\
         NICHE: {niche}\n\
         CURRENT HOOK: {hook}\n\n\
         Give 5 numbered suggestions covering the hook, the headline, the \
         description, the call to action and overall conversion.",
        creative.headline, creative.description, creative.call_to_action,
    )
}

#[cfg(test)]
mod tests {
    use adscout_core::{AdFormat, CreativeAnalysis, Platform};
    use chrono::Utc;

    use super::*;

    fn creative(headline: &str) -> Creative {
        let now = Utc::now();
        Creative {
            id: "c1".to_owned(),
            headline: headline.to_owned(),
            description: "Ten week program".to_owned(),
            thumbnail_url: None,
            video_url: None,
            destination_url: "https://shop.example".to_owned(),
            call_to_action: "Sign up".to_owned(),
            start_date: now,
            page_name: "Fit Shop".to_owned(),
            platform: Platform::Instagram,
            format: AdFormat::Carousel,
            hash: "h".to_owned(),
            is_active: true,
            created_at: now,
            updated_at: now,
            analysis: None,
        }
    }

    #[test]
    fn system_prompt_lists_every_hook_type() {
        let system = analysis_system_prompt();
        for hook in HookType::ALL {
            assert!(system.contains(hook.as_str()));
        }
    }

    #[test]
    fn analysis_prompt_includes_creative_fields() {
        let prompt = build_analysis_prompt(&creative("Get fit fast"));
        assert!(prompt.contains("HEADLINE: Get fit fast"));
        assert!(prompt.contains("PLATFORM: instagram"));
        assert!(prompt.contains("FORMAT: carousel"));
        assert!(prompt.contains("DESTINATION URL: https://shop.example"));
    }

    #[test]
    fn insights_prompt_skips_unanalyzed_creatives() {
        let mut analyzed = creative("Analyzed");
        analyzed.analysis = Some(CreativeAnalysis {
            niche: "fitness".to_owned(),
            tags: vec!["emagrecimento".to_owned()],
            ..CreativeAnalysis::fallback(Utc::now())
        });
        let prompt = build_insights_prompt(&[creative("Raw"), analyzed]);
        assert!(prompt.contains("1. Headline: Analyzed"));
        assert!(prompt.contains("Niche: fitness"));
        assert!(!prompt.contains("Headline: Raw"));
    }
}

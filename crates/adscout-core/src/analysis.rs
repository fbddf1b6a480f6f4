//! Enrichment output attached to a [`crate::Creative`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Niche recorded when the classifier could not identify one.
pub const FALLBACK_NICHE: &str = "unidentified";

/// The persuasion hook an ad leads with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookType {
    Urgency,
    Curiosity,
    Fear,
    SocialProof,
    Authority,
    Scarcity,
    Benefit,
    ProblemSolution,
    Question,
    Story,
    Listicle,
    HowTo,
    Comparison,
    Testimonial,
    Discount,
    Free,
    Guarantee,
    LimitedTime,
    Exclusive,
    Trending,
    New,
    Other,
}

impl HookType {
    pub const ALL: [HookType; 22] = [
        HookType::Urgency,
        HookType::Curiosity,
        HookType::Fear,
        HookType::SocialProof,
        HookType::Authority,
        HookType::Scarcity,
        HookType::Benefit,
        HookType::ProblemSolution,
        HookType::Question,
        HookType::Story,
        HookType::Listicle,
        HookType::HowTo,
        HookType::Comparison,
        HookType::Testimonial,
        HookType::Discount,
        HookType::Free,
        HookType::Guarantee,
        HookType::LimitedTime,
        HookType::Exclusive,
        HookType::Trending,
        HookType::New,
        HookType::Other,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HookType::Urgency => "urgency",
            HookType::Curiosity => "curiosity",
            HookType::Fear => "fear",
            HookType::SocialProof => "social_proof",
            HookType::Authority => "authority",
            HookType::Scarcity => "scarcity",
            HookType::Benefit => "benefit",
            HookType::ProblemSolution => "problem_solution",
            HookType::Question => "question",
            HookType::Story => "story",
            HookType::Listicle => "listicle",
            HookType::HowTo => "how_to",
            HookType::Comparison => "comparison",
            HookType::Testimonial => "testimonial",
            HookType::Discount => "discount",
            HookType::Free => "free",
            HookType::Guarantee => "guarantee",
            HookType::LimitedTime => "limited_time",
            HookType::Exclusive => "exclusive",
            HookType::Trending => "trending",
            HookType::New => "new",
            HookType::Other => "other",
        }
    }
}

impl fmt::Display for HookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        HookType::ALL
            .into_iter()
            .find(|hook| hook.as_str() == needle)
            .ok_or_else(|| CoreError::UnknownHookType(s.to_owned()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl FromStr for Sentiment {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            _ => Err(CoreError::UnknownSentiment(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
}

impl FromStr for UrgencyLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(UrgencyLevel::Low),
            "medium" => Ok(UrgencyLevel::Medium),
            "high" => Ok(UrgencyLevel::High),
            _ => Err(CoreError::UnknownUrgencyLevel(s.to_owned())),
        }
    }
}

/// Classification of one creative.
///
/// Either a complete classifier result or the complete default returned by
/// [`CreativeAnalysis::fallback`]; never a mix of the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreativeAnalysis {
    pub hook_type: HookType,
    pub niche: String,
    pub tags: Vec<String>,
    pub sentiment: Sentiment,
    pub urgency_level: UrgencyLevel,
    pub emotional_triggers: Vec<String>,
    pub suggestions: Vec<String>,
    /// Classifier confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    pub processed_at: DateTime<Utc>,
}

impl CreativeAnalysis {
    /// The deterministic result used whenever classification fails.
    #[must_use]
    pub fn fallback(processed_at: DateTime<Utc>) -> Self {
        Self {
            hook_type: HookType::Other,
            niche: FALLBACK_NICHE.to_owned(),
            tags: Vec::new(),
            sentiment: Sentiment::Neutral,
            urgency_level: UrgencyLevel::Low,
            emotional_triggers: Vec::new(),
            suggestions: Vec::new(),
            confidence: 0.0,
            processed_at,
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.hook_type == HookType::Other
            && self.niche == FALLBACK_NICHE
            && self.confidence == 0.0
            && self.tags.is_empty()
    }
}

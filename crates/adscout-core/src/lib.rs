//! Shared domain types and configuration for the adscout workspace.

pub mod analysis;
pub mod app_config;
pub mod clock;
pub mod config;
pub mod creative;
pub mod job;

pub use analysis::{CreativeAnalysis, HookType, Sentiment, UrgencyLevel, FALLBACK_NICHE};
pub use app_config::{AppConfig, Environment};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{load_app_config, load_app_config_from_env};
pub use creative::{AdFormat, Creative, Platform};
pub use job::{JobStatus, ScrapingConfig, ScrapingJob, DEFAULT_USER_AGENT};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown hook type: {0}")]
    UnknownHookType(String),

    #[error("unknown sentiment: {0}")]
    UnknownSentiment(String),

    #[error("unknown urgency level: {0}")]
    UnknownUrgencyLevel(String),
}

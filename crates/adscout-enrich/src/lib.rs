//! AI classification of ad creatives.
//!
//! [`EnrichmentService`] never fails its caller: every provider or decoding
//! failure is logged and replaced by [`adscout_core::CreativeAnalysis::fallback`].

pub mod client;
pub mod decode;
pub mod error;
pub mod prompt;
pub mod service;

pub use client::{classifier_from_config, ChatPrompt, Classifier, DisabledClassifier, OpenAiClassifier};
pub use decode::decode_analysis;
pub use error::EnrichError;
pub use service::{EnrichmentService, EnrichmentSettings, INSIGHTS_UNAVAILABLE, SUGGESTIONS_UNAVAILABLE};

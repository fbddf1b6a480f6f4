//! The canonical ad record ingested from the ads library.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::CreativeAnalysis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Facebook,
    Instagram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdFormat {
    Image,
    Video,
    Carousel,
}

impl AdFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AdFormat::Image => "image",
            AdFormat::Video => "video",
            AdFormat::Carousel => "carousel",
        }
    }
}

impl Platform {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
        }
    }
}

/// One ad creative as stored in the `creatives` collection.
///
/// `hash` is derived from `(headline, destination_url, start_date)` only, so
/// two creatives with the same hash are the same logical ad even when their
/// other fields differ. `id` stays empty until the creative is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creative {
    #[serde(default)]
    pub id: String,
    pub headline: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub destination_url: String,
    #[serde(default)]
    pub call_to_action: String,
    pub start_date: DateTime<Utc>,
    pub page_name: String,
    pub platform: Platform,
    pub format: AdFormat,
    pub hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub analysis: Option<CreativeAnalysis>,
}

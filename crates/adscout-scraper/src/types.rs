use serde::{Deserialize, Serialize};

/// Field snapshot of one ad card as read from the results page.
///
/// Every field is optional on the wire; a card with nothing usable is
/// rejected later by normalization rather than here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAd {
    pub headline: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub destination_url: String,
    pub call_to_action: String,
    pub page_name: String,
    pub start_date_text: String,
    pub has_carousel: bool,
}

/// Result of one keyword crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlOutput {
    pub ads: Vec<RawAd>,
    /// Result pages that were extracted.
    pub pages: u32,
    /// Snapshots dropped because they could not be decoded.
    pub skipped: usize,
}

pub mod browser;
pub mod chromium;
pub mod crawler;
pub mod error;
pub mod hash;
pub mod normalize;
pub mod selectors;
pub mod types;

pub use browser::{BlockedResource, BrowserLauncher, BrowserSession, LaunchOptions, PageAdvance};
pub use chromium::ChromiumLauncher;
pub use crawler::{search_url, CrawlState, CrawlerSettings, PageCrawler};
pub use error::ScraperError;
pub use hash::{content_hash, hash_string};
pub use normalize::{normalize_ad, normalize_ads, parse_start_date};
pub use types::{CrawlOutput, RawAd};

//! Seam between the crawl state machine and the browser that drives it.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ScraperError;

pub const VIEWPORT_WIDTH: u32 = 1920;
pub const VIEWPORT_HEIGHT: u32 = 1080;

pub const LAUNCH_ARGS: [&str; 7] = [
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-accelerated-2d-canvas",
    "--no-first-run",
    "--no-zygote",
    "--disable-gpu",
];

/// Resource types aborted before they hit the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockedResource {
    Image,
    Stylesheet,
    Font,
    Media,
}

impl BlockedResource {
    pub const ALL: [BlockedResource; 4] = [
        BlockedResource::Image,
        BlockedResource::Stylesheet,
        BlockedResource::Font,
        BlockedResource::Media,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub user_agent: String,
    pub viewport: (u32, u32),
    pub args: Vec<String>,
    pub blocked_resources: Vec<BlockedResource>,
    pub chrome_executable: Option<PathBuf>,
    pub proxy_server: Option<String>,
}

impl LaunchOptions {
    #[must_use]
    pub fn headless(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_owned(),
            viewport: (VIEWPORT_WIDTH, VIEWPORT_HEIGHT),
            args: LAUNCH_ARGS.iter().map(|a| (*a).to_owned()).collect(),
            blocked_resources: BlockedResource::ALL.to_vec(),
            chrome_executable: None,
            proxy_server: None,
        }
    }
}

/// Outcome of trying to move to the next results page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAdvance {
    Advanced,
    /// No "next" control on the page.
    NoNextControl,
    /// The control exists but is marked disabled.
    Disabled,
}

/// One open browser tab.
#[async_trait]
pub trait BrowserSession: Send {
    async fn goto(&mut self, url: &str) -> Result<(), ScraperError>;

    /// Waits up to `timeout` for `selector`; `Ok(false)` on timeout.
    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, ScraperError>;

    /// Snapshots every ad card on the current page as a JSON object.
    async fn extract_ads(&mut self) -> Result<Vec<Value>, ScraperError>;

    async fn advance_page(&mut self) -> Result<PageAdvance, ScraperError>;

    async fn close(&mut self) -> Result<(), ScraperError>;
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, options: &LaunchOptions)
        -> Result<Box<dyn BrowserSession>, ScraperError>;
}

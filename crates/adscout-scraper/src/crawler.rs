//! Paginated crawl of the ads library results.
//!
//! ```text
//! Idle -> Initialized -> Navigating -> Extracting -> (Paginating <-> Extracting)* -> Initialized
//!   any state --error / close()--> Closed
//! ```
//!
//! A finished crawl returns to `Initialized` so the same session can serve
//! the next keyword. Any error closes the session first; a closed crawler can
//! be initialized again.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use adscout_core::{AppConfig, ScrapingConfig, DEFAULT_USER_AGENT};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::browser::{BrowserLauncher, BrowserSession, LaunchOptions, PageAdvance};
use crate::error::ScraperError;
use crate::selectors;
use crate::types::{CrawlOutput, RawAd};

const LIBRARY_URL: &str = "https://www.facebook.com/ads/library/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Idle,
    Initialized,
    Navigating,
    Extracting,
    Paginating,
    Closed,
}

impl CrawlState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CrawlState::Idle => "idle",
            CrawlState::Initialized => "initialized",
            CrawlState::Navigating => "navigating",
            CrawlState::Extracting => "extracting",
            CrawlState::Paginating => "paginating",
            CrawlState::Closed => "closed",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlerSettings {
    pub country: String,
    pub user_agent: String,
    pub delay_between_pages: Duration,
    pub selector_timeout: Duration,
    pub chrome_executable: Option<PathBuf>,
    pub proxy_server: Option<String>,
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            country: "BR".to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            delay_between_pages: Duration::from_millis(2000),
            selector_timeout: Duration::from_secs(10),
            chrome_executable: None,
            proxy_server: None,
        }
    }
}

impl CrawlerSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            country: config.scraper_country.clone(),
            user_agent: config.scraper_user_agent.clone(),
            delay_between_pages: Duration::from_millis(config.scraper_delay_ms),
            selector_timeout: Duration::from_secs(config.scraper_selector_timeout_secs),
            chrome_executable: config.chrome_executable.clone(),
            proxy_server: config.scraper_proxy_server.clone(),
        }
    }

    /// Snapshot of these settings as recorded on a scraping job.
    #[must_use]
    pub fn scraping_config(&self, max_pages: u32, keywords: Option<Vec<String>>) -> ScrapingConfig {
        ScrapingConfig {
            max_pages,
            delay_between_requests: u64::try_from(self.delay_between_pages.as_millis())
                .unwrap_or(u64::MAX),
            use_proxy: self.proxy_server.is_some(),
            user_agent: self.user_agent.clone(),
            keywords,
            target_niches: None,
        }
    }

    fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            chrome_executable: self.chrome_executable.clone(),
            proxy_server: self.proxy_server.clone(),
            ..LaunchOptions::headless(&self.user_agent)
        }
    }
}

/// Search URL for `keyword` in `country`; no keyword lists everything.
#[must_use]
pub fn search_url(keyword: Option<&str>, country: &str) -> String {
    let country = utf8_percent_encode(country, NON_ALPHANUMERIC);
    match keyword.map(str::trim).filter(|k| !k.is_empty()) {
        Some(keyword) => format!(
            "{LIBRARY_URL}?search_type=keyword_unordered&search_term={}&country={country}",
            utf8_percent_encode(keyword, NON_ALPHANUMERIC)
        ),
        None => format!("{LIBRARY_URL}?country={country}"),
    }
}

pub struct PageCrawler {
    launcher: Arc<dyn BrowserLauncher>,
    settings: CrawlerSettings,
    session: Option<Box<dyn BrowserSession>>,
    state: CrawlState,
}

impl fmt::Debug for PageCrawler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageCrawler")
            .field("settings", &self.settings)
            .field("state", &self.state)
            .field("has_session", &self.session.is_some())
            .finish_non_exhaustive()
    }
}

impl PageCrawler {
    #[must_use]
    pub fn new(launcher: Arc<dyn BrowserLauncher>, settings: CrawlerSettings) -> Self {
        Self {
            launcher,
            settings,
            session: None,
            state: CrawlState::Idle,
        }
    }

    #[must_use]
    pub fn state(&self) -> CrawlState {
        self.state
    }

    #[must_use]
    pub fn settings(&self) -> &CrawlerSettings {
        &self.settings
    }

    /// Open a browser session.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidState`] unless the crawler is idle or
    /// closed, or [`ScraperError::Initialization`] if the browser cannot be
    /// launched (the crawler is then `Closed`).
    pub async fn initialize(&mut self) -> Result<(), ScraperError> {
        if !matches!(self.state, CrawlState::Idle | CrawlState::Closed) {
            return Err(ScraperError::InvalidState {
                operation: "initialize",
                state: self.state.as_str(),
            });
        }

        match self.launcher.launch(&self.settings.launch_options()).await {
            Ok(session) => {
                self.session = Some(session);
                self.state = CrawlState::Initialized;
                tracing::debug!("crawler: session initialized");
                Ok(())
            }
            Err(e) => {
                self.state = CrawlState::Closed;
                let e = match e {
                    ScraperError::Initialization(_) => e,
                    other => ScraperError::Initialization(other.to_string()),
                };
                tracing::error!(error = %e, "crawler: initialization failed");
                Err(e)
            }
        }
    }

    /// Crawl up to `max_pages` result pages for `keyword`.
    ///
    /// A result list that never appears on the first page is fatal; on later
    /// pages it, a missing or disabled "next" control, or a failed click ends
    /// the crawl with what was collected.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::NotInitialized`] before [`Self::initialize`],
    /// [`ScraperError::Navigation`] if the search page or its result list
    /// cannot be loaded, or a browser error from extraction. Every error
    /// closes the session.
    pub async fn crawl(
        &mut self,
        keyword: Option<&str>,
        max_pages: u32,
    ) -> Result<CrawlOutput, ScraperError> {
        if self.state != CrawlState::Initialized || self.session.is_none() {
            return Err(ScraperError::NotInitialized);
        }

        match self.crawl_pages(keyword, max_pages).await {
            Ok(output) => {
                self.state = CrawlState::Initialized;
                tracing::info!(
                    keyword = keyword.unwrap_or(""),
                    pages = output.pages,
                    ads = output.ads.len(),
                    skipped = output.skipped,
                    "crawler: crawl finished"
                );
                Ok(output)
            }
            Err(e) => {
                tracing::warn!(
                    keyword = keyword.unwrap_or(""),
                    state = %self.state,
                    error = %e,
                    "crawler: crawl aborted"
                );
                self.close().await;
                Err(e)
            }
        }
    }

    async fn crawl_pages(
        &mut self,
        keyword: Option<&str>,
        max_pages: u32,
    ) -> Result<CrawlOutput, ScraperError> {
        let url = search_url(keyword, &self.settings.country);
        let selector_timeout = self.settings.selector_timeout;
        let delay = self.settings.delay_between_pages;

        self.state = CrawlState::Navigating;
        let session = self.session.as_mut().ok_or(ScraperError::NotInitialized)?;
        session.goto(&url).await.map_err(|e| match e {
            ScraperError::Navigation { .. } => e,
            other => ScraperError::Navigation {
                url: url.clone(),
                reason: other.to_string(),
            },
        })?;

        let mut output = CrawlOutput::default();
        for page in 1..=max_pages {
            self.state = CrawlState::Extracting;
            let listed = match session
                .wait_for_selector(selectors::RESULT_MARKER, selector_timeout)
                .await
            {
                Ok(listed) => listed,
                Err(e) if page > 1 => {
                    tracing::warn!(page, error = %e, "crawler: result wait failed, keeping collected ads");
                    break;
                }
                Err(e) => return Err(e),
            };
            if !listed {
                if page == 1 {
                    return Err(ScraperError::Navigation {
                        url,
                        reason: "result list never loaded".to_owned(),
                    });
                }
                tracing::info!(page, "crawler: result list missing, stopping pagination");
                break;
            }

            let snapshots = match session.extract_ads().await {
                Ok(snapshots) => snapshots,
                Err(e) if page > 1 => {
                    tracing::warn!(page, error = %e, "crawler: extraction failed, keeping collected ads");
                    break;
                }
                Err(e) => return Err(e),
            };
            let found = snapshots.len();
            for snapshot in snapshots {
                match serde_json::from_value::<RawAd>(snapshot) {
                    Ok(raw) => output.ads.push(raw),
                    Err(source) => {
                        let e = ScraperError::Extraction(source);
                        tracing::warn!(page, error = %e, "crawler: skipping ad snapshot");
                        output.skipped += 1;
                    }
                }
            }
            output.pages = page;
            tracing::debug!(page, found, "crawler: page extracted");

            if page == max_pages {
                break;
            }

            self.state = CrawlState::Paginating;
            match session.advance_page().await {
                Ok(PageAdvance::Advanced) => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Ok(PageAdvance::NoNextControl | PageAdvance::Disabled) => {
                    tracing::debug!(page, "crawler: last page reached");
                    break;
                }
                Err(e) => {
                    tracing::warn!(page, error = %e, "crawler: pagination failed, keeping collected ads");
                    break;
                }
            }
        }

        Ok(output)
    }

    /// Release the browser session. Safe to call repeatedly; close-time
    /// errors are logged, not returned.
    pub async fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.close().await {
                tracing::warn!(error = %e, "crawler: error while closing session");
            }
        }
        self.state = CrawlState::Closed;
    }
}

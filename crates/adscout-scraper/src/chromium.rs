//! Headless Chromium driven over CDP.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::fetch::{
    EnableParams, EventRequestPaused, FailRequestParams, RequestPattern, RequestStage,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::browser::{BlockedResource, BrowserLauncher, BrowserSession, LaunchOptions, PageAdvance};
use crate::error::ScraperError;
use crate::selectors;

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(15);

fn browser_err(e: impl std::fmt::Display) -> ScraperError {
    ScraperError::Browser(e.to_string())
}

fn resource_type(resource: BlockedResource) -> ResourceType {
    match resource {
        BlockedResource::Image => ResourceType::Image,
        BlockedResource::Stylesheet => ResourceType::Stylesheet,
        BlockedResource::Font => ResourceType::Font,
        BlockedResource::Media => ResourceType::Media,
    }
}

/// Launches a local Chromium (auto-detected unless an executable is given).
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromiumLauncher;

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(
        &self,
        options: &LaunchOptions,
    ) -> Result<Box<dyn BrowserSession>, ScraperError> {
        let (width, height) = options.viewport;
        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .viewport(Viewport {
                width,
                height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: true,
                has_touch: false,
            })
            .args(options.args.clone());
        if let Some(path) = &options.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        if let Some(proxy) = &options.proxy_server {
            builder = builder.arg(format!("--proxy-server={proxy}"));
        }
        let config = builder.build().map_err(ScraperError::Initialization)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScraperError::Initialization(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "chromium: handler event error");
                }
            }
        });

        let page = match open_page(&browser, options).await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    tracing::warn!(error = %close_err, "chromium: close after failed setup");
                }
                handler_task.abort();
                return Err(e);
            }
        };

        let interceptor = match install_request_filter(&page, &options.blocked_resources).await {
            Ok(task) => task,
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    tracing::warn!(error = %close_err, "chromium: close after failed setup");
                }
                handler_task.abort();
                return Err(e);
            }
        };

        tracing::debug!(width, height, "chromium: session ready");
        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler_task,
            interceptor,
            closed: false,
        }))
    }
}

async fn open_page(browser: &Browser, options: &LaunchOptions) -> Result<Page, ScraperError> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| ScraperError::Initialization(e.to_string()))?;
    page.execute(SetUserAgentOverrideParams::new(options.user_agent.clone()))
        .await
        .map_err(|e| ScraperError::Initialization(e.to_string()))?;
    Ok(page)
}

/// Pause matching requests in the Fetch domain and fail each one.
async fn install_request_filter(
    page: &Page,
    blocked: &[BlockedResource],
) -> Result<Option<JoinHandle<()>>, ScraperError> {
    if blocked.is_empty() {
        return Ok(None);
    }

    let mut paused = page
        .event_listener::<EventRequestPaused>()
        .await
        .map_err(|e| ScraperError::Initialization(e.to_string()))?;

    let patterns = blocked
        .iter()
        .map(|resource| RequestPattern {
            url_pattern: Some("*".to_owned()),
            resource_type: Some(resource_type(*resource)),
            request_stage: Some(RequestStage::Request),
        })
        .collect();
    page.execute(EnableParams {
        patterns: Some(patterns),
        handle_auth_requests: None,
    })
    .await
    .map_err(|e| ScraperError::Initialization(e.to_string()))?;

    let page = page.clone();
    Ok(Some(tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let abort =
                FailRequestParams::new(event.request_id.clone(), ErrorReason::BlockedByClient);
            if let Err(e) = page.execute(abort).await {
                tracing::debug!(error = %e, "chromium: could not abort blocked request");
            }
        }
    })))
}

struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    interceptor: Option<JoinHandle<()>>,
    closed: bool,
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn goto(&mut self, url: &str) -> Result<(), ScraperError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| ScraperError::Navigation {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, ScraperError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn extract_ads(&mut self) -> Result<Vec<Value>, ScraperError> {
        self.page
            .evaluate(selectors::EXTRACT_ADS_SCRIPT.as_str())
            .await
            .map_err(browser_err)?
            .into_value::<Vec<Value>>()
            .map_err(browser_err)
    }

    async fn advance_page(&mut self) -> Result<PageAdvance, ScraperError> {
        let Ok(next) = self.page.find_element(selectors::NEXT_PAGE).await else {
            return Ok(PageAdvance::NoNextControl);
        };

        let aria_disabled = next.attribute("aria-disabled").await.map_err(browser_err)?;
        let disabled = next.attribute("disabled").await.map_err(browser_err)?;
        if aria_disabled.as_deref() == Some("true") || disabled.is_some() {
            return Ok(PageAdvance::Disabled);
        }

        next.click().await.map_err(browser_err)?;
        // Results often page in place without a navigation event; the
        // caller's marker wait decides whether the next page arrived.
        match tokio::time::timeout(NAVIGATION_TIMEOUT, self.page.wait_for_navigation()).await {
            Ok(Err(e)) => Err(browser_err(e)),
            Ok(Ok(_)) | Err(_) => Ok(PageAdvance::Advanced),
        }
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if let Some(task) = self.interceptor.take() {
            task.abort();
        }

        let mut first_err = None;
        if let Err(e) = self.page.clone().close().await {
            first_err.get_or_insert(browser_err(e));
        }
        if let Err(e) = self.browser.close().await {
            first_err.get_or_insert(browser_err(e));
        }
        if let Err(e) = self.browser.wait().await {
            first_err.get_or_insert(browser_err(e));
        }
        self.handler_task.abort();

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

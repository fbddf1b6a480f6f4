//! State-machine tests for `PageCrawler` against a scripted browser session.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use adscout_scraper::{
    BrowserLauncher, BrowserSession, CrawlState, CrawlerSettings, LaunchOptions, PageAdvance,
    PageCrawler, ScraperError,
};
use async_trait::async_trait;
use serde_json::{json, Value};

#[derive(Clone)]
struct ScriptedPage {
    listed: bool,
    ads: Vec<Value>,
    advance: Advance,
    extract_fails: bool,
}

#[derive(Clone, Copy)]
enum Advance {
    Next,
    NoControl,
    Disabled,
    ClickFails,
}

#[derive(Default)]
struct Log {
    calls: Vec<String>,
    launches: Vec<LaunchOptions>,
}

struct ScriptedSession {
    pages: Vec<ScriptedPage>,
    current: usize,
    goto_fails: bool,
    log: Arc<Mutex<Log>>,
}

impl ScriptedSession {
    fn record(&self, call: impl Into<String>) {
        self.log.lock().unwrap().calls.push(call.into());
    }

    fn page(&self) -> Option<&ScriptedPage> {
        self.pages.get(self.current)
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn goto(&mut self, url: &str) -> Result<(), ScraperError> {
        self.record(format!("goto {url}"));
        if self.goto_fails {
            return Err(ScraperError::Browser("net::ERR_NAME_NOT_RESOLVED".to_owned()));
        }
        self.current = 0;
        Ok(())
    }

    async fn wait_for_selector(
        &mut self,
        _selector: &str,
        _timeout: Duration,
    ) -> Result<bool, ScraperError> {
        self.record("wait");
        Ok(self.page().is_some_and(|p| p.listed))
    }

    async fn extract_ads(&mut self) -> Result<Vec<Value>, ScraperError> {
        self.record("extract");
        if self.page().is_some_and(|p| p.extract_fails) {
            return Err(ScraperError::Browser("execution context destroyed".to_owned()));
        }
        Ok(self.page().map(|p| p.ads.clone()).unwrap_or_default())
    }

    async fn advance_page(&mut self) -> Result<PageAdvance, ScraperError> {
        self.record("advance");
        let advance = self.page().map_or(Advance::NoControl, |p| p.advance);
        match advance {
            Advance::Next => {
                self.current += 1;
                Ok(PageAdvance::Advanced)
            }
            Advance::NoControl => Ok(PageAdvance::NoNextControl),
            Advance::Disabled => Ok(PageAdvance::Disabled),
            Advance::ClickFails => Err(ScraperError::Browser("click intercepted".to_owned())),
        }
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        self.record("close");
        Ok(())
    }
}

struct ScriptedLauncher {
    pages: Vec<ScriptedPage>,
    goto_fails: bool,
    launch_fails: bool,
    log: Arc<Mutex<Log>>,
}

impl ScriptedLauncher {
    fn new(pages: Vec<ScriptedPage>) -> Self {
        Self {
            pages,
            goto_fails: false,
            launch_fails: false,
            log: Arc::new(Mutex::new(Log::default())),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().calls.clone()
    }

    fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }
}

#[async_trait]
impl BrowserLauncher for ScriptedLauncher {
    async fn launch(
        &self,
        options: &LaunchOptions,
    ) -> Result<Box<dyn BrowserSession>, ScraperError> {
        self.log.lock().unwrap().launches.push(options.clone());
        if self.launch_fails {
            return Err(ScraperError::Initialization("no chrome binary".to_owned()));
        }
        Ok(Box::new(ScriptedSession {
            pages: self.pages.clone(),
            current: 0,
            goto_fails: self.goto_fails,
            log: Arc::clone(&self.log),
        }))
    }
}

fn ad(headline: &str) -> Value {
    json!({ "headline": headline, "pageName": "Shop", "startDateText": "2 days ago" })
}

fn page(ads: &[&str], advance: Advance) -> ScriptedPage {
    ScriptedPage {
        listed: true,
        ads: ads.iter().map(|h| ad(h)).collect(),
        advance,
        extract_fails: false,
    }
}

fn settings() -> CrawlerSettings {
    CrawlerSettings {
        delay_between_pages: Duration::ZERO,
        selector_timeout: Duration::from_millis(1),
        ..CrawlerSettings::default()
    }
}

fn crawler(launcher: &Arc<ScriptedLauncher>) -> PageCrawler {
    PageCrawler::new(Arc::clone(launcher) as Arc<dyn BrowserLauncher>, settings())
}

#[tokio::test]
async fn crawl_before_initialize_is_rejected() {
    let launcher = Arc::new(ScriptedLauncher::new(vec![]));
    let mut crawler = crawler(&launcher);
    assert_eq!(crawler.state(), CrawlState::Idle);

    let err = crawler.crawl(Some("beleza"), 3).await.unwrap_err();
    assert!(matches!(err, ScraperError::NotInitialized));
    assert!(launcher.calls().is_empty());
}

#[tokio::test]
async fn initialize_passes_viewport_agent_and_filter() {
    let launcher = Arc::new(ScriptedLauncher::new(vec![]));
    let mut crawler = crawler(&launcher);
    crawler.initialize().await.unwrap();
    assert_eq!(crawler.state(), CrawlState::Initialized);

    let log = launcher.log.lock().unwrap();
    let options = &log.launches[0];
    assert_eq!(options.viewport, (1920, 1080));
    assert_eq!(options.user_agent, adscout_core::DEFAULT_USER_AGENT);
    assert_eq!(options.blocked_resources.len(), 4);
    assert!(options.args.iter().any(|a| a == "--disable-dev-shm-usage"));
}

#[tokio::test]
async fn initialize_twice_is_rejected() {
    let launcher = Arc::new(ScriptedLauncher::new(vec![]));
    let mut crawler = crawler(&launcher);
    crawler.initialize().await.unwrap();
    let err = crawler.initialize().await.unwrap_err();
    assert!(matches!(err, ScraperError::InvalidState { .. }));
}

#[tokio::test]
async fn launch_failure_leaves_crawler_closed() {
    let mut launcher = ScriptedLauncher::new(vec![]);
    launcher.launch_fails = true;
    let launcher = Arc::new(launcher);
    let mut crawler = crawler(&launcher);

    let err = crawler.initialize().await.unwrap_err();
    assert!(matches!(err, ScraperError::Initialization(_)));
    assert_eq!(crawler.state(), CrawlState::Closed);
}

#[tokio::test]
async fn max_pages_bounds_extraction_cycles() {
    let launcher = Arc::new(ScriptedLauncher::new(vec![
        page(&["a"], Advance::Next),
        page(&["b"], Advance::Next),
        page(&["c"], Advance::Next),
        page(&["d"], Advance::Next),
        page(&["e"], Advance::NoControl),
    ]));
    let mut crawler = crawler(&launcher);
    crawler.initialize().await.unwrap();

    let output = crawler.crawl(Some("beleza"), 3).await.unwrap();
    assert_eq!(output.pages, 3);
    assert_eq!(output.ads.len(), 3);
    assert_eq!(launcher.count("extract"), 3);
    assert_eq!(launcher.count("advance"), 2);
    assert_eq!(crawler.state(), CrawlState::Initialized);
}

#[tokio::test]
async fn missing_next_control_ends_crawl_normally() {
    let launcher = Arc::new(ScriptedLauncher::new(vec![
        page(&["a", "b"], Advance::Next),
        page(&["c"], Advance::NoControl),
    ]));
    let mut crawler = crawler(&launcher);
    crawler.initialize().await.unwrap();

    let output = crawler.crawl(None, 10).await.unwrap();
    assert_eq!(output.pages, 2);
    let headlines: Vec<_> = output.ads.iter().map(|a| a.headline.as_str()).collect();
    assert_eq!(headlines, ["a", "b", "c"]);
}

#[tokio::test]
async fn disabled_next_control_ends_crawl_normally() {
    let launcher = Arc::new(ScriptedLauncher::new(vec![page(&["a"], Advance::Disabled)]));
    let mut crawler = crawler(&launcher);
    crawler.initialize().await.unwrap();

    let output = crawler.crawl(Some("dinheiro"), 5).await.unwrap();
    assert_eq!(output.pages, 1);
    assert_eq!(launcher.count("advance"), 1);
}

#[tokio::test]
async fn click_failure_keeps_collected_ads() {
    let launcher = Arc::new(ScriptedLauncher::new(vec![
        page(&["a"], Advance::Next),
        page(&["b"], Advance::ClickFails),
        page(&["never"], Advance::NoControl),
    ]));
    let mut crawler = crawler(&launcher);
    crawler.initialize().await.unwrap();

    let output = crawler.crawl(Some("beleza"), 5).await.unwrap();
    assert_eq!(output.ads.len(), 2);
    assert_eq!(crawler.state(), CrawlState::Initialized);
}

#[tokio::test]
async fn first_page_without_results_is_fatal_and_closes() {
    let launcher = Arc::new(ScriptedLauncher::new(vec![ScriptedPage {
        listed: false,
        ads: vec![],
        advance: Advance::NoControl,
        extract_fails: false,
    }]));
    let mut crawler = crawler(&launcher);
    crawler.initialize().await.unwrap();

    let err = crawler.crawl(Some("beleza"), 3).await.unwrap_err();
    assert!(matches!(err, ScraperError::Navigation { ref reason, .. } if reason.contains("never loaded")));
    assert_eq!(crawler.state(), CrawlState::Closed);
    assert_eq!(launcher.count("close"), 1);
}

#[tokio::test]
async fn later_page_without_results_ends_gracefully() {
    let launcher = Arc::new(ScriptedLauncher::new(vec![
        page(&["a"], Advance::Next),
        ScriptedPage {
            listed: false,
            ads: vec![],
            advance: Advance::NoControl,
            extract_fails: false,
        },
    ]));
    let mut crawler = crawler(&launcher);
    crawler.initialize().await.unwrap();

    let output = crawler.crawl(Some("beleza"), 3).await.unwrap();
    assert_eq!(output.pages, 1);
    assert_eq!(output.ads.len(), 1);
}

#[tokio::test]
async fn later_page_extraction_failure_keeps_collected_ads() {
    let launcher = Arc::new(ScriptedLauncher::new(vec![
        page(&["a", "b"], Advance::Next),
        ScriptedPage {
            extract_fails: true,
            ..page(&["c"], Advance::Next)
        },
        page(&["d"], Advance::NoControl),
    ]));
    let mut crawler = crawler(&launcher);
    crawler.initialize().await.unwrap();

    let output = crawler.crawl(Some("beleza"), 3).await.unwrap();
    assert_eq!(output.pages, 1);
    let headlines: Vec<_> = output.ads.iter().map(|a| a.headline.as_str()).collect();
    assert_eq!(headlines, ["a", "b"]);
    assert_eq!(crawler.state(), CrawlState::Initialized);
    assert_eq!(launcher.count("close"), 0);
}

#[tokio::test]
async fn first_page_extraction_failure_is_fatal() {
    let launcher = Arc::new(ScriptedLauncher::new(vec![ScriptedPage {
        extract_fails: true,
        ..page(&["a"], Advance::NoControl)
    }]));
    let mut crawler = crawler(&launcher);
    crawler.initialize().await.unwrap();

    let err = crawler.crawl(Some("beleza"), 3).await.unwrap_err();
    assert!(matches!(err, ScraperError::Browser(_)));
    assert_eq!(crawler.state(), CrawlState::Closed);
}

#[tokio::test]
async fn navigation_failure_is_navigation_error() {
    let mut launcher = ScriptedLauncher::new(vec![page(&["a"], Advance::NoControl)]);
    launcher.goto_fails = true;
    let launcher = Arc::new(launcher);
    let mut crawler = crawler(&launcher);
    crawler.initialize().await.unwrap();

    let err = crawler.crawl(Some("beleza"), 3).await.unwrap_err();
    assert!(matches!(err, ScraperError::Navigation { ref url, .. } if url.contains("search_term=beleza")));
    assert_eq!(crawler.state(), CrawlState::Closed);
}

#[tokio::test]
async fn undecodable_snapshot_is_skipped() {
    let launcher = Arc::new(ScriptedLauncher::new(vec![ScriptedPage {
        listed: true,
        ads: vec![ad("good"), json!("not an object"), json!({ "headline": 42 })],
        advance: Advance::NoControl,
        extract_fails: false,
    }]));
    let mut crawler = crawler(&launcher);
    crawler.initialize().await.unwrap();

    let output = crawler.crawl(Some("beleza"), 1).await.unwrap();
    assert_eq!(output.ads.len(), 1);
    assert_eq!(output.skipped, 2);
}

#[tokio::test]
async fn close_is_idempotent_and_allows_reinitialize() {
    let launcher = Arc::new(ScriptedLauncher::new(vec![page(&["a"], Advance::NoControl)]));
    let mut crawler = crawler(&launcher);
    crawler.initialize().await.unwrap();

    crawler.close().await;
    crawler.close().await;
    assert_eq!(crawler.state(), CrawlState::Closed);
    assert_eq!(launcher.count("close"), 1);

    crawler.initialize().await.unwrap();
    let output = crawler.crawl(Some("beleza"), 1).await.unwrap();
    assert_eq!(output.ads.len(), 1);
}

#[tokio::test]
async fn keyword_search_url_reaches_session() {
    let launcher = Arc::new(ScriptedLauncher::new(vec![page(&[], Advance::NoControl)]));
    let mut crawler = crawler(&launcher);
    crawler.initialize().await.unwrap();
    crawler.crawl(Some("ganho de massa"), 1).await.unwrap();

    assert_eq!(
        launcher.calls()[0],
        "goto https://www.facebook.com/ads/library/?search_type=keyword_unordered&search_term=ganho%20de%20massa&country=BR"
    );
}

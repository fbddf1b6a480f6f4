use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Result pages crawled per keyword on scheduled runs.
    pub scraper_max_pages: u32,
    pub scraper_delay_ms: u64,
    pub scraper_user_agent: String,
    pub scraper_country: String,
    pub scraper_selector_timeout_secs: u64,
    pub scraper_proxy_server: Option<String>,
    pub chrome_executable: Option<PathBuf>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_max_tokens: u32,
    pub openai_temperature: f32,
    pub openai_request_timeout_secs: u64,
    pub enrich_delay_ms: u64,
    pub scheduler_utc_offset_hours: i32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("scraper_max_pages", &self.scraper_max_pages)
            .field("scraper_delay_ms", &self.scraper_delay_ms)
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("scraper_country", &self.scraper_country)
            .field(
                "scraper_selector_timeout_secs",
                &self.scraper_selector_timeout_secs,
            )
            .field(
                "scraper_proxy_server",
                &self.scraper_proxy_server.as_ref().map(|_| "[redacted]"),
            )
            .field("chrome_executable", &self.chrome_executable)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("openai_max_tokens", &self.openai_max_tokens)
            .field("openai_temperature", &self.openai_temperature)
            .field(
                "openai_request_timeout_secs",
                &self.openai_request_timeout_secs,
            )
            .field("enrich_delay_ms", &self.enrich_delay_ms)
            .field(
                "scheduler_utc_offset_hours",
                &self.scheduler_utc_offset_hours,
            )
            .finish()
    }
}

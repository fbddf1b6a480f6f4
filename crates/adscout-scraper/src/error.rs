use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("browser session could not be created: {0}")]
    Initialization(String),

    #[error("navigation failed for {url}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("ad snapshot could not be decoded: {0}")]
    Extraction(#[source] serde_json::Error),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("crawler is not initialized")]
    NotInitialized,

    #[error("crawler cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
}

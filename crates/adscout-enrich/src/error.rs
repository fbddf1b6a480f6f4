use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("classifier returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("classifier returned no content")]
    EmptyResponse,

    #[error("classifier response is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("field `{field}` is missing or invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("classifier is not configured")]
    Disabled,
}

use adscout_store::{list_recent_creatives, DocumentStore};
use chrono::{DateTime, Duration, Utc};

pub const FALLBACK_KEYWORDS: [&str; 5] = [
    "emagrecimento",
    "ganho de massa",
    "beleza",
    "dinheiro",
    "relacionamento",
];

const LOOKBACK_DAYS: i64 = 7;
const SAMPLE_SIZE: usize = 100;
const MAX_KEYWORDS: usize = 10;

/// Search keywords for a scrape run: the tags of recently created creatives,
/// first-seen order, deduplicated and capped at ten. Falls back to
/// [`FALLBACK_KEYWORDS`] when there are none or the lookup fails.
pub async fn trending_keywords(store: &dyn DocumentStore, now: DateTime<Utc>) -> Vec<String> {
    let since = now - Duration::days(LOOKBACK_DAYS);
    let recent = match list_recent_creatives(store, since, SAMPLE_SIZE).await {
        Ok(recent) => recent,
        Err(e) => {
            tracing::warn!(error = %e, "keywords: recent creatives lookup failed, using fallback list");
            return fallback();
        }
    };

    let mut keywords: Vec<String> = Vec::new();
    let tags = recent
        .iter()
        .filter_map(|c| c.analysis.as_ref())
        .flat_map(|a| a.tags.iter());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || keywords.iter().any(|k| k == tag) {
            continue;
        }
        keywords.push(tag.to_owned());
        if keywords.len() == MAX_KEYWORDS {
            break;
        }
    }

    if keywords.is_empty() {
        tracing::debug!("keywords: no recent tags, using fallback list");
        return fallback();
    }
    keywords
}

fn fallback() -> Vec<String> {
    FALLBACK_KEYWORDS.iter().map(|k| (*k).to_owned()).collect()
}

//! Turn raw ad snapshots into canonical [`Creative`] records.

use std::sync::LazyLock;

use adscout_core::{AdFormat, Creative, Platform};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;

use crate::hash::content_hash;
use crate::types::RawAd;

static RELATIVE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s+(day|week|month|year)s?\s+ago").expect("valid regex")
});

const STARTED_PREFIX: &str = "started running on ";

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%d %b %Y", "%d %B %Y"];

/// Normalize every snapshot, dropping the ones that fail the gate.
#[must_use]
pub fn normalize_ads(raws: &[RawAd], platform: Platform, now: DateTime<Utc>) -> Vec<Creative> {
    let creatives: Vec<Creative> = raws
        .iter()
        .filter_map(|raw| normalize_ad(raw, platform, now))
        .collect();
    let rejected = raws.len() - creatives.len();
    if rejected > 0 {
        tracing::debug!(
            rejected,
            kept = creatives.len(),
            "normalize: dropped ads without headline or page name"
        );
    }
    creatives
}

/// Build a candidate creative, or `None` when headline or page name is blank.
///
/// The result has an empty `id`; one is assigned when it is first persisted.
#[must_use]
pub fn normalize_ad(raw: &RawAd, platform: Platform, now: DateTime<Utc>) -> Option<Creative> {
    let headline = raw.headline.trim();
    let page_name = raw.page_name.trim();
    if headline.is_empty() || page_name.is_empty() {
        return None;
    }

    let thumbnail_url = non_empty(raw.thumbnail_url.as_deref());
    let video_url = non_empty(raw.video_url.as_deref());
    let format = classify_format(video_url.is_some(), raw.has_carousel);
    let destination_url = raw.destination_url.trim().to_owned();
    let start_date = parse_start_date(&raw.start_date_text, now);
    let hash = content_hash(headline, &destination_url, start_date);

    Some(Creative {
        id: String::new(),
        headline: headline.to_owned(),
        description: raw.description.trim().to_owned(),
        thumbnail_url,
        video_url,
        destination_url,
        call_to_action: raw.call_to_action.trim().to_owned(),
        start_date,
        page_name: page_name.to_owned(),
        platform,
        format,
        hash,
        is_active: true,
        created_at: now,
        updated_at: now,
        analysis: None,
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Video wins over carousel, carousel over image.
fn classify_format(has_video: bool, has_carousel: bool) -> AdFormat {
    if has_video {
        AdFormat::Video
    } else if has_carousel {
        AdFormat::Carousel
    } else {
        AdFormat::Image
    }
}

/// Parse the start-date text shown on an ad card.
///
/// Accepts relative phrases (`"3 days ago"`; a month is 30 days and a year
/// 365) and a handful of literal date formats. Anything else yields `now`.
#[must_use]
pub fn parse_start_date(text: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let text = text.trim();
    if text.is_empty() {
        return now;
    }

    if let Some(date) = parse_relative(text, now) {
        return date;
    }

    let literal = match text.get(..STARTED_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(STARTED_PREFIX) => {
            text[STARTED_PREFIX.len()..].trim()
        }
        _ => text,
    };
    parse_literal(literal).unwrap_or(now)
}

fn parse_relative(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let caps = RELATIVE_DATE.captures(text)?;
    let amount: i64 = caps.get(1)?.as_str().parse().ok()?;
    let days_per_unit = match caps.get(2)?.as_str().to_ascii_lowercase().as_str() {
        "day" => 1,
        "week" => 7,
        "month" => 30,
        "year" => 365,
        _ => return None,
    };
    let offset = Duration::try_days(amount.checked_mul(days_per_unit)?)?;
    now.checked_sub_signed(offset)
}

fn parse_literal(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(text, fmt)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    })
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;

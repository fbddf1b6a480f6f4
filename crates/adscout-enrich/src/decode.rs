//! Strict decoding of classifier replies.

use adscout_core::{CreativeAnalysis, HookType, Sentiment, UrgencyLevel};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::EnrichError;

/// Drop a surrounding markdown code fence (with or without a language tag).
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn field<'a>(object: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, EnrichError> {
    object.get(name).ok_or(EnrichError::InvalidField {
        field: name,
        reason: "missing".to_owned(),
    })
}

fn string_field(object: &Map<String, Value>, name: &'static str) -> Result<String, EnrichError> {
    field(object, name)?
        .as_str()
        .map(str::to_owned)
        .ok_or(EnrichError::InvalidField {
            field: name,
            reason: "expected a string".to_owned(),
        })
}

fn string_list(object: &Map<String, Value>, name: &'static str) -> Result<Vec<String>, EnrichError> {
    let invalid = || EnrichError::InvalidField {
        field: name,
        reason: "expected an array of strings".to_owned(),
    };
    field(object, name)?
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|item| item.as_str().map(str::to_owned).ok_or_else(invalid))
        .collect()
}

fn enum_field<T>(object: &Map<String, Value>, name: &'static str) -> Result<T, EnrichError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    string_field(object, name)?
        .parse()
        .map_err(|e: T::Err| EnrichError::InvalidField {
            field: name,
            reason: e.to_string(),
        })
}

/// Decode a classifier reply into a complete [`CreativeAnalysis`].
///
/// All eight fields are required and `confidence` must be a finite number in
/// `[0, 1]`.
///
/// # Errors
///
/// Returns [`EnrichError::InvalidJson`] if the text is not a JSON object or
/// [`EnrichError::InvalidField`] for the first field that is missing or out
/// of range.
pub fn decode_analysis(
    text: &str,
    processed_at: DateTime<Utc>,
) -> Result<CreativeAnalysis, EnrichError> {
    let value: Value = serde_json::from_str(strip_code_fence(text)).map_err(EnrichError::InvalidJson)?;
    let Value::Object(object) = value else {
        return Err(EnrichError::InvalidField {
            field: "root",
            reason: "expected a JSON object".to_owned(),
        });
    };

    let hook_type: HookType = enum_field(&object, "hookType")?;
    let niche = string_field(&object, "niche")?;
    let tags = string_list(&object, "tags")?;
    let sentiment: Sentiment = enum_field(&object, "sentiment")?;
    let urgency_level: UrgencyLevel = enum_field(&object, "urgencyLevel")?;
    let emotional_triggers = string_list(&object, "emotionalTriggers")?;
    let suggestions = string_list(&object, "suggestions")?;

    let confidence = field(&object, "confidence")?
        .as_f64()
        .filter(|c| c.is_finite() && (0.0..=1.0).contains(c))
        .ok_or(EnrichError::InvalidField {
            field: "confidence",
            reason: "expected a number between 0 and 1".to_owned(),
        })?;

    Ok(CreativeAnalysis {
        hook_type,
        niche,
        tags,
        sentiment,
        urgency_level,
        emotional_triggers,
        suggestions,
        confidence,
        processed_at,
    })
}

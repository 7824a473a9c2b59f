//! Extraction of a [`WeatherResult`] from free-form model output.
//!
//! The model is asked for a single JSON object, but grounded responses
//! regularly wrap it in a markdown fence or a sentence of prose.

use chrono::Utc;
use serde::{Deserialize, Deserializer};
use url::Url;

use crate::types::{ResolutionError, Source, WeatherResult};

/// Value the model is told to put in `error` when it cannot place the location
pub const NOT_FOUND_MARKER: &str = "LOCATION_NOT_FOUND";

#[derive(Debug, Deserialize)]
struct WeatherPayload {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    temperature: Option<String>,
    #[serde(default)]
    condition: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    humidity: Option<String>,
    #[serde(default, alias = "wind_speed", rename = "windSpeed", deserialize_with = "text_or_number")]
    wind_speed: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "ai_advice", rename = "aiAdvice")]
    ai_advice: Option<String>,
}

/// Measurements sometimes come back as bare numbers
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Locate the outermost JSON object in `text`.
pub fn find_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Build a result from the model's text and its grounding sources.
///
/// `location` is the query as typed and is only used in the not-found message.
pub fn parse_weather(
    text: &str,
    sources: Vec<Source>,
    location: &str,
) -> Result<WeatherResult, ResolutionError> {
    if text.trim().is_empty() {
        return Err(ResolutionError::parse("empty response"));
    }

    let json = find_json_object(text)
        .ok_or_else(|| ResolutionError::parse("no JSON object in response"))?;

    let payload: WeatherPayload = serde_json::from_str(json)
        .map_err(|e| ResolutionError::parse(format!("invalid JSON: {}", e)))?;

    if let Some(error) = payload.error.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        if error.eq_ignore_ascii_case(NOT_FOUND_MARKER) {
            return Err(ResolutionError::NotFound(location.to_string()));
        }
        return Err(ResolutionError::parse(format!("model reported: {}", error)));
    }

    let city = required_non_empty(payload.city, "city")?;
    let condition = required_non_empty(payload.condition, "condition")?;

    Ok(WeatherResult {
        city,
        temperature: required(payload.temperature, "temperature")?,
        condition,
        humidity: required(payload.humidity, "humidity")?,
        wind_speed: required(payload.wind_speed, "windSpeed")?,
        description: required(payload.description, "description")?,
        ai_advice: required(payload.ai_advice, "aiAdvice")?,
        sources,
        fetched_at: Utc::now(),
    })
}

fn required(value: Option<String>, field: &str) -> Result<String, ResolutionError> {
    value
        .map(|v| v.trim().to_string())
        .ok_or_else(|| ResolutionError::parse(format!("missing field `{}`", field)))
}

fn required_non_empty(value: Option<String>, field: &str) -> Result<String, ResolutionError> {
    let value = required(value, field)?;
    if value.is_empty() {
        return Err(ResolutionError::parse(format!("empty field `{}`", field)));
    }
    Ok(value)
}

/// Keep sources with a title and an absolute http(s) URI, first occurrence wins.
pub fn clean_sources(raw: impl IntoIterator<Item = Source>) -> Vec<Source> {
    let mut kept: Vec<Source> = Vec::new();
    for source in raw {
        let title = source.title.trim();
        let uri = source.uri.trim();
        if title.is_empty() || !is_web_uri(uri) {
            tracing::debug!("Dropping grounding source {:?}", source);
            continue;
        }
        if kept.iter().any(|s| s.uri == uri) {
            continue;
        }
        kept.push(Source {
            title: title.to_string(),
            uri: uri.to_string(),
        });
    }
    kept
}

fn is_web_uri(uri: &str) -> bool {
    Url::parse(uri)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false)
}

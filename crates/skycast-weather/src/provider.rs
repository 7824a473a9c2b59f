//! Gemini-backed weather resolution.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::extract::{clean_sources, parse_weather, NOT_FOUND_MARKER};
use crate::types::{ResolutionError, Source, WeatherResult};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Turns a location description into weather. Resolves or fails exactly once per call.
#[async_trait]
pub trait WeatherResolver: Send + Sync {
    async fn resolve(&self, location: &str) -> Result<WeatherResult, ResolutionError>;
}

/// Connection settings for [`WeatherProvider`]
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub grounding: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            grounding: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    settings: ProviderSettings,
}

// generateContent wire types

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: EmptyObject,
}

#[derive(Debug, Serialize)]
struct EmptyObject {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

/// Prompt asking for current weather as one JSON object.
pub fn build_prompt(location: &str) -> String {
    format!(
        "Find the current weather for the location \"{location}\". \
         The location may be a city, address, postal code, or a \"latitude, longitude\" pair. \
         Use Google Search to get up-to-date conditions.\n\
         Respond with a single JSON object and nothing else, using exactly these string fields:\n\
         - \"city\": the resolved place name, e.g. \"Paris, France\"\n\
         - \"temperature\": current temperature including its unit, e.g. \"18°C\"\n\
         - \"condition\": a short condition label, e.g. \"Sunny\", \"Light rain\", \"Overcast\"\n\
         - \"humidity\": e.g. \"62%\"\n\
         - \"windSpeed\": e.g. \"14 km/h\"\n\
         - \"description\": one or two sentences summarising the weather\n\
         - \"aiAdvice\": a short practical recommendation (clothing, activities, precautions)\n\
         If the location cannot be identified, respond with {{\"error\": \"{marker}\"}}.",
        location = location,
        marker = NOT_FOUND_MARKER,
    )
}

impl WeatherProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, ResolutionError> {
        let client = Client::builder().timeout(settings.timeout).build()?;

        if settings.api_key.is_none() {
            tracing::warn!("WeatherProvider created without an API key; lookups will fail");
        }

        Ok(Self {
            client: Arc::new(client),
            settings,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }

    /// Fetch current weather for `location`.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch(&self, location: &str) -> Result<WeatherResult, ResolutionError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or_else(|| ResolutionError::Service("no API key configured".to_string()))?;

        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(build_prompt(location)),
                }],
            }],
            tools: if self.settings.grounding {
                vec![Tool {
                    google_search: EmptyObject {},
                }]
            } else {
                Vec::new()
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Gemini returned status {}: {}", status, body);
            return Err(status_error(status, &body));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ResolutionError::parse(format!("undecodable response: {}", e)))?;

        let (text, sources) = into_text_and_sources(body)?;
        tracing::debug!("Gemini text: {}", text);

        let result = parse_weather(&text, sources, location);
        match &result {
            Ok(weather) => tracing::info!(
                "Resolved \"{}\" to {} ({} sources)",
                location,
                weather.city,
                weather.sources.len()
            ),
            Err(ResolutionError::Parse { detail }) => {
                tracing::warn!("Could not parse weather for \"{}\": {}", location, detail)
            }
            Err(e) => tracing::info!("Resolution for \"{}\" failed: {}", location, e),
        }
        result
    }
}

#[async_trait]
impl WeatherResolver for WeatherProvider {
    async fn resolve(&self, location: &str) -> Result<WeatherResult, ResolutionError> {
        self.fetch(location).await
    }
}

fn into_text_and_sources(
    body: GenerateResponse,
) -> Result<(String, Vec<Source>), ResolutionError> {
    if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ResolutionError::Service(format!(
            "the request was blocked ({})",
            reason
        )));
    }

    let candidate = body
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ResolutionError::parse("no candidates"))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    let raw_sources = candidate
        .grounding_metadata
        .map(|m| m.grounding_chunks)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|chunk| chunk.web)
        .map(|web| Source {
            title: web.title.unwrap_or_default(),
            uri: web.uri.unwrap_or_default(),
        });

    Ok((text, clean_sources(raw_sources)))
}

fn status_error(status: StatusCode, body: &str) -> ResolutionError {
    let upstream = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .ok()
        .filter(|m| !m.is_empty());

    let summary = match status {
        StatusCode::BAD_REQUEST => "the request was rejected",
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => "authentication failed - check the API key",
        StatusCode::NOT_FOUND => "the configured model was not found",
        StatusCode::TOO_MANY_REQUESTS => "quota exceeded - try again later",
        s if s.is_server_error() => "the service is unavailable - try again later",
        _ => "unexpected response",
    };

    let message = match upstream {
        Some(detail) => format!("{} ({}: {})", summary, status.as_u16(), detail),
        None => format!("{} ({})", summary, status.as_u16()),
    };
    ResolutionError::Service(message)
}

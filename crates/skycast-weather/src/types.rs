use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A citation returned by search grounding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

/// Current weather for one location, as summarised by the AI service.
///
/// Built only from a fully validated response; there is no partial result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherResult {
    pub city: String,
    /// Includes its unit, e.g. "18°C"
    pub temperature: String,
    /// Free text, e.g. "Partly cloudy"
    pub condition: String,
    pub humidity: String,
    pub wind_speed: String,
    pub description: String,
    pub ai_advice: String,
    /// Ordered by upstream relevance
    pub sources: Vec<Source>,
    pub fetched_at: DateTime<Utc>,
}

/// Geographic position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// `"<lat>, <lon>"` as passed to resolution, e.g. `"40.7128, -74.006"`.
    pub fn query_string(&self) -> String {
        format!("{}, {}", self.latitude, self.longitude)
    }
}

/// Location service errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

/// Message shown for every response that cannot be read as weather data
pub const PARSE_ERROR_MESSAGE: &str = "Could not parse weather data for this location.";

/// Why a resolution failed. `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// The AI call itself failed (network, auth, quota, configuration)
    #[error("Weather service error: {0}")]
    Service(String),

    /// The response could not be read as weather data; `detail` is for logs only
    #[error("Could not parse weather data for this location.")]
    Parse { detail: String },

    /// The service could not identify the location
    #[error("Could not find weather for \"{0}\". Check the spelling or try a nearby city.")]
    NotFound(String),
}

impl ResolutionError {
    pub fn parse(detail: impl Into<String>) -> Self {
        Self::Parse {
            detail: detail.into(),
        }
    }
}

impl From<reqwest::Error> for ResolutionError {
    fn from(e: reqwest::Error) -> Self {
        let message = if e.is_timeout() {
            "the request timed out".to_string()
        } else if e.is_connect() {
            "unable to connect - check your internet connection".to_string()
        } else if e.is_decode() {
            return Self::parse(e.to_string());
        } else {
            e.to_string()
        };
        Self::Service(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string_preserves_sign() {
        assert_eq!(Location::new(40.7128, -74.006).query_string(), "40.7128, -74.006");
        assert_eq!(Location::new(-33.8688, 151.2093).query_string(), "-33.8688, 151.2093");
        assert_eq!(Location::new(0.0, 10.0).query_string(), "0, 10");
    }

    #[test]
    fn test_resolution_error_messages_are_distinct() {
        let service = ResolutionError::Service("quota exceeded".into()).to_string();
        let parse = ResolutionError::parse("missing city").to_string();
        let not_found = ResolutionError::NotFound("Atlantis".into()).to_string();

        assert!(service.contains("quota exceeded"));
        assert_eq!(parse, PARSE_ERROR_MESSAGE);
        assert!(!parse.contains("missing city"));
        assert!(not_found.contains("Atlantis"));
        assert_ne!(service, parse);
        assert_ne!(parse, not_found);
    }

    #[test]
    fn test_weather_result_serializes_camel_case() {
        let result = WeatherResult {
            city: "Paris".into(),
            temperature: "18°C".into(),
            condition: "Sunny".into(),
            humidity: "40%".into(),
            wind_speed: "10 km/h".into(),
            description: "Bright".into(),
            ai_advice: "Wear sunglasses".into(),
            sources: vec![],
            fetched_at: Utc::now(),
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"windSpeed\""));
        assert!(json.contains("\"aiAdvice\""));
    }
}

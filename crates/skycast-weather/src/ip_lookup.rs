//! Approximate position from the public IP address.
//! Defaults to ipapi.co - free, no API key required.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::location::Geolocator;
use crate::types::{Location, LocationError};

const DEFAULT_LOOKUP_URL: &str = "https://ipapi.co/json/";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = "SkyCast/0.1.0";

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IpGeolocator {
    client: Option<Client>,
    url: String,
}

impl IpGeolocator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = match Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
        {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::warn!("Failed to create IP lookup client: {}", e);
                None
            }
        };

        Self {
            client,
            url: url.into(),
        }
    }
}

impl Default for IpGeolocator {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKUP_URL, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    fn is_available(&self) -> bool {
        self.client.is_some()
    }

    async fn current_position(&self) -> Result<Location, LocationError> {
        let client = self
            .client
            .as_ref()
            .ok_or(LocationError::ServiceUnavailable)?;

        let response = client.get(&self.url).send().await.map_err(|e| {
            tracing::debug!("IP lookup request failed: {}", e);
            if e.is_timeout() {
                LocationError::Timeout
            } else {
                LocationError::ServiceUnavailable
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("IP lookup returned status {}", status);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LocationError::PermissionDenied,
                StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => LocationError::Timeout,
                _ => LocationError::ServiceUnavailable,
            });
        }

        let body: IpLookupResponse = response.json().await.map_err(|e| {
            tracing::debug!("IP lookup parse error: {}", e);
            LocationError::Other(format!("unreadable response: {}", e))
        })?;

        if body.error.as_ref().is_some_and(|e| e != &serde_json::Value::Bool(false)) {
            let reason = body.reason.unwrap_or_else(|| "lookup refused".to_string());
            return Err(LocationError::Other(reason));
        }

        match (body.latitude, body.longitude) {
            (Some(latitude), Some(longitude)) => {
                tracing::info!("IP lookup located: {}, {}", latitude, longitude);
                Ok(Location::new(latitude, longitude))
            }
            _ => Err(LocationError::Other("no coordinates in response".to_string())),
        }
    }
}

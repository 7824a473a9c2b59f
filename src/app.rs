//! Builds the orchestrator and its collaborators from configuration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use skycast_core::{AiConfig, Config, LocationConfig, LocationSource};
use skycast_ui::Orchestrator;
use skycast_weather::{
    FixedGeolocator, Geolocator, IpGeolocator, ProviderSettings, Unavailable, WeatherProvider,
};

pub fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let provider = WeatherProvider::new(provider_settings(&config.ai))
        .context("Failed to create weather provider")?;

    Ok(Orchestrator::new(
        Arc::new(provider),
        geolocator(&config.location),
    ))
}

pub fn provider_settings(ai: &AiConfig) -> ProviderSettings {
    ProviderSettings {
        api_key: ai.effective_api_key(),
        model: ai.model.clone(),
        base_url: ai.base_url.clone(),
        timeout: Duration::from_secs(ai.timeout_secs),
        grounding: ai.grounding,
    }
}

pub fn geolocator(location: &LocationConfig) -> Arc<dyn Geolocator> {
    match location.source {
        LocationSource::Ip => Arc::new(IpGeolocator::new(
            location.ip_lookup_url.clone(),
            Duration::from_secs(location.timeout_secs),
        )),
        LocationSource::Fixed => match (location.latitude, location.longitude) {
            (Some(latitude), Some(longitude)) => {
                Arc::new(FixedGeolocator::new(latitude, longitude))
            }
            _ => {
                tracing::warn!("Fixed location without coordinates; geolocation disabled");
                Arc::new(Unavailable)
            }
        },
        LocationSource::Disabled => Arc::new(Unavailable),
    }
}

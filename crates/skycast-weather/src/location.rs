//! Geolocation capability used by the startup lookup.

use async_trait::async_trait;

use crate::types::{Location, LocationError};

/// Single-shot source of the current position.
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// False when this environment has no way to determine a position.
    fn is_available(&self) -> bool;

    async fn current_position(&self) -> Result<Location, LocationError>;
}

/// Position taken from configuration
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator {
    location: Location,
}

impl FixedGeolocator {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            location: Location::new(latitude, longitude),
        }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    fn is_available(&self) -> bool {
        true
    }

    async fn current_position(&self) -> Result<Location, LocationError> {
        Ok(self.location)
    }
}

/// No geolocation capability at all
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

#[async_trait]
impl Geolocator for Unavailable {
    fn is_available(&self) -> bool {
        false
    }

    async fn current_position(&self) -> Result<Location, LocationError> {
        Err(LocationError::ServiceUnavailable)
    }
}

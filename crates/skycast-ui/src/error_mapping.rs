//! Maps resolution and location errors to the messages stored in `AppState`.

use skycast_weather::{LocationError, ResolutionError};

/// Shown when the environment has no geolocation capability.
pub const GEOLOCATION_UNSUPPORTED: &str = "Geolocation is not supported on this system.";

/// Shown when a position could not be obtained, whatever the cause.
pub const GEOLOCATION_FAILED: &str =
    "Unable to retrieve your location. Try searching for a city instead.";

/// Resolution failures are surfaced verbatim.
pub fn resolution_message(error: &ResolutionError) -> String {
    error.to_string()
}

/// Every position failure collapses to one fixed message; the cause is only logged.
pub fn location_message(error: &LocationError) -> &'static str {
    tracing::info!("Geolocation failed: {}", error);
    GEOLOCATION_FAILED
}

//! Weather resolution for SkyCast
//!
//! Turns a free-text location into a structured [`WeatherResult`] by asking
//! the Gemini API (grounded with Google Search), and provides the
//! geolocation capability used for the startup lookup.

pub mod extract;
pub mod ip_lookup;
pub mod location;
pub mod provider;
pub mod types;

pub use ip_lookup::IpGeolocator;
pub use location::{FixedGeolocator, Geolocator, Unavailable};
pub use provider::{ProviderSettings, WeatherProvider, WeatherResolver};
pub use types::*;

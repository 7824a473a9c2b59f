//! Application state and its transitions.
//!
//! `weather` and `error` describe the outcome of the most recent completed
//! resolution; starting a new one leaves the previous outcome in place until
//! it completes.

use skycast_weather::WeatherResult;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    /// Last successful resolution
    pub weather: Option<WeatherResult>,
    /// True while a resolution (or position request) is in flight
    pub loading: bool,
    /// Last failure message
    pub error: Option<String>,
}

impl AppState {
    /// A resolution is starting.
    pub fn begin_resolution(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// A position request is starting; prior outcome stays visible.
    pub fn begin_locating(&mut self) {
        self.loading = true;
    }

    pub fn resolved(&mut self, weather: WeatherResult) {
        self.weather = Some(weather);
        self.loading = false;
        self.error = None;
    }

    pub fn failed(&mut self, message: impl Into<String>) {
        self.weather = None;
        self.loading = false;
        self.error = Some(message.into());
    }

    /// Position could not be obtained; weather is left untouched.
    pub fn location_failed(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    /// Geolocation is missing entirely; loading is never set.
    pub fn location_unsupported(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}

//! Background theme derived from the weather condition.

use skycast_weather::WeatherResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Sunny,
    Rainy,
    Cloudy,
    #[default]
    Default,
}

impl Theme {
    /// Ordered keyword checks, first match wins.
    pub fn for_condition(condition: &str) -> Self {
        let condition = condition.to_lowercase();
        if condition.contains("sun") || condition.contains("clear") {
            Self::Sunny
        } else if condition.contains("rain")
            || condition.contains("drizzle")
            || condition.contains("storm")
        {
            Self::Rainy
        } else if condition.contains("cloud") || condition.contains("overcast") {
            Self::Cloudy
        } else {
            Self::Default
        }
    }

    pub fn for_weather(weather: Option<&WeatherResult>) -> Self {
        weather
            .map(|w| Self::for_condition(&w.condition))
            .unwrap_or_default()
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Sunny => "weather-gradient-sunny",
            Self::Rainy => "weather-gradient-rainy",
            Self::Cloudy => "weather-gradient-cloudy",
            Self::Default => "weather-gradient-default",
        }
    }

    /// Glyph shown next to the city on the weather card
    pub fn icon(self) -> &'static str {
        match self {
            Self::Sunny => "☀",
            Self::Rainy => "☂",
            Self::Cloudy => "☁",
            Self::Default => "·",
        }
    }

    /// ANSI foreground color used by the terminal renderer
    pub fn ansi_color(self) -> &'static str {
        match self {
            Self::Sunny => "\x1b[33m",
            Self::Rainy => "\x1b[34m",
            Self::Cloudy => "\x1b[37m",
            Self::Default => "\x1b[36m",
        }
    }
}

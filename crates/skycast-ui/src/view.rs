//! What to show for a given state, and its terminal rendering.

use std::fmt::Write;

use skycast_weather::WeatherResult;

use crate::state::AppState;
use crate::theme::Theme;

pub const TITLE: &str = "SkyCast AI";
pub const LOADING_MESSAGE: &str = "Consulting Gemini for latest data...";
pub const WELCOME_MESSAGE: &str = "Search for a location to see the magic happen.";
pub const DISMISS_HINT: &str = "(type /dismiss to clear)";

const RESET: &str = "\x1b[0m";
const ERROR_COLOR: &str = "\x1b[31m";

/// Visible parts of the screen. Loading and error can show together
/// (a position request that started while an error was displayed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen<'a> {
    pub theme: Theme,
    pub loading: bool,
    pub error: Option<&'a str>,
    /// Only shown once loading has finished
    pub card: Option<&'a WeatherResult>,
    pub show_welcome: bool,
}

impl<'a> Screen<'a> {
    pub fn from_state(state: &'a AppState) -> Self {
        let card = if state.loading {
            None
        } else {
            state.weather.as_ref()
        };
        Self {
            theme: Theme::for_weather(state.weather.as_ref()),
            loading: state.loading,
            error: state.error.as_deref(),
            card,
            show_welcome: !state.loading && state.weather.is_none() && state.error.is_none(),
        }
    }
}

/// Render `screen` as terminal text. `color` enables ANSI theming.
pub fn render(screen: &Screen<'_>, color: bool) -> String {
    let paint = |code: &str, text: &str| -> String {
        if color {
            format!("{}{}{}", code, text, RESET)
        } else {
            text.to_string()
        }
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", paint(screen.theme.ansi_color(), TITLE));
    out.push('\n');

    if screen.loading {
        let _ = writeln!(out, "  … {}", LOADING_MESSAGE);
    }

    if let Some(error) = screen.error {
        let _ = writeln!(out, "  {}", paint(ERROR_COLOR, &format!("! {}", error)));
        let _ = writeln!(out, "    {}", DISMISS_HINT);
    }

    if let Some(weather) = screen.card {
        render_card(&mut out, weather, screen.theme, &paint);
    }

    if screen.show_welcome {
        let _ = writeln!(out, "  {}", WELCOME_MESSAGE);
    }

    out
}

fn render_card(
    out: &mut String,
    weather: &WeatherResult,
    theme: Theme,
    paint: &dyn Fn(&str, &str) -> String,
) {
    let _ = writeln!(
        out,
        "  {}  {}",
        theme.icon(),
        paint(theme.ansi_color(), &weather.city)
    );
    let _ = writeln!(out, "     {}  {}", weather.temperature, weather.condition);
    let _ = writeln!(
        out,
        "     Humidity {}   Wind {}",
        weather.humidity, weather.wind_speed
    );
    if !weather.description.is_empty() {
        let _ = writeln!(out, "     {}", weather.description);
    }
    if !weather.ai_advice.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "  AI advice: {}", weather.ai_advice);
    }
    if !weather.sources.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "  Sources:");
        for (i, source) in weather.sources.iter().enumerate() {
            let _ = writeln!(out, "    {}. {}  {}", i + 1, source.title, source.uri);
        }
    }
    let _ = writeln!(
        out,
        "  Updated {}",
        weather.fetched_at.format("%Y-%m-%d %H:%M UTC")
    );
}

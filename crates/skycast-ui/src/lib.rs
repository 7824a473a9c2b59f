//! Application state, orchestration and presentation for SkyCast.
//!
//! The [`Orchestrator`] is the only writer of [`AppState`]; front ends
//! subscribe to its changes and render them through [`Screen`].

pub mod error_mapping;
pub mod orchestrator;
pub mod state;
pub mod theme;
pub mod view;

pub use orchestrator::Orchestrator;
pub use state::AppState;
pub use theme::Theme;
pub use view::{render, Screen};

pub mod config;

pub use config::{AiConfig, Config, LocationConfig, LocationSource, UiConfig, ValidationResult};

use anyhow::Result;

/// Initialize logging.
///
/// Logs go to stderr so they never interleave with the rendered screen on
/// stdout. `RUST_LOG` overrides the default `warn` filter.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::info!("SkyCast core initialized");
    Ok(())
}

mod app;
mod terminal;

use anyhow::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    skycast_core::init()?;

    let (config, validation) = skycast_core::Config::load_validated()?;
    tracing::info!(
        "SkyCast started (config directory: {}, {} warnings)",
        config.config_dir.display(),
        validation.warnings.len()
    );

    let orchestrator = app::build_orchestrator(&config)?;
    terminal::run(orchestrator, config.ui.color).await?;

    tracing::info!("SkyCast shut down");
    Ok(())
}

//! Tensio: interactive hypertension risk form.
//!
//! Loads the artifacts named by `TENSIO_*` configuration and runs the terminal
//! form against them.

use anyhow::{Context, Result};

use tensio::adapters::ArtifactBundle;
use tensio::config::Config;
use tensio::tui::App;

fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Writing logs to the terminal would corrupt the alternate screen.
    let _guard = tensio::logging::init(&config, true)?;

    tracing::info!("Starting Tensio form...");

    let bundle = ArtifactBundle::load(&config.artifacts).with_context(|| {
        format!(
            "Failed to load artifacts from {:?}. Set TENSIO_ARTIFACT_DIR to a directory \
             containing the model, scaler and encoding table.",
            config.artifacts.dir
        )
    })?;

    let mut app = App::new(bundle.into_service());
    app.run()?;

    tracing::info!("Tensio shutdown complete.");
    Ok(())
}

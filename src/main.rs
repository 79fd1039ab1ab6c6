//! Microscope Server
//!
//! Run with: cargo run --bin microscope
//!
//! Configuration comes from the first config file found (see
//! [`microscope::config::Config::load_default`]) plus `MICROSCOPE_*`
//! environment overrides. `MICROSCOPE_SEED_FILE` points at a JSON snapshot
//! the in-memory job store starts from.

use microscope::api::{serve, AppState};
use microscope::config::Config;
use microscope::jobs::{JobBackend, MemoryJobStore};
use microscope::logging::init_logging;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_default()?;
    init_logging(&config.logging);

    tracing::info!("Starting Microscope v{}", env!("CARGO_PKG_VERSION"));

    let store = match &config.server.seed_file {
        Some(path) => MemoryJobStore::load_snapshot(path)?,
        None => {
            tracing::info!("No seed file configured, starting with an empty job store");
            MemoryJobStore::new()
        }
    };
    let jobs: Arc<dyn JobBackend> = Arc::new(store);

    let api_config = config.api_config();
    tracing::info!(
        mount = %api_config.base_path(),
        timezone = %api_config.timezone,
        production = api_config.production,
        "Dashboard configured"
    );

    let state = AppState::new(jobs, api_config.clone());
    serve(state, &api_config).await?;

    tracing::info!("Microscope server stopped");
    Ok(())
}

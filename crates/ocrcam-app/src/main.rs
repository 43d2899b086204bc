//! ocrcam application binary - composition root.
//!
//! 1. Load configuration from TOML and apply CLI overrides
//! 2. Build the camera and the OCR engine
//! 3. Provision the recognition pool in the background
//! 4. Serve the HTTP surface (or, headless, poll and log results)
//! 5. On Ctrl-C, stop polling and tear the pool down

mod cli;
mod mount;

use clap::Parser;

use ocrcam_api::{routes, AppState};
use ocrcam_core::config::OcrCamConfig;
use ocrcam_core::error::OcrCamError;
use ocrcam_poll::forward_pool_status;

use crate::cli::CliArgs;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config, loaded before tracing so the file can set the log level.
    let config_file = args.resolve_config_path();
    let (mut config, load_error) = match OcrCamConfig::load(&config_file) {
        Ok(config) => (config, None),
        Err(e) => (OcrCamConfig::default(), Some(e)),
    };
    args.apply(&mut config);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting ocrcam v{}", env!("CARGO_PKG_VERSION"));
    match load_error {
        None => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Some(OcrCamError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %config_file.display(), "No config file, using defaults");
        }
        Some(e) => {
            tracing::warn!(path = %config_file.display(), error = %e, "Failed to load config, using defaults");
        }
    }
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    // === Mount ===

    let camera = mount::build_camera(&config.camera).await;
    let engine = mount::build_engine(&config.pool);
    let state = AppState::new(config.clone(), camera);

    forward_pool_status(&state.pool, state.event_tx.clone());
    let provisioning = mount::spawn_provisioning(state.pool.clone(), engine);
    if config.polling.autostart {
        mount::spawn_autostart(&state);
    }

    // === Serve ===

    if args.headless {
        tracing::info!("Running headless; press Ctrl-C to stop");
        mount::spawn_result_logger(state.event_tx.subscribe());
        shutdown_signal().await;
    } else {
        tracing::info!(
            "Surface at http://{}:{}/ui",
            config.general.bind,
            config.general.port
        );
        if let Err(e) = routes::start_server(&config, state.clone(), shutdown_signal()).await {
            tracing::error!(error = %e, "API server failed");
            mount::unmount(&state, provisioning).await;
            return Err(e.into());
        }
    }

    // === Unmount ===

    mount::unmount(&state, provisioning).await;
    Ok(())
}

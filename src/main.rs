//! hot-config service host.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────── hot-config ─────────────────────────────┐
//!   │                                                                      │
//!   │  config dir ──▶ watcher ──▶ reload ──▶ store ──▶ dispatch ──▶ observers
//!   │                                  ▲                   │               │
//!   │               loader + overrides ┘                   ▼               │
//!   │  plugins dir ─▶ watcher ─────────────────────▶ restart coordinator   │
//!   │                                                      │               │
//!   │  admin API (read-only) ◀── store                     ▼               │
//!   │                                            lifecycle: drain, exit 42 │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use hot_config::admin::{self, AdminState};
use hot_config::config::HotConfig;
use hot_config::lifecycle::{signals, ProcessExit, RestartHandler, Shutdown};
use hot_config::observability::{logging, metrics};
use hot_config::settings::{self, ServiceSettings, SettingsError};

const DEFAULT_SETTINGS_FILE: &str = "hot-config.toml";

#[derive(Parser)]
#[command(name = "hot-config")]
#[command(about = "Hot-reloading configuration service", long_about = None)]
struct Cli {
    /// Settings file (TOML). Defaults to ./hot-config.toml when present.
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Override engine.config_dir.
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Override engine.plugins_dir.
    #[arg(long)]
    plugins_dir: Option<PathBuf>,

    /// Request a restart (exit 42) whenever a config is updated.
    #[arg(long)]
    restart_on_update: bool,
}

fn resolve_settings(cli: &Cli) -> Result<ServiceSettings, SettingsError> {
    let mut settings = match &cli.settings {
        Some(path) => settings::load_settings(path)?,
        None if PathBuf::from(DEFAULT_SETTINGS_FILE).is_file() => {
            settings::load_settings(&PathBuf::from(DEFAULT_SETTINGS_FILE))?
        }
        None => ServiceSettings::default(),
    };

    if let Some(dir) = &cli.config_dir {
        settings.engine.config_dir = dir.clone();
    }
    if let Some(dir) = &cli.plugins_dir {
        settings.engine.plugins_dir = Some(dir.clone());
    }
    if cli.restart_on_update {
        settings.engine.restart_on_update = true;
    }

    settings::validate_settings(&settings).map_err(SettingsError::Validation)?;
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;

    logging::init_logging(&settings.observability);
    tracing::info!("hot-config v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        config_dir = %settings.engine.config_dir.display(),
        plugins_dir = ?settings.engine.plugins_dir,
        restart_on_update = settings.engine.restart_on_update,
        "Settings loaded"
    );

    if settings.observability.metrics_enabled {
        if let Ok(addr) = settings.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %settings.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let engine = Arc::new(HotConfig::new(settings.engine.clone())?);
    engine.start().await?;
    let restart_requests = engine
        .take_restart_requests()
        .ok_or("restart channel already taken")?;

    let shutdown = Shutdown::new();

    if settings.admin.enabled {
        let listener = TcpListener::bind(&settings.admin.bind_address).await?;
        let state = AdminState {
            engine: engine.clone(),
            api_key: Arc::from(settings.admin.api_key.as_str()),
        };
        let admin_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = admin::serve(listener, state, admin_shutdown).await {
                tracing::error!(error = %e, "Admin API failed");
            }
        });
    }

    let restart = RestartHandler::new(
        ProcessExit,
        Duration::from_millis(settings.engine.restart_drain_ms),
    );

    tokio::select! {
        _ = signals::wait_for_termination() => {
            engine.stop();
            shutdown.trigger();
        }
        _ = restart.run(restart_requests, &engine, &shutdown) => {}
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

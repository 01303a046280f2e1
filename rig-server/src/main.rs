//! Rigmon radio control core
//!
//! Headless control daemon for a two-VFO HF transceiver. Owns the
//! canonical radio state, drives the serial or simulated link, and
//! serves the JSON control API.

mod api;
mod link;
mod settings;

use anyhow::Context;
use rig_core::{LinkMode, Rig};
use rig_detect::DetectConfig;
use settings::{SavedState, Settings};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Include all our crates in the default filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "rig_server=info,rig_protocol=info,rig_detect=info,rig_core=info,rig_sim=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Rigmon radio control core");

    let mut settings = Settings::load();

    let (link_tx, link_rx) = mpsc::channel(32);
    let mut rig = Rig::new();
    rig.set_link(link_tx);

    if let Some(saved) = &settings.state {
        saved.apply(&rig);
        info!("restored radio state from previous session");
    }

    let link_task = match settings.connection.link_mode {
        LinkMode::Mock => tokio::spawn(link::run_mock_link(rig.clone(), link_rx)),
        LinkMode::Serial => {
            let detect = DetectConfig {
                baud_rates: settings.connection.baud_rates.clone(),
                default_port: settings.connection.port.clone(),
                default_baud: settings.connection.baud.unwrap_or(4800),
                ..DetectConfig::default()
            };
            tokio::spawn(link::run_serial_link(rig.clone(), link_rx, detect))
        }
    };

    let server_handle = if settings.http.enabled {
        let server = api::build_server(rig.clone(), &settings.http.host, settings.http.port)
            .with_context(|| {
                format!(
                    "failed to bind control API on {}:{}",
                    settings.http.host, settings.http.port
                )
            })?;
        let handle = server.handle();
        tokio::spawn(server);
        Some(handle)
    } else {
        info!("control API disabled by settings");
        None
    };

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutting down");

    rig.shutdown_link().await;
    if let Some(handle) = server_handle {
        handle.stop(true).await;
    }
    if let Err(e) = link_task.await {
        warn!("link task exited abnormally: {}", e);
    }

    settings.state = Some(SavedState::from_snapshot(&rig.snapshot()));
    if let Err(e) = settings.save() {
        warn!("failed to save settings: {}", e);
    }

    Ok(())
}

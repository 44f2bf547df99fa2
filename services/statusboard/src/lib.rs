//! Status board - e-paper dashboard for uptime monitors and error-tracker incidents
//!
//! Polls UptimeRobot and Sentry, aggregates the results into a snapshot, and
//! redraws the panel whenever the snapshot changes.

pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod incidents;
pub mod io;
pub mod render;
pub mod snapshot;
pub mod uptime;

pub use config::{load_config, Config};
pub use error::{Result, StatusBoardError};

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::display::{DisplayDriver, PbmFileDisplay};
use crate::engine::{CycleOutcome, Engine};
use crate::incidents::SentryClient;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::render::{MonoFonts, Renderer};
use crate::snapshot::SnapshotBuilder;
use crate::uptime::UptimeRobotClient;

/// Wire the production clients, renderer and panel into an engine
pub fn build_engine(
    config: &Config,
    http: Arc<dyn HttpClient>,
    display: Arc<dyn DisplayDriver>,
    cancel: CancellationToken,
) -> Engine {
    let uptime = Arc::new(UptimeRobotClient::new(&config.uptime, Arc::clone(&http)));
    let incidents = Arc::new(SentryClient::new(&config.incidents, http));
    let builder = SnapshotBuilder::new(uptime, incidents, &config.incidents);
    let renderer = Renderer::new(
        config.layout.clone(),
        Box::new(MonoFonts::default()),
        config.uptime.precision,
    );

    Engine::new(
        builder,
        renderer,
        display,
        Duration::from_secs(config.poll.interval_seconds),
        Duration::from_secs(config.poll.error_backoff_seconds),
        cancel,
    )
}

fn file_display(config: &Config) -> Arc<dyn DisplayDriver> {
    Arc::new(PbmFileDisplay::new(
        &config.display,
        config.layout.width,
        config.layout.height,
    ))
}

/// Run the status board until Ctrl-C
pub async fn run(config: Config) -> Result<()> {
    config.validate()?;
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::default());
    let cancel = CancellationToken::new();
    let engine = build_engine(&config, http, file_display(&config), cancel.clone());

    engine.start().await?;

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
        }
        cancel_for_signal.cancel();
    });

    tracing::info!("Status board started");
    let state = engine.run().await;
    tracing::info!(
        "Status board stopped after {} frame(s)",
        state.frames_pushed
    );

    Ok(())
}

/// Fetch, render and push a single frame
pub async fn run_once(config: Config) -> Result<CycleOutcome> {
    config.validate()?;
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::default());
    let engine = build_engine(
        &config,
        http,
        file_display(&config),
        CancellationToken::new(),
    );

    engine.start().await?;
    let outcome = engine.run_once().await;
    engine.shutdown().await;
    outcome
}

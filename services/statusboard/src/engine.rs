//! Engine: the poll loop tying sources, renderer and display together

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::display::DisplayDriver;
use crate::render::Renderer;
use crate::snapshot::{Fingerprint, SnapshotBuilder};

/// State carried from one cycle to the next
#[derive(Debug, Default, Clone)]
pub struct LoopState {
    /// Fingerprint of the last frame pushed to the panel
    pub previous_fingerprint: Option<Fingerprint>,
    pub frames_pushed: u64,
}

/// What a single cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Rendered(Fingerprint),
    Unchanged(Fingerprint),
}

/// The engine polls the sources and refreshes the panel when data changes
pub struct Engine {
    builder: SnapshotBuilder,
    renderer: Renderer,
    display: Arc<dyn DisplayDriver>,
    interval: Duration,
    error_backoff: Duration,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(
        builder: SnapshotBuilder,
        renderer: Renderer,
        display: Arc<dyn DisplayDriver>,
        interval: Duration,
        error_backoff: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            builder,
            renderer,
            display,
            interval,
            error_backoff,
            cancel,
        }
    }

    /// Initialise and blank the panel
    pub async fn start(&self) -> crate::Result<()> {
        self.display.init().await?;
        self.display.clear().await?;
        tracing::debug!("Display ready");
        Ok(())
    }

    /// Fetch a snapshot and push it when it differs from the last one pushed
    pub async fn run_cycle(&self, state: &mut LoopState) -> crate::Result<CycleOutcome> {
        tracing::info!("Fetching new data");
        let snapshot = self.builder.build().await;

        if state.previous_fingerprint == Some(snapshot.fingerprint) {
            tracing::info!("Data hasn't changed");
            return Ok(CycleOutcome::Unchanged(snapshot.fingerprint));
        }

        tracing::info!("Displaying new data ({})", snapshot.fingerprint);
        let frame = self.renderer.render(&snapshot);
        self.display.display(&frame).await?;

        state.previous_fingerprint = Some(snapshot.fingerprint);
        state.frames_pushed += 1;
        Ok(CycleOutcome::Rendered(snapshot.fingerprint))
    }

    /// Single cycle from a fresh state, for one-shot runs
    pub async fn run_once(&self) -> crate::Result<CycleOutcome> {
        let mut state = LoopState::default();
        self.run_cycle(&mut state).await
    }

    /// Poll until the cancellation token is triggered, then put the panel to sleep
    pub async fn run(&self) -> LoopState {
        let mut state = LoopState::default();

        loop {
            let wait = tokio::select! {
                result = self.run_cycle(&mut state) => match result {
                    Ok(_) => self.interval,
                    Err(e) => {
                        tracing::error!(
                            "Cycle failed: {}. Retrying in {:?}",
                            e,
                            self.error_backoff
                        );
                        self.error_backoff
                    }
                },
                _ = self.cancel.cancelled() => break,
            };

            tracing::debug!("Sleeping for {:?}", wait);
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = self.cancel.cancelled() => break,
            }
        }

        tracing::debug!("Poll loop cancelled");
        self.shutdown().await;
        state
    }

    /// Best-effort panel shutdown
    pub async fn shutdown(&self) {
        if let Err(e) = self.display.sleep().await {
            tracing::warn!("Failed to put display to sleep: {}", e);
        }
    }
}

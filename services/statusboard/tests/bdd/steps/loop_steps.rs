//! BDD step definitions for poll loop feature

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when};
use tokio_util::sync::CancellationToken;

use statusboard::config::IncidentConfig;
use statusboard::display::DisplayDriver;
use statusboard::engine::{Engine, LoopState};
use statusboard::render::{Frame, Layout, MonoFonts, Renderer};
use statusboard::snapshot::SnapshotBuilder;
use statusboard::uptime::{ServiceRatio, UptimeSource};
use statusboard::StatusBoardError;

use crate::steps::snapshot_steps::{sample_incidents, sample_ratios, StaticIncidents};
use crate::world::StatusBoardWorld;

/// Display that counts pushes and can fail the first one
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pub pushes: AtomicU32,
    pub attempts: AtomicU32,
    pub fail_first: AtomicBool,
}

#[async_trait::async_trait]
impl DisplayDriver for RecordingDisplay {
    async fn init(&self) -> statusboard::Result<()> {
        Ok(())
    }

    async fn clear(&self) -> statusboard::Result<()> {
        Ok(())
    }

    async fn display(&self, _frame: &Frame) -> statusboard::Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt == 0 && self.fail_first.load(Ordering::SeqCst) {
            return Err(StatusBoardError::Device("panel busy".to_string()));
        }
        self.pushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn sleep(&self) -> statusboard::Result<()> {
        Ok(())
    }
}

/// Uptime source reporting a new down monitor on every call
struct ChangingUptime {
    calls: AtomicU32,
}

#[async_trait::async_trait]
impl UptimeSource for ChangingUptime {
    async fn fetch_down_monitors(&self) -> statusboard::Result<Vec<String>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![format!("worker-{} eu-west", n)])
    }

    async fn fetch_service_ratios(&self) -> statusboard::Result<Vec<ServiceRatio>> {
        Ok(sample_ratios())
    }
}

fn engine_for(world: &StatusBoardWorld, display: Arc<RecordingDisplay>) -> Engine {
    let builder = if world.data_changes {
        SnapshotBuilder::new(
            Arc::new(ChangingUptime {
                calls: AtomicU32::new(0),
            }),
            Arc::new(StaticIncidents {
                issues: sample_incidents(),
            }),
            &IncidentConfig::default(),
        )
    } else {
        crate::steps::snapshot_steps::builder(Vec::new(), false)
    };
    let renderer = Renderer::new(Layout::default(), Box::new(MonoFonts::default()), 2);
    Engine::new(
        builder,
        renderer,
        display,
        Duration::from_millis(1),
        Duration::from_millis(1),
        CancellationToken::new(),
    )
}

fn recording_display(world: &mut StatusBoardWorld) -> Arc<RecordingDisplay> {
    Arc::clone(
        world
            .display
            .get_or_insert_with(|| Arc::new(RecordingDisplay::default())),
    )
}

#[given("the data does not change between cycles")]
fn data_stable(world: &mut StatusBoardWorld) {
    world.data_changes = false;
}

#[given("the data changes every cycle")]
fn data_changing(world: &mut StatusBoardWorld) {
    world.data_changes = true;
}

#[given("the display fails on the first push")]
fn display_fails_first(world: &mut StatusBoardWorld) {
    recording_display(world)
        .fail_first
        .store(true, Ordering::SeqCst);
}

#[when(expr = "the engine runs {int} cycle(s)")]
async fn run_cycles(world: &mut StatusBoardWorld, cycles: usize) {
    let display = recording_display(world);
    let engine = engine_for(world, display);
    let mut state = LoopState::default();
    for _ in 0..cycles {
        let result = engine.run_cycle(&mut state).await;
        world.cycle_results.push(result);
    }
}

#[then(expr = "the display should have been updated {int} time(s)")]
fn display_updated(world: &mut StatusBoardWorld, expected: u32) {
    let display = world.display.as_ref().expect("no display");
    assert_eq!(display.pushes.load(Ordering::SeqCst), expected);
}

#[then("the first cycle should report a display error")]
fn first_cycle_failed(world: &mut StatusBoardWorld) {
    match world.cycle_results.first() {
        Some(Err(StatusBoardError::Device(msg))) => assert!(msg.contains("panel busy")),
        other => panic!("expected device error, got {:?}", other),
    }
}

#[then("every later cycle should succeed")]
fn later_cycles_succeed(world: &mut StatusBoardWorld) {
    for result in world.cycle_results.iter().skip(1) {
        assert!(result.is_ok(), "cycle failed: {:?}", result);
    }
}

//! BDD test world for the status board service

use std::sync::Arc;

use cucumber::World;
use statusboard::config::UptimeConfig;
use statusboard::engine::CycleOutcome;
use statusboard::incidents::Incident;
use statusboard::render::Canvas;
use statusboard::snapshot::Snapshot;
use statusboard::uptime::ServiceRatio;

use crate::steps::loop_steps::RecordingDisplay;
use crate::steps::uptime_steps::PagedUptimeApi;

#[derive(Debug, Default, World)]
pub struct StatusBoardWorld {
    // Uptime aggregation
    pub uptime_config: UptimeConfig,
    pub uptime_api: Option<Arc<PagedUptimeApi>>,
    pub service_ratios: Option<statusboard::Result<Vec<ServiceRatio>>>,

    // Incident fetching
    pub issue_count: usize,
    pub issue_status: u16,
    pub incidents: Option<statusboard::Result<Vec<Incident>>>,

    // Snapshots
    pub uptime_unavailable: bool,
    pub snapshot: Option<Snapshot>,
    pub other_snapshot: Option<Snapshot>,

    // Layout
    pub down_monitors: Vec<String>,
    pub canvas: Option<Canvas>,

    // Poll loop
    pub data_changes: bool,
    pub display: Option<Arc<RecordingDisplay>>,
    pub cycle_results: Vec<statusboard::Result<CycleOutcome>>,
}

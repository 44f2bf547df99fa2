//! Snapshot of all board data for one poll cycle

use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use crate::config::IncidentConfig;
use crate::incidents::{Incident, IncidentSource};
use crate::uptime::{ServiceRatio, UptimeSource};

/// Change-detection hash over a snapshot's fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Hash the string form of each field, in a fixed order
    pub fn of(
        service_ratios: &[ServiceRatio],
        down_monitor_names: &[String],
        frontend_incidents: Option<&[Incident]>,
        backend_incidents: &[Incident],
    ) -> Self {
        let mut hasher = DefaultHasher::new();
        format!("{:?}", service_ratios).hash(&mut hasher);
        format!("{:?}", down_monitor_names).hash(&mut hasher);
        format!("{:?}", frontend_incidents).hash(&mut hasher);
        format!("{:?}", backend_incidents).hash(&mut hasher);
        Fingerprint(hasher.finish())
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Aggregated, point-in-time view of everything on the board
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub service_ratios: Vec<ServiceRatio>,
    pub down_monitor_names: Vec<String>,
    pub backend_incidents: Vec<Incident>,
    /// `None` when no frontend project is tracked
    pub frontend_incidents: Option<Vec<Incident>>,
    pub fingerprint: Fingerprint,
}

impl Snapshot {
    pub fn new(
        service_ratios: Vec<ServiceRatio>,
        down_monitor_names: Vec<String>,
        backend_incidents: Vec<Incident>,
        frontend_incidents: Option<Vec<Incident>>,
    ) -> Self {
        let fingerprint = Fingerprint::of(
            &service_ratios,
            &down_monitor_names,
            frontend_incidents.as_deref(),
            &backend_incidents,
        );
        Self {
            service_ratios,
            down_monitor_names,
            backend_incidents,
            frontend_incidents,
            fingerprint,
        }
    }
}

/// Collects one snapshot per cycle from the configured sources
pub struct SnapshotBuilder {
    uptime: Arc<dyn UptimeSource>,
    incidents: Arc<dyn IncidentSource>,
    backend_project: String,
    frontend_project: Option<String>,
    limit: usize,
}

impl SnapshotBuilder {
    pub fn new(
        uptime: Arc<dyn UptimeSource>,
        incidents: Arc<dyn IncidentSource>,
        config: &IncidentConfig,
    ) -> Self {
        Self {
            uptime,
            incidents,
            backend_project: config.backend_project.clone(),
            frontend_project: config.frontend_project.clone(),
            limit: config.limit,
        }
    }

    /// Fetch every source in turn. A failing source is logged and left empty.
    pub async fn build(&self) -> Snapshot {
        let service_ratios = self
            .uptime
            .fetch_service_ratios()
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Error getting service ratios: {}", e);
                Vec::new()
            });

        let down_monitor_names = self
            .uptime
            .fetch_down_monitors()
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Error getting down monitors: {}", e);
                Vec::new()
            });

        let frontend_incidents = match &self.frontend_project {
            Some(project) => Some(self.issues_or_empty(project).await),
            None => None,
        };
        let backend_incidents = self.issues_or_empty(&self.backend_project).await;

        let snapshot = Snapshot::new(
            service_ratios,
            down_monitor_names,
            backend_incidents,
            frontend_incidents,
        );
        tracing::debug!(
            "Snapshot {}: {} services, {} down, {} backend issues",
            snapshot.fingerprint,
            snapshot.service_ratios.len(),
            snapshot.down_monitor_names.len(),
            snapshot.backend_incidents.len()
        );
        snapshot
    }

    async fn issues_or_empty(&self, project: &str) -> Vec<Incident> {
        self.incidents
            .fetch_recent_issues(project, self.limit)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Error getting issues for '{}': {}", project, e);
                Vec::new()
            })
    }
}

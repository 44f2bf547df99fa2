//! UptimeRobot client: down monitors and per-service uptime ratios

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::UptimeConfig;
use crate::io::HttpClient;

const SERVICE: &str = "uptime API";

/// UptimeRobot status codes for "seems down" and "down"
const DOWN_STATUSES: &str = "8-9";

/// Health of a single monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorStatus {
    Up,
    Down,
    Other,
}

impl MonitorStatus {
    /// Map an UptimeRobot status code
    pub fn from_code(code: u8) -> Self {
        match code {
            2 => MonitorStatus::Up,
            8 | 9 => MonitorStatus::Down,
            _ => MonitorStatus::Other,
        }
    }
}

/// A single health-check target
#[derive(Debug, Clone, PartialEq)]
pub struct Monitor {
    pub display_name: String,
    pub status: MonitorStatus,
    pub uptime_ratio: f64,
}

/// Average uptime of all monitors sharing a service name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRatio {
    pub service_name: String,
    pub average_ratio: f64,
}

/// How ties are broken when rounding service ratios
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Ties go to the even neighbour (99.125 -> 99.12)
    #[default]
    HalfEven,
    /// Ties go away from zero (99.125 -> 99.13)
    HalfUp,
}

/// Source of uptime data for the board
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait UptimeSource: Send + Sync {
    /// Display names of monitors that are currently down
    async fn fetch_down_monitors(&self) -> crate::Result<Vec<String>>;

    /// Average uptime ratio per service, in first-seen order
    async fn fetch_service_ratios(&self) -> crate::Result<Vec<ServiceRatio>>;
}

#[derive(Debug, Deserialize)]
struct GetMonitorsResponse {
    stat: String,
    #[serde(default)]
    monitors: Vec<RawMonitor>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    total: usize,
}

#[derive(Debug, Deserialize)]
struct RawMonitor {
    friendly_name: String,
    #[serde(default)]
    status: u8,
    #[serde(default)]
    custom_uptime_ratio: Option<RatioValue>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RatioValue {
    Text(String),
    Number(f64),
}

impl RawMonitor {
    fn into_monitor(self) -> crate::Result<Monitor> {
        let uptime_ratio = match &self.custom_uptime_ratio {
            None => {
                return Err(crate::StatusBoardError::Upstream {
                    service: SERVICE,
                    status: 200,
                    body: format!("no uptime ratio for monitor '{}'", self.friendly_name),
                })
            }
            Some(RatioValue::Number(n)) => *n,
            // several windows come back dash-separated; only one is requested
            Some(RatioValue::Text(s)) => s
                .split('-')
                .next()
                .unwrap_or_default()
                .trim()
                .parse::<f64>()
                .map_err(|_| crate::StatusBoardError::Upstream {
                    service: SERVICE,
                    status: 200,
                    body: format!(
                        "unparseable uptime ratio {:?} for monitor '{}'",
                        s, self.friendly_name
                    ),
                })?,
        };

        Ok(Monitor {
            status: MonitorStatus::from_code(self.status),
            display_name: self.friendly_name,
            uptime_ratio,
        })
    }
}

/// Client for the UptimeRobot v2 `getMonitors` endpoint
pub struct UptimeRobotClient {
    url: String,
    api_key: String,
    ratio_days: String,
    precision: u32,
    rounding: RoundingMode,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for UptimeRobotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UptimeRobotClient")
            .field("url", &self.url)
            .field("ratio_days", &self.ratio_days)
            .finish()
    }
}

impl UptimeRobotClient {
    pub fn new(config: &UptimeConfig, http: Arc<dyn HttpClient>) -> Self {
        let url = format!("{}/getMonitors", config.api_url.trim_end_matches('/'));
        tracing::debug!("Created UptimeRobotClient at {}", url);

        Self {
            url,
            api_key: config.api_key.clone(),
            ratio_days: config.ratio_days.to_string(),
            precision: config.precision,
            rounding: config.rounding,
            http,
        }
    }

    async fn get_monitors(&self, extra: &[(&str, &str)]) -> crate::Result<GetMonitorsResponse> {
        let mut params = vec![("api_key", self.api_key.as_str()), ("format", "json")];
        params.extend_from_slice(extra);

        let response = self.http.post_form(&self.url, &params).await?;
        if response.status != 200 {
            return Err(crate::StatusBoardError::Upstream {
                service: SERVICE,
                status: response.status,
                body: response.body,
            });
        }

        let parsed: GetMonitorsResponse = serde_json::from_str(&response.body)?;
        if parsed.stat != "ok" {
            return Err(crate::StatusBoardError::Upstream {
                service: SERVICE,
                status: response.status,
                body: response.body,
            });
        }
        Ok(parsed)
    }
}

#[async_trait]
impl UptimeSource for UptimeRobotClient {
    async fn fetch_down_monitors(&self) -> crate::Result<Vec<String>> {
        let response = self.get_monitors(&[("statuses", DOWN_STATUSES)]).await?;
        let names: Vec<String> = response
            .monitors
            .into_iter()
            .map(|m| m.friendly_name)
            .collect();
        tracing::debug!("{} monitors down", names.len());
        Ok(names)
    }

    async fn fetch_service_ratios(&self) -> crate::Result<Vec<ServiceRatio>> {
        let first = self
            .get_monitors(&[("custom_uptime_ratios", self.ratio_days.as_str()), ("offset", "0")])
            .await?;
        let total = first.pagination.map(|p| p.total).unwrap_or(0);
        let mut raw = first.monitors;

        while raw.len() < total {
            let offset = raw.len().to_string();
            tracing::debug!("Fetching monitors page at offset {} of {}", offset, total);
            let page = self
                .get_monitors(&[
                    ("custom_uptime_ratios", self.ratio_days.as_str()),
                    ("offset", offset.as_str()),
                ])
                .await?;
            if page.monitors.is_empty() {
                tracing::warn!(
                    "Uptime API reported {} monitors but returned an empty page at offset {}",
                    total,
                    offset
                );
                break;
            }
            raw.extend(page.monitors);
        }

        let monitors = raw
            .into_iter()
            .map(RawMonitor::into_monitor)
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(aggregate_service_ratios(&monitors, self.precision, self.rounding))
    }
}

/// Service a monitor belongs to: the first word of its display name, with a
/// trailing numeric instance suffix (`api-2`) removed
pub fn service_name(display_name: &str) -> &str {
    let token = display_name.split_whitespace().next().unwrap_or_default();
    match token.rsplit_once('-') {
        Some((base, suffix))
            if !base.is_empty()
                && !suffix.is_empty()
                && suffix.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => token,
    }
}

/// Round `value` to `precision` decimal places
pub fn round_ratio(value: f64, precision: u32, mode: RoundingMode) -> f64 {
    let factor = 10f64.powi(precision as i32);
    let scaled = value * factor;
    let rounded = match mode {
        RoundingMode::HalfEven => scaled.round_ties_even(),
        RoundingMode::HalfUp => scaled.round(),
    };
    rounded / factor
}

/// Group monitors by service and average their ratios
pub fn aggregate_service_ratios(
    monitors: &[Monitor],
    precision: u32,
    rounding: RoundingMode,
) -> Vec<ServiceRatio> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<f64>)> = Vec::new();

    for monitor in monitors {
        let name = service_name(&monitor.display_name);
        let slot = *index.entry(name).or_insert_with(|| {
            groups.push((name, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(monitor.uptime_ratio);
    }

    groups
        .into_iter()
        .map(|(name, ratios)| {
            let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
            ServiceRatio {
                service_name: name.to_string(),
                average_ratio: round_ratio(mean, precision, rounding),
            }
        })
        .collect()
}

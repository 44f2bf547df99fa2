//! Configuration types for the status board service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::render::Layout;
use crate::uptime::RoundingMode;

/// Environment variable holding the UptimeRobot API key
pub const UPTIME_API_KEY_ENV: &str = "UPTIMEROBOT_API_KEY";

/// Environment variable holding the Sentry auth token
pub const INCIDENT_TOKEN_ENV: &str = "SENTRY_TOKEN";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub uptime: UptimeConfig,
    #[serde(default)]
    pub incidents: IncidentConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub layout: Layout,
}

/// Uptime monitoring API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UptimeConfig {
    #[serde(default = "default_uptime_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    /// Window, in days, of the custom uptime ratio requested per monitor
    #[serde(default = "default_ratio_days")]
    pub ratio_days: u32,
    /// Decimal places kept when averaging service ratios
    #[serde(default = "default_precision")]
    pub precision: u32,
    #[serde(default)]
    pub rounding: RoundingMode,
}

impl Default for UptimeConfig {
    fn default() -> Self {
        Self {
            api_url: default_uptime_api_url(),
            api_key: String::new(),
            ratio_days: default_ratio_days(),
            precision: default_precision(),
            rounding: RoundingMode::default(),
        }
    }
}

/// Error tracking API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentConfig {
    #[serde(default = "default_incident_api_url")]
    pub api_url: String,
    #[serde(default = "default_organization")]
    pub organization: String,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_stats_period")]
    pub stats_period: String,
    /// Number of issues kept per project
    #[serde(default = "default_incident_limit")]
    pub limit: usize,
    #[serde(default = "default_backend_project")]
    pub backend_project: String,
    /// `null` drops the frontend section from the board
    #[serde(default = "default_frontend_project")]
    pub frontend_project: Option<String>,
}

impl Default for IncidentConfig {
    fn default() -> Self {
        Self {
            api_url: default_incident_api_url(),
            organization: default_organization(),
            token: String::new(),
            stats_period: default_stats_period(),
            limit: default_incident_limit(),
            backend_project: default_backend_project(),
            frontend_project: default_frontend_project(),
        }
    }
}

/// Poll loop timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    #[serde(default = "default_error_backoff")]
    pub error_backoff_seconds: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
            error_backoff_seconds: default_error_backoff(),
        }
    }
}

/// Where frames are pushed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    /// Optional raw panel buffer written next to the image
    #[serde(default)]
    pub device_buffer_path: Option<PathBuf>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            device_buffer_path: None,
        }
    }
}

impl Config {
    /// Fill empty credentials from the process environment
    pub fn resolve_secrets(&mut self) -> crate::Result<()> {
        self.resolve_secrets_with(|name| std::env::var(name).ok())
    }

    /// Fill empty credentials using `lookup`, then check that none is missing
    pub fn resolve_secrets_with<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.uptime.api_key.is_empty() {
            self.uptime.api_key = lookup(UPTIME_API_KEY_ENV).unwrap_or_default();
        }
        if self.incidents.token.is_empty() {
            self.incidents.token = lookup(INCIDENT_TOKEN_ENV).unwrap_or_default();
        }

        if self.uptime.api_key.is_empty() {
            return Err(crate::StatusBoardError::Config(format!(
                "uptime API key missing: set uptime.api_key or {}",
                UPTIME_API_KEY_ENV
            )));
        }
        if self.incidents.token.is_empty() {
            return Err(crate::StatusBoardError::Config(format!(
                "incident token missing: set incidents.token or {}",
                INCIDENT_TOKEN_ENV
            )));
        }
        Ok(())
    }

    /// Reject values the poll loop cannot work with
    pub fn validate(&self) -> crate::Result<()> {
        if self.incidents.limit == 0 {
            return Err(crate::StatusBoardError::Config(
                "incidents.limit must be at least 1".to_string(),
            ));
        }
        if self.uptime.precision > 6 {
            return Err(crate::StatusBoardError::Config(format!(
                "uptime.precision {} is out of range (0-6)",
                self.uptime.precision
            )));
        }
        if self.poll.interval_seconds == 0 {
            return Err(crate::StatusBoardError::Config(
                "poll.interval_seconds must be positive".to_string(),
            ));
        }
        if self.poll.error_backoff_seconds == 0 {
            return Err(crate::StatusBoardError::Config(
                "poll.error_backoff_seconds must be positive".to_string(),
            ));
        }
        if self.layout.width == 0 || self.layout.height == 0 {
            return Err(crate::StatusBoardError::Config(
                "layout dimensions must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_uptime_api_url() -> String {
    "https://api.uptimerobot.com/v2".to_string()
}

fn default_ratio_days() -> u32 {
    30
}

fn default_precision() -> u32 {
    2
}

fn default_incident_api_url() -> String {
    "https://sentry.io/api/0".to_string()
}

fn default_organization() -> String {
    "root-health".to_string()
}

fn default_stats_period() -> String {
    "24h".to_string()
}

fn default_incident_limit() -> usize {
    4
}

fn default_backend_project() -> String {
    "backend".to_string()
}

fn default_frontend_project() -> Option<String> {
    Some("frontend".to_string())
}

fn default_interval() -> u64 {
    30
}

fn default_error_backoff() -> u64 {
    60
}

fn default_output_path() -> PathBuf {
    PathBuf::from("statusboard.pbm")
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::StatusBoardError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}

//! Sentry client: most recent issues per project

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::IncidentConfig;
use crate::io::HttpClient;

const SERVICE: &str = "incident API";

/// An error-tracking issue as shown on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub title: String,
    pub culprit: String,
    pub occurrence_count: u64,
}

/// Source of recent incidents for the board
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait IncidentSource: Send + Sync {
    /// The first `limit` issues of the stats period, in source order
    async fn fetch_recent_issues(
        &self,
        project: &str,
        limit: usize,
    ) -> crate::Result<Vec<Incident>>;
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    title: String,
    #[serde(default)]
    culprit: Option<String>,
    #[serde(default)]
    count: Option<CountValue>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CountValue {
    Text(String),
    Number(u64),
}

impl CountValue {
    /// Occurrence count; text that is not a number counts as 0
    fn value(&self, title: &str) -> u64 {
        match self {
            CountValue::Number(n) => *n,
            CountValue::Text(s) => s.trim().parse().unwrap_or_else(|_| {
                tracing::warn!("Unparseable count {:?} for issue '{}', showing 0", s, title);
                0
            }),
        }
    }
}

impl From<RawIssue> for Incident {
    fn from(raw: RawIssue) -> Self {
        Incident {
            occurrence_count: raw.count.as_ref().map_or(0, |c| c.value(&raw.title)),
            title: raw.title,
            culprit: raw.culprit.unwrap_or_default(),
        }
    }
}

/// Client for the Sentry project issues endpoint
pub struct SentryClient {
    base_url: String,
    organization: String,
    token: String,
    stats_period: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for SentryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentryClient")
            .field("base_url", &self.base_url)
            .field("organization", &self.organization)
            .finish()
    }
}

impl SentryClient {
    pub fn new(config: &IncidentConfig, http: Arc<dyn HttpClient>) -> Self {
        tracing::debug!(
            "Created SentryClient for organization '{}' at {}",
            config.organization,
            config.api_url
        );

        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            organization: config.organization.clone(),
            token: config.token.clone(),
            stats_period: config.stats_period.clone(),
            http,
        }
    }

    fn issues_url(&self, project: &str) -> String {
        format!(
            "{}/projects/{}/{}/issues/?statsPeriod={}",
            self.base_url, self.organization, project, self.stats_period
        )
    }
}

#[async_trait]
impl IncidentSource for SentryClient {
    async fn fetch_recent_issues(
        &self,
        project: &str,
        limit: usize,
    ) -> crate::Result<Vec<Incident>> {
        let url = self.issues_url(project);
        let response = self.http.get_with_bearer(&url, &self.token).await?;

        if response.status != 200 {
            return Err(crate::StatusBoardError::Upstream {
                service: SERVICE,
                status: response.status,
                body: response.body,
            });
        }

        let issues: Vec<RawIssue> = serde_json::from_str(&response.body)?;
        tracing::debug!(
            "Project '{}' has {} issues, keeping {}",
            project,
            issues.len(),
            limit.min(issues.len())
        );

        Ok(issues.into_iter().take(limit).map(Incident::from).collect())
    }
}

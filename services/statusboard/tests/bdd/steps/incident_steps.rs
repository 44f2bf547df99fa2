//! BDD step definitions for incident fetching feature

use std::sync::Arc;

use cucumber::{given, then, when};

use statusboard::config::IncidentConfig;
use statusboard::incidents::{IncidentSource, SentryClient};
use statusboard::io::{HttpClient, HttpResponse};
use statusboard::StatusBoardError;

use crate::world::StatusBoardWorld;

/// An incident API that returns `count` numbered issues, newest first
struct NumberedIssuesApi {
    count: usize,
    status: u16,
}

#[async_trait::async_trait]
impl HttpClient for NumberedIssuesApi {
    async fn get_with_bearer(&self, _url: &str, _token: &str) -> statusboard::Result<HttpResponse> {
        if self.status != 200 {
            return Ok(HttpResponse {
                status: self.status,
                body: r#"{"detail": "Invalid token"}"#.to_string(),
            });
        }
        let issues: Vec<serde_json::Value> = (1..=self.count)
            .map(|i| {
                serde_json::json!({
                    "title": format!("Issue {}", i),
                    "culprit": format!("module{}.handler", i),
                    "count": i.to_string(),
                })
            })
            .collect();
        Ok(HttpResponse {
            status: 200,
            body: serde_json::Value::Array(issues).to_string(),
        })
    }

    async fn post_form(
        &self,
        _url: &str,
        _params: &[(&str, &str)],
    ) -> statusboard::Result<HttpResponse> {
        Ok(HttpResponse {
            status: 405,
            body: String::new(),
        })
    }
}

#[given(expr = "the incident API returns {int} issue(s)")]
fn api_returns_issues(world: &mut StatusBoardWorld, count: usize) {
    world.issue_count = count;
    world.issue_status = 200;
}

#[given("the incident API rejects the token")]
fn api_rejects_token(world: &mut StatusBoardWorld) {
    world.issue_status = 401;
}

#[when(expr = "the {string} issues are fetched with a limit of {int}")]
async fn fetch_issues(world: &mut StatusBoardWorld, project: String, limit: usize) {
    let api = NumberedIssuesApi {
        count: world.issue_count,
        status: world.issue_status,
    };
    let client = SentryClient::new(&IncidentConfig::default(), Arc::new(api));
    world.incidents = Some(client.fetch_recent_issues(&project, limit).await);
}

#[then(expr = "{int} incident(s) should be kept")]
fn incidents_kept(world: &mut StatusBoardWorld, expected: usize) {
    let incidents = world
        .incidents
        .as_ref()
        .expect("incidents not fetched")
        .as_ref()
        .expect("fetch failed");
    assert_eq!(incidents.len(), expected);
}

#[then("the incidents should be the newest ones in source order")]
fn incidents_in_source_order(world: &mut StatusBoardWorld) {
    let incidents = world
        .incidents
        .as_ref()
        .expect("incidents not fetched")
        .as_ref()
        .expect("fetch failed");
    for (i, incident) in incidents.iter().enumerate() {
        assert_eq!(incident.title, format!("Issue {}", i + 1));
        assert_eq!(incident.culprit, format!("module{}.handler", i + 1));
        assert_eq!(incident.occurrence_count, (i + 1) as u64);
    }
}

#[then("the fetch should fail with an upstream error")]
fn fetch_fails_upstream(world: &mut StatusBoardWorld) {
    let result = world.incidents.as_ref().expect("incidents not fetched");
    match result {
        Err(StatusBoardError::Upstream { status, body, .. }) => {
            assert_eq!(*status, 401);
            assert!(body.contains("Invalid token"));
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

//! GitLab publisher.
//!
//! API:
//! - POST /projects/:id/merge_requests/:iid/notes   (answer / review)
//! - PUT  /projects/:id/merge_requests/:iid         (overview title + description)

use std::fmt;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::ProviderError;
use crate::parser::OverviewResult;

/// Banner placed above every note the bot posts.
pub const NOTE_BANNER: &str = "🤖 **Aider AI Review**";

/// Note text: banner, blank line, message.
pub fn note_body(message: &str) -> String {
    format!("{NOTE_BANNER}\n\n{message}")
}

#[derive(Clone)]
pub struct GitLabPublisher {
    http: reqwest::Client,
    headers: HeaderMap,
    /// e.g. `https://gitlab.example.com/api/v4`
    base_api: String,
}

impl fmt::Debug for GitLabPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitLabPublisher")
            .field("base_api", &self.base_api)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct NoteReq<'a> {
    body: &'a str,
}

#[derive(Serialize)]
struct UpdateReq<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    description: &'a str,
}

impl GitLabPublisher {
    /// `timeout` bounds every request end to end.
    pub fn new(base_api: &str, token: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            headers: build_gitlab_headers(token)?,
            base_api: base_api.trim_end_matches('/').to_string(),
        })
    }

    /// Posts `message` wrapped in the bot banner as an MR note.
    pub async fn post_note(
        &self,
        project_id: &str,
        mr_id: &str,
        message: &str,
    ) -> Result<(), ProviderError> {
        let url = format!("{}/notes", self.mr_url(project_id, mr_id));
        let body = note_body(message);
        debug!(chars = body.chars().count(), "note POST");

        let resp = self
            .http
            .post(&url)
            .headers(self.headers.clone())
            .json(&NoteReq { body: &body })
            .send()
            .await?;
        check_status(&resp)?;

        info!(project = project_id, mr = mr_id, "note posted");
        Ok(())
    }

    /// Replaces title and description. A fallback result only sets the
    /// description so the MR keeps its current title.
    pub async fn update_overview(
        &self,
        project_id: &str,
        mr_id: &str,
        overview: &OverviewResult,
    ) -> Result<(), ProviderError> {
        let url = self.mr_url(project_id, mr_id);
        let req = UpdateReq {
            title: (!overview.is_fallback()).then_some(overview.title.as_str()),
            description: &overview.description,
        };
        debug!(with_title = req.title.is_some(), "merge request PUT");

        let resp = self
            .http
            .put(&url)
            .headers(self.headers.clone())
            .json(&req)
            .send()
            .await?;
        check_status(&resp)?;

        info!(project = project_id, mr = mr_id, "overview updated");
        Ok(())
    }

    fn mr_url(&self, project_id: &str, mr_id: &str) -> String {
        format!(
            "{}/projects/{}/merge_requests/{}",
            self.base_api,
            urlencoding::encode(project_id),
            urlencoding::encode(mr_id)
        )
    }
}

fn check_status(resp: &reqwest::Response) -> Result<(), ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let retry_after = resp
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    Err(ProviderError::from_status(status.as_u16(), retry_after))
}

fn build_gitlab_headers(token: &str) -> Result<HeaderMap, ProviderError> {
    let mut h = HeaderMap::new();
    h.insert(USER_AGENT, HeaderValue::from_static("mr-aider-bot/0.1"));
    h.insert(ACCEPT, HeaderValue::from_static("application/json"));
    h.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let mut token = HeaderValue::from_str(token)
        .map_err(|_| ProviderError::InvalidConfig("token is not a valid header value".into()))?;
    token.set_sensitive(true);
    h.insert(HeaderName::from_static("private-token"), token);
    Ok(h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::{
        Json, Router,
        extract::{Path, State},
        http::{HeaderMap as AxHeaders, StatusCode},
        routing::{post, put},
    };
    use serde_json::Value;

    #[derive(Debug, Clone)]
    struct Seen {
        method: &'static str,
        path: String,
        token: Option<String>,
        body: Value,
    }

    type Log = Arc<Mutex<Vec<Seen>>>;

    async fn notes(
        State(log): State<Log>,
        Path((project, mr)): Path<(String, String)>,
        headers: AxHeaders,
        Json(body): Json<Value>,
    ) -> StatusCode {
        log.lock().unwrap().push(Seen {
            method: "POST",
            path: format!("{project}/{mr}/notes"),
            token: headers
                .get("private-token")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body,
        });
        if project == "denied" {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::CREATED
        }
    }

    async fn update(
        State(log): State<Log>,
        Path((project, mr)): Path<(String, String)>,
        Json(body): Json<Value>,
    ) -> StatusCode {
        log.lock().unwrap().push(Seen {
            method: "PUT",
            path: format!("{project}/{mr}"),
            token: None,
            body,
        });
        StatusCode::OK
    }

    async fn fake_gitlab() -> (String, Log) {
        let log: Log = Arc::default();
        let app = Router::new()
            .route("/api/v4/projects/{project}/merge_requests/{mr}/notes", post(notes))
            .route("/api/v4/projects/{project}/merge_requests/{mr}", put(update))
            .with_state(log.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/api/v4"), log)
    }

    #[test]
    fn banner_precedes_message() {
        assert_eq!(note_body("LGTM"), "🤖 **Aider AI Review**\n\nLGTM");
    }

    #[test]
    fn debug_hides_token() {
        let p = GitLabPublisher::new("http://h/api/v4", "glpat-xyz", Duration::from_secs(1)).unwrap();
        assert!(!format!("{p:?}").contains("glpat-xyz"));
    }

    #[tokio::test]
    async fn note_is_posted_with_token_and_banner() {
        let (base, log) = fake_gitlab().await;
        let p = GitLabPublisher::new(&base, "tok", Duration::from_secs(5)).unwrap();
        p.post_note("12", "7", "Looks fine").await.unwrap();

        let seen = log.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, "POST");
        assert_eq!(seen[0].path, "12/7/notes");
        assert_eq!(seen[0].token.as_deref(), Some("tok"));
        assert_eq!(seen[0].body["body"], "🤖 **Aider AI Review**\n\nLooks fine");
    }

    #[tokio::test]
    async fn http_errors_map_to_provider_errors() {
        let (base, _log) = fake_gitlab().await;
        let p = GitLabPublisher::new(&base, "tok", Duration::from_secs(5)).unwrap();
        let err = p.post_note("denied", "1", "x").await.unwrap_err();
        assert!(matches!(err, ProviderError::Unauthorized));
    }

    #[tokio::test]
    async fn overview_sets_title_and_description() {
        let (base, log) = fake_gitlab().await;
        let p = GitLabPublisher::new(&base, "tok", Duration::from_secs(5)).unwrap();
        let ov = OverviewResult {
            title: "Add cache".into(),
            description: "## Overview".into(),
        };
        p.update_overview("12", "7", &ov).await.unwrap();

        let seen = log.lock().unwrap().clone();
        assert_eq!(seen[0].method, "PUT");
        assert_eq!(seen[0].path, "12/7");
        assert_eq!(seen[0].body["title"], "Add cache");
        assert_eq!(seen[0].body["description"], "## Overview");
    }

    #[tokio::test]
    async fn fallback_overview_keeps_existing_title() {
        let (base, log) = fake_gitlab().await;
        let p = GitLabPublisher::new(&base, "tok", Duration::from_secs(5)).unwrap();
        let ov = OverviewResult {
            title: String::new(),
            description: "raw answer".into(),
        };
        p.update_overview("12", "7", &ov).await.unwrap();

        let seen = log.lock().unwrap().clone();
        assert!(seen[0].body.get("title").is_none());
        assert_eq!(seen[0].body["description"], "raw answer");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let p = GitLabPublisher::new(&format!("http://{addr}/api/v4"), "tok", Duration::from_secs(2))
            .unwrap();
        let err = p.post_note("1", "1", "x").await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_) | ProviderError::Timeout));
    }
}

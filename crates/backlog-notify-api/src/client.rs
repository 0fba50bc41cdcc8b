//! Ticket backend seam and the Backlog REST implementation.

use backlog_notify_core::IssueUpdate;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx response, e.g. `404 Not Found`.
    #[error("{status} {reason}")]
    Status { status: u16, reason: String },
    #[error("request failed")]
    Request(#[source] reqwest::Error),
    #[error("invalid Backlog URL `{url}`")]
    BaseUrl { url: String },
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        // The URL carries the API key as a query parameter.
        ApiError::Request(e.without_url())
    }
}

/// Something that can apply an [`IssueUpdate`].
#[async_trait::async_trait]
pub trait IssueTracker: Send + Sync {
    async fn update_issue(&self, update: &IssueUpdate) -> Result<(), ApiError>;
}

// ── Backlog ──

/// `PATCH {base}/api/v2/issues/{key}?apiKey=...` with a form-encoded body.
pub struct BacklogClient {
    http: reqwest::Client,
    base_url: reqwest::Url,
    api_key: String,
}

impl BacklogClient {
    pub fn new(api_host: &str, api_key: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_base_url(format!("https://{api_host}"), api_key)
    }

    /// Point the client at an arbitrary origin, e.g. a local test server.
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let url = base_url.into();
        let base_url = match reqwest::Url::parse(&url) {
            Ok(parsed) if !parsed.cannot_be_a_base() => parsed,
            _ => return Err(ApiError::BaseUrl { url }),
        };
        let http = reqwest::Client::builder()
            .user_agent(concat!("backlog-notify/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// The issue key is one percent-encoded path segment.
    pub fn issue_url(&self, issue_key: &str) -> reqwest::Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "v2", "issues", issue_key]);
        }
        url
    }
}

#[async_trait::async_trait]
impl IssueTracker for BacklogClient {
    async fn update_issue(&self, update: &IssueUpdate) -> Result<(), ApiError> {
        let mut form = vec![("comment", update.comment.as_str())];
        if let Some(status_id) = &update.status_id {
            form.push(("statusId", status_id.as_str()));
        }

        let resp = self
            .http
            .patch(self.issue_url(&update.issue_key))
            .query(&[("apiKey", self.api_key.as_str())])
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }
        tracing::info!(
            issue_key = %update.issue_key,
            status_id = ?update.status_id,
            "updated issue"
        );
        Ok(())
    }
}

// ── Dry run ──

/// Logs each update instead of sending it.
pub struct DryRunTracker;

#[async_trait::async_trait]
impl IssueTracker for DryRunTracker {
    async fn update_issue(&self, update: &IssueUpdate) -> Result<(), ApiError> {
        tracing::info!(
            issue_key = %update.issue_key,
            status_id = ?update.status_id,
            comment = %update.comment,
            "dry run: skipping issue update"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Form, Path, Query, State};
    use axum::http::StatusCode;
    use axum::routing::patch;
    use axum::Router;

    #[derive(Debug, Clone)]
    struct Received {
        issue_key: String,
        query: HashMap<String, String>,
        form: HashMap<String, String>,
    }

    type Log = Arc<Mutex<Vec<Received>>>;

    async fn handle(
        State(log): State<Log>,
        Path(issue_key): Path<String>,
        Query(query): Query<HashMap<String, String>>,
        Form(form): Form<HashMap<String, String>>,
    ) -> StatusCode {
        let missing = issue_key.starts_with("GONE-");
        log.lock().unwrap().push(Received {
            issue_key,
            query,
            form,
        });
        if missing {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::OK
        }
    }

    /// Serve the issue endpoint on an ephemeral port; returns its origin.
    async fn backlog_server() -> (String, Log) {
        let log: Log = Arc::default();
        let app = Router::new()
            .route("/api/v2/issues/{issue_key}", patch(handle))
            .with_state(log.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), log)
    }

    fn update(issue_key: &str, status_id: Option<&str>) -> IssueUpdate {
        IssueUpdate {
            issue_key: issue_key.into(),
            comment: "bobさんがプッシュしました\n+ [a & b](u)".into(),
            status_id: status_id.map(String::from),
        }
    }

    #[test]
    fn issue_url_from_host() {
        let client = BacklogClient::new("example.backlog.jp", "k").unwrap();
        assert_eq!(
            client.issue_url("PROJ-1").as_str(),
            "https://example.backlog.jp/api/v2/issues/PROJ-1"
        );
        let client = BacklogClient::with_base_url("http://127.0.0.1:9/", "k").unwrap();
        assert_eq!(
            client.issue_url("A-2").as_str(),
            "http://127.0.0.1:9/api/v2/issues/A-2"
        );
    }

    #[test]
    fn issue_key_cannot_escape_its_path_segment() {
        let client = BacklogClient::new("example.backlog.jp", "k").unwrap();
        assert_eq!(
            client.issue_url("A/../B?x#y").as_str(),
            "https://example.backlog.jp/api/v2/issues/A%2F..%2FB%3Fx%23y"
        );
    }

    #[test]
    fn invalid_base_url() {
        let err = BacklogClient::with_base_url("not a url", "k").err().unwrap();
        assert!(matches!(err, ApiError::BaseUrl { .. }));
        assert!(BacklogClient::new("bad host/", "k").is_err());
    }

    #[tokio::test]
    async fn patch_sends_comment_and_api_key() {
        let (base, log) = backlog_server().await;
        let client = BacklogClient::with_base_url(base, "secret key").unwrap();

        client.update_issue(&update("PROJ-1", None)).await.unwrap();

        let received = log.lock().unwrap().clone();
        assert_eq!(received.len(), 1);
        let r = &received[0];
        assert_eq!(r.issue_key, "PROJ-1");
        assert_eq!(r.query["apiKey"], "secret key");
        assert_eq!(r.form["comment"], "bobさんがプッシュしました\n+ [a & b](u)");
        assert!(!r.form.contains_key("statusId"));
    }

    #[tokio::test]
    async fn reserved_characters_stay_in_the_issue_key() {
        let (base, log) = backlog_server().await;
        let client = BacklogClient::with_base_url(base, "k").unwrap();

        client.update_issue(&update("A/B?c", None)).await.unwrap();

        let received = log.lock().unwrap().clone();
        assert_eq!(received[0].issue_key, "A/B?c");
        assert_eq!(received[0].query.len(), 1);
    }

    #[tokio::test]
    async fn patch_sends_status_id_when_present() {
        let (base, log) = backlog_server().await;
        let client = BacklogClient::with_base_url(base, "k").unwrap();

        client.update_issue(&update("PROJ-2", Some("3"))).await.unwrap();

        let received = log.lock().unwrap().clone();
        assert_eq!(received[0].form["statusId"], "3");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (base, _log) = backlog_server().await;
        let client = BacklogClient::with_base_url(base, "k").unwrap();

        let err = client.update_issue(&update("GONE-1", None)).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 404, .. }));
        assert_eq!(err.to_string(), "404 Not Found");
    }

    #[tokio::test]
    async fn transport_error_hides_api_key() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = BacklogClient::with_base_url(format!("http://{addr}"), "hunter2").unwrap();
        let err = client.update_issue(&update("PROJ-1", None)).await.unwrap_err();
        assert!(matches!(err, ApiError::Request(_)));

        let source = std::error::Error::source(&err).expect("transport cause is chained");
        assert!(!err.to_string().contains("hunter2"));
        assert!(!source.to_string().contains("hunter2"));
    }

    #[tokio::test]
    async fn dry_run_never_fails() {
        DryRunTracker
            .update_issue(&update("PROJ-1", Some("4")))
            .await
            .unwrap();
    }
}

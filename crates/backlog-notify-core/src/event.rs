//! GitHub webhook payloads consumed by the pipeline.
//!
//! Only the fields the pipeline reads are modelled. The payload is classified
//! once, at the boundary, into [`Event`]; downstream code never probes for
//! field presence.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::EventError;

/// `null` reads the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ── Push ──

/// A person as it appears in a commit's `author` / `committer`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// One element of a push event's `commits` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    #[serde(default)]
    pub tree_id: String,
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
    pub url: String,
    #[serde(default)]
    pub author: Person,
    #[serde(default)]
    pub committer: Person,
    #[serde(default)]
    pub distinct: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PushEvent {
    /// Full git ref, e.g. `refs/heads/main`.
    #[serde(rename = "ref", default)]
    pub git_ref: String,
    #[serde(default)]
    pub repository: Repository,
    #[serde(default, deserialize_with = "null_as_default")]
    pub commits: Vec<Commit>,
}

// ── Pull request ──

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub title: String,
    pub html_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub draft: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub merged: bool,
    pub number: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub number: u64,
    pub pull_request: PullRequest,
    pub sender: User,
}

/// What happened to the pull request, as far as comment selection cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrAction {
    Opened,
    Reopened,
    ReadyForReview,
    Closed,
    Other(String),
}

impl PrAction {
    pub fn parse(action: &str) -> Self {
        match action {
            "opened" => PrAction::Opened,
            "reopened" => PrAction::Reopened,
            "ready_for_review" => PrAction::ReadyForReview,
            "closed" => PrAction::Closed,
            other => PrAction::Other(other.to_string()),
        }
    }
}

// ── Classification ──

/// A webhook payload, discriminated into the two shapes the pipeline handles.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Push(PushEvent),
    PullRequest(PullRequestEvent),
}

impl Event {
    /// Classify a decoded payload.
    ///
    /// A payload carrying both `pull_request` and `number` is a pull request
    /// event; everything else is treated as a push, with a missing `commits`
    /// array meaning "no commits".
    pub fn from_value(value: serde_json::Value) -> Result<Self, EventError> {
        let is_pull_request = value.get("pull_request").is_some() && value.get("number").is_some();
        if is_pull_request {
            serde_json::from_value(value)
                .map(Event::PullRequest)
                .map_err(|source| EventError::Shape {
                    kind: "pull_request",
                    source,
                })
        } else if value.is_object() {
            serde_json::from_value(value)
                .map(Event::Push)
                .map_err(|source| EventError::Shape {
                    kind: "push",
                    source,
                })
        } else {
            Ok(Event::Push(PushEvent::default()))
        }
    }

    pub fn from_json(json: &str) -> Result<Self, EventError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Read and classify the event file GitHub Actions points at.
    pub fn load(path: &Path) -> Result<Self, EventError> {
        let content = std::fs::read_to_string(path).map_err(|source| EventError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Event::Push(_) => "push",
            Event::PullRequest(_) => "pull_request",
        }
    }
}

//! Apply the ticket pattern to commit messages and pull request titles.

use serde::Serialize;

use crate::event::{Commit, PullRequest, PullRequestEvent, User};
use crate::extract::TicketMatcher;

/// Configured fix/close keywords. Membership is exact; the lists may overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keywords {
    pub fix: Vec<String>,
    pub close: Vec<String>,
}

impl Keywords {
    pub fn new(fix: Vec<String>, close: Vec<String>) -> Self {
        Self { fix, close }
    }

    pub fn is_fix(&self, keywords: &str) -> bool {
        self.fix.iter().any(|k| k == keywords)
    }

    pub fn is_close(&self, keywords: &str) -> bool {
        self.close.iter().any(|k| k == keywords)
    }
}

/// A commit whose message carries an issue key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedCommit {
    #[serde(flatten)]
    pub commit: Commit,
    pub issue_key: String,
    /// Message with the issue key and trailing keyword stripped.
    pub comment: String,
    pub keywords: String,
    pub is_fix: bool,
    pub is_close: bool,
}

/// A pull request whose title carries an issue key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedPullRequest {
    pub pr: PullRequest,
    pub action: String,
    pub sender: User,
    pub issue_key: String,
    pub title: String,
    pub keywords: String,
    pub is_fix: bool,
    pub is_close: bool,
}

pub fn parse_commit(
    commit: &Commit,
    matcher: &TicketMatcher,
    keywords: &Keywords,
) -> Option<ParsedCommit> {
    let found = matcher.find(&commit.message)?;
    let issue_key = found.issue_key?;
    Some(ParsedCommit {
        commit: commit.clone(),
        issue_key,
        comment: found.content.trim().to_string(),
        is_fix: keywords.is_fix(&found.keywords),
        is_close: keywords.is_close(&found.keywords),
        keywords: found.keywords,
    })
}

/// Parse every commit, dropping those without an issue key. Order is kept.
pub fn parse_commits(
    commits: &[Commit],
    matcher: &TicketMatcher,
    keywords: &Keywords,
) -> Vec<ParsedCommit> {
    commits
        .iter()
        .filter_map(|commit| {
            let parsed = parse_commit(commit, matcher, keywords);
            if parsed.is_none() {
                tracing::debug!(commit = %commit.id, "no issue key in commit message");
            }
            parsed
        })
        .collect()
}

pub fn parse_pull_request(
    event: &PullRequestEvent,
    matcher: &TicketMatcher,
    keywords: &Keywords,
) -> Option<ParsedPullRequest> {
    let found = matcher.find(&event.pull_request.title)?;
    let issue_key = found.issue_key?;
    Some(ParsedPullRequest {
        pr: event.pull_request.clone(),
        action: event.action.clone(),
        sender: event.sender.clone(),
        issue_key,
        title: found.content.trim().to_string(),
        is_fix: keywords.is_fix(&found.keywords),
        is_close: keywords.is_close(&found.keywords),
        keywords: found.keywords,
    })
}

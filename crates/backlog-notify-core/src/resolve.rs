//! Decide which status transition, if any, accompanies an issue update.

use crate::event::PrAction;
use crate::parse::{ParsedCommit, ParsedPullRequest};

/// A status transition requested by a fix or close keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Fixed,
    Closed,
}

/// Backlog status ids for each transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusIds {
    pub fixed: String,
    pub closed: String,
}

impl StatusIds {
    pub fn id(&self, change: StatusChange) -> &str {
        match change {
            StatusChange::Fixed => &self.fixed,
            StatusChange::Closed => &self.closed,
        }
    }
}

/// Whether any fix / close keyword was seen for one issue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolution {
    pub is_fix: bool,
    pub is_close: bool,
}

impl Resolution {
    pub fn of_commits(commits: &[ParsedCommit]) -> Self {
        Self {
            is_fix: commits.iter().any(|c| c.is_fix),
            is_close: commits.iter().any(|c| c.is_close),
        }
    }

    pub fn of_pull_request(pr: &ParsedPullRequest) -> Self {
        Self {
            is_fix: pr.is_fix,
            is_close: pr.is_close,
        }
    }

    /// Fix wins when both were seen.
    pub fn status(&self) -> Option<StatusChange> {
        if self.is_fix {
            Some(StatusChange::Fixed)
        } else if self.is_close {
            Some(StatusChange::Closed)
        } else {
            None
        }
    }
}

/// Pull requests only change ticket status once merged.
pub fn pull_request_status(pr: &ParsedPullRequest) -> Option<StatusChange> {
    let merged = PrAction::parse(&pr.action) == PrAction::Closed && pr.pr.merged;
    if merged {
        Resolution::of_pull_request(pr).status()
    } else {
        None
    }
}

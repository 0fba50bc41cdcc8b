//! Send planned updates concurrently and collect per-ticket results.

use std::error::Error as _;
use std::fmt;

use backlog_notify_core::resolve::StatusChange;
use backlog_notify_core::{PlannedUpdate, UpdateSubject};
use futures_util::future::join_all;

use crate::client::{ApiError, IssueTracker};

/// A ticket that was updated, for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub issue_key: String,
    pub is_fix: bool,
    pub is_close: bool,
    /// Status transition sent with the comment, if any.
    pub status: Option<StatusChange>,
    pub subject: UpdateSubject,
}

impl From<PlannedUpdate> for UpdateOutcome {
    fn from(p: PlannedUpdate) -> Self {
        Self {
            issue_key: p.update.issue_key,
            is_fix: p.resolution.is_fix,
            is_close: p.resolution.is_close,
            status: p.status,
            subject: p.subject,
        }
    }
}

/// Every request's result, in plan order.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub succeeded: Vec<UpdateOutcome>,
    pub failed: Vec<(String, ApiError)>,
}

impl DispatchReport {
    pub fn into_result(self) -> Result<Vec<UpdateOutcome>, DispatchError> {
        if self.failed.is_empty() {
            return Ok(self.succeeded);
        }
        Err(DispatchError {
            failed: self.failed,
            updated: self.succeeded.into_iter().map(|o| o.issue_key).collect(),
        })
    }
}

/// At least one update failed. Tickets in `updated` were already changed.
#[derive(Debug, thiserror::Error)]
pub struct DispatchError {
    pub failed: Vec<(String, ApiError)>,
    pub updated: Vec<String>,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.failed.len() + self.updated.len();
        write!(f, "failed to update {} of {total} issues: ", self.failed.len())?;
        for (i, (key, err)) in self.failed.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key} ({err}")?;
            let mut cause = err.source();
            while let Some(e) = cause {
                write!(f, ": {e}")?;
                cause = e.source();
            }
            f.write_str(")")?;
        }
        if !self.updated.is_empty() {
            write!(f, "; already updated: {}", self.updated.join(", "))?;
        }
        Ok(())
    }
}

/// Issue all requests, then await them together. Failures do not cancel
/// the requests still in flight.
pub async fn dispatch(tracker: &dyn IssueTracker, planned: Vec<PlannedUpdate>) -> DispatchReport {
    let results = join_all(planned.iter().map(|p| tracker.update_issue(&p.update))).await;

    let mut report = DispatchReport::default();
    for (p, result) in planned.into_iter().zip(results) {
        match result {
            Ok(()) => report.succeeded.push(p.into()),
            Err(e) => {
                tracing::warn!(issue_key = %p.update.issue_key, error = %e, "issue update failed");
                report.failed.push((p.update.issue_key, e));
            }
        }
    }
    report
}

//! One run: plan the event, send the updates, describe what happened.

use backlog_notify_core::resolve::StatusChange;
use backlog_notify_core::{Event, Pipeline, Plan, Skip};

use crate::client::IssueTracker;
use crate::dispatch::{dispatch, DispatchError, UpdateOutcome};

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Nothing to send.
    Skipped(Skip),
    Sent(Vec<UpdateOutcome>),
}

impl RunOutcome {
    /// The one-line summary shown at the end of a run.
    pub fn message(&self) -> String {
        match self {
            RunOutcome::Skipped(skip) => skip.to_string(),
            RunOutcome::Sent(_) => "正常に送信しました。".to_string(),
        }
    }
}

impl UpdateOutcome {
    /// e.g. `PROJ-1を処理済みにしました。`
    pub fn status_message(&self) -> Option<String> {
        let key = &self.issue_key;
        self.status.map(|s| match s {
            StatusChange::Fixed => format!("{key}を処理済みにしました。"),
            StatusChange::Closed => format!("{key}を完了にしました。"),
        })
    }
}

pub async fn run(
    pipeline: &Pipeline,
    event: &Event,
    tracker: &dyn IssueTracker,
) -> Result<RunOutcome, DispatchError> {
    let planned = match pipeline.plan(event) {
        Plan::Skip(skip) => {
            tracing::debug!(kind = event.kind(), ?skip, "nothing to update");
            return Ok(RunOutcome::Skipped(skip));
        }
        Plan::Updates(planned) => planned,
    };

    tracing::debug!(kind = event.kind(), updates = planned.len(), "dispatching");
    let outcomes = dispatch(tracker, planned).await.into_result()?;
    Ok(RunOutcome::Sent(outcomes))
}

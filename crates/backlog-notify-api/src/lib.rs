//! Backlog side of backlog-notify: the [`IssueTracker`] seam, the REST
//! client, concurrent dispatch, and the per-event [`run`].

pub mod client;
pub mod dispatch;
pub mod runner;

pub use client::{ApiError, BacklogClient, DryRunTracker, IssueTracker};
pub use dispatch::{dispatch, DispatchError, DispatchReport, UpdateOutcome};
pub use runner::{run, RunOutcome};

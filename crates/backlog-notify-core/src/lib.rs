//! Event-to-comment pipeline: turns a GitHub push or pull_request payload into
//! Backlog issue updates. Pure computation; the HTTP side lives in
//! `backlog-notify-api`.

pub mod config;
pub mod error;
pub mod event;
pub mod extract;
pub mod git_ref;
pub mod group;
pub mod parse;
pub mod pipeline;
pub mod render;
pub mod resolve;
pub mod template;

pub use config::{Config, Options};
pub use error::{ConfigError, EventError, TemplateError};
pub use event::Event;
pub use pipeline::{IssueUpdate, Pipeline, Plan, PlannedUpdate, Skip, UpdateSubject};

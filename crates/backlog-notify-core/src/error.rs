//! Structured error types for configuration, templates and event payloads.

use std::path::PathBuf;

use thiserror::Error;

/// A template string that cannot be compiled.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("unclosed tag starting at byte {offset}")]
    UnclosedTag { offset: usize },

    #[error("empty tag at byte {offset}")]
    EmptyTag { offset: usize },

    #[error("unknown variable `{name}`")]
    UnknownVariable { name: String },

    #[error("unknown filter `{name}`")]
    UnknownFilter { name: String },

    #[error("invalid argument for filter `{filter}`: {arg:?}")]
    InvalidFilterArgument { filter: String, arg: String },

    #[error("malformed block tag `{tag}`")]
    MalformedBlock { tag: String },

    #[error("`{{{{/each}}}}` at byte {offset} has no matching `{{{{#each}}}}`")]
    UnexpectedEndEach { offset: usize },

    #[error("`{{{{#each {path}}}}}` is never closed")]
    UnclosedEach { path: String },

    #[error("invalid regular expression")]
    Regex(#[from] regex::Error),
}

/// Configuration that cannot be used to run the pipeline.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Input required and not supplied: {0}")]
    MissingInput(String),

    #[error("invalid {setting}")]
    Template {
        setting: &'static str,
        #[source]
        source: TemplateError,
    },
}

impl ConfigError {
    pub fn template(setting: &'static str, source: TemplateError) -> Self {
        Self::Template { setting, source }
    }
}

/// An event payload that cannot be read or does not have the expected shape.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("reading event file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("event is not valid JSON")]
    Json(#[from] serde_json::Error),

    #[error("malformed {kind} event")]
    Shape {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

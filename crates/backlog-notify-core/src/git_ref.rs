use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static REF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"refs/[a-z]*/(.*)").expect("static ref pattern"));

/// The branch or tag a push went to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitRef {
    /// e.g. `feature/foo` for `refs/heads/feature/foo`.
    pub name: String,
    /// `{repository_html_url}/tree/{name}`
    pub url: String,
}

impl GitRef {
    pub fn parse(git_ref: &str, repository_html_url: &str) -> Option<Self> {
        let name = REF_PATTERN.captures(git_ref)?.get(1)?.as_str();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            url: format!("{repository_html_url}/tree/{name}"),
        })
    }
}

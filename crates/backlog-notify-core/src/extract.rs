//! Normalize a ticket-pattern match into issue key, content and keywords.

use regex::{Captures, Regex};

use crate::error::TemplateError;
use crate::template::{compile_pattern, PatternVars};

/// The parts of a commit message or PR title the pipeline cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub issue_key: Option<String>,
    pub content: String,
    pub keywords: String,
}

/// Read a match either by group name or by position.
///
/// Named groups (`issueKey`, `comment` or `title`, `keywords`) are used when
/// the pattern declares any; otherwise groups 1, 2 and 3.
pub fn extract(named: bool, caps: &Captures<'_>) -> Extracted {
    let text = |m: Option<regex::Match<'_>>| m.map(|m| m.as_str().to_string());

    let (issue_key, content, keywords) = if named {
        (
            text(caps.name("issueKey")),
            text(caps.name("comment")).or_else(|| text(caps.name("title"))),
            text(caps.name("keywords")),
        )
    } else {
        (text(caps.get(1)), text(caps.get(2)), text(caps.get(3)))
    };

    Extracted {
        issue_key: issue_key.filter(|k| !k.is_empty()),
        content: content.unwrap_or_default(),
        keywords: keywords.unwrap_or_default(),
    }
}

/// A compiled ticket pattern, applied to every commit or PR title of a run.
#[derive(Debug, Clone)]
pub struct TicketMatcher {
    regex: Regex,
    named: bool,
}

impl TicketMatcher {
    pub fn new(regex: Regex) -> Self {
        let named = regex.capture_names().flatten().next().is_some();
        Self { regex, named }
    }

    pub fn compile(template: &str, vars: &PatternVars<'_>) -> Result<Self, TemplateError> {
        compile_pattern(template, vars).map(Self::new)
    }

    /// `None` when the text does not match or the match carries no issue key.
    pub fn find(&self, text: &str) -> Option<Extracted> {
        let caps = self.regex.captures(text)?;
        let extracted = extract(self.named, &caps);
        extracted.issue_key.is_some().then_some(extracted)
    }
}

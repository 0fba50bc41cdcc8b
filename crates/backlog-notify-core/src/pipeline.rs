//! Event → plan of issue updates.
//!
//! Every template is compiled when the [`Pipeline`] is built, so a bad
//! template fails the run before any event is looked at. Planning itself is
//! infallible: an event either yields updates or a [`Skip`].

use std::fmt;

use crate::config::{Config, Options};
use crate::error::ConfigError;
use crate::event::{Event, PullRequestEvent, PushEvent};
use crate::extract::TicketMatcher;
use crate::git_ref::GitRef;
use crate::group::IssueGroups;
use crate::parse::{parse_commits, parse_pull_request, Keywords, ParsedCommit, ParsedPullRequest};
use crate::render::{CommentTemplates, PrComment};
use crate::resolve::{pull_request_status, Resolution, StatusChange, StatusIds};
use crate::template::PatternVars;

// ── Plan types ──

/// Why a run ends without contacting the ticket backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    NoCommits,
    NoTicketedCommits,
    InvalidRef,
    NoTicketedPullRequest,
    Draft,
    UnexpectedEvent { action: String },
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Skip::NoCommits => "コミットが1件も見つかりませんでした。",
            Skip::NoTicketedCommits => "課題キーのついたコミットが1件も見つかりませんでした。",
            Skip::InvalidRef => "Git referenceの解析に失敗しました。",
            Skip::NoTicketedPullRequest => "課題キーのついたプルリクエストが見つかりませんでした。",
            Skip::Draft => "プルリクエストが下書きでした。",
            Skip::UnexpectedEvent { .. } => "予期しないイベントでした。",
        };
        f.write_str(msg)
    }
}

/// Body of one `PATCH /api/v2/issues/{issue_key}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueUpdate {
    pub issue_key: String,
    pub comment: String,
    pub status_id: Option<String>,
}

/// What an update was made from, kept for reporting.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateSubject {
    Commits(Vec<ParsedCommit>),
    PullRequest(Box<ParsedPullRequest>),
}

impl UpdateSubject {
    /// Commit messages, or the pull request title.
    pub fn lines(&self) -> Vec<&str> {
        match self {
            UpdateSubject::Commits(commits) => {
                commits.iter().map(|c| c.commit.message.as_str()).collect()
            }
            UpdateSubject::PullRequest(pr) => vec![pr.title.as_str()],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedUpdate {
    pub update: IssueUpdate,
    pub resolution: Resolution,
    /// The transition actually requested, if any.
    pub status: Option<StatusChange>,
    pub subject: UpdateSubject,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Skip(Skip),
    Updates(Vec<PlannedUpdate>),
}

// ── Pipeline ──

/// Compiled patterns and templates for one run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    commit_matcher: TicketMatcher,
    pr_title_matcher: TicketMatcher,
    keywords: Keywords,
    templates: CommentTemplates,
    status_ids: StatusIds,
}

impl Pipeline {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(&config.project_key, &config.options)
    }

    pub fn new(project_key: &str, options: &Options) -> Result<Self, ConfigError> {
        let vars = PatternVars {
            project_key,
            fix_keywords: &options.fix_keywords,
            close_keywords: &options.close_keywords,
        };
        let commit_matcher = TicketMatcher::compile(&options.commit_message_reg_template, &vars)
            .map_err(|e| ConfigError::template("commit_message_reg_template", e))?;
        let pr_title_matcher = TicketMatcher::compile(&options.pr_title_reg_template, &vars)
            .map_err(|e| ConfigError::template("pr_title_reg_template", e))?;

        Ok(Self {
            commit_matcher,
            pr_title_matcher,
            keywords: Keywords::new(options.fix_keywords.clone(), options.close_keywords.clone()),
            templates: CommentTemplates::compile(options)?,
            status_ids: StatusIds {
                fixed: options.fix_status_id.clone(),
                closed: options.close_status_id.clone(),
            },
        })
    }

    pub fn plan(&self, event: &Event) -> Plan {
        match event {
            Event::Push(push) => self.plan_push(push),
            Event::PullRequest(pr) => self.plan_pull_request(pr),
        }
    }

    fn plan_push(&self, push: &PushEvent) -> Plan {
        if push.commits.is_empty() {
            return Plan::Skip(Skip::NoCommits);
        }

        let parsed = parse_commits(&push.commits, &self.commit_matcher, &self.keywords);
        let groups = IssueGroups::from_commits(parsed);
        if groups.is_empty() {
            return Plan::Skip(Skip::NoTicketedCommits);
        }

        let Some(git_ref) = GitRef::parse(&push.git_ref, &push.repository.html_url) else {
            return Plan::Skip(Skip::InvalidRef);
        };
        tracing::debug!(issues = groups.len(), git_ref = %git_ref.name, "grouped commits");

        let updates = groups
            .into_iter()
            .map(|(issue_key, commits)| {
                let resolution = Resolution::of_commits(&commits);
                let status = resolution.status();
                let comment = self.templates.render_push(&commits, &git_ref);
                PlannedUpdate {
                    update: IssueUpdate {
                        issue_key,
                        comment,
                        status_id: self.status_id(status),
                    },
                    resolution,
                    status,
                    subject: UpdateSubject::Commits(commits),
                }
            })
            .collect();
        Plan::Updates(updates)
    }

    fn plan_pull_request(&self, event: &PullRequestEvent) -> Plan {
        let Some(parsed) = parse_pull_request(event, &self.pr_title_matcher, &self.keywords) else {
            return Plan::Skip(Skip::NoTicketedPullRequest);
        };

        let comment = match self.templates.render_pull_request(&parsed) {
            PrComment::Comment(comment) => comment,
            PrComment::Draft => return Plan::Skip(Skip::Draft),
            PrComment::Unexpected(action) => {
                tracing::debug!(%action, "no comment template for pull request action");
                return Plan::Skip(Skip::UnexpectedEvent { action });
            }
        };

        let status = pull_request_status(&parsed);
        Plan::Updates(vec![PlannedUpdate {
            update: IssueUpdate {
                issue_key: parsed.issue_key.clone(),
                comment,
                status_id: self.status_id(status),
            },
            resolution: Resolution::of_pull_request(&parsed),
            status,
            subject: UpdateSubject::PullRequest(Box::new(parsed)),
        }])
    }

    fn status_id(&self, status: Option<StatusChange>) -> Option<String> {
        status.map(|s| self.status_ids.id(s).to_string())
    }
}

//! Comment rendering: pick the template for the event kind and render it.

use serde_json::json;

use crate::config::Options;
use crate::error::ConfigError;
use crate::event::PrAction;
use crate::git_ref::GitRef;
use crate::parse::{ParsedCommit, ParsedPullRequest};
use crate::template::TextTemplate;

/// Variables available to the push comment template.
pub const PUSH_ROOTS: &[&str] = &["commits", "ref", "author"];

/// Variables available to the pull request comment templates.
pub const PULL_REQUEST_ROOTS: &[&str] = &[
    "pr",
    "sender",
    "action",
    "issue_key",
    "title",
    "keywords",
    "is_fix",
    "is_close",
];

/// Outcome of rendering a pull request comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrComment {
    Comment(String),
    /// Draft pull requests never update the ticket.
    Draft,
    /// An action without a template, e.g. `labeled`.
    Unexpected(String),
}

/// The six comment templates, compiled.
#[derive(Debug, Clone)]
pub struct CommentTemplates {
    push: TextTemplate,
    opened: TextTemplate,
    reopened: TextTemplate,
    ready_for_review: TextTemplate,
    closed: TextTemplate,
    merged: TextTemplate,
}

impl CommentTemplates {
    pub fn compile(options: &Options) -> Result<Self, ConfigError> {
        let compile = |setting: &'static str, src: &str, roots: &[&str]| {
            TextTemplate::compile(src, roots).map_err(|e| ConfigError::template(setting, e))
        };
        Ok(Self {
            push: compile(
                "push_comment_template",
                &options.push_comment_template,
                PUSH_ROOTS,
            )?,
            opened: compile(
                "pr_opened_comment_template",
                &options.pr_opened_comment_template,
                PULL_REQUEST_ROOTS,
            )?,
            reopened: compile(
                "pr_reopened_comment_template",
                &options.pr_reopened_comment_template,
                PULL_REQUEST_ROOTS,
            )?,
            ready_for_review: compile(
                "pr_ready_for_review_comment_template",
                &options.pr_ready_for_review_comment_template,
                PULL_REQUEST_ROOTS,
            )?,
            closed: compile(
                "pr_closed_comment_template",
                &options.pr_closed_comment_template,
                PULL_REQUEST_ROOTS,
            )?,
            merged: compile(
                "pr_merged_comment_template",
                &options.pr_merged_comment_template,
                PULL_REQUEST_ROOTS,
            )?,
        })
    }

    /// Render the comment for one issue's commits.
    pub fn render_push(&self, commits: &[ParsedCommit], git_ref: &GitRef) -> String {
        let scope = json!({
            "commits": commits,
            "ref": git_ref,
            "author": commits.first().map(|c| &c.commit.author),
        });
        self.push.render(&scope)
    }

    /// Draft is checked first, then the action selects the template.
    pub fn render_pull_request(&self, pr: &ParsedPullRequest) -> PrComment {
        if pr.pr.draft {
            return PrComment::Draft;
        }
        let template = match PrAction::parse(&pr.action) {
            PrAction::Opened => &self.opened,
            PrAction::Reopened => &self.reopened,
            PrAction::ReadyForReview => &self.ready_for_review,
            PrAction::Closed if pr.pr.merged => &self.merged,
            PrAction::Closed => &self.closed,
            PrAction::Other(action) => return PrComment::Unexpected(action),
        };
        let scope = serde_json::to_value(pr).unwrap_or_default();
        PrComment::Comment(template.render(&scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Person, PullRequest, User};
    use crate::parse::tests::{commit, default_keywords, default_matcher};
    use crate::parse::parse_commits;

    fn templates() -> CommentTemplates {
        CommentTemplates::compile(&Options::default()).unwrap()
    }

    fn main_ref() -> GitRef {
        GitRef {
            name: "main".into(),
            url: "https://x/tree/main".into(),
        }
    }

    fn pr(action: &str, draft: bool, merged: bool) -> ParsedPullRequest {
        ParsedPullRequest {
            pr: PullRequest {
                title: "PROJ-1 Add login #fix".into(),
                html_url: "https://github.com/o/r/pull/12".into(),
                draft,
                merged,
                number: 12,
            },
            action: action.into(),
            sender: User {
                login: "bob".into(),
            },
            issue_key: "PROJ-1".into(),
            title: "Add login".into(),
            keywords: "#fix".into(),
            is_fix: true,
            is_close: false,
        }
    }

    #[test]
    fn default_push_comment() {
        let keywords = default_keywords();
        let matcher = default_matcher(&keywords);
        let commits = parse_commits(
            &[
                commit("0123456789abcdef", "PROJ-1 fix login"),
                commit("fedcba9876543210", "PROJ-1 add tests #fixed"),
            ],
            &matcher,
            &keywords,
        );
        let comment = templates().render_push(&commits, &main_ref());
        assert_eq!(
            comment,
            "Aliceさんが[main](https://x/tree/main)にプッシュしました\n\
             \n+ [fix login](https://github.com/o/r/commit/0123456789abcdef) (0123456)\
             \n+ [add tests](https://github.com/o/r/commit/fedcba9876543210) (fedcba9)"
        );

        let mut lines = comment.lines();
        assert_eq!(
            lines.next(),
            Some("Aliceさんが[main](https://x/tree/main)にプッシュしました")
        );
        let bullets = lines.filter(|l| l.starts_with('+')).count();
        assert_eq!(bullets, commits.len());
    }

    #[test]
    fn push_author_comes_from_first_commit() {
        let keywords = default_keywords();
        let matcher = default_matcher(&keywords);
        let mut second = commit("b", "PROJ-1 two");
        second.author = Person {
            name: "Carol".into(),
            ..Person::default()
        };
        let commits = parse_commits(&[commit("a", "PROJ-1 one"), second], &matcher, &keywords);
        let comment = templates().render_push(&commits, &main_ref());
        assert!(comment.starts_with("Aliceさんが"));
    }

    #[test]
    fn pull_request_template_dispatch() {
        let t = templates();
        let bullet = "\n\n+ [Add login](https://github.com/o/r/pull/12) (#12)";
        let cases = [
            ("opened", false, "bobさんがプルリクエストを作成しました"),
            ("reopened", false, "bobさんがプルリクエストを作成しました"),
            ("ready_for_review", false, "bobさんがプルリクエストを作成しました"),
            ("closed", false, "bobさんがプルリクエストをクローズしました"),
            ("closed", true, "bobさんがプルリクエストをマージしました"),
        ];
        for (action, merged, head) in cases {
            assert_eq!(
                t.render_pull_request(&pr(action, false, merged)),
                PrComment::Comment(format!("{head}{bullet}")),
                "action={action} merged={merged}"
            );
        }
    }

    #[test]
    fn custom_templates_are_selected_per_action() {
        let options = Options {
            pr_reopened_comment_template: "reopened {{ issue_key }}".into(),
            pr_ready_for_review_comment_template: "ready {{ action }}".into(),
            ..Options::default()
        };
        let t = CommentTemplates::compile(&options).unwrap();
        assert_eq!(
            t.render_pull_request(&pr("reopened", false, false)),
            PrComment::Comment("reopened PROJ-1".into())
        );
        assert_eq!(
            t.render_pull_request(&pr("ready_for_review", false, false)),
            PrComment::Comment("ready ready_for_review".into())
        );
    }

    #[test]
    fn draft_wins_over_every_action() {
        let t = templates();
        for action in ["opened", "reopened", "ready_for_review", "closed", "labeled"] {
            assert_eq!(t.render_pull_request(&pr(action, true, false)), PrComment::Draft);
        }
        assert_eq!(t.render_pull_request(&pr("closed", true, true)), PrComment::Draft);
    }

    #[test]
    fn unexpected_action() {
        assert_eq!(
            templates().render_pull_request(&pr("edited", false, false)),
            PrComment::Unexpected("edited".into())
        );
    }

    #[test]
    fn invalid_template_names_the_setting() {
        let options = Options {
            pr_closed_comment_template: "{{ commits.0.id }}".into(),
            ..Options::default()
        };
        let err = CommentTemplates::compile(&options).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Template {
                setting: "pr_closed_comment_template",
                ..
            }
        ));
    }
}

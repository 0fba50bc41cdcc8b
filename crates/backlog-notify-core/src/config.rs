//! Run configuration.
//!
//! Every setting is looked up as `INPUT_<NAME>` (how GitHub Actions passes
//! `with:` inputs) and then as `<NAME>`. Values are trimmed; blank means unset.

use std::path::PathBuf;

use crate::error::ConfigError;

const PR_BULLET: &str = "\n\n+ [{{ title }}]({{ pr.html_url }}) (#{{ pr.number }})";

/// Settings that have defaults. `Options::default()` is the default
/// configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub fix_keywords: Vec<String>,
    pub close_keywords: Vec<String>,
    pub push_comment_template: String,
    pub pr_opened_comment_template: String,
    pub pr_reopened_comment_template: String,
    pub pr_ready_for_review_comment_template: String,
    pub pr_closed_comment_template: String,
    pub pr_merged_comment_template: String,
    pub commit_message_reg_template: String,
    pub pr_title_reg_template: String,
    /// Backlog status id sent when a fix keyword is present.
    pub fix_status_id: String,
    /// Backlog status id sent when a close keyword is present.
    pub close_status_id: String,
}

impl Default for Options {
    fn default() -> Self {
        let ticket_pattern = concat!(
            r"^({{ projectKey }}-[0-9]+)\s?",
            r"(.*?)?\s?",
            r"({{ fixKeywords }}|{{ closeKeywords }})?",
            r"$",
        );
        let pr_created = format!("{{{{ sender.login }}}}さんがプルリクエストを作成しました{PR_BULLET}");

        Self {
            fix_keywords: strings(&["#fix", "#fixes", "#fixed"]),
            close_keywords: strings(&["#close", "#closes", "#closed"]),
            push_comment_template: concat!(
                "{{ author.name }}さんが[{{ ref.name }}]({{ ref.url }})にプッシュしました\n",
                "{{#each commits as commit}}",
                "\n+ [{{ commit.comment }}]({{ commit.url }}) ({{ commit.id | truncate(7) }})",
                "{{/each}}",
            )
            .to_string(),
            pr_opened_comment_template: pr_created.clone(),
            pr_reopened_comment_template: pr_created.clone(),
            pr_ready_for_review_comment_template: pr_created,
            pr_closed_comment_template: format!(
                "{{{{ sender.login }}}}さんがプルリクエストをクローズしました{PR_BULLET}"
            ),
            pr_merged_comment_template: format!(
                "{{{{ sender.login }}}}さんがプルリクエストをマージしました{PR_BULLET}"
            ),
            commit_message_reg_template: ticket_pattern.to_string(),
            pr_title_reg_template: ticket_pattern.to_string(),
            fix_status_id: "3".to_string(),
            close_status_id: "4".to_string(),
        }
    }
}

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Full configuration of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Backlog project key, e.g. `PROJ` for issue keys like `PROJ-123`.
    pub project_key: String,
    /// Backlog space host, e.g. `example.backlog.com`.
    pub api_host: String,
    pub api_key: String,
    pub event_path: PathBuf,
    pub options: Options,
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. `event_path` is required unless
    /// `event_path_override` is given.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup_with(lookup, None)
    }

    pub fn from_lookup_with<F>(
        lookup: F,
        event_path_override: Option<PathBuf>,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let inputs = Inputs { lookup };
        let defaults = Options::default();

        let project_key = inputs.required("project_key")?;
        let api_host = inputs.required("api_host")?;
        let api_key = inputs.required("api_key")?;
        let event_path = match event_path_override {
            Some(path) => path,
            None => PathBuf::from(inputs.required("github_event_path")?),
        };

        Ok(Self {
            project_key,
            api_host,
            api_key,
            event_path,
            options: Options {
                fix_keywords: inputs.lines("fix_keywords").unwrap_or(defaults.fix_keywords),
                close_keywords: inputs
                    .lines("close_keywords")
                    .unwrap_or(defaults.close_keywords),
                push_comment_template: inputs
                    .get("push_comment_template")
                    .unwrap_or(defaults.push_comment_template),
                pr_opened_comment_template: inputs
                    .get("pr_opened_comment_template")
                    .unwrap_or(defaults.pr_opened_comment_template),
                pr_reopened_comment_template: inputs
                    .get("pr_reopened_comment_template")
                    .unwrap_or(defaults.pr_reopened_comment_template),
                pr_ready_for_review_comment_template: inputs
                    .get("pr_ready_for_review_comment_template")
                    .unwrap_or(defaults.pr_ready_for_review_comment_template),
                pr_closed_comment_template: inputs
                    .get("pr_closed_comment_template")
                    .unwrap_or(defaults.pr_closed_comment_template),
                pr_merged_comment_template: inputs
                    .get("pr_merged_comment_template")
                    .unwrap_or(defaults.pr_merged_comment_template),
                commit_message_reg_template: inputs
                    .get("commit_message_reg_template")
                    .unwrap_or(defaults.commit_message_reg_template),
                pr_title_reg_template: inputs
                    .get("pr_title_reg_template")
                    .unwrap_or(defaults.pr_title_reg_template),
                fix_status_id: inputs.get("fix_status_id").unwrap_or(defaults.fix_status_id),
                close_status_id: inputs
                    .get("close_status_id")
                    .unwrap_or(defaults.close_status_id),
            },
        })
    }
}

struct Inputs<F> {
    lookup: F,
}

impl<F> Inputs<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// `INPUT_<NAME>` wins over `<NAME>`; blank values count as unset.
    fn get(&self, name: &str) -> Option<String> {
        let key = name.to_uppercase();
        [format!("INPUT_{key}"), key]
            .iter()
            .filter_map(|k| (self.lookup)(k.as_str()))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    }

    fn required(&self, name: &str) -> Result<String, ConfigError> {
        self.get(name)
            .ok_or_else(|| ConfigError::MissingInput(name.to_string()))
    }

    /// One value per line, each trimmed, blank lines dropped.
    fn lines(&self, name: &str) -> Option<Vec<String>> {
        let raw = self.get(name)?;
        let values: Vec<String> = raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        (!values.is_empty()).then_some(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("INPUT_PROJECT_KEY", "PROJ"),
            ("INPUT_API_HOST", "example.backlog.com"),
            ("INPUT_API_KEY", "secret"),
            ("GITHUB_EVENT_PATH", "/tmp/event.json"),
        ]
    }

    #[test]
    fn loads_required_and_defaults() {
        let vars = env(&required());
        let config = Config::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.project_key, "PROJ");
        assert_eq!(config.api_host, "example.backlog.com");
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.event_path, PathBuf::from("/tmp/event.json"));
        assert_eq!(config.options, Options::default());
    }

    #[test]
    fn missing_required_input_is_an_error() {
        let mut pairs = required();
        pairs.retain(|(k, _)| *k != "INPUT_API_KEY");
        pairs.push(("API_KEY", "   "));
        let vars = env(&pairs);
        let err = Config::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(&err, ConfigError::MissingInput(name) if name == "api_key"));
        assert_eq!(err.to_string(), "Input required and not supplied: api_key");
    }

    #[test]
    fn input_variable_wins_over_plain_variable() {
        let mut pairs = required();
        pairs.push(("PROJECT_KEY", "OTHER"));
        pairs.push(("FIX_STATUS_ID", " 5 "));
        let vars = env(&pairs);
        let config = Config::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.project_key, "PROJ");
        assert_eq!(config.options.fix_status_id, "5");
    }

    #[test]
    fn blank_input_falls_back_to_plain_variable() {
        let mut pairs = required();
        pairs.push(("INPUT_CLOSE_STATUS_ID", ""));
        pairs.push(("CLOSE_STATUS_ID", "9"));
        let vars = env(&pairs);
        let config = Config::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.options.close_status_id, "9");
    }

    #[test]
    fn multiline_keywords_are_trimmed() {
        let mut pairs = required();
        pairs.push(("INPUT_FIX_KEYWORDS", "  #done\n\n  #resolved  \n"));
        let vars = env(&pairs);
        let config = Config::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.options.fix_keywords, vec!["#done", "#resolved"]);
        assert_eq!(config.options.close_keywords, Options::default().close_keywords);
    }

    #[test]
    fn event_path_override_skips_required_lookup() {
        let mut pairs = required();
        pairs.retain(|(k, _)| *k != "GITHUB_EVENT_PATH");
        let vars = env(&pairs);
        let config = Config::from_lookup_with(
            |k| vars.get(k).cloned(),
            Some(PathBuf::from("event.json")),
        )
        .unwrap();
        assert_eq!(config.event_path, PathBuf::from("event.json"));

        let err = Config::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingInput(name) if name == "github_event_path"));
    }

    #[test]
    fn default_pr_templates() {
        let defaults = Options::default();
        assert_eq!(
            defaults.pr_merged_comment_template,
            "{{ sender.login }}さんがプルリクエストをマージしました\n\n+ [{{ title }}]({{ pr.html_url }}) (#{{ pr.number }})"
        );
        assert_eq!(
            defaults.pr_opened_comment_template,
            defaults.pr_ready_for_review_comment_template
        );
    }
}

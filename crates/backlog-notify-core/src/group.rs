//! Group parsed commits by issue key.

use std::collections::HashMap;

use crate::parse::ParsedCommit;

/// Issue key → commits, in order of each key's first appearance. Commits
/// within a key keep their push order. No key maps to an empty list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueGroups {
    groups: Vec<(String, Vec<ParsedCommit>)>,
}

impl IssueGroups {
    pub fn from_commits(commits: impl IntoIterator<Item = ParsedCommit>) -> Self {
        let mut groups: Vec<(String, Vec<ParsedCommit>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for commit in commits {
            match index.get(&commit.issue_key).copied() {
                Some(i) => groups[i].1.push(commit),
                None => {
                    index.insert(commit.issue_key.clone(), groups.len());
                    groups.push((commit.issue_key.clone(), vec![commit]));
                }
            }
        }
        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, issue_key: &str) -> Option<&[ParsedCommit]> {
        self.groups
            .iter()
            .find(|(k, _)| k == issue_key)
            .map(|(_, c)| c.as_slice())
    }
}

impl IntoIterator for IssueGroups {
    type Item = (String, Vec<ParsedCommit>);
    type IntoIter = std::vec::IntoIter<(String, Vec<ParsedCommit>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::tests::{commit, default_keywords, default_matcher};
    use crate::parse::parse_commits;

    fn groups(messages: &[(&str, &str)]) -> IssueGroups {
        let keywords = default_keywords();
        let matcher = default_matcher(&keywords);
        let commits: Vec<_> = messages.iter().map(|(id, m)| commit(id, m)).collect();
        IssueGroups::from_commits(parse_commits(&commits, &matcher, &keywords))
    }

    #[test]
    fn first_appearance_order() {
        let g = groups(&[
            ("c1", "PROJ-2 one"),
            ("c2", "PROJ-1 two"),
            ("c3", "PROJ-2 three"),
        ]);
        assert_eq!(g.keys().collect::<Vec<_>>(), vec!["PROJ-2", "PROJ-1"]);
        let ids: Vec<&str> = g
            .get("PROJ-2")
            .unwrap()
            .iter()
            .map(|c| c.commit.id.as_str())
            .collect();
        assert_eq!(ids, vec!["c1", "c3"]);
    }

    #[test]
    fn unmatched_commits_leave_no_group() {
        let g = groups(&[("c1", "no key"), ("c2", "still none")]);
        assert!(g.is_empty());
        assert_eq!(g.len(), 0);
    }

    #[test]
    fn into_iter_yields_owned_groups_in_order() {
        let g = groups(&[("c1", "PROJ-1 a"), ("c2", "PROJ-3 b"), ("c3", "PROJ-1 c")]);
        let owned: Vec<(String, usize)> = g.into_iter().map(|(k, c)| (k, c.len())).collect();
        assert_eq!(owned, vec![("PROJ-1".to_string(), 2), ("PROJ-3".to_string(), 1)]);
    }
}

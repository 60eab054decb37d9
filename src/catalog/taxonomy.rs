//! Category taxonomy and per-entry derivation heuristics.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::entry::Priority;
use crate::search::tokenizer::{is_stopword, tokenize};

pub const DEFAULT_CATEGORY: &str = "general";

/// Uses at or above which a tool is promoted to `Always`.
pub const ALWAYS_USAGE_THRESHOLD: u64 = 100;
/// Uses at or above which a tool is promoted to `High`.
pub const HIGH_USAGE_THRESHOLD: u64 = 20;

const SYNONYMS: &[(&str, &str)] = &[
    ("auth", "authentication"),
    ("cfg", "config"),
    ("config", "configuration"),
    ("cp", "copy"),
    ("db", "database"),
    ("del", "delete"),
    ("dir", "directory"),
    ("doc", "document"),
    ("docs", "documentation"),
    ("env", "environment"),
    ("exec", "execute"),
    ("fs", "filesystem"),
    ("img", "image"),
    ("info", "information"),
    ("ls", "list"),
    ("msg", "message"),
    ("mv", "move"),
    ("pr", "pull request"),
    ("repo", "repository"),
    ("rm", "remove"),
    ("search", "find"),
    ("stat", "status"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
    /// Base priority for tools in this category; `None` means `Medium`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl CategoryRule {
    pub fn new(
        name: impl Into<String>,
        keywords: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .collect(),
            priority: None,
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    fn matches(&self, tokens: &HashSet<String>) -> bool {
        self.keywords.iter().any(|k| tokens.contains(k))
    }
}

/// Ordered category rules; the first matching rule wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTaxonomy {
    pub rules: Vec<CategoryRule>,
    #[serde(default = "default_category_name")]
    pub default_category: String,
}

fn default_category_name() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Default for CategoryTaxonomy {
    fn default() -> Self {
        Self {
            rules: vec![
                CategoryRule::new("github", ["github", "pull", "pr", "issue", "issues"])
                    .priority(Priority::High),
                CategoryRule::new("git", ["git", "commit", "branch", "diff", "merge", "rebase"])
                    .priority(Priority::High),
                CategoryRule::new(
                    "files",
                    ["file", "files", "directory", "dir", "folder", "path", "fs"],
                )
                .priority(Priority::High),
                CategoryRule::new("shell", ["bash", "shell", "command", "terminal", "exec"])
                    .priority(Priority::High),
                CategoryRule::new("obsidian", ["obsidian", "vault", "note", "notes"]),
                CategoryRule::new("database", ["sql", "database", "db", "table", "postgres"]),
                CategoryRule::new("web", ["http", "fetch", "url", "browser", "web", "scrape"]),
                CategoryRule::new("memory", ["memory", "remember", "recall", "knowledge"]),
                CategoryRule::new("communication", ["email", "slack", "message", "chat"]),
                CategoryRule::new("calendar", ["calendar", "event", "schedule", "meeting"]),
                CategoryRule::new("agents", ["agent", "subagent", "delegate"]),
                CategoryRule::new("search", ["search", "find", "grep", "lookup"]),
            ],
            default_category: default_category_name(),
        }
    }
}

impl CategoryTaxonomy {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self {
            rules,
            default_category: default_category_name(),
        }
    }

    pub fn rule(&self, category: &str) -> Option<&CategoryRule> {
        self.rules.iter().find(|r| r.name == category)
    }

    pub fn categorize(&self, name: &str, description: &str) -> String {
        let tokens: HashSet<String> = identifier_tokens(name)
            .into_iter()
            .chain(tokenize(description))
            .collect();
        self.rules
            .iter()
            .find(|r| r.matches(&tokens))
            .map(|r| r.name.clone())
            .unwrap_or_else(|| self.default_category.clone())
    }

    /// Category base priority, raised by historical usage when available.
    pub fn priority_for(&self, category: &str, usage_count: Option<u64>) -> Priority {
        let base = self
            .rule(category)
            .and_then(|r| r.priority)
            .unwrap_or(Priority::Medium);
        match usage_count.and_then(usage_priority) {
            Some(from_usage) => base.min(from_usage),
            None => base,
        }
    }
}

fn usage_priority(count: u64) -> Option<Priority> {
    if count >= ALWAYS_USAGE_THRESHOLD {
        Some(Priority::Always)
    } else if count >= HIGH_USAGE_THRESHOLD {
        Some(Priority::High)
    } else {
        None
    }
}

/// Split an identifier on `_`, `-`, `.`, whitespace and camelCase boundaries.
/// Returned words are lowercase.
pub fn split_identifier(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for ch in name.chars() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.extend(ch.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn identifier_tokens(name: &str) -> Vec<String> {
    split_identifier(name)
        .into_iter()
        .filter(|w| !is_stopword(w))
        .collect()
}

/// Name and description tokens, deduplicated, stopwords removed.
pub fn extract_keywords(name: &str, description: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    identifier_tokens(name)
        .into_iter()
        .chain(tokenize(description))
        .filter(|t| t.len() > 1 && seen.insert(t.clone()))
        .collect()
}

/// Hyphen, underscore, camelCase and spaced forms of the name plus synonym
/// expansions of its words. The raw name itself is excluded.
pub fn derive_aliases(name: &str) -> Vec<String> {
    let words = split_identifier(name);
    let mut aliases = Vec::new();

    if words.len() > 1 {
        aliases.push(words.join("_"));
        aliases.push(words.join("-"));
        aliases.push(words.join(" "));
        let camel: String = words
            .iter()
            .enumerate()
            .map(|(i, w)| {
                if i == 0 {
                    w.clone()
                } else {
                    let mut chars = w.chars();
                    chars
                        .next()
                        .map(|c| c.to_uppercase().chain(chars).collect())
                        .unwrap_or_default()
                }
            })
            .collect();
        aliases.push(camel);
    } else if let Some(word) = words.first() {
        aliases.push(word.clone());
    }

    for word in &words {
        for (a, b) in SYNONYMS {
            if word == a {
                aliases.push((*b).to_string());
            } else if word == b {
                aliases.push((*a).to_string());
            }
        }
    }

    let mut seen = HashSet::new();
    aliases
        .into_iter()
        .filter(|a| a != name && seen.insert(a.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_first_match_wins() {
        let taxonomy = CategoryTaxonomy::default();
        assert_eq!(taxonomy.categorize("git_status", "Show working tree status"), "git");
        assert_eq!(
            taxonomy.categorize("create_pull_request", "Open a PR on GitHub"),
            "github"
        );
        assert_eq!(taxonomy.categorize("list_files", "List directory entries"), "files");
        assert_eq!(
            taxonomy.categorize("obsidian_search_notes", "Search the vault"),
            "obsidian"
        );
        assert_eq!(taxonomy.categorize("roll_dice", "Random numbers"), DEFAULT_CATEGORY);
    }

    #[test]
    fn test_custom_taxonomy() {
        let taxonomy = CategoryTaxonomy::new(vec![CategoryRule::new("hr", ["payroll"])]);
        assert_eq!(taxonomy.categorize("run_payroll", ""), "hr");
        assert_eq!(taxonomy.categorize("git_status", ""), DEFAULT_CATEGORY);
    }

    #[test]
    fn test_priority_for() {
        let taxonomy = CategoryTaxonomy::default();
        assert_eq!(taxonomy.priority_for("git", None), Priority::High);
        assert_eq!(taxonomy.priority_for("obsidian", None), Priority::Medium);
        assert_eq!(taxonomy.priority_for("obsidian", Some(5)), Priority::Medium);
        assert_eq!(taxonomy.priority_for("obsidian", Some(20)), Priority::High);
        assert_eq!(taxonomy.priority_for("git", Some(150)), Priority::Always);
        assert_eq!(taxonomy.priority_for("unknown", None), Priority::Medium);
    }

    #[test]
    fn test_split_identifier() {
        assert_eq!(split_identifier("git_status"), vec!["git", "status"]);
        assert_eq!(split_identifier("readFile"), vec!["read", "file"]);
        assert_eq!(split_identifier("list-dir.v2"), vec!["list", "dir", "v2"]);
        assert_eq!(split_identifier("HTTPFetch"), vec!["httpfetch"]);
    }

    #[test]
    fn test_extract_keywords() {
        assert_eq!(
            extract_keywords("git_status", "Show the status of a git repository"),
            vec!["git", "status", "show", "repository"]
        );
    }

    #[test]
    fn test_derive_aliases() {
        let aliases = derive_aliases("git_status");
        assert_eq!(aliases[..3], ["git-status", "git status", "gitStatus"]);
        assert!(aliases.contains(&"stat".to_string()));
        assert!(!aliases.contains(&"git_status".to_string()));

        let aliases = derive_aliases("ls");
        assert_eq!(aliases, vec!["list"]);
    }
}

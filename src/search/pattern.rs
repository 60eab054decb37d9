//! Regex search over names, aliases, categories and servers.

use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use super::{SearchField, SearchResult, rank};
use crate::catalog::{ToolCatalog, ToolCatalogEntry};

/// Compiled program size cap for user-supplied patterns.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Outcome of a pattern query. An invalid pattern is reported here rather
/// than as an error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternMatches<'a> {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub results: Vec<SearchResult<'a>>,
}

impl<'a> PatternMatches<'a> {
    fn invalid(error: String) -> Self {
        Self {
            valid: false,
            error: Some(error),
            results: Vec::new(),
        }
    }

    fn valid(results: Vec<SearchResult<'a>>) -> Self {
        Self {
            valid: true,
            error: None,
            results,
        }
    }
}

/// Prebuilt patterns for frequent lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommonPattern {
    GitPrefixed,
    FileOperations,
    ReadOnly,
    SearchTools,
    Mutating,
}

impl CommonPattern {
    pub const ALL: [CommonPattern; 5] = [
        Self::GitPrefixed,
        Self::FileOperations,
        Self::ReadOnly,
        Self::SearchTools,
        Self::Mutating,
    ];

    pub fn pattern(&self) -> &'static str {
        match self {
            Self::GitPrefixed => r"^git[_-]",
            Self::FileOperations => {
                r"(read|write|edit|create|delete|list|move|copy)[_-]?(file|files|dir|directory)"
            }
            Self::ReadOnly => r"^(get|list|read|search|find|show|view)[_-]",
            Self::SearchTools => r"(search|find|query|lookup|grep)",
            Self::Mutating => r"^(create|update|delete|remove|write|edit|set|add|put|patch)[_-]",
        }
    }
}

pub struct PatternEngine {
    catalog: Arc<ToolCatalog>,
}

pub(crate) fn compile(pattern: &str) -> Result<Regex, String> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map_err(|e| e.to_string())
}

impl PatternEngine {
    pub fn new(catalog: Arc<ToolCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Every match scores 1.0, so ordering falls to priority then id.
    pub fn search(&self, pattern: &str, limit: usize) -> PatternMatches<'_> {
        if pattern.is_empty() {
            return PatternMatches::valid(Vec::new());
        }
        match compile(pattern) {
            Ok(regex) => PatternMatches::valid(self.search_compiled(&regex, limit)),
            Err(e) => PatternMatches::invalid(e),
        }
    }

    pub fn search_common(&self, common: CommonPattern, limit: usize) -> PatternMatches<'_> {
        self.search(common.pattern(), limit)
    }

    pub(crate) fn search_compiled(&self, regex: &Regex, limit: usize) -> Vec<SearchResult<'_>> {
        let mut results: Vec<SearchResult<'_>> = self
            .catalog
            .tools()
            .iter()
            .filter_map(|entry| match_entry(regex, entry))
            .collect();
        rank(&mut results);
        results.truncate(limit);
        results
    }

    pub fn get_by_category(&self, category: &str) -> Vec<&ToolCatalogEntry> {
        self.catalog
            .resolve(self.catalog.by_category(category))
            .collect()
    }

    /// Entries whose server name matches `pattern`.
    pub fn get_by_server_pattern(&self, pattern: &str) -> PatternMatches<'_> {
        let regex = match compile(pattern) {
            Ok(regex) => regex,
            Err(e) => return PatternMatches::invalid(e),
        };
        let mut results: Vec<SearchResult<'_>> = self
            .catalog
            .tools()
            .iter()
            .filter(|entry| regex.is_match(&entry.server))
            .map(|entry| {
                let mut result = SearchResult::new(entry, 1.0);
                result.matched_fields.insert(SearchField::Server);
                result
            })
            .collect();
        rank(&mut results);
        PatternMatches::valid(results)
    }
}

/// Fields are tested one by one so anchors apply per field; the joined
/// string also catches patterns spanning two fields.
fn match_entry<'a>(regex: &Regex, entry: &'a ToolCatalogEntry) -> Option<SearchResult<'a>> {
    let mut result = SearchResult::new(entry, 1.0);
    if regex.is_match(&entry.name) {
        result.matched_fields.insert(SearchField::Name);
    }
    if entry.aliases.iter().any(|a| regex.is_match(a)) {
        result.matched_fields.insert(SearchField::Aliases);
    }
    if regex.is_match(&entry.category) {
        result.matched_fields.insert(SearchField::Category);
    }
    if regex.is_match(&entry.server) {
        result.matched_fields.insert(SearchField::Server);
    }
    if !result.matched_fields.is_empty() {
        return Some(result);
    }

    let composite = format!(
        "{} {} {} {}",
        entry.name,
        entry.aliases.join(" "),
        entry.category,
        entry.server
    );
    regex.is_match(&composite).then_some(result)
}

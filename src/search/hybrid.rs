//! Strategy selection and result fusion: the entry point for queries.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::bm25::{Bm25Engine, Bm25Params};
use super::pattern::{PatternEngine, compile};
use super::tokenizer::unique_tokens;
use super::{SearchResult, SearchType, rank};
use crate::catalog::{Priority, SourceKind, ToolCatalog, ToolCatalogEntry};

const PATTERN_METACHARACTERS: &[char] = &[
    '^', '$', '[', ']', '(', ')', '|', '*', '+', '?', '{', '}', '\\',
];

/// Whether a query should be treated as a regular expression.
pub fn looks_like_pattern(query: &str) -> bool {
    query.contains(PATTERN_METACHARACTERS)
}

/// `\b(?:t1|t2|...)\b` over the query's significant terms, or `None` when
/// every term is a stopword.
pub fn query_to_pattern(query: &str) -> Option<String> {
    let terms: Vec<String> = unique_tokens(query)
        .iter()
        .map(|t| regex::escape(t))
        .collect();
    if terms.is_empty() {
        return None;
    }
    Some(format!(r"\b(?:{})\b", terms.join("|")))
}

/// Which engines actually ran for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    Bm25,
    Regex,
    Hybrid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub search_type: SearchType,
    /// Maximum results returned, applied after filters and the hybrid merge.
    pub limit: usize,
    pub category: Option<String>,
    pub source: Option<SourceKind>,
    pub min_score: Option<f64>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            search_type: SearchType::Hybrid,
            limit: 10,
            category: None,
            source: None,
            min_score: None,
        }
    }
}

impl SearchOptions {
    pub fn new(search_type: SearchType) -> Self {
        Self {
            search_type,
            ..Default::default()
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn source(mut self, source: SourceKind) -> Self {
        self.source = Some(source);
        self
    }

    pub fn min_score(mut self, min_score: f64) -> Self {
        self.min_score = Some(min_score);
        self
    }

    fn accepts(&self, result: &SearchResult<'_>) -> bool {
        self.category
            .as_deref()
            .is_none_or(|c| result.tool.category == c)
            && self.source.is_none_or(|s| result.tool.source == s)
            && self.min_score.is_none_or(|m| result.score >= m)
    }

    /// Filter before truncating so filtered-out hits never use up the limit.
    fn finish<'a>(&self, results: Vec<SearchResult<'a>>) -> Vec<SearchResult<'a>> {
        let mut kept: Vec<_> = results.into_iter().filter(|r| self.accepts(r)).collect();
        rank(&mut kept);
        kept.truncate(self.limit);
        kept
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse<'a> {
    pub results: Vec<SearchResult<'a>>,
    pub strategy: SearchStrategy,
    /// Set when the regex pass was requested but the pattern did not compile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_error: Option<String>,
    /// Hybrid only: no significant term survived, so no regex pass ran.
    pub regex_skipped: bool,
}

impl<'a> SearchResponse<'a> {
    fn new(strategy: SearchStrategy) -> Self {
        Self {
            results: Vec::new(),
            strategy,
            pattern_error: None,
            regex_skipped: false,
        }
    }

    pub fn ids(&self) -> Vec<&'a str> {
        self.results.iter().map(|r| r.id()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total_tools: usize,
    pub by_source: BTreeMap<SourceKind, usize>,
    pub by_priority: BTreeMap<Priority, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub always_loaded_count: usize,
    pub deferred_count: usize,
    /// Estimated tokens for every definition.
    pub estimated_tokens: usize,
    /// Estimated tokens for the definitions that are not deferred.
    pub always_loaded_tokens: usize,
}

/// BM25 and regex engines over one immutable catalog snapshot.
pub struct HybridSearchEngine {
    catalog: Arc<ToolCatalog>,
    bm25: Bm25Engine,
    pattern: PatternEngine,
}

impl HybridSearchEngine {
    pub fn new(catalog: ToolCatalog) -> Self {
        Self::from_shared(Arc::new(catalog))
    }

    pub fn from_shared(catalog: Arc<ToolCatalog>) -> Self {
        Self::with_params(catalog, Bm25Params::default())
    }

    pub fn with_params(catalog: Arc<ToolCatalog>, params: Bm25Params) -> Self {
        Self {
            bm25: Bm25Engine::with_params(Arc::clone(&catalog), params),
            pattern: PatternEngine::new(Arc::clone(&catalog)),
            catalog,
        }
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn shared_catalog(&self) -> Arc<ToolCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn bm25(&self) -> &Bm25Engine {
        &self.bm25
    }

    pub fn pattern(&self) -> &PatternEngine {
        &self.pattern
    }

    pub fn search(&self, query: &str, options: &SearchOptions) -> SearchResponse<'_> {
        let query = query.trim();
        let strategy = match options.search_type {
            SearchType::Bm25 => SearchStrategy::Bm25,
            SearchType::Regex => SearchStrategy::Regex,
            SearchType::Hybrid if looks_like_pattern(query) => SearchStrategy::Regex,
            SearchType::Hybrid => SearchStrategy::Hybrid,
        };
        let mut response = SearchResponse::new(strategy);
        if query.is_empty() || options.limit == 0 {
            return response;
        }

        let unbounded = self.catalog.len();
        match strategy {
            SearchStrategy::Bm25 => {
                response.results = options.finish(self.bm25.search(query, unbounded));
            }
            SearchStrategy::Regex => {
                let matches = self.pattern.search(query, unbounded);
                response.pattern_error = matches.error;
                response.results = options.finish(matches.results);
            }
            SearchStrategy::Hybrid => {
                let lexical = options.finish(self.bm25.search(query, unbounded));
                let patterned = match query_to_pattern(query).map(|p| compile(&p)) {
                    Some(Ok(regex)) => {
                        options.finish(self.pattern.search_compiled(&regex, unbounded))
                    }
                    Some(Err(e)) => {
                        response.pattern_error = Some(e);
                        Vec::new()
                    }
                    None => {
                        debug!(query = %query, "No significant terms; skipping regex pass");
                        response.regex_skipped = true;
                        Vec::new()
                    }
                };
                let mut merged = merge(lexical, patterned);
                merged.truncate(options.limit);
                response.results = merged;
            }
        }

        debug!(
            query = %query,
            strategy = ?response.strategy,
            results = response.results.len(),
            "Search completed"
        );
        response
    }

    /// Prefix completions from the BM25 vocabulary.
    pub fn suggest(&self, prefix: &str, limit: usize) -> Vec<String> {
        self.bm25.suggest(prefix, limit)
    }

    pub fn always_loaded_tools(&self) -> Vec<&ToolCatalogEntry> {
        self.catalog
            .tools()
            .iter()
            .filter(|t| !t.defer_loading)
            .collect()
    }

    pub fn deferred_tools(&self) -> Vec<&ToolCatalogEntry> {
        self.catalog
            .tools()
            .iter()
            .filter(|t| t.defer_loading)
            .collect()
    }

    pub fn by_category(&self, category: &str) -> Vec<&ToolCatalogEntry> {
        self.catalog
            .resolve(self.catalog.by_category(category))
            .collect()
    }

    pub fn by_source(&self, source: SourceKind) -> Vec<&ToolCatalogEntry> {
        self.catalog.resolve(self.catalog.by_source(source)).collect()
    }

    pub fn by_server(&self, server: &str) -> Vec<&ToolCatalogEntry> {
        self.catalog.resolve(self.catalog.by_server(server)).collect()
    }

    pub fn stats(&self) -> CatalogStats {
        let mut stats = CatalogStats {
            total_tools: self.catalog.len(),
            ..Default::default()
        };
        for tool in self.catalog.tools() {
            *stats.by_source.entry(tool.source).or_default() += 1;
            *stats.by_priority.entry(tool.priority).or_default() += 1;
            *stats.by_category.entry(tool.category.clone()).or_default() += 1;

            let tokens = tool.estimated_tokens();
            stats.estimated_tokens += tokens;
            if tool.defer_loading {
                stats.deferred_count += 1;
            } else {
                stats.always_loaded_count += 1;
                stats.always_loaded_tokens += tokens;
            }
        }
        stats
    }
}

/// Union by id keeping the higher score and every matched field.
fn merge<'a>(
    first: Vec<SearchResult<'a>>,
    second: Vec<SearchResult<'a>>,
) -> Vec<SearchResult<'a>> {
    let mut merged: Vec<SearchResult<'a>> = Vec::with_capacity(first.len() + second.len());
    let mut positions: HashMap<&'a str, usize> = HashMap::new();

    for result in first.into_iter().chain(second) {
        match positions.get(result.id()).copied() {
            Some(pos) => {
                let existing = &mut merged[pos];
                existing.score = existing.score.max(result.score);
                existing.matched_fields.extend(result.matched_fields);
            }
            None => {
                positions.insert(result.id(), merged.len());
                merged.push(result);
            }
        }
    }

    rank(&mut merged);
    merged
}

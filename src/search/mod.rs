//! Query-time search over a catalog snapshot.

mod bm25;
mod hybrid;
mod pattern;
pub mod tokenizer;

pub use bm25::{Bm25Engine, Bm25Params};
pub use hybrid::{
    CatalogStats, HybridSearchEngine, SearchOptions, SearchResponse, SearchStrategy,
    looks_like_pattern, query_to_pattern,
};
pub use pattern::{CommonPattern, PatternEngine, PatternMatches};

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::ToolCatalogEntry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Bm25,
    Regex,
    #[default]
    Hybrid,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bm25 => "bm25",
            Self::Regex => "regex",
            Self::Hybrid => "hybrid",
        }
    }
}

impl std::fmt::Display for SearchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry field that contributed to a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Name,
    Aliases,
    Keywords,
    Category,
    Description,
    Server,
}

impl SearchField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Aliases => "aliases",
            Self::Keywords => "keywords",
            Self::Category => "category",
            Self::Description => "description",
            Self::Server => "server",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult<'a> {
    pub tool: &'a ToolCatalogEntry,
    pub score: f64,
    pub matched_fields: BTreeSet<SearchField>,
}

impl<'a> SearchResult<'a> {
    pub(crate) fn new(tool: &'a ToolCatalogEntry, score: f64) -> Self {
        Self {
            tool,
            score,
            matched_fields: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> &'a str {
        &self.tool.id
    }
}

/// Score descending, then priority (`Always` first), then id.
pub(crate) fn rank(results: &mut [SearchResult<'_>]) {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.tool.priority.cmp(&b.tool.priority))
            .then_with(|| a.tool.id.cmp(&b.tool.id))
    });
}

//! Field-weighted BM25 over catalog entries.

use std::collections::HashMap;
use std::sync::Arc;

use super::tokenizer::{tokenize, unique_tokens};
use super::{SearchField, SearchResult, rank};
use crate::catalog::{ToolCatalog, ToolCatalogEntry};

const NAME_WEIGHT: f64 = 4.0;
const ALIASES_WEIGHT: f64 = 3.0;
const KEYWORDS_WEIGHT: f64 = 2.0;
const CATEGORY_WEIGHT: f64 = 2.0;
const DESCRIPTION_WEIGHT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term frequency saturation.
    pub k1: f64,
    /// Length normalization strength, 0..=1.
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

#[derive(Debug, Clone, Copy)]
struct Posting {
    doc: usize,
    tf: f64,
}

/// Inverted index built once per catalog snapshot.
#[derive(Debug)]
pub struct Bm25Engine {
    catalog: Arc<ToolCatalog>,
    params: Bm25Params,
    postings: HashMap<String, Vec<Posting>>,
    doc_lengths: Vec<f64>,
    avg_length: f64,
}

fn weighted_fields(entry: &ToolCatalogEntry) -> [(SearchField, f64, Vec<String>); 5] {
    [
        (SearchField::Name, NAME_WEIGHT, tokenize(&entry.name)),
        (SearchField::Aliases, ALIASES_WEIGHT, tokenize(&entry.aliases.join(" "))),
        (SearchField::Keywords, KEYWORDS_WEIGHT, tokenize(&entry.keywords.join(" "))),
        (SearchField::Category, CATEGORY_WEIGHT, tokenize(&entry.category)),
        (SearchField::Description, DESCRIPTION_WEIGHT, tokenize(&entry.description)),
    ]
}

impl Bm25Engine {
    pub fn new(catalog: Arc<ToolCatalog>) -> Self {
        Self::with_params(catalog, Bm25Params::default())
    }

    pub fn with_params(catalog: Arc<ToolCatalog>, params: Bm25Params) -> Self {
        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        let mut doc_lengths = Vec::with_capacity(catalog.len());

        for (doc, entry) in catalog.tools().iter().enumerate() {
            let mut tf: HashMap<String, f64> = HashMap::new();
            let mut length = 0.0;
            for (_, weight, tokens) in weighted_fields(entry) {
                length += weight * tokens.len() as f64;
                for token in tokens {
                    *tf.entry(token).or_insert(0.0) += weight;
                }
            }
            doc_lengths.push(length);
            for (term, tf) in tf {
                postings.entry(term).or_default().push(Posting { doc, tf });
            }
        }

        let avg_length = if doc_lengths.is_empty() {
            1.0
        } else {
            (doc_lengths.iter().sum::<f64>() / doc_lengths.len() as f64).max(1.0)
        };

        Self {
            catalog,
            params,
            postings,
            doc_lengths,
            avg_length,
        }
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn params(&self) -> Bm25Params {
        self.params
    }

    pub fn vocabulary_size(&self) -> usize {
        self.postings.len()
    }

    /// Number of entries containing `term`.
    pub fn document_frequency(&self, term: &str) -> usize {
        self.postings.get(term).map_or(0, Vec::len)
    }

    fn idf(&self, document_frequency: usize) -> f64 {
        let n = self.doc_lengths.len() as f64;
        let df = document_frequency as f64;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// Ranked matches; an empty or all-stopword query yields nothing.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchResult<'_>> {
        let terms = unique_tokens(query);
        if terms.is_empty() || limit == 0 {
            return Vec::new();
        }

        let Bm25Params { k1, b } = self.params;
        let mut scores: HashMap<usize, f64> = HashMap::new();
        for term in &terms {
            let Some(postings) = self.postings.get(term) else {
                continue;
            };
            let idf = self.idf(postings.len());
            for posting in postings {
                let norm = 1.0 - b + b * self.doc_lengths[posting.doc] / self.avg_length;
                let score = idf * posting.tf * (k1 + 1.0) / (posting.tf + k1 * norm);
                *scores.entry(posting.doc).or_insert(0.0) += score;
            }
        }

        let tools = self.catalog.tools();
        let mut results: Vec<SearchResult<'_>> = scores
            .into_iter()
            .filter(|(_, score)| *score > 0.0)
            .map(|(doc, score)| SearchResult::new(&tools[doc], score))
            .collect();
        rank(&mut results);
        results.truncate(limit);

        for result in &mut results {
            for (field, _, tokens) in weighted_fields(result.tool) {
                if tokens.iter().any(|t| terms.contains(t)) {
                    result.matched_fields.insert(field);
                }
            }
        }
        results
    }

    /// Vocabulary terms starting with `prefix`, most common first.
    pub fn suggest(&self, prefix: &str, limit: usize) -> Vec<String> {
        let prefix = prefix.trim().to_lowercase();
        if prefix.is_empty() {
            return Vec::new();
        }

        let mut terms: Vec<(&String, usize)> = self
            .postings
            .iter()
            .filter(|(term, _)| term.starts_with(&prefix))
            .map(|(term, postings)| (term, postings.len()))
            .collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        terms
            .into_iter()
            .take(limit)
            .map(|(term, _)| term.clone())
            .collect()
    }
}

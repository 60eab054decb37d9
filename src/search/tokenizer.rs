//! Tokenization primitives shared by indexing, querying and keyword extraction.

use std::collections::HashMap;

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "all", "an", "and", "any", "are", "as", "at", "be", "been",
    "before", "being", "but", "by", "can", "could", "did", "do", "does", "for", "from", "had",
    "has", "have", "how", "i", "if", "in", "into", "is", "it", "its", "me", "my", "of", "on",
    "or", "our", "should", "so", "some", "than", "that", "the", "their", "them", "then", "there",
    "these", "this", "those", "to", "use", "used", "using", "via", "was", "we", "were", "what",
    "when", "which", "will", "with", "would", "you", "your",
];

pub fn is_stopword(term: &str) -> bool {
    STOPWORDS.binary_search(&term).is_ok()
}

/// Lowercase, split on non-alphanumeric boundaries, drop empties and stopwords.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| !is_stopword(t))
        .collect()
}

/// Tokens in first-seen order without repeats.
pub fn unique_tokens(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

pub fn term_frequencies<I, S>(tokens: I) -> HashMap<String, usize>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut tf = HashMap::new();
    for token in tokens {
        *tf.entry(token.into()).or_insert(0) += 1;
    }
    tf
}

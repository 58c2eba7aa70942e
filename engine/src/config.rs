use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Construction-time knobs for the whole engine. One instance is handed to
/// [`crate::SearchEngine::new`] and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Terms shorter than this are dropped during normalization.
    pub min_term_len: usize,
    /// Normalized terms excluded from indexing and queries.
    pub stop_words: HashSet<String>,
    /// Category allow-list; filters naming anything else are rejected.
    pub categories: HashSet<String>,
    /// Upper bound on `page_size`; larger requests are clamped, not rejected.
    pub max_page_size: usize,
    /// Minimum score for a document to appear in `find_similar` results.
    pub similarity_threshold: f64,
    /// Stricter cutoff deciding `is_duplicate`. Similar and duplicate are
    /// different decisions with different false-positive costs.
    pub duplicate_threshold: f64,
    /// How many top comparables price estimation retrieves.
    pub price_comparable_k: usize,
    /// Below this many comparables the price range degrades from p10/p90 to
    /// min/max, and confidence scales down proportionally.
    pub comparable_count_min: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_term_len: 2,
            stop_words: default_stop_words(),
            categories: default_categories(),
            max_page_size: 100,
            similarity_threshold: 0.3,
            duplicate_threshold: 0.8,
            price_comparable_k: 10,
            comparable_count_min: 8,
        }
    }
}

fn default_categories() -> HashSet<String> {
    [
        "Electronics",
        "Books",
        "Furniture",
        "Clothing",
        "Sports",
        "Appliances",
        "Other",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_stop_words() -> HashSet<String> {
    let words: &[&str] = &[
        "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
        "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
        "by", "can", "cannot", "could", "did", "do", "does", "doing", "down", "during", "each",
        "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here",
        "hers", "herself", "him", "himself", "his", "how", "if", "in", "into", "is", "it", "its",
        "itself", "me", "more", "most", "my", "myself", "no", "nor", "not", "of", "off", "on",
        "once", "only", "or", "other", "ought", "our", "ours", "ourselves", "out", "over", "own",
        "same", "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs",
        "them", "themselves", "then", "there", "these", "they", "this", "those", "through", "to",
        "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where",
        "which", "while", "who", "whom", "why", "with", "would", "you", "your", "yours",
        "yourself", "yourselves",
    ];
    words.iter().map(|s| s.to_string()).collect()
}

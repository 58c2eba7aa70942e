use crate::EngineConfig;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref TERM_RE: Regex = Regex::new(r"[a-z0-9]+").expect("valid regex");
}

/// Turns raw listing text into canonical terms: NFKC fold, ASCII lowercase,
/// split on non-alphanumeric boundaries, drop short terms and stop words.
/// Pure and deterministic; whitespace-only input yields no terms.
#[derive(Debug, Clone)]
pub struct Analyzer {
    min_term_len: usize,
    stop_words: HashSet<String>,
}

impl Analyzer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            min_term_len: config.min_term_len,
            stop_words: config.stop_words.clone(),
        }
    }

    /// Ordered term sequence, duplicates preserved.
    pub fn terms(&self, text: &str) -> Vec<String> {
        let folded = text.nfkc().collect::<String>().to_lowercase();
        TERM_RE
            .find_iter(&folded)
            .map(|m| m.as_str().to_string())
            .filter(|t| t.len() >= self.min_term_len && !self.stop_words.contains(t))
            .collect()
    }

    /// Term multiset of a text, the unit the inverted index consumes.
    pub fn term_counts(&self, text: &str) -> HashMap<String, u32> {
        let mut counts: HashMap<String, u32> = HashMap::new();
        for term in self.terms(text) {
            *counts.entry(term).or_insert(0) += 1;
        }
        counts
    }

    /// Deduplicated term set for similarity signatures.
    pub fn term_set(&self, text: &str) -> HashSet<String> {
        self.terms(text).into_iter().collect()
    }

    /// Case-folds a raw autocomplete prefix. Returns `None` when nothing
    /// matchable survives folding.
    pub fn fold_prefix(&self, prefix: &str) -> Option<String> {
        let folded = prefix.nfkc().collect::<String>().to_lowercase();
        TERM_RE.find(&folded).map(|m| m.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineConfig;

    fn analyzer() -> Analyzer {
        Analyzer::new(&EngineConfig::default())
    }

    #[test]
    fn lowercases_and_splits_on_punctuation() {
        let terms = analyzer().terms("MacBook Pro, 16GB/512GB!");
        assert_eq!(terms, vec!["macbook", "pro", "16gb", "512gb"]);
    }

    #[test]
    fn drops_stop_words_and_short_terms() {
        let terms = analyzer().terms("the desk and a lamp");
        assert_eq!(terms, vec!["desk", "lamp"]);
    }

    #[test]
    fn empty_input_yields_no_terms() {
        assert!(analyzer().terms("").is_empty());
        assert!(analyzer().terms("   \t\n").is_empty());
        assert!(analyzer().terms("! ? ...").is_empty());
    }

    #[test]
    fn counts_repeated_terms() {
        let counts = analyzer().term_counts("phone case, spare case");
        assert_eq!(counts.get("case"), Some(&2));
        assert_eq!(counts.get("phone"), Some(&1));
    }

    #[test]
    fn unicode_folds_to_ascii() {
        let terms = analyzer().terms("Ｃａｆé ｔａｂｌｅ");
        assert!(terms.contains(&"table".to_string()));
    }

    #[test]
    fn folds_prefix() {
        let a = analyzer();
        assert_eq!(a.fold_prefix("Mac"), Some("mac".to_string()));
        assert_eq!(a.fold_prefix("  "), None);
    }
}

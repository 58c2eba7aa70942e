use crate::index::{InvertedIndex, VocabDelta};
use std::collections::BTreeSet;

/// Ordered vocabulary for prefix autocomplete. Kept in sync through the
/// vocabulary deltas the inverted index emits, so its maintenance cost tracks
/// vocabulary churn rather than document volume. Document frequencies are
/// read from the inverted index at query time instead of being duplicated
/// here.
#[derive(Debug, Default)]
pub struct SuggestionIndex {
    vocabulary: BTreeSet<String>,
}

impl SuggestionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }

    pub fn apply(&mut self, delta: &VocabDelta) {
        for term in &delta.removed {
            self.vocabulary.remove(term);
        }
        for term in &delta.added {
            self.vocabulary.insert(term.clone());
        }
    }

    /// Terms starting with `prefix`, by descending corpus document frequency
    /// then lexicographically, truncated to `limit`. A sub-minimum prefix
    /// yields an empty sequence, not an error.
    pub fn suggest(&self, index: &InvertedIndex, prefix: &str, limit: usize) -> Vec<String> {
        if prefix.is_empty() || limit == 0 {
            return Vec::new();
        }
        let mut matches: Vec<(usize, &str)> = self
            .vocabulary
            .range(prefix.to_string()..)
            .take_while(|term| term.starts_with(prefix))
            .map(|term| (index.document_frequency(term), term.as_str()))
            .collect();
        matches.sort_by(|(a_df, a), (b_df, b)| b_df.cmp(a_df).then_with(|| a.cmp(b)));
        matches
            .into_iter()
            .take(limit)
            .map(|(_, term)| term.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Analyzer;
    use crate::{DocId, Document, EngineConfig, ListingStatus};

    fn indexed(titles: &[(DocId, &str)]) -> (InvertedIndex, SuggestionIndex) {
        let analyzer = Analyzer::new(&EngineConfig::default());
        let mut index = InvertedIndex::new();
        let mut suggest = SuggestionIndex::new();
        for (id, title) in titles {
            let doc = Document {
                id: *id,
                title: title.to_string(),
                description: String::new(),
                category: "Books".to_string(),
                price: 10.0,
                status: ListingStatus::Active,
                created_at: 0,
                university: "State".to_string(),
            };
            let delta = index.add(doc, analyzer.term_counts(title)).unwrap();
            suggest.apply(&delta);
        }
        (index, suggest)
    }

    #[test]
    fn orders_by_frequency_then_lexicographic() {
        let (index, suggest) = indexed(&[
            (1, "calculus textbook"),
            (2, "calculus notes"),
            (3, "calendar"),
            (4, "calzone maker"),
        ]);
        assert_eq!(
            suggest.suggest(&index, "cal", 10),
            vec!["calculus", "calendar", "calzone"]
        );
    }

    #[test]
    fn truncates_to_limit_and_rejects_empty_prefix() {
        let (index, suggest) = indexed(&[(1, "lamp lantern laptop")]);
        assert_eq!(suggest.suggest(&index, "la", 2).len(), 2);
        assert!(suggest.suggest(&index, "", 5).is_empty());
        assert!(suggest.suggest(&index, "la", 0).is_empty());
    }

    #[test]
    fn vocabulary_shrinks_when_last_posting_goes() {
        let (mut index, mut suggest) = indexed(&[(1, "unicycle"), (2, "unicycle wheel")]);
        suggest.apply(&index.remove(1).unwrap());
        assert_eq!(suggest.suggest(&index, "uni", 5), vec!["unicycle"]);
        suggest.apply(&index.remove(2).unwrap());
        assert!(suggest.suggest(&index, "uni", 5).is_empty());
    }
}

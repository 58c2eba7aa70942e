use crate::error::{EngineError, Result};
use crate::{DocId, Document, ListingStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One entry of a posting list: a document and how often the term occurs in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_frequency: u32,
}

/// Vocabulary churn produced by a mutation: terms whose first posting appeared
/// and terms whose last posting disappeared. The suggestion index consumes
/// this instead of rescanning the corpus.
#[derive(Debug, Default)]
pub struct VocabDelta {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

/// Term -> postings map over the live document set, plus the arena of indexed
/// documents. Posting lists stay sorted by ascending doc_id so the query
/// engine can intersect them with a deterministic merge. A term is dropped
/// the moment its last posting goes, so the vocabulary only holds live terms.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    postings: HashMap<String, Vec<Posting>>,
    docs: HashMap<DocId, Document>,
    doc_terms: HashMap<DocId, HashMap<String, u32>>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_docs(&self) -> usize {
        self.docs.len()
    }

    pub fn contains(&self, doc_id: DocId) -> bool {
        self.docs.contains_key(&doc_id)
    }

    pub fn doc(&self, doc_id: DocId) -> Option<&Document> {
        self.docs.get(&doc_id)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.docs.values()
    }

    /// Postings for a term, ascending by doc_id. Unknown terms yield an empty
    /// slice, not an error.
    pub fn postings_for(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of live documents containing the term.
    pub fn document_frequency(&self, term: &str) -> usize {
        self.postings.get(term).map(Vec::len).unwrap_or(0)
    }

    pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(String::as_str)
    }

    pub fn term_counts(&self, doc_id: DocId) -> Option<&HashMap<String, u32>> {
        self.doc_terms.get(&doc_id)
    }

    pub fn add(&mut self, doc: Document, counts: HashMap<String, u32>) -> Result<VocabDelta> {
        if self.docs.contains_key(&doc.id) {
            return Err(EngineError::DuplicateDocument(doc.id));
        }
        let mut delta = VocabDelta::default();
        for (term, tf) in &counts {
            let list = self.postings.entry(term.clone()).or_default();
            if list.is_empty() {
                delta.added.push(term.clone());
            }
            let posting = Posting {
                doc_id: doc.id,
                term_frequency: *tf,
            };
            match list.binary_search_by_key(&doc.id, |p| p.doc_id) {
                // Unreachable while doc ids are unique, but keep the list sorted
                // rather than trusting the caller.
                Ok(pos) => list[pos] = posting,
                Err(pos) => list.insert(pos, posting),
            }
        }
        self.doc_terms.insert(doc.id, counts);
        self.docs.insert(doc.id, doc);
        Ok(delta)
    }

    pub fn remove(&mut self, doc_id: DocId) -> Result<VocabDelta> {
        let counts = self
            .doc_terms
            .remove(&doc_id)
            .ok_or(EngineError::NotFound(doc_id))?;
        self.docs.remove(&doc_id);
        let mut delta = VocabDelta::default();
        for term in counts.keys() {
            if let Some(list) = self.postings.get_mut(term) {
                if let Ok(pos) = list.binary_search_by_key(&doc_id, |p| p.doc_id) {
                    list.remove(pos);
                }
                if list.is_empty() {
                    self.postings.remove(term);
                    delta.removed.push(term.clone());
                }
            }
        }
        Ok(delta)
    }

    /// Remove-then-add as one operation. The caller holds the write lock for
    /// the whole call, so no reader ever observes the document absent.
    pub fn replace(&mut self, doc: Document, counts: HashMap<String, u32>) -> Result<VocabDelta> {
        if !self.docs.contains_key(&doc.id) {
            return Err(EngineError::NotFound(doc.id));
        }
        let removed = self.remove(doc.id)?;
        let added = self.add(doc, counts)?;
        // A term dropped and immediately re-added is no churn at all.
        let mut delta = VocabDelta::default();
        delta.added = added
            .added
            .iter()
            .filter(|t| !removed.removed.contains(t))
            .cloned()
            .collect();
        delta.removed = removed
            .removed
            .into_iter()
            .filter(|t| !added.added.contains(t))
            .collect();
        Ok(delta)
    }

    /// Status changes do not touch the document's text, so the postings stay
    /// as they are and only the stored document is swapped.
    pub fn set_status(&mut self, doc_id: DocId, status: ListingStatus) -> Result<()> {
        let doc = self
            .docs
            .get_mut(&doc_id)
            .ok_or(EngineError::NotFound(doc_id))?;
        doc.status = status;
        Ok(())
    }

    /// Cross-checks postings against the document store. A failure means the
    /// index is corrupt and must be rebuilt via `reindex_all`.
    pub fn check_integrity(&self) -> Result<()> {
        for (term, list) in &self.postings {
            if list.is_empty() {
                return Err(EngineError::Corrupted(format!(
                    "term {term:?} registered with an empty posting list"
                )));
            }
            let mut prev: Option<DocId> = None;
            for posting in list {
                if prev.is_some_and(|p| p >= posting.doc_id) {
                    return Err(EngineError::Corrupted(format!(
                        "posting list for {term:?} is not strictly ascending"
                    )));
                }
                prev = Some(posting.doc_id);
                let counts = self.doc_terms.get(&posting.doc_id).ok_or_else(|| {
                    EngineError::Corrupted(format!(
                        "posting for {term:?} references unknown document {}",
                        posting.doc_id
                    ))
                })?;
                if counts.get(term.as_str()) != Some(&posting.term_frequency) {
                    return Err(EngineError::Corrupted(format!(
                        "term frequency mismatch for {term:?} in document {}",
                        posting.doc_id
                    )));
                }
            }
        }
        if self.docs.len() != self.doc_terms.len() {
            return Err(EngineError::Corrupted(
                "document store and term store disagree on size".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Analyzer;
    use crate::{EngineConfig, ListingStatus};

    fn doc(id: DocId, title: &str) -> Document {
        Document {
            id,
            title: title.to_string(),
            description: String::new(),
            category: "Electronics".to_string(),
            price: 100.0,
            status: ListingStatus::Active,
            created_at: 1_700_000_000 + id as i64,
            university: "State".to_string(),
        }
    }

    fn counts(text: &str) -> HashMap<String, u32> {
        Analyzer::new(&EngineConfig::default()).term_counts(text)
    }

    #[test]
    fn add_then_postings_sorted_by_doc_id() {
        let mut idx = InvertedIndex::new();
        idx.add(doc(7, "bike lock"), counts("bike lock")).unwrap();
        idx.add(doc(3, "bike lamp"), counts("bike lamp")).unwrap();
        let ids: Vec<DocId> = idx.postings_for("bike").iter().map(|p| p.doc_id).collect();
        assert_eq!(ids, vec![3, 7]);
        assert_eq!(idx.document_frequency("bike"), 2);
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let mut idx = InvertedIndex::new();
        idx.add(doc(1, "desk"), counts("desk")).unwrap();
        let err = idx.add(doc(1, "desk"), counts("desk")).unwrap_err();
        assert_eq!(err, EngineError::DuplicateDocument(1));
    }

    #[test]
    fn remove_unknown_is_not_found() {
        let mut idx = InvertedIndex::new();
        assert_eq!(idx.remove(9).unwrap_err(), EngineError::NotFound(9));
    }

    #[test]
    fn remove_drops_last_term_from_vocabulary() {
        let mut idx = InvertedIndex::new();
        idx.add(doc(1, "ukulele strings"), counts("ukulele strings"))
            .unwrap();
        idx.add(doc(2, "guitar strings"), counts("guitar strings"))
            .unwrap();
        let delta = idx.remove(1).unwrap();
        assert!(delta.removed.contains(&"ukulele".to_string()));
        assert!(!delta.removed.contains(&"strings".to_string()));
        assert!(idx.postings_for("ukulele").is_empty());
        assert_eq!(idx.document_frequency("strings"), 1);
    }

    #[test]
    fn replace_reports_net_vocabulary_churn() {
        let mut idx = InvertedIndex::new();
        idx.add(doc(1, "red bike"), counts("red bike")).unwrap();
        let delta = idx.replace(doc(1, "blue bike"), counts("blue bike")).unwrap();
        assert_eq!(delta.added, vec!["blue".to_string()]);
        assert_eq!(delta.removed, vec!["red".to_string()]);
        assert_eq!(idx.document_frequency("bike"), 1);
    }

    #[test]
    fn integrity_holds_after_mutations() {
        let mut idx = InvertedIndex::new();
        idx.add(doc(1, "red bike"), counts("red bike")).unwrap();
        idx.add(doc(2, "red lamp"), counts("red lamp")).unwrap();
        idx.replace(doc(1, "green bike"), counts("green bike"))
            .unwrap();
        idx.remove(2).unwrap();
        idx.check_integrity().unwrap();
    }
}

use crate::error::{EngineError, Result};
use crate::index::InvertedIndex;
use crate::query::{self, SearchFilters, SearchPage};
use crate::similar::{DuplicateCheck, JaccardScorer, PriceEstimate, SimilarHit, SimilarityIndex};
use crate::suggest::SuggestionIndex;
use crate::tokenizer::Analyzer;
use crate::{DocId, Document, EngineConfig, ListingStatus, SimilarityScorer};
use parking_lot::RwLock;
use std::sync::Arc;

/// One consistent snapshot of every derived structure. Guarded by a single
/// RwLock so a read observes exactly one generation start to finish and a
/// mutation is never visible half-applied.
#[derive(Default)]
struct IndexState {
    generation: u64,
    inverted: InvertedIndex,
    suggestions: SuggestionIndex,
    similarity: SimilarityIndex,
}

impl IndexState {
    fn apply_add(&mut self, analyzer: &Analyzer, doc: Document) -> Result<()> {
        let counts = analyzer.term_counts(&doc.search_text());
        let term_set = analyzer.term_set(&doc.similarity_text());
        let doc_id = doc.id;
        let category = doc.category.clone();
        let delta = self.inverted.add(doc, counts)?;
        self.suggestions.apply(&delta);
        self.similarity.insert(doc_id, &category, term_set);
        Ok(())
    }
}

/// Sole entry point for index mutations and the read surface the web layer
/// consumes. The engine is a derived index over the persisted listings; the
/// collaborator notifies it after its own commit succeeds, and a missed
/// notification is reconciled with `reindex_all`.
#[derive(Clone)]
pub struct SearchEngine {
    config: EngineConfig,
    analyzer: Analyzer,
    scorer: Arc<dyn SimilarityScorer>,
    state: Arc<RwLock<IndexState>>,
}

impl SearchEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_scorer(config, Arc::new(JaccardScorer))
    }

    /// Swap in an alternate similarity model without changing any contract.
    pub fn with_scorer(config: EngineConfig, scorer: Arc<dyn SimilarityScorer>) -> Self {
        let analyzer = Analyzer::new(&config);
        Self {
            config,
            analyzer,
            scorer,
            state: Arc::new(RwLock::new(IndexState::default())),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- mutations (serialized by the write lock) ---

    pub fn index_listing(&self, doc: Document) -> Result<()> {
        let doc_id = doc.id;
        let mut state = self.state.write();
        state.apply_add(&self.analyzer, doc)?;
        state.generation += 1;
        tracing::debug!(doc_id, generation = state.generation, "indexed listing");
        Ok(())
    }

    pub fn update_listing(&self, doc: Document) -> Result<()> {
        let doc_id = doc.id;
        let mut state = self.state.write();
        let old_category = state
            .inverted
            .doc(doc_id)
            .ok_or(EngineError::NotFound(doc_id))?
            .category
            .clone();
        let counts = self.analyzer.term_counts(&doc.search_text());
        let term_set = self.analyzer.term_set(&doc.similarity_text());
        let category = doc.category.clone();
        let delta = state.inverted.replace(doc, counts)?;
        state.suggestions.apply(&delta);
        state.similarity.remove(doc_id, &old_category);
        state.similarity.insert(doc_id, &category, term_set);
        state.generation += 1;
        tracing::debug!(doc_id, generation = state.generation, "replaced listing");
        Ok(())
    }

    pub fn remove_listing(&self, doc_id: DocId) -> Result<()> {
        let mut state = self.state.write();
        let category = state
            .inverted
            .doc(doc_id)
            .ok_or(EngineError::NotFound(doc_id))?
            .category
            .clone();
        let delta = state.inverted.remove(doc_id)?;
        state.suggestions.apply(&delta);
        state.similarity.remove(doc_id, &category);
        state.generation += 1;
        tracing::debug!(doc_id, generation = state.generation, "removed listing");
        Ok(())
    }

    /// Status flips (ACTIVE -> SOLD etc.) leave the text untouched, so only
    /// the stored document changes; postings and signatures stay put.
    pub fn set_status(&self, doc_id: DocId, status: ListingStatus) -> Result<()> {
        let mut state = self.state.write();
        state.inverted.set_status(doc_id, status)?;
        state.generation += 1;
        tracing::debug!(doc_id, ?status, generation = state.generation, "status changed");
        Ok(())
    }

    /// Full rebuild from the system of record. The fresh state is assembled
    /// off to the side and swapped in whole, so readers see either the old
    /// corpus or the new one, never a mixture.
    pub fn reindex_all(&self, docs: impl IntoIterator<Item = Document>) -> Result<()> {
        let mut fresh = IndexState::default();
        for doc in docs {
            fresh.apply_add(&self.analyzer, doc)?;
        }
        let mut state = self.state.write();
        fresh.generation = state.generation + 1;
        let num_docs = fresh.inverted.num_docs();
        *state = fresh;
        tracing::info!(num_docs, generation = state.generation, "reindexed corpus");
        Ok(())
    }

    // --- reads (concurrent, one generation each) ---

    pub fn search(
        &self,
        query_text: &str,
        filters: &SearchFilters,
        page: usize,
        page_size: usize,
    ) -> Result<SearchPage> {
        let state = self.state.read();
        query::search(
            &state.inverted,
            &self.analyzer,
            &self.config,
            query_text,
            filters,
            page,
            page_size,
        )
    }

    pub fn suggest(&self, prefix: &str, limit: usize) -> Vec<String> {
        let folded = match self.analyzer.fold_prefix(prefix) {
            Some(p) => p,
            None => return Vec::new(),
        };
        let state = self.state.read();
        state.suggestions.suggest(&state.inverted, &folded, limit)
    }

    pub fn find_similar(
        &self,
        candidate_text: &str,
        category: &str,
        threshold: f64,
    ) -> Result<Vec<SimilarHit>> {
        self.validate_category(category)?;
        let candidate = self.analyzer.term_set(candidate_text);
        let state = self.state.read();
        Ok(state
            .similarity
            .find_similar(self.scorer.as_ref(), &candidate, category, threshold))
    }

    pub fn check_duplicate(&self, candidate_text: &str, category: &str) -> Result<DuplicateCheck> {
        self.validate_category(category)?;
        let candidate = self.analyzer.term_set(candidate_text);
        let state = self.state.read();
        Ok(state.similarity.check_duplicate(
            self.scorer.as_ref(),
            &self.config,
            &candidate,
            category,
        ))
    }

    pub fn estimate_price(
        &self,
        candidate_text: &str,
        category: &str,
        condition: Option<&str>,
    ) -> Result<PriceEstimate> {
        self.validate_category(category)?;
        // The document model has no condition facet, so the condition string
        // joins the candidate terms and matches like any other text.
        let text = match condition {
            Some(c) => format!("{candidate_text} {c}"),
            None => candidate_text.to_string(),
        };
        let candidate = self.analyzer.term_set(&text);
        let state = self.state.read();
        Ok(state.similarity.estimate_price(
            self.scorer.as_ref(),
            &self.config,
            &state.inverted,
            &candidate,
            category,
        ))
    }

    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    pub fn num_docs(&self) -> usize {
        self.state.read().inverted.num_docs()
    }

    /// Surfaces internal corruption instead of serving wrong results; a
    /// failure here obliges the caller to run `reindex_all`.
    pub fn check_integrity(&self) -> Result<()> {
        let state = self.state.read();
        if let Err(err) = state.inverted.check_integrity() {
            tracing::error!(%err, "index integrity check failed, reindex required");
            return Err(err);
        }
        Ok(())
    }

    fn validate_category(&self, category: &str) -> Result<()> {
        if !self.config.categories.contains(category) {
            return Err(EngineError::InvalidFilter(format!(
                "unknown category {category:?}"
            )));
        }
        Ok(())
    }
}

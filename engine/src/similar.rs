use crate::index::InvertedIndex;
use crate::{DocId, EngineConfig, ListingStatus};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Pairwise content similarity over term sets. The Jaccard heuristic is the
/// default; an alternate scorer can be swapped in without touching the rest
/// of the engine.
pub trait SimilarityScorer: Send + Sync {
    /// Score in [0, 1]; 1 means identical term sets.
    fn score(&self, candidate: &HashSet<String>, doc: &HashSet<String>) -> f64;
}

/// Intersection-over-union of the two term sets.
#[derive(Debug, Default, Clone, Copy)]
pub struct JaccardScorer;

impl SimilarityScorer for JaccardScorer {
    fn score(&self, candidate: &HashSet<String>, doc: &HashSet<String>) -> f64 {
        if candidate.is_empty() && doc.is_empty() {
            return 0.0;
        }
        let (small, large) = if candidate.len() <= doc.len() {
            (candidate, doc)
        } else {
            (doc, candidate)
        };
        let intersection = small.iter().filter(|t| large.contains(*t)).count();
        let union = candidate.len() + doc.len() - intersection;
        if union == 0 {
            0.0
        } else {
            intersection as f64 / union as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarHit {
    pub doc_id: DocId,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateCheck {
    pub is_duplicate: bool,
    /// Score of the best match, 0 when nothing cleared the similarity bar.
    pub confidence: f64,
    pub similar: Vec<SimilarHit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceEstimate {
    /// Median price of the comparables; absent when none exist.
    pub suggested_price: Option<f64>,
    /// [p10, p90] of comparable prices, or [min, max] when too few
    /// comparables exist for percentiles to mean anything.
    pub price_range: Option<(f64, f64)>,
    /// Grows with comparable count and mean similarity; low values are
    /// surfaced rather than hidden behind a point estimate.
    pub confidence: f64,
    pub comparable_count: usize,
}

/// Per-category precomputed term-set signatures for every indexed document.
/// Restricting comparison to one category bounds scan cost and avoids
/// cross-category false positives ("case" for a phone vs. a textbook).
#[derive(Debug, Default)]
pub struct SimilarityIndex {
    records: HashMap<String, HashMap<DocId, HashSet<String>>>,
}

impl SimilarityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, doc_id: DocId, category: &str, terms: HashSet<String>) {
        self.records
            .entry(category.to_string())
            .or_default()
            .insert(doc_id, terms);
    }

    pub fn remove(&mut self, doc_id: DocId, category: &str) {
        if let Some(bucket) = self.records.get_mut(category) {
            bucket.remove(&doc_id);
            if bucket.is_empty() {
                self.records.remove(category);
            }
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn num_records(&self) -> usize {
        self.records.values().map(HashMap::len).sum()
    }

    /// Documents in `category` scoring at least `threshold` against the
    /// candidate terms, by descending score then ascending doc_id.
    pub fn find_similar(
        &self,
        scorer: &dyn SimilarityScorer,
        candidate: &HashSet<String>,
        category: &str,
        threshold: f64,
    ) -> Vec<SimilarHit> {
        let bucket = match self.records.get(category) {
            Some(b) => b,
            None => return Vec::new(),
        };
        let mut hits: Vec<SimilarHit> = bucket
            .iter()
            .map(|(doc_id, terms)| SimilarHit {
                doc_id: *doc_id,
                score: scorer.score(candidate, terms),
            })
            .filter(|hit| hit.score >= threshold)
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
        hits
    }

    /// One similarity pass, two threshold decisions: everything above the
    /// similarity threshold is reported, and the duplicate verdict applies
    /// the stricter duplicate threshold to the top match only.
    pub fn check_duplicate(
        &self,
        scorer: &dyn SimilarityScorer,
        config: &EngineConfig,
        candidate: &HashSet<String>,
        category: &str,
    ) -> DuplicateCheck {
        let similar = self.find_similar(scorer, candidate, category, config.similarity_threshold);
        let top = similar.first().map(|hit| hit.score).unwrap_or(0.0);
        DuplicateCheck {
            is_duplicate: top >= config.duplicate_threshold,
            confidence: top,
            similar,
        }
    }

    /// Nearest-neighbor price heuristic: median of the K most similar live,
    /// non-archived listings in the same category.
    pub fn estimate_price(
        &self,
        scorer: &dyn SimilarityScorer,
        config: &EngineConfig,
        index: &InvertedIndex,
        candidate: &HashSet<String>,
        category: &str,
    ) -> PriceEstimate {
        let comparables: Vec<SimilarHit> = self
            .find_similar(scorer, candidate, category, f64::MIN_POSITIVE)
            .into_iter()
            .filter(|hit| {
                index
                    .doc(hit.doc_id)
                    .is_some_and(|d| d.status != ListingStatus::Archived)
            })
            .take(config.price_comparable_k)
            .collect();

        if comparables.is_empty() {
            return PriceEstimate {
                suggested_price: None,
                price_range: None,
                confidence: 0.0,
                comparable_count: 0,
            };
        }

        let mut prices: Vec<f64> = comparables
            .iter()
            .filter_map(|hit| index.doc(hit.doc_id).map(|d| d.price))
            .collect();
        prices.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let count = prices.len();
        let range = if count >= config.comparable_count_min {
            (percentile(&prices, 0.10), percentile(&prices, 0.90))
        } else {
            (prices[0], prices[count - 1])
        };
        let mean_similarity =
            comparables.iter().map(|h| h.score).sum::<f64>() / comparables.len() as f64;
        let count_factor = (count as f64 / config.comparable_count_min.max(1) as f64).min(1.0);

        PriceEstimate {
            suggested_price: Some(median(&prices)),
            price_range: Some(range),
            confidence: (count_factor * mean_similarity).clamp(0.0, 1.0),
            comparable_count: count,
        }
    }
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Nearest-rank percentile over an ascending slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    let rank = ((p * n as f64).ceil() as usize).clamp(1, n);
    sorted[rank - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(terms: &[&str]) -> HashSet<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn jaccard_of_identical_sets_is_one() {
        let a = set(&["macbook", "pro", "2021"]);
        assert_eq!(JaccardScorer.score(&a, &a), 1.0);
    }

    #[test]
    fn jaccard_of_disjoint_sets_is_zero() {
        let a = set(&["bike"]);
        let b = set(&["lamp"]);
        assert_eq!(JaccardScorer.score(&a, &b), 0.0);
    }

    #[test]
    fn jaccard_partial_overlap() {
        let a = set(&["macbook", "pro", "laptop", "sell"]);
        let b = set(&["macbook", "pro", "2021"]);
        let score = JaccardScorer.score(&a, &b);
        assert!((score - 2.0 / 5.0).abs() < 1e-9);
    }

    #[test]
    fn jaccard_of_empty_sets_is_zero() {
        assert_eq!(JaccardScorer.score(&set(&[]), &set(&[])), 0.0);
    }

    #[test]
    fn median_and_percentiles() {
        let prices = [900.0, 1000.0, 1100.0, 1150.0, 1300.0];
        assert_eq!(median(&prices), 1100.0);
        assert_eq!(percentile(&prices, 0.10), 900.0);
        assert_eq!(percentile(&prices, 0.90), 1300.0);
        let even = [10.0, 20.0, 30.0, 40.0];
        assert_eq!(median(&even), 25.0);
    }

    #[test]
    fn find_similar_is_category_scoped() {
        let mut sim = SimilarityIndex::new();
        sim.insert(1, "Electronics", set(&["macbook", "pro"]));
        sim.insert(2, "Books", set(&["macbook", "pro"]));
        let hits = sim.find_similar(&JaccardScorer, &set(&["macbook", "pro"]), "Electronics", 0.5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, 1);
        assert_eq!(hits[0].score, 1.0);
    }

    #[test]
    fn removal_invalidates_record() {
        let mut sim = SimilarityIndex::new();
        sim.insert(1, "Electronics", set(&["macbook"]));
        sim.remove(1, "Electronics");
        assert!(sim
            .find_similar(&JaccardScorer, &set(&["macbook"]), "Electronics", 0.0)
            .is_empty());
        assert_eq!(sim.num_records(), 0);
    }
}

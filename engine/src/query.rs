use crate::error::{EngineError, Result};
use crate::index::InvertedIndex;
use crate::tokenizer::Analyzer;
use crate::{DocId, Document, EngineConfig, ListingStatus};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Structured constraints applied after term matching and before ranking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub university: Option<String>,
    #[serde(default)]
    pub exclude_sold: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage {
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
    pub results: Vec<SearchHit>,
}

/// Conjunctive ranked search: every query term must match, filters narrow the
/// candidate set, TF-IDF orders it, and the (score, recency, doc_id) total
/// order keeps pagination stable across pages.
pub fn search(
    index: &InvertedIndex,
    analyzer: &Analyzer,
    config: &EngineConfig,
    query_text: &str,
    filters: &SearchFilters,
    page: usize,
    page_size: usize,
) -> Result<SearchPage> {
    validate_filters(config, filters)?;

    let mut terms = analyzer.terms(query_text);
    terms.sort_unstable();
    terms.dedup();

    let candidates = match_candidates(index, &terms);
    let mut hits: Vec<(SearchHit, i64)> = Vec::new();
    let num_docs = index.num_docs();
    for doc_id in candidates {
        let doc = match index.doc(doc_id) {
            Some(d) => d,
            None => continue,
        };
        if !passes_filters(doc, filters) {
            continue;
        }
        let score = score_doc(index, doc_id, &terms, num_docs);
        hits.push((SearchHit { doc_id, score }, doc.created_at));
    }

    // Score descending, then newest first, then ascending doc_id. Zero-term
    // queries score everything 0.0 and fall through to pure recency.
    hits.sort_by(|(a, a_ts), (b, b_ts)| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b_ts.cmp(a_ts))
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });

    Ok(paginate(
        hits.into_iter().map(|(h, _)| h).collect(),
        page,
        page_size,
        config.max_page_size,
    ))
}

fn validate_filters(config: &EngineConfig, filters: &SearchFilters) -> Result<()> {
    if let Some(category) = &filters.category {
        if !config.categories.contains(category) {
            return Err(EngineError::InvalidFilter(format!(
                "unknown category {category:?}"
            )));
        }
    }
    if let (Some(min), Some(max)) = (filters.min_price, filters.max_price) {
        if min > max {
            return Err(EngineError::InvalidFilter(format!(
                "min_price {min} exceeds max_price {max}"
            )));
        }
    }
    Ok(())
}

/// Doc ids containing every query term, via a merge over doc-id-sorted
/// posting lists starting from the rarest term. No terms means the whole
/// corpus is a candidate (filter-only search).
fn match_candidates(index: &InvertedIndex, terms: &[String]) -> Vec<DocId> {
    if terms.is_empty() {
        let mut ids: Vec<DocId> = index.documents().map(|d| d.id).collect();
        ids.sort_unstable();
        return ids;
    }
    let mut lists: Vec<&[crate::index::Posting]> =
        terms.iter().map(|t| index.postings_for(t)).collect();
    lists.sort_by_key(|l| l.len());
    let Some((seed, rest)) = lists.split_first() else {
        return Vec::new();
    };
    if seed.is_empty() {
        return Vec::new();
    }
    seed.iter()
        .map(|p| p.doc_id)
        .filter(|id| {
            rest.iter()
                .all(|list| list.binary_search_by_key(id, |p| p.doc_id).is_ok())
        })
        .collect()
}

fn passes_filters(doc: &Document, filters: &SearchFilters) -> bool {
    if let Some(category) = &filters.category {
        if &doc.category != category {
            return false;
        }
    }
    if let Some(min) = filters.min_price {
        if doc.price < min {
            return false;
        }
    }
    if let Some(max) = filters.max_price {
        if doc.price > max {
            return false;
        }
    }
    if let Some(university) = &filters.university {
        if &doc.university != university {
            return false;
        }
    }
    if filters.exclude_sold && doc.status == ListingStatus::Sold {
        return false;
    }
    true
}

fn score_doc(index: &InvertedIndex, doc_id: DocId, terms: &[String], num_docs: usize) -> f64 {
    let counts = match index.term_counts(doc_id) {
        Some(c) => c,
        None => return 0.0,
    };
    let n = num_docs.max(1) as f64;
    let mut score = 0.0;
    for term in terms {
        let tf = counts.get(term.as_str()).copied().unwrap_or(0) as f64;
        let df = index.document_frequency(term);
        if tf > 0.0 && df > 0 {
            score += tf * (n / df as f64).ln();
        }
    }
    score
}

/// 1-based pages; out-of-bounds values are clamped or answered with an empty
/// page rather than rejected.
fn paginate(
    ranked: Vec<SearchHit>,
    page: usize,
    page_size: usize,
    max_page_size: usize,
) -> SearchPage {
    let page = page.max(1);
    let page_size = page_size.clamp(1, max_page_size.max(1));
    let total = ranked.len();
    let total_pages = total.div_ceil(page_size);
    let start = (page - 1).saturating_mul(page_size);
    let results: Vec<SearchHit> = if start >= total {
        Vec::new()
    } else {
        ranked[start..(start + page_size).min(total)].to_vec()
    };
    SearchPage {
        total,
        page,
        page_size,
        total_pages,
        has_next: page < total_pages,
        has_prev: page > 1 && total > 0,
        results,
    }
}

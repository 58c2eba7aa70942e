pub mod config;
pub mod coordinator;
pub mod error;
pub mod index;
pub mod query;
pub mod similar;
pub mod suggest;
pub mod tokenizer;

use serde::{Deserialize, Serialize};

pub use config::EngineConfig;
pub use coordinator::SearchEngine;
pub use error::{EngineError, Result};
pub use query::{SearchFilters, SearchHit, SearchPage};
pub use similar::{DuplicateCheck, JaccardScorer, PriceEstimate, SimilarHit, SimilarityScorer};

pub type DocId = u64;

/// Lifecycle status of a listing. Sold and archived listings stay indexed so
/// historical search keeps working; they are filterable instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingStatus {
    Active,
    Sold,
    Archived,
    Pending,
}

/// Searchable snapshot of one listing. Replaced wholesale on edit; the engine
/// never patches individual fields of an indexed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub status: ListingStatus,
    /// Unix timestamp (seconds). Drives recency ranking and tie-breaks.
    pub created_at: i64,
    pub university: String,
}

impl Document {
    /// Concatenated searchable text, the input to term derivation.
    pub fn search_text(&self) -> String {
        format!("{} {} {}", self.title, self.description, self.category)
    }

    /// Text compared for near-duplicate detection. The category is left out:
    /// similarity search is already scoped to one category, and counting the
    /// category word would skew every score inside it.
    pub fn similarity_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

use crate::DocId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// Malformed or contradictory filter input; a request error for the caller.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// A mutation referenced a doc_id the index does not hold. The collaborator
    /// broke the lifecycle contract; surfaced, never ignored.
    #[error("document {0} not found in index")]
    NotFound(DocId),

    /// An add for a doc_id that is already indexed. Never silently merged.
    #[error("document {0} is already indexed")]
    DuplicateDocument(DocId),

    /// Internal invariant violation. The index can no longer be trusted and
    /// the caller must run `reindex_all` from the system of record.
    #[error("index corrupted: {0}")]
    Corrupted(String),
}

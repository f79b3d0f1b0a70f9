use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("no document with id '{id}'")]
    NotFound { id: String },

    /// The write carried a revision that is no longer current. Retryable
    /// by re-reading and reapplying.
    #[error("stale revision for document '{id}' (expected {expected}, found {found})")]
    Conflict { id: String, expected: u64, found: u64 },
}

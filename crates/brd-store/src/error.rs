//! Store errors

/// Failure of the backing store itself (not a domain outcome)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Backend unreachable or refused the request
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Stored data could not be decoded
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

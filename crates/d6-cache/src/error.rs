//! Cache error types

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache entry already exists: {0}")]
    Occupied(String),

    #[error("Cache entry is not pending: {0}")]
    NotPending(String),

    #[error("Stale resolution for {url} (generation {generation})")]
    Stale { url: String, generation: u64 },

    #[error("No async runtime available: {0}")]
    NoRuntime(String),
}

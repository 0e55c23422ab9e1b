//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Cache error: {0}")]
    Cache(#[from] d6_cache::CacheError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] d6_fetch::FetchError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] d6_navigation::NavigationError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No async runtime available: {0}")]
    NoRuntime(String),
}

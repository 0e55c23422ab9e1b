//! Fetch error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No async runtime available: {0}")]
    NoRuntime(String),
}

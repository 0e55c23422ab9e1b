//! Navigation error types

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Field {0} is not a submit button")]
    NotSubmitButton(usize),
}

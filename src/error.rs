//! Error types for the exhibit hall

use thiserror::Error;

/// Result type for hall operations
pub type HallResult<T> = Result<T, HallError>;

/// Errors that can occur while running the hall
#[derive(Error, Debug)]
pub enum HallError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown exhibit: {0}")]
    UnknownExhibit(String),

    #[error("Body {body} reached a non-finite state")]
    NonFiniteState { body: usize },
}

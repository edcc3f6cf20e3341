//! Crate-wide error type.

use std::io;

use thiserror::Error;

/// Errors surfaced while building the vocabulary or training.
///
/// Configuration errors have their own type ([`crate::config::ConfigError`])
/// because their failure path differs: they print the help text and exit
/// before any work is done.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{path} cannot be opened for training: {source}")]
    OpenInput { path: String, source: io::Error },

    #[error("{path} cannot be opened for saving vectors: {source}")]
    CreateOutput { path: String, source: io::Error },

    #[error("empty vocabulary; try a smaller -min-count value")]
    EmptyVocabulary,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for trainer operations
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for docparity.
//!
//! Mismatches between documents or images are never errors: they are
//! reported through result values. The variants here cover caller bugs
//! (invalid configuration), I/O and decoding failures, and cancellation.

use std::io;
use thiserror::Error;

/// Result type alias for docparity operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the library.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid thresholds, weights or strategy order.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A settings file could not be parsed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// An image could not be decoded or encoded.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// The file format could not be determined.
    #[error("Unknown file format")]
    UnknownFormat,

    /// A strategy name in the configuration has no registered implementation.
    #[error("Unknown extraction strategy: {0}")]
    UnknownStrategy(String),

    /// The escalation pipeline was cancelled between attempts.
    #[error("Pipeline cancelled after {completed_attempts} attempt(s)")]
    Cancelled {
        /// Attempts that finished before cancellation was observed
        completed_attempts: usize,
    },

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error.
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}

//! Typed errors for store backends.

use thiserror::Error;

/// Errors that can occur in a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key does not have the shape the backend requires.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The value cannot be serialized into a JSON object.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// The backend does not support this operation.
    #[error("{0} is not supported by this store backend")]
    Unsupported(&'static str),

    /// The remote API answered with a non-success status.
    #[error("request to {url} failed with status {status}: {body}")]
    Http { status: u16, url: String, body: String },

    /// The request could not be sent or the response could not be read.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// Writing an object failed. The cause is kept as the error source.
    #[error("unable to set object in cloud store backend")]
    SetFailed(#[source] Box<StoreError>),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Transport(e)
    }
}

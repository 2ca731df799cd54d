//! Error types for elohim-ipfs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IpfsError {
    #[error("content not found: {cid} ({reason})")]
    NotFound { cid: String, reason: String },

    #[error("invalid CID: {0:?}")]
    InvalidCid(String),

    #[error("IPFS {operation} failed with status {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("failed to {operation}: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("failed to build reflection service: {0}")]
    Reflection(#[from] tonic_reflection::server::Error),
}

impl IpfsError {
    /// True when the backing store has no content for the requested CID
    pub fn is_not_found(&self) -> bool {
        matches!(self, IpfsError::NotFound { .. })
    }
}

/// Result type for IPFS operations
pub type Result<T> = std::result::Result<T, IpfsError>;

//! Storage client contract
//!
//! Every backing store (the Blockfrost pinning service, the in-memory store)
//! implements [`IpfsClient`]. The backend is chosen once at startup and
//! injected into [`crate::service::IpfsService`] as `Arc<dyn IpfsClient>`.
//!
//! Dropping a returned future cancels the operation; the remote backend
//! aborts its in-flight HTTP request when that happens.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Result of storing content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Content identifier computed from the stored bytes
    pub cid: String,
    /// Display name the content was stored under
    pub name: String,
    /// Size reported by the backend
    pub size_bytes: u64,
}

#[async_trait]
pub trait IpfsClient: Send + Sync {
    /// Store `data` and return its CID. Empty payloads are accepted.
    async fn upload(&self, data: &[u8], filename: &str) -> Result<UploadResult>;

    /// Retrieve the exact bytes stored under `cid`
    async fn get(&self, cid: &str) -> Result<Vec<u8>>;

    /// Mark `cid` as retained
    async fn pin(&self, cid: &str) -> Result<()>;

    /// Clear the retention mark. Unpinning an unknown CID is not an error.
    async fn unpin(&self, cid: &str) -> Result<()>;

    /// Public gateway URL for `cid`. No I/O.
    fn gateway_url(&self, cid: &str) -> String;
}

/// Join a gateway base URL and a CID
pub(crate) fn join_url(base: &str, cid: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), cid)
}

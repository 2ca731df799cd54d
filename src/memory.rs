//! In-memory IPFS backend
//!
//! Used when no Blockfrost project id is configured. CIDs are computed
//! locally with [`crate::cid::compute_cid`], so identifiers match what a real
//! IPFS node would report for the same raw bytes. Nothing survives a restart.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cid::compute_cid;
use crate::client::{join_url, IpfsClient, UploadResult};
use crate::error::{IpfsError, Result};

/// Gateway used when none is configured
pub const DEFAULT_GATEWAY_URL: &str = "https://ipfs.io/ipfs";

#[derive(Default)]
struct MemoryState {
    storage: HashMap<String, Vec<u8>>,
    pins: HashSet<String>,
}

/// Volatile content store keyed by CID
pub struct MemoryClient {
    state: RwLock<MemoryState>,
    gateway_url: String,
}

impl MemoryClient {
    /// Create an empty store. An empty `gateway_url` selects [`DEFAULT_GATEWAY_URL`].
    pub fn new(gateway_url: impl Into<String>) -> Self {
        let mut gateway_url = gateway_url.into();
        if gateway_url.trim().is_empty() {
            gateway_url = DEFAULT_GATEWAY_URL.to_string();
        }

        warn!("IPFS backend running in memory - content is lost on restart");

        Self {
            state: RwLock::new(MemoryState::default()),
            gateway_url,
        }
    }

    pub async fn is_pinned(&self, cid: &str) -> bool {
        self.state.read().await.pins.contains(cid)
    }

    /// All stored CIDs, sorted
    pub async fn stored_cids(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut cids: Vec<String> = state.storage.keys().cloned().collect();
        cids.sort();
        cids
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.storage.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new(DEFAULT_GATEWAY_URL)
    }
}

#[async_trait]
impl IpfsClient for MemoryClient {
    async fn upload(&self, data: &[u8], filename: &str) -> Result<UploadResult> {
        let cid = compute_cid(data);

        self.state
            .write()
            .await
            .storage
            .insert(cid.clone(), data.to_vec());

        info!(cid = %cid, size = data.len(), filename, "Stored content in memory");

        Ok(UploadResult {
            cid,
            name: filename.to_string(),
            size_bytes: data.len() as u64,
        })
    }

    async fn get(&self, cid: &str) -> Result<Vec<u8>> {
        let data = self.state.read().await.storage.get(cid).cloned();

        match data {
            Some(data) => {
                debug!(cid, size = data.len(), "Retrieved content from memory");
                Ok(data)
            }
            None => {
                warn!(cid, "CID not found in memory store");
                Err(IpfsError::NotFound {
                    cid: cid.to_string(),
                    reason: "in-memory storage does not survive restarts".to_string(),
                })
            }
        }
    }

    async fn pin(&self, cid: &str) -> Result<()> {
        self.state.write().await.pins.insert(cid.to_string());
        info!(cid, "Pinned CID");
        Ok(())
    }

    async fn unpin(&self, cid: &str) -> Result<()> {
        self.state.write().await.pins.remove(cid);
        info!(cid, "Unpinned CID");
        Ok(())
    }

    fn gateway_url(&self, cid: &str) -> String {
        join_url(&self.gateway_url, cid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_and_get() {
        let client = MemoryClient::default();

        let data = b"Hello, Elohim!";
        let result = client.upload(data, "greeting.txt").await.unwrap();

        assert_eq!(result.cid, "QmRqbwZ8MbmGTXYPY9dEoeUjtm7YYLrxJiFAT2NHeuS7PH");
        assert_eq!(result.name, "greeting.txt");
        assert_eq!(result.size_bytes, data.len() as u64);

        let retrieved = client.get(&result.cid).await.unwrap();
        assert_eq!(retrieved, data);
    }

    #[tokio::test]
    async fn test_empty_payload_roundtrip() {
        let client = MemoryClient::default();

        let result = client.upload(b"", "empty").await.unwrap();
        assert_eq!(result.cid, "QmdfTbBqBPQ7VNxZEYEj14VmRuZBkqFbiwReogJgS1zR1n");
        assert_eq!(result.size_bytes, 0);
        assert!(client.get(&result.cid).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_idempotent_upload() {
        let client = MemoryClient::default();

        let first = client.upload(b"Duplicate test", "a").await.unwrap();
        let second = client.upload(b"Duplicate test", "b").await.unwrap();

        assert_eq!(first.cid, second.cid);
        assert_eq!(client.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let client = MemoryClient::default();

        let err = client.get("QmMissing").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("does not survive restarts"));
    }

    #[tokio::test]
    async fn test_pin_then_unpin() {
        let client = MemoryClient::default();
        let cid = client.upload(b"pinned", "p").await.unwrap().cid;

        client.pin(&cid).await.unwrap();
        assert!(client.is_pinned(&cid).await);

        client.unpin(&cid).await.unwrap();
        assert!(!client.is_pinned(&cid).await);
    }

    #[tokio::test]
    async fn test_pin_tracked_independently_of_storage() {
        let client = MemoryClient::default();

        client.pin("QmNeverUploaded").await.unwrap();
        assert!(client.is_pinned("QmNeverUploaded").await);
        assert!(client.is_empty().await);

        client.unpin("QmNeverPinned").await.unwrap();
    }

    #[tokio::test]
    async fn test_stored_cids_sorted() {
        let client = MemoryClient::default();
        let payloads: [&[u8]; 3] = [b"one", b"two", b"three"];
        for payload in payloads {
            client.upload(payload, "x").await.unwrap();
        }

        let cids = client.stored_cids().await;
        assert_eq!(cids.len(), 3);
        assert!(cids.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_gateway_url_defaults() {
        let client = MemoryClient::new("");
        assert_eq!(client.gateway_url("QmA"), "https://ipfs.io/ipfs/QmA");

        let client = MemoryClient::new("https://gw.example/ipfs");
        assert_eq!(client.gateway_url("QmA"), "https://gw.example/ipfs/QmA");
    }
}

//! Blockfrost IPFS backend
//!
//! Talks to the Blockfrost IPFS API:
//!
//! - `POST {base}/ipfs/add` - multipart upload, field `file`
//! - `POST {base}/ipfs/pin/add/{cid}` - pin
//! - `POST {base}/ipfs/pin/remove/{cid}` - unpin
//! - `GET {gateway}/{cid}` - fetch through the public gateway
//!
//! CIDs are checked before they are placed in a URL path. Every API call
//! carries the `project_id` header. Calls are never retried;
//! a failure is returned to the caller with status code and body attached.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cid::is_valid_cid;
use crate::client::{join_url, IpfsClient, UploadResult};
use crate::error::{IpfsError, Result};

pub const DEFAULT_API_URL: &str = "https://ipfs.blockfrost.io/api/v0";
pub const DEFAULT_GATEWAY_URL: &str = "https://ipfs.blockfrost.dev/ipfs";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Header carrying the Blockfrost project credential
pub const PROJECT_ID_HEADER: &str = "project_id";

/// Blockfrost client configuration
#[derive(Debug, Clone)]
pub struct BlockfrostConfig {
    pub project_id: String,
    pub base_url: String,
    pub gateway_url: String,
    /// Per-request timeout (zero selects [`DEFAULT_TIMEOUT`])
    pub timeout: Duration,
}

impl Default for BlockfrostConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            base_url: DEFAULT_API_URL.to_string(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Response body of `POST /ipfs/add`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddResponse {
    #[serde(default)]
    pub name: String,
    pub ipfs_hash: String,
    /// Size in bytes, encoded as a decimal string
    #[serde(default)]
    pub size: String,
}

impl AddResponse {
    /// Parsed size. Size is informational, so garbage reads as 0.
    pub fn size_bytes(&self) -> u64 {
        match self.size.trim().parse() {
            Ok(size) => size,
            Err(_) => {
                debug!(size = %self.size, cid = %self.ipfs_hash, "Unparseable size in add response");
                0
            }
        }
    }
}

/// IPFS client backed by the Blockfrost pinning service
pub struct BlockfrostClient {
    project_id: String,
    base_url: String,
    gateway_url: String,
    http: Client,
}

impl BlockfrostClient {
    pub fn new(config: BlockfrostConfig) -> Result<Self> {
        let timeout = if config.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            config.timeout
        };

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(IpfsError::Client)?;

        info!(
            base_url = %config.base_url,
            gateway_url = %config.gateway_url,
            timeout_secs = timeout.as_secs(),
            "Using Blockfrost IPFS backend"
        );

        Ok(Self {
            project_id: config.project_id,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            gateway_url: config.gateway_url,
            http,
        })
    }

    /// POST to a pin endpoint with an empty body
    async fn post_pin(&self, action: &str, operation: &'static str, cid: &str) -> Result<()> {
        require_valid_cid(cid)?;
        let url = format!("{}/ipfs/pin/{}/{}", self.base_url, action, cid);

        let response = self
            .http
            .post(&url)
            .header(PROJECT_ID_HEADER, &self.project_id)
            .send()
            .await
            .map_err(|source| IpfsError::Transport { operation, source })?;

        expect_ok(response, operation).await?;
        Ok(())
    }
}

/// CIDs become URL path segments, so anything but a plain identifier is refused
fn require_valid_cid(cid: &str) -> Result<()> {
    if is_valid_cid(cid) {
        Ok(())
    } else {
        warn!(cid, "Refusing malformed CID");
        Err(IpfsError::InvalidCid(cid.to_string()))
    }
}

/// Turn any non-200 response into [`IpfsError::Status`] carrying the body
async fn expect_ok(response: Response, operation: &'static str) -> Result<Response> {
    let status = response.status();
    if status == StatusCode::OK {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(operation, status = status.as_u16(), body = %body, "IPFS request failed");

    Err(IpfsError::Status {
        operation,
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl IpfsClient for BlockfrostClient {
    async fn upload(&self, data: &[u8], filename: &str) -> Result<UploadResult> {
        let url = format!("{}/ipfs/add", self.base_url);

        let part = Part::bytes(data.to_vec()).file_name(filename.to_string());
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(&url)
            .header(PROJECT_ID_HEADER, &self.project_id)
            .multipart(form)
            .send()
            .await
            .map_err(|source| IpfsError::Transport {
                operation: "upload",
                source,
            })?;

        let response = expect_ok(response, "upload").await?;
        let added: AddResponse = response.json().await.map_err(IpfsError::Decode)?;

        info!(cid = %added.ipfs_hash, size = data.len(), filename, "Uploaded content to IPFS");

        Ok(UploadResult {
            size_bytes: added.size_bytes(),
            cid: added.ipfs_hash,
            name: added.name,
        })
    }

    async fn get(&self, cid: &str) -> Result<Vec<u8>> {
        require_valid_cid(cid)?;
        let url = join_url(&self.gateway_url, cid);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| IpfsError::Transport {
                operation: "get",
                source,
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(IpfsError::NotFound {
                cid: cid.to_string(),
                reason: "gateway returned 404".to_string(),
            });
        }

        let response = expect_ok(response, "get").await?;
        let data = response.bytes().await.map_err(|source| IpfsError::Transport {
            operation: "get",
            source,
        })?;

        debug!(cid, size = data.len(), "Retrieved content from gateway");
        Ok(data.to_vec())
    }

    async fn pin(&self, cid: &str) -> Result<()> {
        self.post_pin("add", "pin", cid).await?;
        info!(cid, "Pinned CID");
        Ok(())
    }

    async fn unpin(&self, cid: &str) -> Result<()> {
        self.post_pin("remove", "unpin", cid).await?;
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

    fn add_response(size: &str) -> AddResponse {
        AddResponse {
            name: "content".to_string(),
            ipfs_hash: "QmTest".to_string(),
            size: size.to_string(),
        }
    }

    #[test]
    fn test_size_parsing_is_lenient() {
        assert_eq!(add_response("1024").size_bytes(), 1024);
        assert_eq!(add_response("").size_bytes(), 0);
        assert_eq!(add_response("12kb").size_bytes(), 0);
        assert_eq!(add_response("-5").size_bytes(), 0);
    }

    #[test]
    fn test_add_response_decodes_blockfrost_shape() {
        let json = r#"{"name":"photo.jpg","ipfs_hash":"QmPhoto","size":"125297"}"#;
        let added: AddResponse = serde_json::from_str(json).unwrap();
        assert_eq!(added.name, "photo.jpg");
        assert_eq!(added.ipfs_hash, "QmPhoto");
        assert_eq!(added.size_bytes(), 125297);
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let client = BlockfrostClient::new(BlockfrostConfig {
            project_id: "ipfs-test".to_string(),
            timeout: Duration::ZERO,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            client.gateway_url("QmA"),
            "https://ipfs.blockfrost.dev/ipfs/QmA"
        );
    }
}

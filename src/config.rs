//! Configuration for elohim-ipfs
//!
//! CLI arguments with environment variable fallbacks, following the doorway
//! pattern. A `.env` file is loaded by the binary before parsing.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use crate::grpc::DEFAULT_MAX_MESSAGE_BYTES;
use crate::blockfrost::{self, BlockfrostClient, BlockfrostConfig};
use crate::client::IpfsClient;
use crate::error::{IpfsError, Result};
use crate::memory::MemoryClient;

/// elohim-ipfs - content-addressed storage over the Blockfrost IPFS API
#[derive(Parser, Debug, Clone)]
#[command(name = "elohim-ipfs")]
#[command(about = "IPFS upload, fetch and pinning service for Elohim nodes")]
pub struct Args {
    /// Address to bind the RPC listener to
    #[arg(long, env = "BIND_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// gRPC listen port
    #[arg(long, env = "RPC_PORT", default_value = "9093")]
    pub port: u16,

    /// Port for the JSON gateway. Disabled when unset.
    #[arg(long, env = "HTTP_PORT")]
    pub http_port: Option<u16>,

    /// Blockfrost IPFS project id. Without it content is kept in memory.
    #[arg(long, env = "BLOCKFROST_IPFS_PROJECT_ID", hide_env_values = true)]
    pub blockfrost_project_id: Option<String>,

    /// Blockfrost IPFS API base URL
    #[arg(long, env = "BLOCKFROST_IPFS_BASE_URL", default_value = blockfrost::DEFAULT_API_URL)]
    pub blockfrost_base_url: String,

    /// Public gateway base URL used for fetches and gateway links
    #[arg(long, env = "IPFS_GATEWAY_URL", default_value = blockfrost::DEFAULT_GATEWAY_URL)]
    pub gateway_url: String,

    /// Timeout for each request to the pinning service, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "60")]
    pub request_timeout_secs: u64,

    /// Maximum RPC request body size in bytes
    #[arg(long, env = "MAX_MESSAGE_BYTES", default_value_t = DEFAULT_MAX_MESSAGE_BYTES)]
    pub max_message_bytes: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Storage backend selected at startup
#[derive(Debug, Clone)]
pub enum Backend {
    Blockfrost(BlockfrostConfig),
    Memory { gateway_url: String },
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(IpfsError::Config("RPC_PORT must be non-zero".to_string()));
        }
        match self.http_port {
            Some(0) => {
                return Err(IpfsError::Config("HTTP_PORT must be non-zero".to_string()));
            }
            Some(port) if port == self.port => {
                return Err(IpfsError::Config(
                    "HTTP_PORT must differ from RPC_PORT".to_string(),
                ));
            }
            _ => {}
        }
        if self.max_message_bytes == 0 {
            return Err(IpfsError::Config(
                "MAX_MESSAGE_BYTES must be non-zero".to_string(),
            ));
        }
        require_http_url("BLOCKFROST_IPFS_BASE_URL", &self.blockfrost_base_url)?;
        require_http_url("IPFS_GATEWAY_URL", &self.gateway_url)?;
        Ok(())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn http_listen_addr(&self) -> Option<SocketAddr> {
        self.http_port.map(|port| SocketAddr::new(self.host, port))
    }

    /// Blockfrost when a project id is set, otherwise the in-memory store
    pub fn backend(&self) -> Backend {
        match self
            .blockfrost_project_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
        {
            Some(project_id) => Backend::Blockfrost(BlockfrostConfig {
                project_id: project_id.to_string(),
                base_url: self.blockfrost_base_url.clone(),
                gateway_url: self.gateway_url.clone(),
                timeout: Duration::from_secs(self.request_timeout_secs),
            }),
            None => Backend::Memory {
                gateway_url: self.gateway_url.clone(),
            },
        }
    }
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Blockfrost(_) => "blockfrost",
            Backend::Memory { .. } => "memory",
        }
    }

    /// Construct the client for this backend
    pub fn into_client(self) -> Result<Arc<dyn IpfsClient>> {
        Ok(match self {
            Backend::Blockfrost(config) => Arc::new(BlockfrostClient::new(config)?),
            Backend::Memory { gateway_url } => Arc::new(MemoryClient::new(gateway_url)),
        })
    }
}

fn require_http_url(name: &str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(IpfsError::Config(format!(
            "{} must be an http(s) URL, got '{}'",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["elohim-ipfs"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.port, 9093);
        assert_eq!(args.listen_addr().to_string(), "0.0.0.0:9093");
        assert_eq!(args.request_timeout_secs, 60);
        assert_eq!(args.max_message_bytes, DEFAULT_MAX_MESSAGE_BYTES);
        assert!(args.http_listen_addr().is_none());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_project_id_selects_blockfrost() {
        let args = parse(&["--blockfrost-project-id", "ipfs123", "--request-timeout-secs", "5"]);
        match args.backend() {
            Backend::Blockfrost(config) => {
                assert_eq!(config.project_id, "ipfs123");
                assert_eq!(config.timeout, Duration::from_secs(5));
            }
            other => panic!("expected blockfrost backend, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_project_id_selects_memory() {
        let args = parse(&["--blockfrost-project-id", "  ", "--gateway-url", "http://gw/ipfs"]);
        match args.backend() {
            Backend::Memory { gateway_url } => assert_eq!(gateway_url, "http://gw/ipfs"),
            other => panic!("expected memory backend, got {:?}", other),
        }
        assert_eq!(args.backend().name(), "memory");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(parse(&["--port", "0"]).validate().is_err());
        assert!(parse(&["--max-message-bytes", "0"]).validate().is_err());
        assert!(parse(&["--http-port", "0"]).validate().is_err());
        assert!(parse(&["--http-port", "9093"]).validate().is_err());
        assert!(parse(&["--gateway-url", "ftp://gw"]).validate().is_err());
        assert!(parse(&["--blockfrost-base-url", "localhost:3000"])
            .validate()
            .is_err());
    }

    #[test]
    fn test_http_gateway_address() {
        let args = parse(&["--host", "127.0.0.1", "--http-port", "8080"]);
        assert!(args.validate().is_ok());
        assert_eq!(
            args.http_listen_addr().map(|a| a.to_string()),
            Some("127.0.0.1:8080".to_string())
        );
    }

    #[tokio::test]
    async fn test_memory_backend_client() {
        let client = Backend::Memory {
            gateway_url: "http://gw/ipfs".to_string(),
        }
        .into_client()
        .unwrap();
        let result = client.upload(b"hello world", "hello.txt").await.unwrap();
        assert_eq!(result.cid, "QmaozNR7DZHQK1ZcU9p7QdrshMvXqWK6gpu5rmrkPdT3L4");
        assert_eq!(
            client.gateway_url(&result.cid),
            "http://gw/ipfs/QmaozNR7DZHQK1ZcU9p7QdrshMvXqWK6gpu5rmrkPdT3L4"
        );
    }
}

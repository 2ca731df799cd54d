//! Elohim IPFS - content-addressed storage facade over an IPFS pinning service
//!
//! Clients upload raw bytes or serialized protobuf payloads, get back a CID
//! computed from the data, and later fetch, pin or unpin by that CID.
//!
//! ## Architecture
//!
//! ```text
//! grpc (tonic) ─┐
//! api (axum)  ──┴►  service::IpfsService  ──►  dyn IpfsClient
//!                  validation, defaults,       ├── BlockfrostClient ──► Blockfrost API / gateway
//!                  status mapping              └── MemoryClient     ──► cid + in-process maps
//! ```
//!
//! ## Backends
//!
//! | Backend | Selected when | Durability |
//! |---------|---------------|------------|
//! | Blockfrost | `BLOCKFROST_IPFS_PROJECT_ID` is set | Remote pinning service |
//! | Memory | no project id | Process lifetime only |
//!
//! Both report the same CIDv0 for the same bytes.

pub mod api;
pub mod blockfrost;
pub mod cid;
pub mod client;
pub mod config;
pub mod error;
pub mod grpc;
pub mod memory;
pub mod service;

// Re-exports
pub use blockfrost::{BlockfrostClient, BlockfrostConfig};
pub use cid::compute_cid;
pub use client::{IpfsClient, UploadResult};
pub use config::{Args, Backend};
pub use error::{IpfsError, Result};
pub use grpc::{IpfsServiceClient, IpfsServiceServer};
pub use memory::MemoryClient;
pub use service::IpfsService;

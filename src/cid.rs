//! Content identifiers
//!
//! Computes IPFS-compatible CIDv0 identifiers locally:
//!
//! ```text
//! cid = base58btc( 0x12 | 0x20 | sha256(data) )
//!        │          │      │      └─ 32-byte digest
//!        │          │      └─ digest length
//!        │          └─ multihash code for sha2-256
//!        └─ no multibase prefix (CIDv0)
//! ```
//!
//! The `Qm` prefix of the result is a property of the encoding, not something
//! this module adds.

use sha2::{Digest, Sha256};

/// Multihash code for sha2-256
pub const SHA2_256_CODE: u8 = 0x12;

/// Digest length of sha2-256 in bytes
pub const SHA2_256_LEN: u8 = 0x20;

/// Total length of a sha2-256 multihash (code + length + digest)
pub const MULTIHASH_LEN: usize = 2 + SHA2_256_LEN as usize;

/// Build the sha2-256 multihash of `data`
pub fn multihash_sha256(data: &[u8]) -> [u8; MULTIHASH_LEN] {
    let digest = Sha256::digest(data);

    let mut multihash = [0u8; MULTIHASH_LEN];
    multihash[0] = SHA2_256_CODE;
    multihash[1] = SHA2_256_LEN;
    multihash[2..].copy_from_slice(&digest);
    multihash
}

/// Encode bytes as base58btc.
///
/// Leading zero bytes carry no numeric value, so each one is emitted as an
/// explicit `'1'` in front of the result.
pub fn encode_base58(input: &[u8]) -> String {
    bs58::encode(input).into_string()
}

/// True when `cid` is safe to place in a URL path segment.
///
/// CIDv0 (base58btc) and CIDv1 (base32/base36 multibase) strings are plain
/// ASCII alphanumerics.
pub fn is_valid_cid(cid: &str) -> bool {
    !cid.is_empty() && cid.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Compute the CIDv0 identifier for `data`
pub fn compute_cid(data: &[u8]) -> String {
    encode_base58(&multihash_sha256(data))
}

//! Public identifier derivation
//!
//! The public id is a one-way 128-bit digest of the raw fingerprint's eight
//! little-endian bytes, rendered as 32 lowercase hex characters. It is only
//! ever recomputed from the raw value, never compared against hardware.
//!
//! # Compatibility
//!
//! Ids and stored records are not interchangeable with MD5-based variants of
//! this scheme. The digest here is SHA-256 and the filter checksum in
//! [`crate::bloom`] is CRC-32C, so fingerprints written by an implementation
//! using MD5 and an unfinalized CRC-32 neither decode to the same raw value
//! nor derive the same public id.

use sha2::{Digest, Sha256};

use crate::bloom::BloomValue;

/// Digest bytes kept for the public identifier
const PUBLIC_ID_BYTES: usize = 16;

/// Derive the public identifier of a raw fingerprint
pub fn derive_public_id(raw: BloomValue) -> String {
    let digest = Sha256::digest(raw.raw().to_le_bytes());
    hex::encode(&digest[..PUBLIC_ID_BYTES])
}

//! Deterministic, non-cryptographic hashing for plan fingerprinting and
//! cache keys (spec §6 "Hash", `[ADD]` expansion).
//!
//! Uses MurmurHash3 x64-128 folded to a `u64` over a canonical byte
//! encoding: enum ordinals as a single byte, strings as a 4-byte
//! little-endian length prefix followed by UTF-8 bytes.

use std::io::Cursor;

use crate::error::{CoreError, CoreResult};

/// Accumulates a canonical byte encoding for hashing. Field order is
/// caller-determined and must be stable across runs for the hash to be a
/// usable cache key.
#[derive(Debug, Default, Clone)]
pub struct CanonicalEncoder {
    buf: Vec<u8>,
}

impl CanonicalEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_ordinal(&mut self, ordinal: u8) -> &mut Self {
        self.buf.push(ordinal);
        self
    }

    pub fn write_str(&mut self, s: &str) -> &mut Self {
        let bytes = s.as_bytes();
        self.buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn write_i64(&mut self, v: i64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn write_bool(&mut self, v: bool) -> &mut Self {
        self.buf.push(v as u8);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Folds a 128-bit MurmurHash3 digest into 64 bits by XORing the halves —
/// cheap and sufficient for a cache-key fingerprint (not a cryptographic
/// use case).
pub fn hash_bytes(bytes: &[u8]) -> CoreResult<u64> {
    let mut cursor = Cursor::new(bytes);
    let digest = murmur3::murmur3_x64_128(&mut cursor, 0)
        .map_err(|e| CoreError::invalid_input(format!("murmur3 hash failed: {e}")))?;
    Ok(((digest >> 64) as u64) ^ (digest as u64))
}

/// Builds the cluster-routable cache key from spec §6: a hash-tag
/// bracket around the prefix+hash so a cluster-aware client routes
/// same-plan segments to the same shard, followed by the per-segment
/// base time.
pub fn cache_key(prefix: &str, interval_label: &str, config_hash: u64, base_time: u32) -> String {
    format!("{{{prefix}{interval_label}{config_hash:016x}}}{base_time:08x}")
}

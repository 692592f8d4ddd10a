//! crates/av_io/src/hasher.rs
//!
//! Deterministic SHA-256 hashing over raw bytes and canonical JSON.
//!
//! - Use `sha256_canonical(..)` for JSON **values/structs** (goes through canonical_json).
//! - Use `sha256_hex(..)` for **raw bytes**.
//! - Hex digests are **lowercase**, 64 characters.

#![forbid(unsafe_code)]

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::canonical_json::{to_canonical_bytes, to_canonical_json_bytes};

/* ----------------------------------- Errors ----------------------------------- */

#[derive(Error, Debug)]
pub enum HashError {
    #[error("JSON serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("invalid hex (expected lowercase 64-hex): {0}")]
    InvalidHex(String),
}

/* ---------------------------------- Helpers ---------------------------------- */

/// Validate a lowercase 64-hex string and shorten it to `n` chars (log display).
pub fn short_hex(hex64: &str, n: usize) -> Result<&str, HashError> {
    if !av_core::ids::is_valid_sha256(hex64) {
        return Err(HashError::InvalidHex(hex64.to_string()));
    }
    Ok(&hex64[..n.min(64)])
}

/* ------------------------------- Raw hashing ------------------------------- */

/// SHA-256 over raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/* ---------------------------- Canonical hashing ---------------------------- */

/// SHA-256 over **canonical JSON bytes** of any serializable value.
pub fn sha256_canonical<T: Serialize>(value: &T) -> Result<String, HashError> {
    let bytes = to_canonical_bytes(value)?;
    Ok(sha256_hex(&bytes))
}

/// SHA-256 over a **canonical JSON Value** (already built).
pub fn sha256_canonical_value(v: &Value) -> String {
    sha256_hex(&to_canonical_json_bytes(v))
}

/* ------------------------------------ Tests ------------------------------------ */

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hex_encoding_is_lowercase() {
        let h = sha256_hex(b"abc");
        assert_eq!(h, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
        assert_eq!(short_hex(&h, 12).unwrap(), "ba7816bf8f01");
        assert!(short_hex("ABC", 4).is_err());
    }

    #[test]
    fn canonical_hashing_follows_field_order() {
        #[derive(Serialize)]
        struct T {
            b: u32,
            a: u32,
        }
        let h1 = sha256_canonical(&T { b: 2, a: 1 }).unwrap();
        let h2 = sha256_canonical_value(&json!({"b": 2, "a": 1}));
        let h3 = sha256_canonical_value(&json!({"a": 1, "b": 2}));
        assert_eq!(h1, h2);
        assert_ne!(h1, h3, "key order is part of the canonical form");
    }
}

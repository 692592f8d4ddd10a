//! crates/av_io/src/lib.rs
//! I/O crate: canonical JSON, hashing, the result seal, and input loaders.
//!
//! - Shared error type (`IoError`) with `From` conversions used across modules.
//! - Public surface kept stable; details live in submodules.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error for av_io (loader/canonical_json).
#[derive(Debug, Error)]
pub enum IoError {
    /// Path rejected before touching the filesystem (URL-like, missing parent, ...).
    #[error("path error: {0}")]
    Path(String),

    /// Filesystem read failures.
    #[error("read error: {0}")]
    Read(String),

    /// Filesystem write failures (create_dir_all, rename, fsync, ...).
    #[error("write error: {0}")]
    Write(String),

    /// Input exceeded a hard size limit.
    #[error("limit exceeded: {0}")]
    Limit(String),

    /// JSON serialization/deserialization errors with a JSON Pointer-ish location.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },
}

pub type IoResult<T> = Result<T, IoError>;

/* ---------------- From conversions (used by file modules) ---------------- */

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Read(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json keeps line/column, not a pointer; callers may enrich this.
        IoError::Json {
            pointer: format!("line {} column {}", e.line(), e.column()),
            msg: e.to_string(),
        }
    }
}

/* ---------------- Public modules ---------------- */

pub mod canonical_json;
pub mod hasher;
pub mod loader;
pub mod seal;

/// Returns true if `s` looks like a URL (any `<scheme>://`, including `file://`).
#[inline]
pub fn looks_like_url_strict(s: &str) -> bool {
    s.trim().contains("://")
}

/* ---------------- Public prelude ---------------- */

pub mod prelude {
    pub use crate::{looks_like_url_strict, IoError, IoResult};

    pub use crate::canonical_json::{to_canonical_bytes, to_canonical_json_bytes};
    pub use crate::hasher::{sha256_canonical, sha256_hex};
    pub use crate::seal::{compute_seal, verify_seal, SealInput, SealRankingEntry};
}

//! av_pipeline: deterministic lock surface (validate → coerce → tabulate → seal → record)
//! JSON shape, hashing and file access are delegated to `av_io`; tally math to `av_algo`.
//! Nothing here reads a clock: the lock timestamp is always an input.

use thiserror::Error;

pub mod build_seal;
pub mod lock;
pub mod tabulate;

pub use build_seal::{seal_input_for, sealed_ranking};
pub use lock::{
    lock_from_file, lock_vote, normalize_locked_at, verify_locked, verify_locked_file,
    LockRequest, LockedRankingEntry, LockedResult,
};
pub use tabulate::{tabulate, tabulate_file, Tabulated};

/// Single error surface for the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("io: {0}")]
    Io(String),

    /// Inputs violate a boundary rule (vote id, duplicate candidates, method, timestamp).
    #[error("validate: {0}")]
    Validate(String),

    #[error(transparent)]
    Seal(#[from] av_io::seal::SealError),

    /// Output assembly failed (record serialization).
    #[error("build: {0}")]
    Build(String),
}

impl From<av_io::IoError> for PipelineError {
    fn from(e: av_io::IoError) -> Self {
        use av_io::IoError as E;
        match e {
            E::Json { pointer, msg } => PipelineError::Validate(format!("json {pointer}: {msg}")),
            E::Read(m) => PipelineError::Io(format!("read: {m}")),
            E::Write(m) => PipelineError::Io(format!("write: {m}")),
            E::Path(m) => PipelineError::Io(format!("path: {m}")),
            E::Limit(m) => PipelineError::Io(format!("limit: {m}")),
        }
    }
}

impl From<av_core::CoreError> for PipelineError {
    fn from(e: av_core::CoreError) -> Self {
        PipelineError::Validate(e.to_string())
    }
}

impl From<av_io::hasher::HashError> for PipelineError {
    fn from(e: av_io::hasher::HashError) -> Self {
        PipelineError::Build(e.to_string())
    }
}

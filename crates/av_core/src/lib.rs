//! av_core: Core types, ordering helpers, and method variables.
//!
//! This crate is **I/O-free**. It defines the stable types shared by the
//! engine crates (`av_algo`, `av_io`, `av_pipeline`, `av_cli`).
//!
//! - Identifiers: `ProjectId` (candidate), `VoteId`, `SealDigest`
//! - Entities: `Ballot`, `RankedEntry`, `TallyResult`
//! - Variables: `TallyMethod`, `LockParams`, `SEAL_VERSION`
//! - Deterministic ordering helpers (index maps, stable descending rank)
//!
//! Serialization derives are gated behind the `serde` feature.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod errors {
    use core::fmt;

    use crate::ids::{IdError, ProjectId};

    /// Minimal error set for core-domain validation & parsing.
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub enum CoreError {
        InvalidId(IdError),
        UnknownMethod,
        DuplicateCandidate(ProjectId),
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::InvalidId(e) => write!(f, "invalid id: {e}"),
                CoreError::UnknownMethod => write!(f, "unknown tally method"),
                CoreError::DuplicateCandidate(id) => write!(f, "duplicate candidate id: {id}"),
            }
        }
    }

    impl From<IdError> for CoreError {
        fn from(e: IdError) -> Self {
            CoreError::InvalidId(e)
        }
    }

    #[cfg(feature = "std")]
    impl std::error::Error for CoreError {}
}

pub mod determinism;
pub mod entities;
pub mod ids;
pub mod variables;

pub use entities::{Ballot, RankedEntry, TallyResult};
pub use errors::CoreError;
pub use ids::{ProjectId, SealDigest, VoteId};
pub use variables::{LockParams, TallyMethod, SEAL_VERSION};

// crates/av_algo/src/lib.rs
#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use av_core::{Ballot, ProjectId, RankedEntry, TallyResult};

// ----------------------------- Tabulation (public surface) ---------------------------

pub mod tabulation {
    pub mod schulze;

    pub use schulze::{
        compute_results, condorcet_winner, pairwise_preferences, schulze_order, schulze_wins,
        strongest_paths, tally_with_audit, SchulzeTally, SquareMatrix,
    };
}

// Convenience re-exports (pipeline imports these from crate root)
pub use tabulation::{compute_results, tally_with_audit, SchulzeTally, SquareMatrix};

// ----------------------------- Participation -----------------------------------------

pub mod participation;

pub use participation::participation_pct;

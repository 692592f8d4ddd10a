//! crates/av_pipeline/src/tabulate.rs
//! TABULATE stage: strict candidate list + loose ballots → Schulze tally with audit.
//!
//! The engine itself is total and silent; this stage is where input quality is
//! reported (dropped entries, shapeless and empty ballots, unknown references).

use std::path::Path;

use tracing::{debug, warn};

use av_algo::{tally_with_audit, SchulzeTally};
use av_core::{determinism, Ballot, ProjectId};
use av_io::loader::{self, coerce_ballots, RawBallot};

use crate::PipelineError;

/// Tally output plus the input-quality counters that were logged.
#[derive(Clone, Debug)]
pub struct Tabulated {
    /// Candidate order the tally's matrices are indexed by.
    pub candidates: Vec<ProjectId>,
    pub tally: SchulzeTally,
    pub ballots: Vec<Ballot>,
    pub dropped_entries: usize,
    pub unknown_refs: usize,
    pub empty_ballots: usize,
}

impl Tabulated {
    pub fn condorcet_winner_id(&self) -> Option<&ProjectId> {
        self.tally.condorcet_winner.and_then(|i| self.candidates.get(i))
    }
}

// ----- Input checks ------------------------------------------------------------------------------

fn count_unknown_refs(candidates: &[ProjectId], ballots: &[Ballot]) -> usize {
    let index = determinism::candidate_index(candidates);
    ballots
        .iter()
        .flat_map(|b| b.ranking.iter())
        .filter(|id| !index.contains_key(id.as_str()))
        .count()
}

// ----- Stage -------------------------------------------------------------------------------------

/// Validate candidates, coerce ballots, run the tally.
pub fn tabulate(candidates: &[ProjectId], raw: &[RawBallot]) -> Result<Tabulated, PipelineError> {
    determinism::ensure_unique(candidates).map_err(|e| {
        warn!(error = %e, "candidate list rejected");
        PipelineError::from(e)
    })?;

    let coerced = coerce_ballots(raw);
    if coerced.dropped_entries > 0 || coerced.shapeless > 0 {
        warn!(
            dropped_entries = coerced.dropped_entries,
            shapeless = coerced.shapeless,
            "ballot documents needed coercion"
        );
    }

    let unknown_refs = count_unknown_refs(candidates, &coerced.ballots);
    if unknown_refs > 0 {
        warn!(unknown_refs, "ballots reference ids that are not candidates; ignored");
    }

    let empty_ballots = coerced.ballots.iter().filter(|b| b.is_empty()).count();
    if empty_ballots > 0 {
        warn!(empty_ballots, "empty ballots counted in total only");
    }

    let tally = tally_with_audit(candidates, &coerced.ballots);
    debug!(
        candidates = candidates.len(),
        ballots = tally.result.total,
        winner = tally.result.winner_id.as_ref().map(ProjectId::as_str),
        "tabulated"
    );

    Ok(Tabulated {
        candidates: candidates.to_vec(),
        tally,
        ballots: coerced.ballots,
        dropped_entries: coerced.dropped_entries,
        unknown_refs,
        empty_ballots,
    })
}

/// Load a `{candidates, ballots}` file and tabulate it.
pub fn tabulate_file(path: &Path) -> Result<Tabulated, PipelineError> {
    let file = loader::load_tally_file(path)?;
    tabulate(&file.candidates, &file.ballots)
}

// ----- Tests -------------------------------------------------------------------------------------

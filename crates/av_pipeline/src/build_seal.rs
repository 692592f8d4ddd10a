//! build_seal.rs: assemble the seal input from a finished tally.
//! Titles come from the catalog by id; the ranking order is the tally's, unchanged.

use std::collections::BTreeMap;

use av_core::{ProjectId, TallyMethod, TallyResult, VoteId};
use av_io::seal::{SealInput, SealRankingEntry};

/// Project the tally ranking into sealed rows (`projectId`, `title`, `score`).
pub fn sealed_ranking(
    result: &TallyResult,
    titles: &BTreeMap<ProjectId, Option<String>>,
) -> Vec<SealRankingEntry> {
    result
        .ranking
        .iter()
        .map(|e| SealRankingEntry {
            project_id: e.id.clone(),
            title: titles.get(&e.id).cloned().flatten(),
            score: u64::from(e.score),
        })
        .collect()
}

/// Everything the seal commits to, from a tally and the lock context.
pub fn seal_input_for(
    vote_id: &VoteId,
    method: TallyMethod,
    locked_at_iso: &str,
    result: &TallyResult,
    participation_pct: Option<f64>,
    titles: &BTreeMap<ProjectId, Option<String>>,
) -> SealInput {
    SealInput {
        vote_id: vote_id.to_string(),
        method: method.as_str().to_string(),
        locked_at_iso: locked_at_iso.to_string(),
        ballots_count: result.total,
        participation_pct,
        winner_id: result.winner_id.clone(),
        ranking: sealed_ranking(result, titles),
    }
}

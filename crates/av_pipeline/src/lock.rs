//! crates/av_pipeline/src/lock.rs
//! LOCK: validate the boundary, tabulate, compute participation, seal, and
//! emit the locked record. Also re-verifies a stored record against its seal.
//!
//! Record shape (camelCase, field order fixed):
//! `{voteId, method, lockedAt, ballotsCount, participationPct, winnerId,
//!   condorcetWinnerId, ranking: [{projectId, title, rank, score}], seal}`
//!
//! `condorcetWinnerId` and `rank` are informational; the seal covers the
//! remaining fields (see `av_io::seal`).

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use av_algo::participation_pct;
use av_core::{LockParams, ProjectId, SealDigest, TallyMethod, VoteId};
use av_io::hasher::short_hex;
use av_io::loader::{self, LockFile, ProjectDoc, RawBallot};
use av_io::seal::{self, SealInput, SealRankingEntry};

use crate::build_seal::seal_input_for;
use crate::tabulate::tabulate;
use crate::PipelineError;

// ----- Types ------------------------------------------------------------------------------------

/// Inputs of one lock.
#[derive(Debug, Clone)]
pub struct LockRequest {
    pub vote_id: String,
    /// Any RFC 3339 timestamp; normalized to `YYYY-MM-DDTHH:MM:SS.sssZ`.
    pub locked_at: String,
    /// Candidate catalog, in display order (this is the tally's candidate order).
    pub projects: Vec<ProjectDoc>,
    pub ballots: Vec<RawBallot>,
    pub params: LockParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedRankingEntry {
    pub project_id: ProjectId,
    pub title: Option<String>,
    pub rank: u32,
    pub score: u64,
}

/// The persisted, sealed outcome of a vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedResult {
    pub vote_id: VoteId,
    pub method: TallyMethod,
    pub locked_at: String,
    pub ballots_count: u64,
    pub participation_pct: Option<f64>,
    pub winner_id: Option<ProjectId>,
    #[serde(default)]
    pub condorcet_winner_id: Option<ProjectId>,
    pub ranking: Vec<LockedRankingEntry>,
    pub seal: SealDigest,
}

impl LockedResult {
    /// The exact values the seal was computed over.
    pub fn seal_input(&self) -> SealInput {
        SealInput {
            vote_id: self.vote_id.to_string(),
            method: self.method.as_str().to_string(),
            locked_at_iso: self.locked_at.clone(),
            ballots_count: self.ballots_count,
            participation_pct: self.participation_pct,
            winner_id: self.winner_id.clone(),
            ranking: self
                .ranking
                .iter()
                .map(|r| SealRankingEntry {
                    project_id: r.project_id.clone(),
                    title: r.title.clone(),
                    score: r.score,
                })
                .collect(),
        }
    }
}

// ----- Helpers ----------------------------------------------------------------------------------

/// Parse an RFC 3339 timestamp (any offset) and render it in UTC with
/// millisecond precision and a `Z` suffix.
pub fn normalize_locked_at(ts: &str) -> Result<String, PipelineError> {
    let dt = DateTime::parse_from_rfc3339(ts.trim())
        .map_err(|e| PipelineError::Validate(format!("lockedAt {ts:?}: {e}")))?;
    Ok(dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true))
}

// ----- Stage ------------------------------------------------------------------------------------

pub fn lock_vote(req: &LockRequest) -> Result<LockedResult, PipelineError> {
    let vote_id = VoteId::try_from(req.vote_id.as_str())
        .map_err(|e| PipelineError::Validate(format!("voteId {:?}: {e}", req.vote_id)))?;
    let locked_at = normalize_locked_at(&req.locked_at)?;

    let candidates: Vec<ProjectId> = req.projects.iter().map(|p| p.id.clone()).collect();
    let tab = tabulate(&candidates, &req.ballots)?;
    let tally = &tab.tally;

    let titles: BTreeMap<ProjectId, Option<String>> =
        req.projects.iter().map(|p| (p.id.clone(), p.title.clone())).collect();
    let pct = participation_pct(tally.result.total, req.params.eligible_count);

    let input = seal_input_for(&vote_id, req.params.method, &locked_at, &tally.result, pct, &titles);
    let digest = SealDigest::try_from(seal::compute_seal(&input))
        .map_err(|e| PipelineError::Build(e.to_string()))?;

    let short = short_hex(digest.as_hex(), 12)?;
    info!(
        vote = %vote_id,
        ballots = input.ballots_count,
        winner = input.winner_id.as_ref().map(ProjectId::as_str),
        seal = short,
        "vote locked"
    );

    let ranking = tally
        .result
        .ranking
        .iter()
        .zip(input.ranking)
        .map(|(e, s)| LockedRankingEntry {
            project_id: s.project_id,
            title: s.title,
            rank: e.rank,
            score: s.score,
        })
        .collect();

    Ok(LockedResult {
        vote_id,
        method: req.params.method,
        locked_at,
        ballots_count: input.ballots_count,
        participation_pct: pct,
        winner_id: input.winner_id,
        condorcet_winner_id: tab.condorcet_winner_id().cloned(),
        ranking,
        seal: digest,
    })
}

/// Recompute the seal of a stored record.
pub fn verify_locked(record: &LockedResult) -> Result<(), PipelineError> {
    seal::verify_seal(&record.seal_input(), record.seal.as_hex())?;
    Ok(())
}

// ----- File entry points ------------------------------------------------------------------------

impl TryFrom<LockFile> for LockRequest {
    type Error = PipelineError;

    /// A missing `lockedAt` is an error here; callers that want "now" fill it in first.
    fn try_from(f: LockFile) -> Result<Self, Self::Error> {
        let method = match f.method.as_deref() {
            Some(m) => m.parse::<TallyMethod>().map_err(|e| PipelineError::Validate(format!("method {m:?}: {e}")))?,
            None => TallyMethod::default(),
        };
        let locked_at = f
            .locked_at
            .ok_or_else(|| PipelineError::Validate("lockedAt is required".into()))?;
        Ok(LockRequest {
            vote_id: f.vote_id,
            locked_at,
            projects: f.projects,
            ballots: f.ballots,
            params: LockParams { method, eligible_count: f.eligible_count },
        })
    }
}

/// Load a lock file and lock it. `default_locked_at` fills a missing `lockedAt`.
pub fn lock_from_file(path: &Path, default_locked_at: Option<&str>) -> Result<LockedResult, PipelineError> {
    let mut file = loader::load_lock_file(path)?;
    if file.locked_at.is_none() {
        file.locked_at = default_locked_at.map(str::to_string);
    }
    lock_vote(&LockRequest::try_from(file)?)
}

/// Load a stored locked record and verify its seal; returns the record.
pub fn verify_locked_file(path: &Path) -> Result<LockedResult, PipelineError> {
    let bytes = loader::read_local_bytes(path)?;
    let record: LockedResult = serde_json::from_slice(&bytes)
        .map_err(|e| PipelineError::from(av_io::IoError::from(e)))?;
    verify_locked(&record)?;
    Ok(record)
}

// ----- Tests ------------------------------------------------------------------------------------

//! Loader: read local JSON inputs (tally, lock, seal) and coerce loosely-shaped
//! ballot documents into strict `Ballot`s. No network I/O.
//!
//! Ballots come from stored documents written by several app versions, so the
//! loader is lenient where the tally is lenient:
//! - a ballot is either `{"ranking": [...], ...}` (extra fields ignored) or a
//!   bare array;
//! - a missing / null / non-array `ranking` is an empty ballot;
//! - non-string ranking entries are dropped and counted.
//!
//! Candidate lists and seal inputs are strict: a malformed one is an error.

#![forbid(unsafe_code)]

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use av_core::{Ballot, ProjectId};

use crate::seal::SealInput;
use crate::{looks_like_url_strict, IoError, IoResult};

/// Hard cap on any single input file.
pub const MAX_INPUT_BYTES: u64 = 64 * 1024 * 1024;

// ----------------------------- Wire-facing types -----------------------------------

/// A stored ballot document, as loosely as it may appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawBallot {
    Bare(Vec<Value>),
    Doc {
        #[serde(default)]
        ranking: Value,
    },
    /// Anything else (`null`, a string, a number); tallied as an empty ballot.
    Other(Value),
}

/// `{"candidates": [...], "ballots": [...]}`
#[derive(Debug, Clone, Deserialize)]
pub struct TallyFile {
    pub candidates: Vec<ProjectId>,
    #[serde(default)]
    pub ballots: Vec<RawBallot>,
}

/// Catalog row: a candidate project and its display title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDoc {
    pub id: ProjectId,
    #[serde(default)]
    pub title: Option<String>,
}

/// Everything needed to lock a vote.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockFile {
    pub vote_id: String,
    #[serde(default)]
    pub method: Option<String>,
    /// Any RFC 3339 timestamp; normalized by the lock step.
    #[serde(default)]
    pub locked_at: Option<String>,
    pub projects: Vec<ProjectDoc>,
    #[serde(default)]
    pub ballots: Vec<RawBallot>,
    #[serde(default)]
    pub eligible_count: Option<u64>,
}

/// Strict ballots plus what was thrown away on the way in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoercedBallots {
    pub ballots: Vec<Ballot>,
    /// Ranking entries that were not strings.
    pub dropped_entries: usize,
    /// Ballots with no usable ranking array (missing, wrong type, or not a
    /// ballot document at all).
    pub shapeless: usize,
}

// ----------------------------- Coercion --------------------------------------------

fn coerce_entries(entries: &[Value], dropped: &mut usize) -> Ballot {
    let ranking = entries
        .iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(ProjectId::from(s.as_str())),
            _ => {
                *dropped += 1;
                None
            }
        })
        .collect();
    Ballot::new(ranking)
}

/// Coerce raw ballots, keeping one strict ballot per raw ballot (so the
/// ballot count is preserved).
pub fn coerce_ballots(raw: &[RawBallot]) -> CoercedBallots {
    let mut out = CoercedBallots { ballots: Vec::with_capacity(raw.len()), ..Default::default() };
    for rb in raw {
        let ballot = match rb {
            RawBallot::Bare(entries) => coerce_entries(entries, &mut out.dropped_entries),
            RawBallot::Doc { ranking: Value::Array(entries) } => {
                coerce_entries(entries, &mut out.dropped_entries)
            }
            RawBallot::Doc { .. } | RawBallot::Other(_) => {
                out.shapeless += 1;
                Ballot::default()
            }
        };
        out.ballots.push(ballot);
    }
    out
}

// ----------------------------- Reading ---------------------------------------------

/// Read a local file with the size cap; URL-like paths are rejected.
pub fn read_local_bytes(path: &Path) -> IoResult<Vec<u8>> {
    let shown = path.to_string_lossy();
    if looks_like_url_strict(&shown) {
        return Err(IoError::Path(format!("not a local path: {shown}")));
    }
    let f = File::open(path).map_err(|e| IoError::Read(format!("{shown}: {e}")))?;
    let mut buf = Vec::new();
    f.take(MAX_INPUT_BYTES + 1)
        .read_to_end(&mut buf)
        .map_err(|e| IoError::Read(format!("{shown}: {e}")))?;
    if buf.len() as u64 > MAX_INPUT_BYTES {
        return Err(IoError::Limit(format!("{shown} exceeds {MAX_INPUT_BYTES} bytes")));
    }
    Ok(buf)
}

fn parse_json<T: DeserializeOwned>(bytes: &[u8], what: &str) -> IoResult<T> {
    serde_json::from_slice(bytes).map_err(|e| IoError::Json {
        pointer: format!("{what}: line {} column {}", e.line(), e.column()),
        msg: e.to_string(),
    })
}

pub fn parse_tally_file(bytes: &[u8]) -> IoResult<TallyFile> {
    parse_json(bytes, "tally")
}

pub fn parse_lock_file(bytes: &[u8]) -> IoResult<LockFile> {
    parse_json(bytes, "lock")
}

pub fn parse_seal_input(bytes: &[u8]) -> IoResult<SealInput> {
    parse_json(bytes, "seal")
}

pub fn load_tally_file(path: &Path) -> IoResult<TallyFile> {
    parse_tally_file(&read_local_bytes(path)?)
}

pub fn load_lock_file(path: &Path) -> IoResult<LockFile> {
    parse_lock_file(&read_local_bytes(path)?)
}

pub fn load_seal_input(path: &Path) -> IoResult<SealInput> {
    parse_seal_input(&read_local_bytes(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loose_ballots_are_coerced() {
        let src = br#"{
            "candidates": ["A", "B", "C"],
            "ballots": [
                {"ranking": ["A", "B"], "voterId": "u1", "createdAt": 17},
                ["C", 4, null, "A"],
                {"ranking": null},
                {"uid": "u9"},
                {"ranking": "A>B"}
            ]
        }"#;
        let t = parse_tally_file(src).unwrap();
        assert_eq!(t.candidates.len(), 3);

        let c = coerce_ballots(&t.ballots);
        assert_eq!(c.ballots.len(), 5, "every raw ballot is kept");
        assert_eq!(c.ballots[0], Ballot::from_ids(["A", "B"]));
        assert_eq!(c.ballots[1], Ballot::from_ids(["C", "A"]));
        assert!(c.ballots[2..].iter().all(Ballot::is_empty));
        assert_eq!(c.dropped_entries, 2);
        assert_eq!(c.shapeless, 3);
    }

    #[test]
    fn non_document_ballots_become_empty() {
        let src = br#"{"candidates": ["A", "B"], "ballots": [null, "A>B", 3, true, ["B", "A"]]}"#;
        let t = parse_tally_file(src).unwrap();
        assert!(matches!(t.ballots[0], RawBallot::Other(Value::Null)));

        let c = coerce_ballots(&t.ballots);
        assert_eq!(c.ballots.len(), 5);
        assert!(c.ballots[..4].iter().all(Ballot::is_empty));
        assert_eq!(c.ballots[4], Ballot::from_ids(["B", "A"]));
        assert_eq!(c.shapeless, 4);
        assert_eq!(c.dropped_entries, 0);
    }

    #[test]
    fn candidates_must_be_strings() {
        let err = parse_tally_file(br#"{"candidates": ["A", 2]}"#).unwrap_err();
        assert!(matches!(err, IoError::Json { .. }));
    }

    #[test]
    fn lock_file_defaults() {
        let src = br#"{"voteId": "v1", "projects": [{"id": "A", "title": "Park", "budget": 10}, {"id": "B"}]}"#;
        let l = parse_lock_file(src).unwrap();
        assert_eq!(l.vote_id, "v1");
        assert!(l.method.is_none() && l.locked_at.is_none() && l.eligible_count.is_none());
        assert!(l.ballots.is_empty());
        assert_eq!(l.projects[0].title.as_deref(), Some("Park"));
        assert_eq!(l.projects[1].title, None);
    }

    #[test]
    fn reads_local_files_and_rejects_urls() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(br#"{"candidates": [], "ballots": []}"#).unwrap();
        let t = load_tally_file(f.path()).unwrap();
        assert!(t.candidates.is_empty());

        let err = load_tally_file(Path::new("https://example.org/t.json")).unwrap_err();
        assert!(matches!(err, IoError::Path(_)));

        let err = load_tally_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, IoError::Read(_)));
    }

    #[test]
    fn seal_input_file_parses() {
        let src = br#"{"voteId":"v","method":"schulze","lockedAtISO":"2024-01-01T00:00:00.000Z",
            "ballotsCount":3,"participationPct":75,"winnerId":"A",
            "ranking":[{"projectId":"A","title":"Park","score":1},{"projectId":"B","score":0}]}"#;
        let s = parse_seal_input(src).unwrap();
        assert_eq!(s.participation_pct, Some(75.0));
        assert_eq!(s.ranking[1].title, None);
        assert_json_diff::assert_json_include!(
            actual: serde_json::to_value(&s).unwrap(),
            expected: serde_json::json!({"voteId": "v", "ballotsCount": 3, "winnerId": "A"})
        );
    }
}

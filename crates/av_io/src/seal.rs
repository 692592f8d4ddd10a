//! Result seal: a SHA-256 digest binding a locked result to its public inputs.
//!
//! Pre-image (compact JSON, keys in exactly this order):
//!
//! ```text
//! {"v":1,"voteId":…,"method":…,"lockedAt":…,"ballotsCount":…,
//!  "participationPct":…|null,"winnerId":…|null,
//!  "ranking":[{"projectId":…,"title":…|null,"score":…},…]}
//! ```
//!
//! - Strings are taken verbatim; the lock timestamp is not reformatted here.
//! - Absent optional values are written as `null`, never omitted.
//! - Ranking entries are projected to `projectId, title, score` and kept in the
//!   order supplied; the seal never re-sorts.
//!
//! The pre-image shape is an external contract: verifiers recompute the digest
//! from published values, so any drift here breaks verification.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use av_core::{ProjectId, SEAL_VERSION};

use crate::canonical_json::to_canonical_json_bytes;
use crate::hasher::sha256_hex;

/// Everything the seal commits to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealInput {
    pub vote_id: String,
    pub method: String,
    /// ISO-8601 lock timestamp, already rendered by the caller.
    #[serde(rename = "lockedAtISO", alias = "lockedAt")]
    pub locked_at_iso: String,
    pub ballots_count: u64,
    #[serde(default)]
    pub participation_pct: Option<f64>,
    #[serde(default)]
    pub winner_id: Option<ProjectId>,
    pub ranking: Vec<SealRankingEntry>,
}

/// One sealed ranking row. Extra fields in input documents are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealRankingEntry {
    pub project_id: ProjectId,
    #[serde(default)]
    pub title: Option<String>,
    pub score: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SealError {
    #[error("expected seal is not a lowercase 64-hex digest: {0}")]
    Malformed(String),

    #[error("seal mismatch: expected {expected}, computed {computed}")]
    Mismatch { expected: String, computed: String },
}

fn opt_string(s: Option<&str>) -> Value {
    s.map_or(Value::Null, |s| Value::String(s.to_string()))
}

/// Build the canonical pre-image object (insertion-ordered keys).
pub fn seal_preimage_value(input: &SealInput) -> Value {
    let ranking: Vec<Value> = input
        .ranking
        .iter()
        .map(|r| {
            let mut row = Map::new();
            row.insert("projectId".into(), Value::String(r.project_id.to_string()));
            row.insert("title".into(), opt_string(r.title.as_deref()));
            row.insert("score".into(), Value::from(r.score));
            Value::Object(row)
        })
        .collect();

    let mut m = Map::new();
    m.insert("v".into(), Value::from(SEAL_VERSION));
    m.insert("voteId".into(), Value::String(input.vote_id.clone()));
    m.insert("method".into(), Value::String(input.method.clone()));
    m.insert("lockedAt".into(), Value::String(input.locked_at_iso.clone()));
    m.insert("ballotsCount".into(), Value::from(input.ballots_count));
    // From<f64> maps NaN/±inf to null, as JSON.stringify does.
    m.insert("participationPct".into(), input.participation_pct.map_or(Value::Null, Value::from));
    m.insert("winnerId".into(), opt_string(input.winner_id.as_ref().map(ProjectId::as_str)));
    m.insert("ranking".into(), Value::Array(ranking));
    Value::Object(m)
}

/// Exact bytes that get hashed.
pub fn seal_preimage_bytes(input: &SealInput) -> Vec<u8> {
    to_canonical_json_bytes(&seal_preimage_value(input))
}

/// Lowercase 64-hex SHA-256 of the canonical pre-image.
pub fn compute_seal(input: &SealInput) -> String {
    sha256_hex(&seal_preimage_bytes(input))
}

/// Recompute the seal and compare it with a published value.
pub fn verify_seal(input: &SealInput, expected: &str) -> Result<(), SealError> {
    if !av_core::ids::is_valid_sha256(expected) {
        return Err(SealError::Malformed(expected.to_string()));
    }
    let computed = compute_seal(input);
    if computed == expected {
        Ok(())
    } else {
        Err(SealError::Mismatch { expected: expected.to_string(), computed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SealInput {
        SealInput {
            vote_id: "vote-2024-budget".into(),
            method: "schulze".into(),
            locked_at_iso: "2024-03-15T18:30:00.000Z".into(),
            ballots_count: 42,
            participation_pct: None,
            winner_id: Some("p-park".into()),
            ranking: vec![
                SealRankingEntry { project_id: "p-park".into(), title: Some("Community Park".into()), score: 2 },
                SealRankingEntry { project_id: "p-library".into(), title: Some("Bibliothèque".into()), score: 1 },
                SealRankingEntry { project_id: "p-road".into(), title: Some("Road \"Repair\"".into()), score: 0 },
            ],
        }
    }

    const PREIMAGE_NULL_PCT: &str = concat!(
        r#"{"v":1,"voteId":"vote-2024-budget","method":"schulze","lockedAt":"2024-03-15T18:30:00.000Z","#,
        r#""ballotsCount":42,"participationPct":null,"winnerId":"p-park","ranking":["#,
        r#"{"projectId":"p-park","title":"Community Park","score":2},"#,
        r#"{"projectId":"p-library","title":"Bibliothèque","score":1},"#,
        r#"{"projectId":"p-road","title":"Road \"Repair\"","score":0}]}"#
    );

    #[test]
    fn preimage_is_bit_exact() {
        let bytes = seal_preimage_bytes(&sample());
        assert_eq!(String::from_utf8(bytes).unwrap(), PREIMAGE_NULL_PCT);
    }

    #[test]
    fn golden_digests() {
        let mut x = sample();
        assert_eq!(compute_seal(&x), "bb583ddb7bda9baa638e220924c4f5759940d32ac10ef8c9ba9fe2803513f946");

        x.participation_pct = Some(87.5);
        assert_eq!(compute_seal(&x), "9ca7dd19d109cf18fb4d517d37a39b325a70016f1e733c6a2db406f00e986427");

        // Integral percentages hash as `50`, not `50.0`.
        x.participation_pct = Some(50.0);
        assert_eq!(compute_seal(&x), "9431031b49fec6dac42ae82ec13c1ac1c5a3e790bd6ff309f1439eb2a0f9a03b");
    }

    #[test]
    fn omitted_pct_equals_explicit_null() {
        let with_null = r#"{"voteId":"v","method":"schulze","lockedAtISO":"2024-01-01T00:00:00.000Z",
            "ballotsCount":0,"participationPct":null,"winnerId":null,"ranking":[]}"#;
        let omitted = r#"{"voteId":"v","method":"schulze","lockedAt":"2024-01-01T00:00:00.000Z",
            "ballotsCount":0,"ranking":[]}"#;
        let a: SealInput = serde_json::from_str(with_null).unwrap();
        let b: SealInput = serde_json::from_str(omitted).unwrap();
        assert_eq!(compute_seal(&a), compute_seal(&b));
        assert!(String::from_utf8(seal_preimage_bytes(&b)).unwrap().contains(r#""participationPct":null,"winnerId":null"#));
    }

    #[test]
    fn extra_ranking_fields_are_dropped() {
        let doc = r#"{"voteId":"vote-2024-budget","method":"schulze","lockedAtISO":"2024-03-15T18:30:00.000Z",
            "ballotsCount":42,"winnerId":"p-park","ranking":[
              {"rank":1,"projectId":"p-park","score":2,"title":"Community Park","color":"green"},
              {"projectId":"p-library","title":"Bibliothèque","score":1,"rank":2},
              {"score":0,"title":"Road \"Repair\"","projectId":"p-road"}]}"#;
        let x: SealInput = serde_json::from_str(doc).unwrap();
        assert_eq!(compute_seal(&x), compute_seal(&sample()));
    }

    #[test]
    fn any_field_change_changes_the_digest() {
        let base = compute_seal(&sample());
        let edits: [fn(&mut SealInput); 11] = [
            |x| x.vote_id.push('x'),
            |x| x.method = "schulze2".into(),
            |x| x.locked_at_iso = "2024-03-15T18:30:00.001Z".into(),
            |x| x.ballots_count += 1,
            |x| x.participation_pct = Some(0.0),
            |x| x.winner_id = Some("p-road".into()),
            |x| x.winner_id = None,
            |x| x.ranking[2].score = 1,
            |x| x.ranking[1].title = None,
            |x| x.ranking.swap(1, 2),
            |x| {
                x.ranking.pop();
            },
        ];
        for (i, edit) in edits.iter().enumerate() {
            let mut x = sample();
            edit(&mut x);
            assert_ne!(compute_seal(&x), base, "edit #{i} left the digest unchanged");
        }
    }

    #[test]
    fn verify_accepts_match_and_rejects_tamper() {
        let x = sample();
        let seal = compute_seal(&x);
        assert_eq!(verify_seal(&x, &seal), Ok(()));

        let mut tampered = x.clone();
        tampered.ranking[0].score = 3;
        assert!(matches!(verify_seal(&tampered, &seal), Err(SealError::Mismatch { .. })));

        assert_eq!(
            verify_seal(&x, &seal.to_uppercase()),
            Err(SealError::Malformed(seal.to_uppercase()))
        );
    }

    #[test]
    fn format_is_lower_hex64() {
        let h = compute_seal(&sample());
        assert_eq!(h.len(), 64);
        assert!(h.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
    }
}

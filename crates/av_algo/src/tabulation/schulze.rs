//! Ranked Condorcet: Schulze method (deterministic, integers-only).
//!
//! Scope:
//! - Build pairwise preference counts `d` from ballots (unknown ids skipped).
//! - Compute strongest paths `p` (Floyd–Warshall style widening).
//! - Count Schulze wins per candidate and rank by wins, descending.
//!
//! Determinism:
//! - No time, no RNG, no map iteration in results; every loop runs by index
//!   over the caller's candidate slice.
//! - Equal win counts keep candidate input order (stable sort).
//!
//! Robustness:
//! - Never fails. Unknown ids, empty rankings and repeated entries contribute
//!   no preference information.

use alloc::vec::Vec;

use av_core::{
    determinism::{candidate_index, stable_order_desc},
    Ballot, ProjectId, RankedEntry, TallyResult,
};

/* -------------------------------------------------------------------------- */
/*                                 Matrices                                   */
/* -------------------------------------------------------------------------- */

/// Dense `n × n` matrix of counts, row-major, allocated fresh per tally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SquareMatrix {
    n: usize,
    cells: Vec<u64>,
}

impl SquareMatrix {
    pub fn zeros(n: usize) -> Self {
        Self { n, cells: alloc::vec![0; n * n] }
    }

    /// Side length (candidate count).
    #[inline]
    pub fn size(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> u64 {
        self.cells[i * self.n + j]
    }

    #[inline]
    fn set(&mut self, i: usize, j: usize, v: u64) {
        self.cells[i * self.n + j] = v;
    }

    #[inline]
    fn bump(&mut self, i: usize, j: usize) {
        let slot = &mut self.cells[i * self.n + j];
        *slot = slot.saturating_add(1);
    }

    /// Nested rows, for audit output.
    pub fn rows(&self) -> Vec<Vec<u64>> {
        self.cells.chunks(self.n.max(1)).take(self.n).map(<[u64]>::to_vec).collect()
    }
}

/* -------------------------------------------------------------------------- */
/*                            Pairwise preferences                            */
/* -------------------------------------------------------------------------- */

/// `d[i][j]` = number of ballots ranking candidate `i` strictly before `j`.
///
/// Pairs are taken by position within each ballot; a pair with an id that is
/// not a candidate contributes nothing. A candidate listed again later on the
/// same ballot keeps only its first position, so every ballot adds at most one
/// to `d[i][j] + d[j][i]`.
pub fn pairwise_preferences(candidates: &[ProjectId], ballots: &[Ballot]) -> SquareMatrix {
    let idx = candidate_index(candidates);
    let mut d = SquareMatrix::zeros(candidates.len());
    let mut seen = alloc::vec![false; candidates.len()];

    for ballot in ballots {
        seen.iter_mut().for_each(|s| *s = false);
        let resolved: Vec<usize> = ballot
            .ranking
            .iter()
            .filter_map(|id| idx.get(id.as_str()).copied())
            .filter(|&i| !core::mem::replace(&mut seen[i], true))
            .collect();

        for (pos, &a) in resolved.iter().enumerate() {
            for &b in &resolved[pos + 1..] {
                d.bump(a, b);
            }
        }
    }

    d
}

/* -------------------------------------------------------------------------- */
/*                              Strongest paths                               */
/* -------------------------------------------------------------------------- */

/// Schulze strongest paths `p` from pairwise preferences `d`.
///
/// - Initialize: `p[i][j] = d[i][j]` if `d[i][j] > d[j][i]`, else `0`; `p[i][i] = 0`.
/// - Widen: for `k` in index order, for `i != k`, for `j ∉ {i, k}`:
///   `p[i][j] = max(p[i][j], min(p[i][k], p[k][j]))`.
pub fn strongest_paths(d: &SquareMatrix) -> SquareMatrix {
    let n = d.size();
    let mut p = SquareMatrix::zeros(n);

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let dij = d.get(i, j);
            if dij > d.get(j, i) {
                p.set(i, j, dij);
            }
        }
    }

    for k in 0..n {
        for i in 0..n {
            if i == k {
                continue;
            }
            for j in 0..n {
                if j == i || j == k {
                    continue;
                }
                let via_k = core::cmp::min(p.get(i, k), p.get(k, j));
                if via_k > p.get(i, j) {
                    p.set(i, j, via_k);
                }
            }
        }
    }

    p
}

/// `wins[i]` = number of `j != i` with `p[i][j] > p[j][i]`.
pub fn schulze_wins(p: &SquareMatrix) -> Vec<u32> {
    let n = p.size();
    (0..n)
        .map(|i| (0..n).filter(|&j| j != i && p.get(i, j) > p.get(j, i)).count() as u32)
        .collect()
}

/// Candidate indices, best first: wins descending, ties in input order.
#[inline]
pub fn schulze_order(wins: &[u32]) -> Vec<usize> {
    stable_order_desc(wins)
}

/// The candidate beating every other one head-to-head on raw counts, if any.
pub fn condorcet_winner(d: &SquareMatrix) -> Option<usize> {
    let n = d.size();
    (0..n).find(|&i| (0..n).all(|j| j == i || d.get(i, j) > d.get(j, i)))
}

/* -------------------------------------------------------------------------- */
/*                                End to end                                  */
/* -------------------------------------------------------------------------- */

/// Full Schulze tally with its intermediate matrices (candidate input order).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchulzeTally {
    pub result: TallyResult,
    pub pairwise: SquareMatrix,
    pub strongest_paths: SquareMatrix,
    pub wins: Vec<u32>,
    /// Index of the raw-majority Condorcet winner, if one exists.
    pub condorcet_winner: Option<usize>,
}

/// Tally and keep the audit trail.
pub fn tally_with_audit(candidates: &[ProjectId], ballots: &[Ballot]) -> SchulzeTally {
    if candidates.is_empty() {
        return SchulzeTally {
            result: TallyResult::empty(),
            pairwise: SquareMatrix::zeros(0),
            strongest_paths: SquareMatrix::zeros(0),
            wins: Vec::new(),
            condorcet_winner: None,
        };
    }

    let d = pairwise_preferences(candidates, ballots);
    let p = strongest_paths(&d);
    let wins = schulze_wins(&p);
    let order = schulze_order(&wins);

    let ranking: Vec<RankedEntry> = order
        .iter()
        .enumerate()
        .map(|(pos, &i)| RankedEntry {
            id: candidates[i].clone(),
            rank: pos as u32 + 1,
            score: wins[i],
        })
        .collect();

    let result = TallyResult {
        winner_id: ranking.first().map(|e| e.id.clone()),
        ranking,
        total: ballots.len() as u64,
    };

    SchulzeTally {
        result,
        condorcet_winner: condorcet_winner(&d),
        pairwise: d,
        strongest_paths: p,
        wins,
    }
}

/// Rank `candidates` from `ballots`.
///
/// Empty candidates give `{winner_id: None, ranking: [], total: 0}`. With no
/// ballots every score is 0 and the first candidate wins.
pub fn compute_results(candidates: &[ProjectId], ballots: &[Ballot]) -> TallyResult {
    tally_with_audit(candidates, ballots).result
}


#[cfg(test)]
mod proptests {
    use super::*;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    const POOL: [&str; 6] = ["A", "B", "C", "D", "E", "X"];

    prop_compose! {
        fn arb_candidates()(n in 0usize..=5) -> Vec<ProjectId> {
            POOL[..n].iter().map(|s| ProjectId::from(*s)).collect()
        }
    }

    prop_compose! {
        fn arb_ballot()(picks in proptest::collection::vec(0usize..POOL.len(), 0..6)) -> Ballot {
            Ballot::from_ids(picks.into_iter().map(|i| POOL[i]))
        }
    }

    proptest! {
        #[test]
        fn tally_is_deterministic(
            c in arb_candidates(),
            b in proptest::collection::vec(arb_ballot(), 0..20),
        ) {
            prop_assert_eq!(compute_results(&c, &b), compute_results(&c, &b));
        }

        #[test]
        fn ballot_order_does_not_matter(
            c in arb_candidates(),
            b in proptest::collection::vec(arb_ballot(), 0..20),
        ) {
            let mut rev = b.clone();
            rev.reverse();
            prop_assert_eq!(compute_results(&c, &b), compute_results(&c, &rev));
        }

        #[test]
        fn result_shape_invariants(
            c in arb_candidates(),
            b in proptest::collection::vec(arb_ballot(), 0..20),
        ) {
            let audit = tally_with_audit(&c, &b);
            let r = &audit.result;
            let n = c.len();

            prop_assert_eq!(r.ranking.len(), n);
            prop_assert_eq!(r.total, if n == 0 { 0 } else { b.len() as u64 });
            prop_assert_eq!(r.winner_id.clone(), r.ranking.first().map(|e| e.id.clone()));

            for (pos, e) in r.ranking.iter().enumerate() {
                prop_assert_eq!(e.rank as usize, pos + 1);
                prop_assert!((e.score as usize) < n.max(1));
            }
            for w in r.ranking.windows(2) {
                prop_assert!(w[0].score >= w[1].score);
            }
            for i in 0..n {
                for j in 0..n {
                    if i != j {
                        prop_assert!(audit.pairwise.get(i, j) + audit.pairwise.get(j, i) <= b.len() as u64);
                    }
                }
            }
            if let Some(cw) = audit.condorcet_winner {
                prop_assert_eq!(r.winner_id.clone(), Some(c[cw].clone()));
            }
        }
    }
}

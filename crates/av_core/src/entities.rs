//! Ballots and tally results.

use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::ProjectId;

/// One voter's strict preference order, most-preferred first.
///
/// Partial rankings are allowed. Ids that are not candidates of the vote are
/// kept here and ignored by the tally.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ballot {
    pub ranking: Vec<ProjectId>,
}

impl Ballot {
    pub fn new(ranking: Vec<ProjectId>) -> Self {
        Self { ranking }
    }

    /// Build a ballot from anything string-like (tests, fixtures, loaders).
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ProjectId>,
    {
        Self { ranking: ids.into_iter().map(Into::into).collect() }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranking.is_empty()
    }
}

/// One row of the final ranking.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RankedEntry {
    pub id: ProjectId,
    /// 1-based position in the ranking.
    pub rank: u32,
    /// Number of candidates this one beats under the Schulze relation.
    pub score: u32,
}

/// Output of one tally. Built once, never mutated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TallyResult {
    pub winner_id: Option<ProjectId>,
    pub ranking: Vec<RankedEntry>,
    /// Every supplied ballot, including ones that contributed no preference.
    pub total: u64,
}

impl TallyResult {
    /// `{winnerId: null, ranking: [], total: 0}`
    pub fn empty() -> Self {
        Self::default()
    }
}
